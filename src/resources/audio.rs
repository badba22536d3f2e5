//! ECS resource that bridges the audio router with the background audio
//! thread.
//!
//! Commands flow to the thread over `tx_cmd`; clip-end reports flow back over
//! `rx_msg` and are drained by
//! [`audio_router_system`](crate::systems::audio::audio_router_system).
//!
//! Use [`setup_audio`] once during initialization to spawn the backend thread
//! and connect it to the [`AudioRouter`]. Call [`shutdown_audio`] during
//! teardown to stop the thread and collect how many commands it handled.

use bevy_ecs::prelude::*;
use crossbeam_channel::{Receiver, Sender, unbounded};
use log::warn;

use crate::events::audio::{AudioCmd, AudioMessage};
use crate::resources::audiorouter::AudioRouter;
use crate::systems::audio::audio_thread;

/// Shared bridge between the ECS world and the audio thread.
#[derive(Resource)]
pub struct AudioBridge {
    /// Sender for [`AudioCmd`] messages (ECS -> audio thread).
    pub tx_cmd: Sender<AudioCmd>,
    /// Receiver for [`AudioMessage`] reports (audio thread -> ECS).
    pub rx_msg: Receiver<AudioMessage>,
    /// Join handle for the background audio thread; yields the number of
    /// commands it processed.
    pub handle: std::thread::JoinHandle<usize>,
}

/// Spawn the audio thread and register the bridge resource.
///
/// If an [`AudioRouter`] is already in the world it is connected to the new
/// thread; otherwise the bridge is inserted alone and a warning is logged.
pub fn setup_audio(world: &mut World) {
    let (tx_cmd, rx_cmd) = unbounded::<AudioCmd>();
    let (tx_msg, rx_msg) = unbounded::<AudioMessage>();

    let handle = std::thread::spawn(move || audio_thread(rx_cmd, tx_msg));

    match world.get_resource_mut::<AudioRouter>() {
        Some(mut router) => router.connect(tx_cmd.clone()),
        None => warn!("audio thread started without an AudioRouter resource"),
    }
    world.insert_resource(AudioBridge {
        tx_cmd,
        rx_msg,
        handle,
    });
}

/// Request shutdown of the audio thread and join it.
///
/// Returns the number of commands the thread processed, or `None` if no
/// bridge was running.
pub fn shutdown_audio(world: &mut World) -> Option<usize> {
    if let Some(mut router) = world.get_resource_mut::<AudioRouter>() {
        router.disconnect();
    }
    let bridge = world.remove_resource::<AudioBridge>()?;
    let _ = bridge.tx_cmd.send(AudioCmd::Shutdown);
    bridge.handle.join().ok()
}
