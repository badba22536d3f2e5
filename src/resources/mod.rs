//! ECS resources made available to systems.
//!
//! Overview
//! - `audio` – bridge to the background audio thread
//! - `audiochannel` – playback channels, channel groups and selection
//! - `audiorouter` – priority routing of sounds onto channels, fades and loops
//! - `audiotask` – per-channel fade and control-loop tasks
//! - `eventbus` – multicast signal registry
//! - `gameconfig` – INI-backed session configuration
//! - `soundbank` – sound definitions loaded from JSON
//! - `worldtime` – simulation time and delta
pub mod audio;
pub mod audiochannel;
pub mod audiorouter;
pub mod audiotask;
pub mod eventbus;
pub mod gameconfig;
pub mod soundbank;
pub mod worldtime;
