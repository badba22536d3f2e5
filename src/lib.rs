//! Dune runner core library.
//!
//! The reusable core of a side-scrolling runner, built on `bevy_ecs`:
//! a signal bus, pooled spawners with a shuffle-bag draw, and a priority
//! audio router. Rendering, physics and input are left to the host; pooled
//! entries expose an active flag and audio is an outbound command stream.

pub mod components;
pub mod error;
pub mod events;
pub mod game;
pub mod resources;
pub mod systems;
