//! Event and signal types exchanged between collaborators.
//!
//! Submodules:
//! - [`audio`] – commands for the background audio thread
//! - [`signal`] – signals broadcast on the [`EventBus`](crate::resources::eventbus::EventBus)
pub mod audio;
pub mod signal;
