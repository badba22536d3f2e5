//! Per-frame systems.
//!
//! Submodules overview
//! - [`accelerator`] – tick spawn accelerators and publish accelerations
//! - [`audio`] – advance audio tasks; the headless audio backend thread
//! - [`spawner`] – periodic spawning
//! - [`time`] – update simulation time and delta
pub mod accelerator;
pub mod audio;
pub mod spawner;
pub mod time;
