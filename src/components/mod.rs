//! ECS components for entities.
//!
//! Submodules overview:
//! - [`accelerator`] – shortens a spawner's interval and requests accelerations over time
//! - [`drawbag`] – without-replacement sampling of candidate templates
//! - [`pooled`] – pool entries, spawn templates and the [`pooled::Spawnable`] trait
//! - [`spawner`] – growable pool that spawns entries periodically
//! - [`timer`] – periodic countdown shared by spawners, accelerators and audio loops

pub mod accelerator;
pub mod drawbag;
pub mod pooled;
pub mod spawner;
pub mod timer;
