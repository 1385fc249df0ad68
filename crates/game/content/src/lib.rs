//! Data-driven content definitions and loaders.
//!
//! This crate houses arena tuning and provides loaders for RON/TOML data files:
//! - Combat configuration (data-driven via TOML)
//! - Archetype stat templates (data-driven via RON)
//!
//! Content is consumed by the spawn path through [`TemplateRegistry`] and
//! never appears in per-agent state beyond the stats it seeds.

pub mod registry;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use registry::TemplateRegistry;

#[cfg(feature = "loaders")]
pub use loaders::{ArchetypeLoader, ConfigLoader, ContentFactory, LoadResult};
