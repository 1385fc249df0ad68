//! Runtime orchestration for the arena combat simulation.
//!
//! This crate wires the combat engine, its collaborators and the content
//! loaders into a frame-driven API. Consumers embed [`Runtime`] to advance
//! frames, forward effects to their physics/VFX layer and subscribe to
//! combat events.
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`config`] reads runtime configuration from the environment
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`hooks`] provides post-frame hooks reacting to deaths and status triggers
//! - [`sink`] is the seam effects leave the runtime through
pub mod config;
pub mod error;
pub mod events;
pub mod hooks;
pub mod runtime;
pub mod sink;

pub use config::RuntimeConfig;
pub use error::{Result, RuntimeError};
pub use events::{Event, EventBus, Topic};
pub use hooks::{
    FnHook, FrameHook, HookContext, HookCriticality, HookOutput, HookRegistry, LootDrop, LootHook,
};
pub use runtime::{FrameReport, Runtime, RuntimeBuilder};
pub use sink::{EffectsSink, NullSink, RecordingSink};
