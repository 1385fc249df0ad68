//! Topic-based event bus for combat events.
//!
//! Events drained from the world are published to specific topics, and
//! consumers subscribe only to the topics they need.

mod bus;

pub use bus::{Event, EventBus, Topic};
