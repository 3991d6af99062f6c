//! Event plugin catalog and per-request event collection.
//!
//! # Modules
//!
//! - [`plugins`] — Event plugin contract and the built-in plugins (login,
//!   sign-up, commerce cart add/remove)
//! - [`registry`] — Statically constructed catalog with dependency gating
//!   and a process-lifetime cache
//! - [`collector`] — Per-transaction accumulator of fired events

pub mod collector;
pub mod plugins;
pub mod registry;

pub use collector::EventCollector;
pub use plugins::{ConfigField, EventDefinition, EventPlugin, FieldError};
pub use registry::{BuildReport, CachedEventRegistry, CapabilitySet, EventRegistry};
