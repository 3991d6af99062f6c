//! Core data model for the TagRelay engine — containers, insertion condition
//! configuration, request contexts, fired events, and the alteration hook
//! seams shared by the condition and snippet engines.

pub mod error;
pub mod hooks;
pub mod settings;
pub mod types;

pub use error::{TagError, TagResult};
pub use settings::{ContainerDefaults, EngineSettings};
pub use types::{
    ConditionConfig, ConditionToggle, Container, EventConfig, EventData, FiredEvent,
    RequestContext,
};
