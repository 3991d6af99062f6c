//! Alteration hook seams.
//!
//! Hosts extend the engine by registering plain callbacks at startup; hooks
//! run in registration order with full trust, so a panicking hook aborts the
//! surrounding decide/render call.

use crate::types::{Container, RequestContext};

/// Callback that may flip the insertion decision for one container. Receives
/// the running decision and returns the (possibly altered) decision.
pub type InsertAlterHook = Box<dyn Fn(bool, &Container, &RequestContext) -> bool + Send + Sync>;

/// Callback that rewrites the assembled script/noscript strings in place,
/// after the built-in assembly pass.
pub type SnippetAlterHook = Box<dyn Fn(&mut String, &mut String) + Send + Sync>;
