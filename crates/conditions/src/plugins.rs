//! Built-in condition plugins.
//!
//! A condition reports whether the request context *matches* its configured
//! list; the evaluator applies toggle polarity on top, so include-listed and
//! exclude-listed share one implementation per plugin.

use std::collections::BTreeSet;
use std::sync::Arc;

use regex::Regex;
use tracing::warn;

use tagrelay_core::types::RequestContext;

/// Plugin ID of the request path condition.
pub const REQUEST_PATH: &str = "request_path";
/// Plugin ID of the user role condition.
pub const USER_ROLE: &str = "user_role";
/// Plugin ID of the response status condition.
pub const RESPONSE_STATUS: &str = "response_status";

/// Pattern matching the site front page regardless of its path alias.
pub const FRONT: &str = "<front>";

/// A configured, evaluatable condition instance.
pub trait Condition: Send + Sync {
    /// Whether the context matches the configured list. An empty list
    /// matches nothing.
    fn matches(&self, context: &RequestContext) -> bool;
}

/// Matches the request path against wildcard patterns, one entry per listed
/// path. `*` matches any run of characters; the literal `<front>` entry
/// matches the front page.
pub struct PathCondition {
    pattern: Option<Regex>,
    matches_front: bool,
}

impl PathCondition {
    pub fn new(list: &[String]) -> Self {
        let matches_front = list.iter().any(|entry| entry == FRONT);
        let patterns: Vec<&str> = list
            .iter()
            .filter(|entry| *entry != FRONT)
            .map(String::as_str)
            .collect();
        Self {
            pattern: compile_path_patterns(&patterns),
            matches_front,
        }
    }
}

/// Compile the wildcard list to a single case-insensitive anchored regex.
fn compile_path_patterns(patterns: &[&str]) -> Option<Regex> {
    if patterns.is_empty() {
        return None;
    }
    let alternatives: Vec<String> = patterns
        .iter()
        .map(|pattern| regex::escape(pattern).replace(r"\*", ".*"))
        .collect();
    let source = format!("(?i)^({})$", alternatives.join("|"));
    match Regex::new(&source) {
        Ok(regex) => Some(regex),
        Err(error) => {
            warn!(%error, "failed to compile path pattern list; list matches nothing");
            None
        }
    }
}

impl Condition for PathCondition {
    fn matches(&self, context: &RequestContext) -> bool {
        if self.matches_front && context.is_front() {
            return true;
        }
        self.pattern
            .as_ref()
            .map_or(false, |regex| regex.is_match(context.path()))
    }
}

/// Matches when the user holds any of the listed roles.
pub struct RoleCondition {
    roles: BTreeSet<String>,
}

impl RoleCondition {
    pub fn new(list: &[String]) -> Self {
        Self {
            roles: list.iter().cloned().collect(),
        }
    }
}

impl Condition for RoleCondition {
    fn matches(&self, context: &RequestContext) -> bool {
        self.roles.iter().any(|role| context.has_role(role))
    }
}

/// Matches when the response status is one of the listed codes. List entries
/// are parsed leniently; a non-numeric entry never matches.
pub struct StatusCondition {
    statuses: Vec<u16>,
}

impl StatusCondition {
    pub fn new(list: &[String]) -> Self {
        Self {
            statuses: list
                .iter()
                .filter_map(|entry| entry.trim().parse().ok())
                .collect(),
        }
    }
}

impl Condition for StatusCondition {
    fn matches(&self, context: &RequestContext) -> bool {
        self.statuses.contains(&context.status())
    }
}

/// Host-supplied predicate wrapped as a condition plugin. The configured
/// list is not consulted; the closure owns the whole match decision.
pub struct CustomCondition {
    predicate: Arc<dyn Fn(&RequestContext) -> bool + Send + Sync>,
}

impl CustomCondition {
    pub fn new(predicate: Arc<dyn Fn(&RequestContext) -> bool + Send + Sync>) -> Self {
        Self { predicate }
    }
}

impl Condition for CustomCondition {
    fn matches(&self, context: &RequestContext) -> bool {
        (self.predicate)(context)
    }
}
