//! Script/noscript snippet assembly for qualifying containers.
//!
//! The host runs the insertion evaluator first and hands over only the
//! containers that qualified; the assembler owns ordering, defensive
//! re-validation, and the final snippet-alter hook pass.

use serde_json::json;
use tracing::{debug, warn};

use tagrelay_core::error::TagError;
use tagrelay_core::hooks::SnippetAlterHook;
use tagrelay_core::settings::EngineSettings;
use tagrelay_core::types::Container;

use crate::escape::{html_attr, js_string, query_value};

const GTM_JS_URL: &str = "https://www.googletagmanager.com/gtm.js";
const GTM_NS_URL: &str = "https://www.googletagmanager.com/ns.html";

/// Result of one render pass. Skipped containers failed their format
/// invariants and were excluded fail-closed; the host decides whether to log
/// or surface them.
#[derive(Debug, Default)]
pub struct RenderOutcome {
    pub script: String,
    pub noscript: String,
    pub skipped: Vec<(String, TagError)>,
}

/// Assembles the script and noscript markup for a render pass.
pub struct SnippetAssembler {
    compact: bool,
    snippet_alters: Vec<SnippetAlterHook>,
}

impl SnippetAssembler {
    pub fn new() -> Self {
        Self {
            compact: true,
            snippet_alters: Vec::new(),
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self {
            compact: settings.compact_snippet,
            snippet_alters: Vec::new(),
        }
    }

    /// Append a snippet-alter hook, run in registration order after the
    /// built-in assembly pass.
    pub fn with_snippet_alter<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut String, &mut String) + Send + Sync + 'static,
    {
        self.snippet_alters.push(Box::new(hook));
        self
    }

    /// Render the snippet pair for the given containers, ordered by weight
    /// ascending with ties broken by container machine name. Containers that
    /// fail re-validation are omitted from the output and reported in
    /// `skipped`; the remaining containers still render.
    pub fn render(&self, containers: &[&Container]) -> RenderOutcome {
        let mut ordered: Vec<&Container> = containers.to_vec();
        ordered.sort_by(|a, b| a.weight.cmp(&b.weight).then_with(|| a.id.cmp(&b.id)));

        let mut outcome = RenderOutcome::default();
        for container in ordered {
            if let Err(error) = container.validate() {
                warn!(container = %container.id, %error, "skipping container with invalid configuration");
                outcome.skipped.push((container.id.clone(), error));
                continue;
            }
            outcome.script.push_str(&self.script_fragment(container));
            outcome.noscript.push_str(&noscript_fragment(container));
            debug!(container = %container.id, "snippet fragments assembled");
        }

        for hook in &self.snippet_alters {
            hook(&mut outcome.script, &mut outcome.noscript);
        }
        outcome
    }

    fn script_fragment(&self, container: &Container) -> String {
        let mut fragment = String::new();
        if let Some(declaration) = data_layer_declaration(container) {
            fragment.push_str(&declaration);
            if !self.compact {
                fragment.push('\n');
            }
        }

        let env_suffix = if container.include_environment {
            format!("+'{}'", environment_query(container))
        } else {
            String::new()
        };

        let segments = [
            "(function(w,d,s,l,i){w[l]=w[l]||[];w[l].push({'gtm.start':new Date().getTime(),event:'gtm.js'});".to_string(),
            "var f=d.getElementsByTagName(s)[0],j=d.createElement(s),dl=l!='dataLayer'?'&l='+l:'';".to_string(),
            format!("j.async=true;j.src='{GTM_JS_URL}?id='+i+dl{env_suffix};"),
            format!(
                "f.parentNode.insertBefore(j,f);}})(window,document,'script','{}','{}');",
                js_string(&container.data_layer),
                js_string(&container.container_id)
            ),
        ];
        fragment.push_str(&segments.join(if self.compact { "" } else { "\n" }));
        fragment
    }
}

impl Default for SnippetAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Data-layer declaration carrying the class allow/deny lists. Only emitted
/// when classes are included and at least one list is non-empty; the lists
/// are independent of each other.
fn data_layer_declaration(container: &Container) -> Option<String> {
    if !container.include_classes {
        return None;
    }
    let mut classes = serde_json::Map::new();
    if !container.allowlist_classes.is_empty() {
        classes.insert("gtm.whitelist".into(), json!(container.allowlist_classes));
    }
    if !container.denylist_classes.is_empty() {
        classes.insert("gtm.blacklist".into(), json!(container.denylist_classes));
    }
    if classes.is_empty() {
        return None;
    }
    let encoded = serde_json::Value::Object(classes).to_string();
    Some(format!(
        "var {} = [{}];",
        js_string(&container.data_layer),
        encoded
    ))
}

/// Environment portion of the snippet URLs, shared by script and noscript.
fn environment_query(container: &Container) -> String {
    format!(
        "&gtm_auth={}&gtm_preview={}&gtm_cookies_win=x",
        query_value(&container.environment_token),
        query_value(&container.environment_id)
    )
}

fn noscript_fragment(container: &Container) -> String {
    let mut src = format!("{GTM_NS_URL}?id={}", query_value(&container.container_id));
    if container.include_environment {
        src.push_str(&environment_query(container));
    }
    format!(
        "<noscript aria-hidden=\"true\"><iframe src=\"{}\" height=\"0\" width=\"0\" \
         style=\"display:none;visibility:hidden\"></iframe></noscript>",
        html_attr(&src)
    )
}
