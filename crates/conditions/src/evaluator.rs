//! Insertion decision engine.
//!
//! Combines a container's configured conditions with AND semantics: every
//! present condition must be satisfied for the snippet to be inserted, and a
//! container with no configured conditions always qualifies. Insert-alter
//! hooks get the final word either way.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use tagrelay_core::error::TagResult;
use tagrelay_core::hooks::InsertAlterHook;
use tagrelay_core::types::{Container, RequestContext};

use crate::registry::ConditionRegistry;

/// Per-request insertion evaluator. Create one per request scope; the
/// registry itself is shared and read-only.
pub struct InsertionEvaluator {
    registry: Arc<ConditionRegistry>,
    insert_alters: Vec<InsertAlterHook>,
    memo: DashMap<(String, u64), bool>,
}

impl InsertionEvaluator {
    pub fn new(registry: Arc<ConditionRegistry>) -> Self {
        Self {
            registry,
            insert_alters: Vec::new(),
            memo: DashMap::new(),
        }
    }

    /// Append an insert-alter hook. Hooks run in registration order after the
    /// built-in condition pass, even when that pass already failed, and may
    /// flip the decision in either direction.
    pub fn with_insert_alter<F>(mut self, hook: F) -> Self
    where
        F: Fn(bool, &Container, &RequestContext) -> bool + Send + Sync + 'static,
    {
        self.insert_alters.push(Box::new(hook));
        self
    }

    /// Decide whether the container's snippet should be inserted for this
    /// context. Pure function of (container, context, registered hooks).
    pub fn decide(&self, container: &Container, context: &RequestContext) -> TagResult<bool> {
        let mut satisfied = true;
        for (condition_id, config) in &container.conditions {
            // A default-valued config is treated as absent, matching the
            // persisted-set invariant. An empty list is not a default.
            if config.is_default() {
                continue;
            }
            let condition = self.registry.instantiate(condition_id, config)?;
            if condition.matches(context) == config.negated() {
                debug!(
                    container = %container.id,
                    condition = %condition_id,
                    "insertion condition not satisfied"
                );
                satisfied = false;
                break;
            }
        }

        for hook in &self.insert_alters {
            satisfied = hook(satisfied, container, context);
        }

        debug!(container = %container.id, satisfied, "insertion decided");
        Ok(satisfied)
    }

    /// Memoized [`decide`](Self::decide), keyed by container ID and context
    /// fingerprint. The memo lives on this evaluator instance, so caching
    /// never crosses request scopes.
    pub fn decide_memo(&self, container: &Container, context: &RequestContext) -> TagResult<bool> {
        let key = (container.id.clone(), context.fingerprint());
        if let Some(decision) = self.memo.get(&key) {
            return Ok(*decision);
        }
        let decision = self.decide(container, context)?;
        self.memo.insert(key, decision);
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tagrelay_core::error::TagError;
    use tagrelay_core::types::ConditionConfig;

    fn evaluator() -> InsertionEvaluator {
        InsertionEvaluator::new(Arc::new(ConditionRegistry::with_builtins()))
    }

    fn container() -> Container {
        Container::new("primary", "GTM-ABCD12")
    }

    #[test]
    fn test_no_conditions_means_insert() {
        let decided = evaluator()
            .decide(&container(), &RequestContext::new("/anything", 200))
            .unwrap();
        assert!(decided);
    }

    #[test]
    fn test_decide_is_pure() {
        let evaluator = evaluator();
        let mut container = container();
        container.set_condition("request_path", ConditionConfig::include_listed(["/node/*"]));
        let context = RequestContext::new("/node/7", 200);

        let first = evaluator.decide(&container, &context).unwrap();
        let second = evaluator.decide(&container, &context).unwrap();
        assert!(first);
        assert_eq!(first, second);
    }

    #[test]
    fn test_include_listed_requires_match() {
        let evaluator = evaluator();
        let mut container = container();
        container.set_condition("request_path", ConditionConfig::include_listed(["/node/*"]));

        assert!(evaluator
            .decide(&container, &RequestContext::new("/node/7", 200))
            .unwrap());
        assert!(!evaluator
            .decide(&container, &RequestContext::new("/admin", 200))
            .unwrap());
    }

    #[test]
    fn test_exclude_listed_requires_no_match() {
        let evaluator = evaluator();
        let mut container = container();
        container.set_condition("user_role", ConditionConfig::exclude_listed(["administrator"]));

        let admin = RequestContext::new("/", 200).with_roles(["administrator"]);
        let visitor = RequestContext::new("/", 200).with_roles(["anonymous"]);
        assert!(!evaluator.decide(&container, &admin).unwrap());
        assert!(evaluator.decide(&container, &visitor).unwrap());
    }

    #[test]
    fn test_empty_list_toggle_semantics() {
        let evaluator = evaluator();

        // Include-listed with an empty list: nothing is listed, nothing
        // matches, the snippet is never inserted.
        let mut include = container();
        include.set_condition("request_path", ConditionConfig::include_listed::<_, String>([]));
        assert!(!evaluator
            .decide(&include, &RequestContext::new("/", 200))
            .unwrap());

        // Exclude-listed with an empty list is the plugin default and is
        // dropped from the stored set, so the container has no conditions.
        let mut exclude = container();
        exclude.set_condition("request_path", ConditionConfig::exclude_listed::<_, String>([]));
        assert!(exclude.conditions.is_empty());
        assert!(evaluator
            .decide(&exclude, &RequestContext::new("/", 200))
            .unwrap());
    }

    #[test]
    fn test_all_conditions_must_pass() {
        let evaluator = evaluator();
        let mut container = container();
        container.set_condition("request_path", ConditionConfig::include_listed(["/shop/*"]));
        container.set_condition("response_status", ConditionConfig::include_listed(["200"]));

        let ok = RequestContext::new("/shop/cart", 200);
        let wrong_status = RequestContext::new("/shop/cart", 404);
        assert!(evaluator.decide(&container, &ok).unwrap());
        assert!(!evaluator.decide(&container, &wrong_status).unwrap());
    }

    #[test]
    fn test_unknown_condition_surfaces() {
        let evaluator = evaluator();
        let mut container = container();
        container.set_condition("no_such_plugin", ConditionConfig::include_listed(["x"]));

        let result = evaluator.decide(&container, &RequestContext::new("/", 200));
        assert!(matches!(result, Err(TagError::UnknownCondition(_))));
    }

    #[test]
    fn test_alter_hook_runs_even_when_unsatisfied() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let evaluator = InsertionEvaluator::new(Arc::new(ConditionRegistry::with_builtins()))
            .with_insert_alter(move |satisfied, _container, _context| {
                seen.fetch_add(1, Ordering::SeqCst);
                !satisfied
            });

        let mut container = container();
        container.set_condition("request_path", ConditionConfig::include_listed::<_, String>([]));

        // Built-in pass fails, hook still runs and flips the decision.
        let decided = evaluator
            .decide(&container, &RequestContext::new("/", 200))
            .unwrap();
        assert!(decided);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_alter_hooks_chain_in_order() {
        let evaluator = InsertionEvaluator::new(Arc::new(ConditionRegistry::with_builtins()))
            .with_insert_alter(|_satisfied, _c, _x| false)
            .with_insert_alter(|satisfied, _c, _x| !satisfied);

        let decided = evaluator
            .decide(&container(), &RequestContext::new("/", 200))
            .unwrap();
        assert!(decided);
    }

    #[test]
    fn test_memo_distinguishes_contexts() {
        let evaluator = evaluator();
        let mut container = container();
        container.set_condition("response_status", ConditionConfig::include_listed(["200"]));

        let ok = RequestContext::new("/page", 200);
        let not_found = RequestContext::new("/page", 404);
        assert!(evaluator.decide_memo(&container, &ok).unwrap());
        assert!(!evaluator.decide_memo(&container, &not_found).unwrap());
        // Second lookups hit the memo and agree.
        assert!(evaluator.decide_memo(&container, &ok).unwrap());
        assert!(!evaluator.decide_memo(&container, &not_found).unwrap());
    }
}
