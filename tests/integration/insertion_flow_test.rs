//! Integration test for the full decide → render → data-layer flow.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use tagrelay_conditions::registry::ConditionRegistry;
    use tagrelay_conditions::InsertionEvaluator;
    use tagrelay_core::types::{ConditionConfig, Container, RequestContext};
    use tagrelay_events::plugins::{CartAddEvent, CartLine, LoginEvent};
    use tagrelay_events::registry::{CapabilitySet, EventRegistry};
    use tagrelay_events::plugins::RegistrationMode;
    use tagrelay_events::EventCollector;
    use tagrelay_snippets::{data_layer, SnippetAssembler};

    /// Two containers: one unrestricted, one limited to the shop section.
    fn sample_containers() -> Vec<Container> {
        let everywhere = Container::new("site_wide", "GTM-ABCD12").with_weight(1);

        let mut shop = Container::new("shop_only", "GTM-WXYZ89").with_weight(5);
        shop.set_condition("request_path", ConditionConfig::include_listed(["/shop/*"]));
        shop.set_condition("response_status", ConditionConfig::include_listed(["200"]));
        vec![everywhere, shop]
    }

    #[test]
    fn test_page_render_flow() {
        let registry = Arc::new(ConditionRegistry::with_builtins());
        let evaluator = InsertionEvaluator::new(registry);
        let assembler = SnippetAssembler::new();

        let containers = sample_containers();
        let context = RequestContext::new("/shop/cart", 200).with_roles(["authenticated"]);

        let qualifying: Vec<&Container> = containers
            .iter()
            .filter(|container| evaluator.decide(container, &context).unwrap())
            .collect();
        assert_eq!(qualifying.len(), 2);

        let outcome = assembler.render(&qualifying);
        assert!(outcome.skipped.is_empty());

        // Both containers render, lower weight first.
        let site_wide = outcome.script.find("GTM-ABCD12").unwrap();
        let shop = outcome.script.find("GTM-WXYZ89").unwrap();
        assert!(site_wide < shop);
        assert!(outcome.noscript.contains("id=GTM-ABCD12"));
        assert!(outcome.noscript.contains("id=GTM-WXYZ89"));
    }

    #[test]
    fn test_conditions_drop_container_outside_shop() {
        let evaluator = InsertionEvaluator::new(Arc::new(ConditionRegistry::with_builtins()));
        let containers = sample_containers();
        let context = RequestContext::new("/blog/post", 200);

        let qualifying: Vec<&Container> = containers
            .iter()
            .filter(|container| evaluator.decide(container, &context).unwrap())
            .collect();
        let ids: Vec<&str> = qualifying.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["site_wide"]);
    }

    #[test]
    fn test_events_flow_into_data_layer() {
        let capabilities = CapabilitySet::new(["user", "commerce"]);
        let (registry, _report) =
            EventRegistry::with_builtins(RegistrationMode::Visitors, &capabilities);

        let mut collector = EventCollector::new();

        let login_plugin = registry.plugin("login").unwrap();
        collector.add(LoginEvent::fired(&login_plugin.default_configuration()));

        collector.add(CartAddEvent::fired(&[CartLine {
            item_name: "Basic tee".into(),
            sku: "TEE-S-BLK".into(),
            affiliation: "Default store".into(),
            currency: "USD".into(),
            unit_price: 12.0,
            quantity: 1,
            discount: 0.0,
        }]));

        let events = collector.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name(), "login");
        assert_eq!(events[1].name(), "add_to_cart");

        let script = data_layer::render(&events, "dataLayer").unwrap();
        assert!(script.contains(r#""event_name":"login""#));
        assert!(script.contains(r#""method":"CMS""#));
        assert!(script.contains(r#""event_name":"add_to_cart""#));
        assert!(script.contains(r#""value":"12.00""#));

        let push = data_layer::push_object(&events[1]);
        assert_eq!(push["currency"], "USD");
        assert_eq!(push["items"][0], json!({
            "item_name": "Basic tee",
            "affiliation": "Default store",
            "discount": "0",
            "price": "12.00",
            "quantity": "1",
            "item_id": "TEE-S-BLK",
        }));
    }

    #[test]
    fn test_catalog_without_user_capability_hides_account_events() {
        let commerce_only = CapabilitySet::new(["commerce"]);
        let (registry, _) =
            EventRegistry::with_builtins(RegistrationMode::Visitors, &commerce_only);

        let ids: Vec<String> = registry.load().into_keys().collect();
        assert_eq!(ids, ["commerce_add_to_cart", "commerce_remove_from_cart"]);
    }
}
