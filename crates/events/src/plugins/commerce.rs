//! Commerce cart event plugins (add to / remove from cart).
//!
//! Payloads follow the analytics e-commerce schema: monetary amounts are
//! two-decimal strings, quantities integer strings, and a zero discount the
//! bare string "0".

use serde_json::json;

use tagrelay_core::types::{EventConfig, EventData, FiredEvent};

use super::{EventDefinition, EventPlugin};

/// Plugin ID of the cart-add event; its data-layer name is `add_to_cart`.
pub const ADD_TO_CART: &str = "commerce_add_to_cart";
/// Plugin ID of the cart-remove event; its data-layer name is
/// `remove_from_cart`.
pub const REMOVE_FROM_CART: &str = "commerce_remove_from_cart";

/// One cart line as reported by the commerce collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    /// Purchasable title as it appears on the order item.
    pub item_name: String,
    /// SKU of the purchased variation.
    pub sku: String,
    /// Store label.
    pub affiliation: String,
    pub currency: String,
    pub unit_price: f64,
    pub quantity: u32,
    pub discount: f64,
}

fn money(amount: f64) -> String {
    format!("{amount:.2}")
}

fn discount(amount: f64) -> String {
    if amount == 0.0 {
        "0".to_string()
    } else {
        money(amount)
    }
}

fn cart_event(event_name: &str, lines: &[CartLine]) -> FiredEvent {
    let currency = lines
        .first()
        .map(|line| line.currency.clone())
        .unwrap_or_default();
    let total: f64 = lines
        .iter()
        .map(|line| line.unit_price * f64::from(line.quantity))
        .sum();
    let items: Vec<serde_json::Value> = lines
        .iter()
        .map(|line| {
            json!({
                "item_name": line.item_name,
                "affiliation": line.affiliation,
                "discount": discount(line.discount),
                "price": money(line.unit_price),
                "quantity": line.quantity.to_string(),
                "item_id": line.sku,
            })
        })
        .collect();

    let mut data = EventData::new();
    data.insert("currency".into(), json!(currency));
    data.insert("value".into(), json!(money(total)));
    data.insert("items".into(), json!(items));
    FiredEvent::new(event_name, data)
}

/// Fires when an item is added to the cart.
pub struct CartAddEvent;

impl CartAddEvent {
    pub fn fired(lines: &[CartLine]) -> FiredEvent {
        cart_event("add_to_cart", lines)
    }
}

impl EventPlugin for CartAddEvent {
    fn definition(&self) -> EventDefinition {
        EventDefinition::new(ADD_TO_CART, "Add to cart")
            .with_event_name("add_to_cart")
            .with_description("Fires when an item is added to a commerce cart.")
            .with_dependency("commerce")
    }

    fn default_configuration(&self) -> EventConfig {
        EventConfig::new()
    }
}

/// Fires when an item is removed from the cart.
pub struct CartRemoveEvent;

impl CartRemoveEvent {
    pub fn fired(lines: &[CartLine]) -> FiredEvent {
        cart_event("remove_from_cart", lines)
    }
}

impl EventPlugin for CartRemoveEvent {
    fn definition(&self) -> EventDefinition {
        EventDefinition::new(REMOVE_FROM_CART, "Remove from cart")
            .with_event_name("remove_from_cart")
            .with_description("Fires when an item is removed from a commerce cart.")
            .with_dependency("commerce")
    }

    fn default_configuration(&self) -> EventConfig {
        EventConfig::new()
    }
}
