//! Data-layer script rendering for collected events.
//!
//! Each fired event becomes one `push` onto the client-side data layer, in
//! firing order, as an object with the event name under `event_name` and the
//! event data flattened beside it.

use serde_json::Value;

use tagrelay_core::error::TagResult;
use tagrelay_core::types::FiredEvent;

/// Serialize one fired event into its data-layer push object:
/// `{"event_name": <name>, ...data}`. Data keys keep insertion order.
pub fn push_object(event: &FiredEvent) -> Value {
    let mut object = serde_json::Map::new();
    object.insert("event_name".into(), Value::String(event.name().to_string()));
    for (key, value) in event.data() {
        object.insert(key.clone(), value.clone());
    }
    Value::Object(object)
}

/// Render the script block that replays the collected events into the data
/// layer. The data-layer name is embedded via bracket access so arbitrary
/// configured names stay inside a JSON-escaped string position.
pub fn render(events: &[FiredEvent], data_layer: &str) -> TagResult<String> {
    let name = serde_json::to_string(data_layer)?;
    let mut script = format!("window[{name}] = window[{name}] || [];");
    for event in events {
        let push = serde_json::to_string(&push_object(event))?;
        script.push_str(&format!("window[{name}].push({push});"));
    }
    Ok(script)
}
