//! Configuration merge logic
//!
//! Two kinds of merge live here:
//! - free-form settings (provider and provisioner blocks) deep-merge as JSON;
//! - whole machine layers fold through [`VmConfig::merge`].

use serde_json::Value;

use crate::vm::{Settings, VmConfig};

/// Deep merge two JSON values.
///
/// Merge semantics:
/// - Objects: deep-merge by key (recursive)
/// - Arrays: REPLACE (second wins entirely)
/// - Scalars: override (second wins)
/// - Null: override (null can override any value)
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        // Both objects: deep merge
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = if let Some(base_value) = base_map.remove(&key) {
                    deep_merge(base_value, overlay_value)
                } else {
                    overlay_value
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }

        // Arrays: REPLACE (no concatenation)
        (Value::Array(_), overlay @ Value::Array(_)) => overlay,

        // Scalars and any other case: overlay wins
        (_, overlay) => overlay,
    }
}

/// Deep-merge `overlay` into `base` in place
pub fn merge_settings(base: &mut Settings, overlay: Settings) {
    for (key, overlay_value) in overlay {
        let merged = match base.remove(&key) {
            Some(base_value) => deep_merge(base_value, overlay_value),
            None => overlay_value,
        };
        base.insert(key, merged);
    }
}

/// Merge machine layers in order (first is base, last has highest precedence)
pub fn merge_layers<I>(layers: I) -> VmConfig
where
    I: IntoIterator<Item = VmConfig>,
{
    layers
        .into_iter()
        .fold(VmConfig::new(), |parent, child| parent.merge(&child))
}
