use crate::scene::layer::{LayerDefaults, LayerKind};
use crate::scene::model::Defaults;

/// Defaults for one layer type: global layer defaults overlaid with the per-type entry.
pub fn merged_layer_defaults(defaults: &Defaults, type_name: &str) -> LayerDefaults {
    let global = defaults.layer.clone().unwrap_or_default();
    match defaults.layer_type.get(type_name) {
        Some(typed) => global.overlaid_with(typed),
        None => global,
    }
}

/// Fill unset fields of `kind` from the merged defaults; explicit fields win.
pub fn apply_layer_defaults(kind: &mut LayerKind, defaults: &Defaults) {
    merged_layer_defaults(defaults, kind.type_name()).apply_to(kind);
}
