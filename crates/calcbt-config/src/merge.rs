use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Loads and deep-merges YAML files in order: later files override earlier
/// ones key-by-key, recursing into nested objects. Returns the canonical
/// (key-sorted) merged JSON value.
pub fn load_layered_yaml(paths: &[impl AsRef<Path>]) -> Result<Value> {
    let mut merged = Value::Object(Default::default());

    for path in paths {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        let yaml_val: serde_yaml::Value =
            serde_yaml::from_str(&text).with_context(|| format!("parse yaml: {}", path.display()))?;
        let json_val = serde_json::to_value(yaml_val).context("yaml -> json conversion failed")?;
        deep_merge(&mut merged, json_val);
    }

    Ok(sort_keys(&merged))
}

fn deep_merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (k, v) in src_map {
                match dst_map.get_mut(&k) {
                    Some(existing) => deep_merge(existing, v),
                    None => {
                        dst_map.insert(k, v);
                    }
                }
            }
        }
        (dst_slot, src_val) => {
            *dst_slot = src_val;
        }
    }
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}
