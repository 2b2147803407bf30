//! Form encoding of remote-call parameters
//!
//! Moodle reads parameters the way PHP parses form bodies: nested lists and
//! objects are spelled out with bracketed keys, so
//! `{"criteria": [{"key": "username", "value": "x"}]}` becomes
//! `criteria[0][key]=username&criteria[0][value]=x`.

use serde_json::{Map, Value};

/// Flatten a parameter mapping into form pairs
///
/// Booleans are sent as `1`/`0`, `null` values and empty lists produce no
/// pair at all.
pub fn encode_params(params: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (key, value) in params {
        push_value(&mut pairs, key.clone(), value);
    }
    pairs
}

fn push_value(pairs: &mut Vec<(String, String)>, key: String, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(b) => pairs.push((key, if *b { "1" } else { "0" }.to_string())),
        Value::Number(n) => pairs.push((key, n.to_string())),
        Value::String(s) => pairs.push((key, s.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                push_value(pairs, format!("{}[{}]", key, index), item);
            }
        }
        Value::Object(object) => {
            for (name, item) in object {
                push_value(pairs, format!("{}[{}]", key, name), item);
            }
        }
    }
}
