//! Output formatting for command outcomes

use crate::executor::Outcome;
use moodle_ws_client::catalog::{self, RemoteFunction};
use serde_json::json;

/// Render an outcome as the text printed to stdout
pub fn render(outcome: &Outcome) -> Result<String, serde_json::Error> {
    match outcome {
        Outcome::Envelope(envelope) => serde_json::to_string_pretty(envelope),
        Outcome::Exists(exists) => serde_json::to_string_pretty(&json!({ "exists": exists })),
        Outcome::Functions => Ok(format_functions(catalog::FUNCTIONS)),
    }
}

/// One line per function, names padded to the longest
fn format_functions(functions: &[RemoteFunction]) -> String {
    let width = functions.iter().map(|f| f.name.len()).max().unwrap_or(0);
    functions
        .iter()
        .map(|f| format!("{:width$}  {}", f.name, f.description))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodle_ws_client::{Ack, Envelope};

    #[test]
    fn test_render_ack() {
        let text = render(&Outcome::Envelope(Envelope::Acknowledged(Ack::Deleted))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!({ "success": true, "response": "deleted" }));
    }

    #[test]
    fn test_render_exists() {
        let text = render(&Outcome::Exists(false)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, json!({ "exists": false }));
    }

    #[test]
    fn test_render_functions_lists_catalog() {
        let text = render(&Outcome::Functions).unwrap();
        assert_eq!(text.lines().count(), catalog::FUNCTIONS.len());
        assert!(text.contains(catalog::CORE_USER_CREATE_USERS));
        assert!(text.contains(catalog::ENROL_MANUAL_ENROL_USERS));
    }
}
