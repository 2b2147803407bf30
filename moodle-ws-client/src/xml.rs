//! Decoding of Moodle's XML REST format into JSON values
//!
//! Moodle encodes structures as nested `SINGLE` (object), `MULTIPLE` (list)
//! and `VALUE` (scalar) elements wrapped in `RESPONSE`. Exceptions come back
//! as an `EXCEPTION` root carrying `ERRORCODE`, `MESSAGE` and `DEBUGINFO`.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub(crate) enum XmlError {
    #[error("malformed XML: {0}")]
    Syntax(String),

    #[error("unexpected XML structure: {0}")]
    Structure(String),
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| XmlError::Syntax(e.to_string()))?;
            let value = attribute
                .unescape_value()
                .map_err(|e| XmlError::Syntax(e.to_string()))?;
            attributes.push((
                String::from_utf8_lossy(attribute.key.as_ref()).into_owned(),
                value.into_owned(),
            ));
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            ..Self::default()
        })
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }
}

/// Decode a Moodle XML response body
///
/// An empty `RESPONSE` decodes to `Value::Null`, mirroring the `null` body
/// Moodle sends in JSON mode for void functions.
pub(crate) fn decode(body: &str) -> Result<Value, XmlError> {
    let root = parse_tree(body)?;
    match root.name.as_str() {
        "RESPONSE" => match root.children.first() {
            Some(child) => structure(child),
            None => Ok(Value::Null),
        },
        "EXCEPTION" => Ok(exception(&root)),
        other => Err(XmlError::Structure(format!("unexpected root <{}>", other))),
    }
}

fn parse_tree(body: &str) -> Result<Element, XmlError> {
    let mut reader = Reader::from_str(body);
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => stack.push(Element::from_start(&start)?),
            Ok(Event::Empty(start)) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| XmlError::Structure("unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, element);
            }
            Ok(Event::Text(text)) => {
                if let Some(current) = stack.last_mut() {
                    let text = text.unescape().map_err(|e| XmlError::Syntax(e.to_string()))?;
                    current.text.push_str(&text);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(current) = stack.last_mut() {
                    current
                        .text
                        .push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(XmlError::Syntax(e.to_string())),
        }
    }

    if !stack.is_empty() {
        return Err(XmlError::Structure("unclosed element".to_string()));
    }
    root.ok_or_else(|| XmlError::Structure("no root element".to_string()))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn structure(element: &Element) -> Result<Value, XmlError> {
    match element.name.as_str() {
        "SINGLE" => {
            let mut object = Map::new();
            for key in &element.children {
                if key.name != "KEY" {
                    return Err(XmlError::Structure(format!(
                        "<{}> inside <SINGLE>",
                        key.name
                    )));
                }
                let name = key
                    .attribute("name")
                    .ok_or_else(|| XmlError::Structure("<KEY> without name".to_string()))?;
                let value = match key.children.first() {
                    Some(child) => structure(child)?,
                    None => Value::Null,
                };
                object.insert(name.to_string(), value);
            }
            Ok(Value::Object(object))
        }
        "MULTIPLE" => element
            .children
            .iter()
            .map(structure)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        "VALUE" => {
            if element.attribute("null") == Some("null") {
                Ok(Value::Null)
            } else {
                Ok(Value::String(element.text.clone()))
            }
        }
        other => Err(XmlError::Structure(format!("unexpected <{}>", other))),
    }
}

fn exception(element: &Element) -> Value {
    let text = |name: &str| {
        element
            .child(name)
            .map(|child| Value::String(child.text.clone()))
            .unwrap_or(Value::Null)
    };

    let mut object = Map::new();
    object.insert(
        "exception".to_string(),
        Value::String(
            element
                .attribute("class")
                .unwrap_or("moodle_exception")
                .to_string(),
        ),
    );
    object.insert("errorcode".to_string(), text("ERRORCODE"));
    object.insert("message".to_string(), text("MESSAGE"));
    if element.child("DEBUGINFO").is_some() {
        object.insert("debuginfo".to_string(), text("DEBUGINFO"));
    }
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_multiple_of_singles() {
        let body = r#"<?xml version="1.0" encoding="UTF-8" ?>
<RESPONSE>
<MULTIPLE>
<SINGLE>
<KEY name="id"><VALUE>7</VALUE>
</KEY>
<KEY name="username"><VALUE>mdl_test_1</VALUE>
</KEY>
</SINGLE>
</MULTIPLE>
</RESPONSE>
"#;
        assert_eq!(
            decode(body).unwrap(),
            json!([{"id": "7", "username": "mdl_test_1"}])
        );
    }

    #[test]
    fn test_decode_nested_and_null_values() {
        let body = r#"<RESPONSE><SINGLE>
<KEY name="users"><MULTIPLE><SINGLE><KEY name="email"><VALUE null="null"/></KEY></SINGLE></MULTIPLE></KEY>
<KEY name="warnings"><MULTIPLE></MULTIPLE></KEY>
</SINGLE></RESPONSE>"#;
        assert_eq!(
            decode(body).unwrap(),
            json!({"users": [{"email": null}], "warnings": []})
        );
    }

    #[test]
    fn test_decode_escaped_text() {
        let body = r#"<RESPONSE><VALUE>Fish &amp; Chips</VALUE></RESPONSE>"#;
        assert_eq!(decode(body).unwrap(), json!("Fish & Chips"));
    }

    #[test]
    fn test_decode_empty_response_is_null() {
        let body = "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n<RESPONSE>\n</RESPONSE>\n";
        assert_eq!(decode(body).unwrap(), Value::Null);
    }

    #[test]
    fn test_decode_exception() {
        let body = r#"<?xml version="1.0" encoding="UTF-8" ?>
<EXCEPTION class="webservice_access_exception">
<ERRORCODE>accessexception</ERRORCODE>
<MESSAGE>Access control exception</MESSAGE>
</EXCEPTION>"#;
        assert_eq!(
            decode(body).unwrap(),
            json!({
                "exception": "webservice_access_exception",
                "errorcode": "accessexception",
                "message": "Access control exception",
            })
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode("").is_err());
        assert!(decode("not xml at all").is_err());
        assert!(decode("<RESPONSE><SINGLE>").is_err());
        assert!(decode("<html><body>Error</body></html>").is_err());
    }
}
