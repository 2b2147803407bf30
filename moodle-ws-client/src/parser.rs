//! Response normalization

use crate::credentials::RestFormat;
use crate::envelope::{ACCESS_CONTROL_EXCEPTION, Envelope, ExceptionKind, FUNCTION_NOT_ADDED};
use crate::xml;
use serde_json::Value;

/// Decode a raw response body and classify it into an [`Envelope`]
///
/// * anything that does not decode to an object or list is a
///   `TransportFailure` with cause `NotDecodable`
/// * an object with a truthy `exception` field is a `RemoteException`
/// * everything else is `Success`
pub fn normalize(body: &str, format: RestFormat) -> Envelope {
    let decoded = match format {
        RestFormat::Json => serde_json::from_str::<Value>(body).ok(),
        RestFormat::Xml => match xml::decode(body) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(error = %e, "Response body is not Moodle XML");
                None
            }
        },
    };

    match decoded {
        Some(value) => classify(value),
        None => Envelope::not_decodable(),
    }
}

/// Classify an already decoded response
pub fn classify(value: Value) -> Envelope {
    match value {
        Value::Object(ref object) if object.get("exception").is_some_and(is_truthy) => {
            let message = match object.get("message") {
                Some(Value::String(message)) => message.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            let errorcode = object
                .get("errorcode")
                .and_then(Value::as_str)
                .map(str::to_string);

            if message == ACCESS_CONTROL_EXCEPTION {
                Envelope::RemoteException {
                    kind: ExceptionKind::AccessDenied,
                    message: FUNCTION_NOT_ADDED.to_string(),
                    errorcode,
                }
            } else {
                Envelope::RemoteException {
                    kind: ExceptionKind::Generic,
                    message,
                    errorcode,
                }
            }
        }
        Value::Object(_) | Value::Array(_) => Envelope::Success(value),
        _ => Envelope::not_decodable(),
    }
}

/// Loose truthiness: null, false, 0, "", "0" and empty containers are falsy
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(items) => !items.is_empty(),
        Value::Object(object) => !object.is_empty(),
    }
}
