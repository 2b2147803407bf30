//! Normalized outcome of a remote call

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// Message Moodle sends when the function is not exposed by the webservice
pub const ACCESS_CONTROL_EXCEPTION: &str = "Access control exception";

/// Message reported instead of [`ACCESS_CONTROL_EXCEPTION`]
pub const FUNCTION_NOT_ADDED: &str = "The function has not been added to the webservice on Moodle";

/// Message reported when the body is not a JSON/XML structure
pub const NOT_AN_ARRAY: &str = "Response was not an array";

/// Classification of a declared remote exception
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionKind {
    /// The function is not enabled for the token's webservice
    AccessDenied,
    /// Any other remote exception; the message is passed through verbatim
    Generic,
    /// A user creation failed because the username is already taken
    UsernameExists,
    /// A user creation failed because the email is already taken
    EmailExists,
}

impl ExceptionKind {
    /// Short code for this kind
    pub fn short(self) -> &'static str {
        match self {
            ExceptionKind::AccessDenied => "function_not_added",
            ExceptionKind::Generic => "generic_error",
            ExceptionKind::UsernameExists => "username_exists",
            ExceptionKind::EmailExists => "email_exists",
        }
    }
}

/// Why no usable response was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    /// The body was empty or not a structure in the configured format
    NotDecodable,
    /// The request never completed (connection refused, timeout, ...)
    Connection,
    /// The body decoded but lacked data the operation needed
    InvalidResponse,
}

impl FailureCause {
    /// Short code for this cause
    pub fn short(self) -> &'static str {
        match self {
            FailureCause::NotDecodable => "not_array",
            FailureCause::Connection => "transport_error",
            FailureCause::InvalidResponse => "invalid_response",
        }
    }
}

/// Completed operations that Moodle answers with an empty body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Updated,
    Deleted,
    Enrolled,
}

impl Ack {
    pub fn as_str(self) -> &'static str {
        match self {
            Ack::Updated => "updated",
            Ack::Deleted => "deleted",
            Ack::Enrolled => "enrolled",
        }
    }
}

/// Result envelope returned by every remote call
///
/// Exactly one outcome is populated. Remote rejections and transport
/// problems are data, never `Err`.
///
/// # Example
///
/// ```
/// use moodle_ws_client::{Envelope, ExceptionKind};
///
/// let envelope = Envelope::RemoteException {
///     kind: ExceptionKind::AccessDenied,
///     message: "The function has not been added to the webservice on Moodle".to_string(),
///     errorcode: Some("accessexception".to_string()),
/// };
/// assert!(!envelope.is_success());
/// assert_eq!(envelope.short(), Some("function_not_added"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// The call succeeded with a decoded payload
    Success(Value),
    /// The call succeeded and Moodle answered with an empty body
    ///
    /// Moodle returns nothing for void functions such as
    /// `core_user_update_users`, which on the wire looks exactly like an
    /// undecodable response. Operations that know their function is void
    /// convert that failure into this variant.
    Acknowledged(Ack),
    /// Moodle declared an exception
    RemoteException {
        kind: ExceptionKind,
        message: String,
        /// Moodle's `errorcode`, when it sent one
        errorcode: Option<String>,
    },
    /// No usable response
    TransportFailure { cause: FailureCause, message: String },
}

impl Envelope {
    pub(crate) fn not_decodable() -> Self {
        Envelope::TransportFailure {
            cause: FailureCause::NotDecodable,
            message: NOT_AN_ARRAY.to_string(),
        }
    }

    pub(crate) fn invalid_response(message: impl Into<String>) -> Self {
        Envelope::TransportFailure {
            cause: FailureCause::InvalidResponse,
            message: message.into(),
        }
    }

    /// Whether the call succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_) | Envelope::Acknowledged(_))
    }

    /// The decoded payload of a successful call
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Envelope::Success(payload) => Some(payload),
            _ => None,
        }
    }

    /// Consume the envelope, keeping only the decoded payload
    pub fn into_payload(self) -> Option<Value> {
        match self {
            Envelope::Success(payload) => Some(payload),
            _ => None,
        }
    }

    /// The response value as callers see it: the payload, or the
    /// acknowledgement word for empty-bodied successes
    pub fn response(&self) -> Option<Value> {
        match self {
            Envelope::Success(payload) => Some(payload.clone()),
            Envelope::Acknowledged(ack) => Some(Value::String(ack.as_str().to_string())),
            _ => None,
        }
    }

    /// The failure message, if the call failed
    pub fn message(&self) -> Option<&str> {
        match self {
            Envelope::RemoteException { message, .. }
            | Envelope::TransportFailure { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Short failure code, if the call failed
    pub fn short(&self) -> Option<&'static str> {
        match self {
            Envelope::RemoteException { kind, .. } => Some(kind.short()),
            Envelope::TransportFailure { cause, .. } => Some(cause.short()),
            _ => None,
        }
    }

    /// Treat an undecodable body as the given acknowledgement
    ///
    /// Only meaningful for void remote functions. Connection failures and
    /// remote exceptions are left untouched.
    pub fn acknowledge_empty(self, ack: Ack) -> Self {
        match self {
            Envelope::TransportFailure {
                cause: FailureCause::NotDecodable,
                ..
            } => Envelope::Acknowledged(ack),
            other => other,
        }
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Envelope::Success(payload) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("response", payload)?;
                map.end()
            }
            Envelope::Acknowledged(ack) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("response", ack.as_str())?;
                map.end()
            }
            Envelope::RemoteException {
                kind,
                message,
                errorcode,
            } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("message", message)?;
                map.serialize_entry("short", kind.short())?;
                if let Some(errorcode) = errorcode {
                    map.serialize_entry("errorcode", errorcode)?;
                }
                map.end()
            }
            Envelope::TransportFailure { cause, message } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("message", message)?;
                map.serialize_entry("short", cause.short())?;
                map.end()
            }
        }
    }
}
