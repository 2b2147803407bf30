//! Moodle Web Service Client Library
//!
//! This library wraps the Moodle REST web-service API with convenience
//! methods for user management and a passthrough for any other function.
//!
//! # Features
//!
//! - Credentials loaded once from a `[moodle_api]` credentials file
//! - Signed REST calls with bracket-encoded form parameters
//! - JSON and XML response formats
//! - One result envelope for payloads, remote exceptions and transport failures
//! - Blocking synchronous API, shareable across threads
//! - Secure TLS using rustls (no OpenSSL dependencies)
//!
//! # Example
//!
//! ```no_run
//! use moodle_ws_client::{Envelope, MoodleApi, NewUser, UserUpdate};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let api = MoodleApi::from_file("credentials.toml")?;
//!
//! let created = api.create_user(&NewUser::new("test001", "Test", "Last", "test@test.com"));
//! match &created {
//!     Envelope::Success(user) => println!("Created user {}", user["id"]),
//!     failure => println!("Failed: {:?}", failure.message()),
//! }
//!
//! let update = UserUpdate {
//!     firstname: Some("Testing".to_string()),
//!     ..UserUpdate::new(3)
//! };
//! assert!(api.update_user(&update).is_success());
//! # Ok(())
//! # }
//! ```

mod api;
pub mod catalog;
mod credentials;
mod encoding;
mod engine;
mod envelope;
mod error;
mod parser;
mod user;
mod xml;

pub use api::{MoodleApi, MoodleApiBuilder, SINGLE_USER_CRITERIA};
pub use catalog::RemoteFunction;
pub use credentials::{Credentials, RestFormat};
pub use encoding::encode_params;
pub use engine::{DEFAULT_TIMEOUT, Engine, EngineBuilder, REST_SERVER_PATH};
pub use envelope::{
    ACCESS_CONTROL_EXCEPTION, Ack, Envelope, ExceptionKind, FUNCTION_NOT_ADDED, FailureCause,
    NOT_AN_ARRAY,
};
pub use error::{ConfigError, MoodleError};
pub use parser::{classify, normalize};
pub use user::{Enrolment, NewUser, STUDENT_ROLE_ID, UserUpdate};
