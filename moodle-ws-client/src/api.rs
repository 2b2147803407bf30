//! User-management operations on top of the transport engine

use crate::catalog::{
    CORE_ENROL_GET_USERS_COURSES, CORE_USER_CREATE_USERS, CORE_USER_DELETE_USERS,
    CORE_USER_GET_USERS, CORE_USER_UPDATE_USERS, ENROL_MANUAL_ENROL_USERS,
};
use crate::credentials::Credentials;
use crate::engine::{Engine, EngineBuilder};
use crate::envelope::{Ack, Envelope, ExceptionKind};
use crate::error::MoodleError;
use crate::parser::is_truthy;
use crate::user::{Enrolment, NewUser, UserUpdate};
use serde_json::{Map, Value};
use std::path::Path;

/// Criteria keys [`MoodleApi::get_user`] keeps
pub const SINGLE_USER_CRITERIA: [&str; 2] = ["id", "username"];

fn single_param(name: &str, value: Value) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert(name.to_string(), value);
    params
}

fn criteria_list<I, K, V>(criteria: I) -> Vec<(String, Value)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    criteria
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// Moodle web-service client
///
/// Every operation returns an [`Envelope`]; nothing here fails with `Err`
/// once the client is built.
///
/// # Example
///
/// ```no_run
/// use moodle_ws_client::{MoodleApi, NewUser};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let api = MoodleApi::from_file("credentials.toml")?;
///
/// let created = api.create_user(&NewUser::new("test001", "Test", "Last", "test@test.com"));
/// if created.is_success() {
///     let exists = api.user_exists([("username", "test001")]);
///     println!("created, exists: {}", exists);
/// } else {
///     println!("{:?}: {:?}", created.short(), created.message());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct MoodleApi {
    engine: Engine,
}

impl MoodleApi {
    /// Create a client with default transport settings
    ///
    /// # Errors
    ///
    /// Returns `MoodleError::ClientInit` if the HTTP client cannot be initialized.
    pub fn new(credentials: Credentials) -> Result<Self, MoodleError> {
        Ok(Self::with_engine(Engine::new(credentials)?))
    }

    /// Load credentials from a file and create a client
    ///
    /// # Errors
    ///
    /// Returns `MoodleError::Config` when the credentials cannot be loaded.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MoodleError> {
        Self::new(Credentials::load(path)?)
    }

    /// Create a builder for configuring the transport
    pub fn builder(credentials: Credentials) -> MoodleApiBuilder {
        MoodleApiBuilder {
            engine: Engine::builder(credentials),
        }
    }

    /// Wrap an already configured engine
    pub fn with_engine(engine: Engine) -> Self {
        Self { engine }
    }

    /// The underlying transport engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Create users (`core_user_create_users`)
    ///
    /// Incomplete records are dropped; the call is made even if none remain.
    /// When Moodle rejects the batch, each submitted user is checked in order
    /// and the first taken username or email is reported as
    /// `username_exists` / `email_exists`.
    pub fn create_users(&self, users: &[NewUser]) -> Envelope {
        let submitted: Vec<&NewUser> = users.iter().filter(|user| user.is_complete()).collect();
        if submitted.len() < users.len() {
            tracing::debug!(
                dropped = users.len() - submitted.len(),
                "Dropping users without username, firstname, lastname or email"
            );
        }

        let params = single_param(
            "users",
            Value::Array(submitted.iter().map(|user| user.to_params()).collect()),
        );
        let envelope = self.engine.call(CORE_USER_CREATE_USERS, &params);

        if matches!(
            envelope,
            Envelope::RemoteException {
                kind: ExceptionKind::Generic,
                ..
            }
        ) && let Some(conflict) = self.find_existing(&submitted)
        {
            return conflict;
        }
        envelope
    }

    /// Create one user and return only its `id` and `username`
    pub fn create_user(&self, user: &NewUser) -> Envelope {
        match self.create_users(std::slice::from_ref(user)) {
            Envelope::Success(payload) => match payload.get(0) {
                Some(created) => {
                    let mut summary = Map::new();
                    summary.insert(
                        "id".to_string(),
                        created.get("id").cloned().unwrap_or(Value::Null),
                    );
                    summary.insert(
                        "username".to_string(),
                        created.get("username").cloned().unwrap_or(Value::Null),
                    );
                    Envelope::Success(Value::Object(summary))
                }
                None => Envelope::invalid_response("Response did not contain the created user"),
            },
            other => other,
        }
    }

    /// Update users (`core_user_update_users`)
    ///
    /// Records without an id are dropped. Moodle answers a successful update
    /// with an empty body, reported as [`Ack::Updated`].
    pub fn update_users(&self, users: &[UserUpdate]) -> Envelope {
        let entries: Vec<Value> = users.iter().filter_map(UserUpdate::to_params).collect();
        if entries.len() < users.len() {
            tracing::debug!(
                dropped = users.len() - entries.len(),
                "Dropping user updates without id"
            );
        }

        let params = single_param("users", Value::Array(entries));
        self.engine
            .call(CORE_USER_UPDATE_USERS, &params)
            .acknowledge_empty(Ack::Updated)
    }

    /// Update one user
    pub fn update_user(&self, user: &UserUpdate) -> Envelope {
        self.update_users(std::slice::from_ref(user))
    }

    /// Search users (`core_user_get_users`)
    ///
    /// Each `(field, value)` pair becomes one `{key, value}` criterion.
    pub fn get_users<I, K, V>(&self, criteria: I) -> Envelope
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.search(criteria_list(criteria))
    }

    /// Search users by `id` and/or `username` only; other criteria and
    /// empty values are ignored
    pub fn get_user<I, K, V>(&self, criteria: I) -> Envelope
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let criteria = criteria_list(criteria)
            .into_iter()
            .filter(|(key, value)| SINGLE_USER_CRITERIA.contains(&key.as_str()) && is_truthy(value))
            .collect();
        self.search(criteria)
    }

    fn search(&self, criteria: Vec<(String, Value)>) -> Envelope {
        let list = criteria
            .into_iter()
            .map(|(key, value)| {
                let mut criterion = Map::new();
                criterion.insert("key".to_string(), Value::String(key));
                criterion.insert("value".to_string(), value);
                Value::Object(criterion)
            })
            .collect();

        self.engine
            .call(CORE_USER_GET_USERS, &single_param("criteria", Value::Array(list)))
    }

    /// Delete users (`core_user_delete_users`)
    ///
    /// Moodle answers a successful delete with an empty body, reported as
    /// [`Ack::Deleted`].
    pub fn delete_users(&self, ids: &[u64]) -> Envelope {
        let params = single_param(
            "userids",
            Value::Array(ids.iter().map(|id| Value::from(*id)).collect()),
        );
        self.engine
            .call(CORE_USER_DELETE_USERS, &params)
            .acknowledge_empty(Ack::Deleted)
    }

    /// Delete one user
    pub fn delete_user(&self, id: u64) -> Envelope {
        self.delete_users(&[id])
    }

    /// Whether a search returns at least one user
    ///
    /// Any failure counts as "does not exist".
    pub fn user_exists<I, K, V>(&self, criteria: I) -> bool
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.get_users(criteria)
            .payload()
            .and_then(|payload| payload.get("users"))
            .and_then(Value::as_array)
            .is_some_and(|users| !users.is_empty())
    }

    /// Enrol a user into a course (`enrol_manual_enrol_users`)
    pub fn enrol_user(&self, enrolment: &Enrolment) -> Envelope {
        let mut entry = Map::new();
        entry.insert("roleid".to_string(), enrolment.roleid.into());
        entry.insert("userid".to_string(), enrolment.userid.into());
        entry.insert("courseid".to_string(), enrolment.courseid.into());

        let params = single_param("enrolments", Value::Array(vec![Value::Object(entry)]));
        self.engine
            .call(ENROL_MANUAL_ENROL_USERS, &params)
            .acknowledge_empty(Ack::Enrolled)
    }

    /// Courses a user is enrolled in (`core_enrol_get_users_courses`)
    pub fn get_users_courses(&self, user_id: u64) -> Envelope {
        self.engine.call(
            CORE_ENROL_GET_USERS_COURSES,
            &single_param("userid", user_id.into()),
        )
    }

    /// Call any remote function with a raw parameter mapping
    pub fn any(&self, function_name: &str, params: &Map<String, Value>) -> Envelope {
        self.engine.call(function_name, params)
    }

    fn find_existing(&self, users: &[&NewUser]) -> Option<Envelope> {
        for user in users {
            if self.user_exists([("username", user.username.as_str())]) {
                tracing::debug!(username = %user.username, "User creation conflicts with an existing username");
                return Some(Envelope::RemoteException {
                    kind: ExceptionKind::UsernameExists,
                    message: "Username already exists".to_string(),
                    errorcode: None,
                });
            }
            if self.user_exists([("email", user.email.as_str())]) {
                tracing::debug!(email = %user.email, "User creation conflicts with an existing email");
                return Some(Envelope::RemoteException {
                    kind: ExceptionKind::EmailExists,
                    message: "Email already exists".to_string(),
                    errorcode: None,
                });
            }
        }
        None
    }
}

/// Builder for a [`MoodleApi`] with custom transport settings
#[derive(Debug)]
pub struct MoodleApiBuilder {
    engine: EngineBuilder,
}

impl MoodleApiBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.engine = self.engine.timeout(timeout);
        self
    }

    /// Skip TLS certificate verification
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.engine = self.engine.accept_invalid_certs(accept);
        self
    }

    /// Restrict the transport to HTTP/1.x
    pub fn http1_only(mut self, http1_only: bool) -> Self {
        self.engine = self.engine.http1_only(http1_only);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns `MoodleError::ClientInit` if the HTTP client cannot be initialized.
    pub fn build(self) -> Result<MoodleApi, MoodleError> {
        Ok(MoodleApi::with_engine(self.engine.build()?))
    }
}
