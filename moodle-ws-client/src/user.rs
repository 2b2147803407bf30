//! User and enrolment records submitted through the facade

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_LANG: &str = "en";
pub const DEFAULT_MAILFORMAT: u8 = 1;
pub const DEFAULT_AUTH: &str = "manual";

/// Moodle's built-in student role
pub const STUDENT_ROLE_ID: u64 = 5;

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// A user to create
///
/// `username`, `firstname`, `lastname` and `email` are required; records
/// with any of them empty (or absent when deserialized) are dropped before
/// submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewUser {
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub idnumber: Option<String>,
    pub lang: Option<String>,
    pub mailformat: Option<u8>,
    pub auth: Option<String>,
}

impl NewUser {
    /// A user with the required fields and defaults for the rest
    pub fn new(
        username: impl Into<String>,
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            firstname: firstname.into(),
            lastname: lastname.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    /// Whether every required field is present
    pub fn is_complete(&self) -> bool {
        [&self.username, &self.firstname, &self.lastname, &self.email]
            .iter()
            .all(|field| !field.is_empty())
    }

    /// Parameters for one entry of `core_user_create_users`
    ///
    /// Moodle generates a password and mails it to the user.
    pub fn to_params(&self) -> Value {
        let mut params = Map::new();
        params.insert("username".into(), self.username.clone().into());
        params.insert("firstname".into(), self.firstname.clone().into());
        params.insert("lastname".into(), self.lastname.clone().into());
        params.insert("email".into(), self.email.clone().into());
        params.insert(
            "idnumber".into(),
            non_empty(&self.idnumber).unwrap_or_default().into(),
        );
        params.insert(
            "lang".into(),
            non_empty(&self.lang).unwrap_or(DEFAULT_LANG).into(),
        );
        params.insert(
            "mailformat".into(),
            self.mailformat.unwrap_or(DEFAULT_MAILFORMAT).into(),
        );
        params.insert(
            "auth".into(),
            non_empty(&self.auth).unwrap_or(DEFAULT_AUTH).into(),
        );
        params.insert("createpassword".into(), 1.into());
        Value::Object(params)
    }
}

/// Changes to an existing user
///
/// Records without an `id` are dropped before submission. Name, email and
/// idnumber fields left unset are not sent, so they keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserUpdate {
    pub id: Option<u64>,
    pub username: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub idnumber: Option<String>,
    pub lang: Option<String>,
    pub mailformat: Option<u8>,
    pub auth: Option<String>,
}

impl UserUpdate {
    /// An update for the user with the given id
    pub fn new(id: u64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// The target id, if usable (Moodle ids start at 1)
    pub fn target(&self) -> Option<u64> {
        self.id.filter(|id| *id != 0)
    }

    /// Parameters for one entry of `core_user_update_users`
    pub fn to_params(&self) -> Option<Value> {
        let id = self.target()?;

        let mut params = Map::new();
        params.insert("id".into(), id.into());
        for (name, value) in [
            ("username", &self.username),
            ("firstname", &self.firstname),
            ("lastname", &self.lastname),
            ("email", &self.email),
            ("idnumber", &self.idnumber),
        ] {
            if let Some(value) = non_empty(value) {
                params.insert(name.into(), value.into());
            }
        }
        params.insert(
            "lang".into(),
            non_empty(&self.lang).unwrap_or(DEFAULT_LANG).into(),
        );
        params.insert(
            "mailformat".into(),
            self.mailformat.unwrap_or(DEFAULT_MAILFORMAT).into(),
        );
        params.insert(
            "auth".into(),
            non_empty(&self.auth).unwrap_or(DEFAULT_AUTH).into(),
        );
        Some(Value::Object(params))
    }
}

/// A manual enrolment of a user into a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrolment {
    pub roleid: u64,
    pub userid: u64,
    pub courseid: u64,
}

impl Enrolment {
    /// Enrol as a student
    pub fn student(userid: u64, courseid: u64) -> Self {
        Self {
            roleid: STUDENT_ROLE_ID,
            userid,
            courseid,
        }
    }
}
