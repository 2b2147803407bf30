//! Dispatch of parsed commands onto the Moodle client

use crate::cli::{Command, CreateUserArgs, UpdateUserArgs};
use crate::error::CliError;
use moodle_ws_client::{Enrolment, Envelope, MoodleApi, NewUser, UserUpdate};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;

/// What a command produced
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// A remote call result
    Envelope(Envelope),
    /// Answer of an existence check
    Exists(bool),
    /// The function catalog was requested
    Functions,
}

impl Outcome {
    /// Whether the process should exit successfully
    pub fn is_success(&self) -> bool {
        match self {
            Outcome::Envelope(envelope) => envelope.is_success(),
            Outcome::Exists(_) | Outcome::Functions => true,
        }
    }
}

impl From<CreateUserArgs> for NewUser {
    fn from(args: CreateUserArgs) -> Self {
        NewUser {
            idnumber: args.idnumber,
            lang: args.lang,
            mailformat: args.mailformat,
            auth: args.auth,
            ..NewUser::new(args.username, args.firstname, args.lastname, args.email)
        }
    }
}

impl From<UpdateUserArgs> for UserUpdate {
    fn from(args: UpdateUserArgs) -> Self {
        UserUpdate {
            id: Some(args.id),
            username: args.username,
            firstname: args.firstname,
            lastname: args.lastname,
            email: args.email,
            idnumber: args.idnumber,
            lang: args.lang,
            mailformat: args.mailformat,
            auth: args.auth,
        }
    }
}

/// Read a JSON array of records from a file
fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, CliError> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Run one command against the client
pub fn execute(api: &MoodleApi, command: Command) -> Result<Outcome, CliError> {
    let envelope = match command {
        Command::Functions => return Ok(Outcome::Functions),
        Command::CreateUser(args) => api.create_user(&args.into()),
        Command::CreateUsers { file } => api.create_users(&read_records::<NewUser>(&file)?),
        Command::UpdateUser(args) => api.update_user(&args.into()),
        Command::UpdateUsers { file } => api.update_users(&read_records::<UserUpdate>(&file)?),
        Command::GetUsers { criteria } => api.get_users(criteria),
        Command::GetUser { id, username } => {
            let mut criteria: Vec<(&str, Value)> = Vec::new();
            if let Some(id) = id {
                criteria.push(("id", id.into()));
            }
            if let Some(username) = username {
                criteria.push(("username", username.into()));
            }
            if criteria.is_empty() {
                return Err(CliError::Config(
                    "get-user needs --id or --username".to_string(),
                ));
            }
            api.get_user(criteria)
        }
        Command::UserExists { criteria } => return Ok(Outcome::Exists(api.user_exists(criteria))),
        Command::DeleteUsers { ids } => api.delete_users(&ids),
        Command::EnrolUser {
            user_id,
            course_id,
            role_id,
        } => api.enrol_user(&Enrolment {
            roleid: role_id,
            userid: user_id,
            courseid: course_id,
        }),
        Command::Courses { user_id } => api.get_users_courses(user_id),
        Command::Call {
            function,
            json,
            params,
        } => {
            let mut payload = json.unwrap_or_default();
            for (key, value) in params {
                payload.insert(key, Value::String(value));
            }
            api.any(&function, &payload)
        }
    };
    Ok(Outcome::Envelope(envelope))
}
