//! CLI argument parsing using clap

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use moodle_ws_client::STUDENT_ROLE_ID;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Moodle web-service client
#[derive(Parser, Debug)]
#[command(name = "moodle", about = "Call the Moodle web-service API", version)]
pub struct Args {
    /// Credentials file (defaults to $MOODLE_CREDENTIALS, then the user config directory)
    #[arg(short, long, global = true)]
    pub credentials: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout: u64,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List known remote functions
    Functions,

    /// Create a single user
    CreateUser(CreateUserArgs),

    /// Create users from a JSON file holding an array of user records
    CreateUsers {
        /// Path to the JSON file
        file: PathBuf,
    },

    /// Update a single user
    UpdateUser(UpdateUserArgs),

    /// Update users from a JSON file holding an array of user records
    UpdateUsers {
        /// Path to the JSON file
        file: PathBuf,
    },

    /// Search users by field=value criteria
    GetUsers {
        /// Criteria such as username=likel email=a@b.c
        #[arg(value_parser = parse_key_value, required = true)]
        criteria: Vec<(String, String)>,
    },

    /// Find a user by id and/or username
    GetUser {
        #[arg(long)]
        id: Option<u64>,
        #[arg(long)]
        username: Option<String>,
    },

    /// Check whether any user matches field=value criteria
    UserExists {
        #[arg(value_parser = parse_key_value, required = true)]
        criteria: Vec<(String, String)>,
    },

    /// Delete users by id
    DeleteUsers {
        #[arg(required = true)]
        ids: Vec<u64>,
    },

    /// Enrol a user into a course
    EnrolUser {
        #[arg(long)]
        user_id: u64,
        #[arg(long)]
        course_id: u64,
        #[arg(long, default_value_t = STUDENT_ROLE_ID)]
        role_id: u64,
    },

    /// List the courses a user is enrolled in
    Courses { user_id: u64 },

    /// Call any remote function
    Call {
        /// Remote function name, e.g. core_webservice_get_site_info
        function: String,

        /// Parameters as a JSON object
        #[arg(long, value_parser = parse_json_object)]
        json: Option<Map<String, Value>>,

        /// Extra top-level string parameters as key=value
        #[arg(value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },
}

#[derive(ClapArgs, Debug, PartialEq)]
pub struct CreateUserArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub firstname: String,
    #[arg(long)]
    pub lastname: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub idnumber: Option<String>,
    #[arg(long)]
    pub lang: Option<String>,
    #[arg(long)]
    pub mailformat: Option<u8>,
    #[arg(long)]
    pub auth: Option<String>,
}

#[derive(ClapArgs, Debug, PartialEq)]
pub struct UpdateUserArgs {
    #[arg(long)]
    pub id: u64,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub firstname: Option<String>,
    #[arg(long)]
    pub lastname: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub idnumber: Option<String>,
    #[arg(long)]
    pub lang: Option<String>,
    #[arg(long)]
    pub mailformat: Option<u8>,
    #[arg(long)]
    pub auth: Option<String>,
}

/// Parse `key=value`; the value may itself contain `=`
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

/// Parse a JSON object
pub fn parse_json_object(s: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(s) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("expected a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_create_user() {
        let args = Args::try_parse_from([
            "moodle",
            "create-user",
            "--username",
            "likel",
            "--firstname",
            "Liam",
            "--lastname",
            "Kelly",
            "--email",
            "email@email.com",
        ])
        .unwrap();

        match args.command {
            Command::CreateUser(user) => {
                assert_eq!(user.username, "likel");
                assert_eq!(user.email, "email@email.com");
                assert_eq!(user.lang, None);
            }
            other => panic!("Expected CreateUser, got {:?}", other),
        }
        assert_eq!(args.timeout, 30);
        assert!(!args.insecure);
    }

    #[test]
    fn test_create_user_requires_email() {
        let result = Args::try_parse_from([
            "moodle",
            "create-user",
            "--username",
            "likel",
            "--firstname",
            "Liam",
            "--lastname",
            "Kelly",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "moodle",
            "delete-users",
            "3",
            "4",
            "--insecure",
            "--timeout",
            "5",
            "-vv",
            "--credentials",
            "/tmp/creds.toml",
        ])
        .unwrap();

        assert_eq!(args.command, Command::DeleteUsers { ids: vec![3, 4] });
        assert!(args.insecure);
        assert_eq!(args.timeout, 5);
        assert_eq!(args.verbose, 2);
        assert_eq!(args.credentials, Some(PathBuf::from("/tmp/creds.toml")));
    }

    #[test]
    fn test_parse_call() {
        let args = Args::try_parse_from([
            "moodle",
            "call",
            "core_course_get_courses",
            "--json",
            r#"{"options":{"ids":[2,3]}}"#,
            "extra=value",
        ])
        .unwrap();

        match args.command {
            Command::Call {
                function,
                json,
                params,
            } => {
                assert_eq!(function, "core_course_get_courses");
                assert_eq!(json.unwrap()["options"]["ids"][1], 3);
                assert_eq!(params, vec![("extra".to_string(), "value".to_string())]);
            }
            other => panic!("Expected Call, got {:?}", other),
        }
    }

    #[test]
    fn test_enrol_defaults_to_student() {
        let args =
            Args::try_parse_from(["moodle", "enrol-user", "--user-id", "7", "--course-id", "2"])
                .unwrap();
        assert_eq!(
            args.command,
            Command::EnrolUser {
                user_id: 7,
                course_id: 2,
                role_id: 5
            }
        );
    }

    #[test]
    fn test_rejects_bad_criteria_and_json() {
        assert!(Args::try_parse_from(["moodle", "get-users", "username"]).is_err());
        assert!(Args::try_parse_from(["moodle", "get-users"]).is_err());
        assert!(Args::try_parse_from(["moodle", "call", "f", "--json", "[1]"]).is_err());
        assert!(Args::try_parse_from(["moodle", "call", "f", "--json", "{"]).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_key_value_split_on_first_equals(
            key in "[a-z_]{1,12}",
            value in "[a-zA-Z0-9=@. ]{0,20}",
        ) {
            let parsed = parse_key_value(&format!("{}={}", key, value)).unwrap();
            prop_assert_eq!(parsed, (key, value));
        }
    }
}
