//! Basic usage example for the Moodle web-service client
//!
//! This example demonstrates how to:
//! - Load credentials and create a client
//! - Create a user and check that it exists
//! - Enrol the user into a course and list their courses
//! - Call a function the facade does not wrap
//!
//! Note: This example requires a Moodle site with the web service enabled.
//! Point MOODLE_CREDENTIALS at a file like:
//!
//! ```toml
//! [moodle_api]
//! url = "https://moodle.example.com"
//! token = "your_webservice_token"
//! ```

use moodle_ws_client::{Enrolment, MoodleApi, NewUser, catalog};
use serde_json::Map;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::var("MOODLE_CREDENTIALS")
        .expect("MOODLE_CREDENTIALS environment variable not set");

    println!("=== Available functions ===");
    for function in catalog::FUNCTIONS {
        println!("{:45} {}", function.name, function.description);
    }

    let api = MoodleApi::builder(moodle_ws_client::Credentials::load(&path)?)
        .timeout(Duration::from_secs(15))
        .build()?;

    println!("\n=== Creating a user ===");
    let created = api.create_user(&NewUser::new("test001", "Test", "Last", "test@test.com"));
    let Some(user) = created.payload() else {
        println!("✗ {}", serde_json::to_string_pretty(&created)?);
        return Ok(());
    };
    println!("✓ Created {}", user);

    let exists = api.user_exists([("username", "test001")]);
    println!("User exists: {}", exists);

    if let Some(user_id) = user["id"].as_u64() {
        println!("\n=== Enrolling into course 2 ===");
        let enrolment = api.enrol_user(&Enrolment::student(user_id, 2));
        println!("{}", serde_json::to_string_pretty(&enrolment)?);

        let courses = api.get_users_courses(user_id);
        println!("{}", serde_json::to_string_pretty(&courses)?);
    }

    println!("\n=== Site info ===");
    let info = api.any("core_webservice_get_site_info", &Map::new());
    println!("{}", serde_json::to_string_pretty(&info)?);

    Ok(())
}
