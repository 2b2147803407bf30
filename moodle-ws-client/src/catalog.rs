//! Reference catalog of Moodle web-service functions
//!
//! Pure data for discoverability; nothing here restricts what
//! [`MoodleApi::any`](crate::MoodleApi::any) may call.

pub const CORE_USER_CREATE_USERS: &str = "core_user_create_users";
pub const CORE_USER_UPDATE_USERS: &str = "core_user_update_users";
pub const CORE_USER_GET_USERS: &str = "core_user_get_users";
pub const CORE_USER_DELETE_USERS: &str = "core_user_delete_users";
pub const ENROL_MANUAL_ENROL_USERS: &str = "enrol_manual_enrol_users";
pub const CORE_ENROL_GET_USERS_COURSES: &str = "core_enrol_get_users_courses";

/// One remote function and the top-level parameters it expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteFunction {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: &'static [&'static str],
}

macro_rules! function {
    ($name:expr, $description:expr, [$($param:expr),* $(,)?]) => {
        RemoteFunction {
            name: $name,
            description: $description,
            parameters: &[$($param),*],
        }
    };
}

/// Functions commonly enabled on a Moodle external service
pub const FUNCTIONS: &[RemoteFunction] = &[
    function!(CORE_USER_CREATE_USERS, "Create users", ["users[]"]),
    function!(CORE_USER_UPDATE_USERS, "Update users", ["users[]"]),
    function!(
        CORE_USER_GET_USERS,
        "Search for users matching key/value criteria",
        ["criteria[][key]", "criteria[][value]"]
    ),
    function!(
        "core_user_get_users_by_field",
        "Retrieve users by a single field",
        ["field", "values[]"]
    ),
    function!(CORE_USER_DELETE_USERS, "Delete users", ["userids[]"]),
    function!(
        "core_user_get_course_user_profiles",
        "Get course user profiles",
        ["userlist[][userid]", "userlist[][courseid]"]
    ),
    function!(
        ENROL_MANUAL_ENROL_USERS,
        "Manually enrol users into courses",
        ["enrolments[][roleid]", "enrolments[][userid]", "enrolments[][courseid]"]
    ),
    function!(
        "enrol_manual_unenrol_users",
        "Manually unenrol users from courses",
        ["enrolments[][userid]", "enrolments[][courseid]"]
    ),
    function!(
        CORE_ENROL_GET_USERS_COURSES,
        "List the courses a user is enrolled in",
        ["userid"]
    ),
    function!(
        "core_enrol_get_enrolled_users",
        "List the users enrolled in a course",
        ["courseid", "options[]"]
    ),
    function!("core_course_get_courses", "Return course details", ["options[ids][]"]),
    function!("core_course_create_courses", "Create new courses", ["courses[]"]),
    function!("core_course_update_courses", "Update courses", ["courses[]"]),
    function!("core_course_delete_courses", "Delete courses", ["courseids[]"]),
    function!(
        "core_course_get_contents",
        "Get course contents",
        ["courseid", "options[]"]
    ),
    function!(
        "core_course_get_categories",
        "Return category details",
        ["criteria[]", "addsubcategories"]
    ),
    function!(
        "core_course_create_categories",
        "Create course categories",
        ["categories[]"]
    ),
    function!(
        "core_cohort_create_cohorts",
        "Create cohorts",
        ["cohorts[]"]
    ),
    function!(
        "core_cohort_add_cohort_members",
        "Add cohort members",
        ["members[]"]
    ),
    function!(
        "core_group_create_groups",
        "Create groups",
        ["groups[]"]
    ),
    function!(
        "core_group_add_group_members",
        "Add group members",
        ["members[][groupid]", "members[][userid]"]
    ),
    function!(
        "core_role_assign_roles",
        "Manual role assignments",
        ["assignments[]"]
    ),
    function!(
        "core_role_unassign_roles",
        "Manual role unassignments",
        ["unassignments[]"]
    ),
    function!(
        "core_webservice_get_site_info",
        "Return site info, user info and the list of available functions",
        ["serviceshortnames[]"]
    ),
    function!(
        "core_grades_get_grades",
        "Return grade item details for a course",
        ["courseid", "component", "activityid", "userids[]"]
    ),
    function!(
        "core_message_send_instant_messages",
        "Send instant messages",
        ["messages[]"]
    ),
    function!(
        "core_notes_create_notes",
        "Create notes",
        ["notes[]"]
    ),
];

/// Look up a function by name
pub fn find(name: &str) -> Option<&'static RemoteFunction> {
    FUNCTIONS.iter().find(|function| function.name == name)
}
