pub const USERNAME_MAX_LENGTH: usize = 150;
pub const EMAIL_MAX_LENGTH: usize = 254;
pub const FIRST_AND_LAST_NAME_MAX_LENGTH: usize = 150;

pub const INGREDIENT_NAME_MAX_LENGTH: usize = 200;
pub const MEASUREMENT_UNIT_MAX_LENGTH: usize = 200;
pub const RECIPE_NAME_MAX_LENGTH: usize = 200;
pub const TAG_NAME_MAX_LENGTH: usize = 200;
pub const TAG_SLUG_MAX_LENGTH: usize = 200;

/// Amount and cooking time are stored as SMALLINT.
pub const SMALLINT_MAX: i32 = i16::MAX as i32;

pub const RESERVED_USERNAMES: &[&str] = &["me"];

pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";

pub const SESSION_COOKIE: &str = "session";

/// Request bodies carry base64 images.
pub const MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;
