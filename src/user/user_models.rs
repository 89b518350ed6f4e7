//! User data models

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: usize,
    pub handle: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Unix milliseconds.
    pub created: i64,
}

/// Profile fields of a user about to be created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    pub handle: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Sign-up form, field names as submitted by clients.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}
