use super::{
    auth::LmnHasher, AuthToken, AuthTokenValue, NewUser, RegistrationForm, User, UserStore,
    UsernamePasswordCredentials,
};
use crate::service_error::ValidationErrors;
use anyhow::{bail, Context, Result};
use std::{sync::Arc, time::SystemTime};
use thiserror::Error;
use tracing::{debug, info};

const USERNAME_MAX_CHARS: usize = 150;
const REQUIRED: &str = "This field is required.";

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Invalid registration: {0}")]
    Invalid(ValidationErrors),

    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

#[derive(Clone)]
pub struct UserManager {
    user_store: Arc<dyn UserStore>,
}

fn is_valid_username(handle: &str) -> bool {
    handle
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    !local.is_empty()
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

impl UserManager {
    pub fn new(user_store: Arc<dyn UserStore>) -> Self {
        Self { user_store }
    }

    /// Validates a sign-up form, then creates the user and its password.
    pub fn register(&self, form: RegistrationForm) -> Result<usize, RegistrationError> {
        let handle = form.username.trim();
        let email = form.email.trim();
        let first_name = form.first_name.trim();
        let last_name = form.last_name.trim();

        let mut errors = ValidationErrors::new();
        for (field, value) in [
            ("username", handle),
            ("first_name", first_name),
            ("last_name", last_name),
            ("email", email),
            ("password1", form.password1.as_str()),
            ("password2", form.password2.as_str()),
        ] {
            if value.is_empty() {
                errors.add(field, REQUIRED);
            }
        }

        if !handle.is_empty() {
            if handle.chars().count() > USERNAME_MAX_CHARS {
                errors.add(
                    "username",
                    format!(
                        "Ensure this value has at most {} characters.",
                        USERNAME_MAX_CHARS
                    ),
                );
            } else if !is_valid_username(handle) {
                errors.add(
                    "username",
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                );
            } else if self.user_store.get_user_id(handle)?.is_some() {
                errors.add("username", "A user with that username already exists.");
            }
        }

        if !email.is_empty() {
            if !is_valid_email(email) {
                errors.add("email", "Enter a valid email address.");
            } else if self.user_store.is_email_taken(email)? {
                errors.add("email", "A user with that email already exists.");
            }
        }

        if !form.password1.is_empty()
            && !form.password2.is_empty()
            && form.password1 != form.password2
        {
            errors.add("password2", "The two password fields didn't match.");
        }

        if !errors.is_empty() {
            return Err(RegistrationError::Invalid(errors));
        }

        let user_id = self.user_store.create_user(&NewUser {
            handle: handle.to_string(),
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        })?;
        self.user_store
            .set_password_credentials(&Self::create_hashed_password(user_id, &form.password1)?)?;
        info!("Registered user {} with id {}", handle, user_id);
        Ok(user_id)
    }

    /// Creates a user without a password, as the admin tool does.
    pub fn add_user(&self, user: NewUser) -> Result<usize> {
        if user.handle.trim().is_empty() {
            bail!("The user handle cannot be empty.");
        }
        if self.user_store.get_user_id(&user.handle)?.is_some() {
            bail!("User handle {} already exists.", user.handle);
        }
        if self.user_store.is_email_taken(&user.email)? {
            bail!("Email {} is already taken.", user.email);
        }
        self.user_store.create_user(&user)
    }

    fn create_hashed_password(user_id: usize, password: &str) -> Result<UsernamePasswordCredentials> {
        let hasher = LmnHasher::Argon2;
        let salt = hasher.generate_b64_salt();
        let hash = hasher.hash(password.as_bytes(), &salt)?;
        Ok(UsernamePasswordCredentials {
            user_id,
            salt,
            hash,
            hasher,
            created: SystemTime::now(),
            last_tried: None,
            last_used: None,
        })
    }

    /// Sets, or replaces, the password of an existing user.
    pub fn create_password_credentials(&self, user_handle: &str, password: &str) -> Result<()> {
        if password.is_empty() {
            bail!("The password cannot be empty.");
        }
        let user_id = self
            .user_store
            .get_user_id(user_handle)?
            .with_context(|| format!("User with handle {} not found.", user_handle))?;
        self.user_store
            .set_password_credentials(&Self::create_hashed_password(user_id, password)?)
    }

    /// Returns Ok(None) when the handle is unknown or the password is wrong.
    pub fn login(&self, user_handle: &str, password: &str) -> Result<Option<AuthToken>> {
        let Some(credentials) = self.user_store.get_password_credentials(user_handle)? else {
            debug!("No password credentials for {}", user_handle);
            return Ok(None);
        };

        let verified = credentials.hasher.verify(password, &credentials.hash)?;
        self.user_store
            .touch_password_credentials(credentials.user_id, verified)?;
        if !verified {
            debug!("Wrong password for user {}", credentials.user_id);
            return Ok(None);
        }

        let token = AuthToken {
            user_id: credentials.user_id,
            value: AuthTokenValue::generate(),
            created: SystemTime::now(),
            last_used: None,
        };
        self.user_store.add_user_auth_token(&token)?;
        Ok(Some(token))
    }

    /// Returns whether the token existed.
    pub fn logout(&self, token: &AuthTokenValue) -> Result<bool> {
        Ok(self.user_store.delete_user_auth_token(token)?.is_some())
    }

    /// Maps a session token to its user, marking the token as used.
    pub fn resolve_session(&self, token: &AuthTokenValue) -> Result<Option<usize>> {
        let Some(auth_token) = self.user_store.get_user_auth_token(token)? else {
            return Ok(None);
        };
        self.user_store
            .update_user_auth_token_last_used_timestamp(token)?;
        Ok(Some(auth_token.user_id))
    }

    pub fn get_user(&self, user_id: usize) -> Result<Option<User>> {
        self.user_store.get_user(user_id)
    }

    pub fn get_users_count(&self) -> Result<usize> {
        self.user_store.get_users_count()
    }
}
