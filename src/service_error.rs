//! Error taxonomy shared by the note and listing services.

use crate::photo_storage::PhotoStorageError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Artist,
    Venue,
    Show,
    Note,
    User,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Artist => "Artist",
            EntityKind::Venue => "Venue",
            EntityKind::Show => "Show",
            EntityKind::Note => "Note",
            EntityKind::User => "User",
        };
        f.write_str(name)
    }
}

/// Field name to messages, serialized as `{"field": ["message", ...]}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(|m| m.as_slice())
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ServiceError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&fields)
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid input: {0}")]
    Validation(ValidationErrors),

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i64 },

    #[error("Not allowed to modify this resource")]
    Forbidden,

    #[error("Failed to store photo: {0}")]
    PhotoStorage(#[from] PhotoStorageError),

    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(kind: EntityKind, id: i64) -> Self {
        ServiceError::NotFound { kind, id }
    }

    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "invalid",
            ServiceError::NotFound { .. } => "not_found",
            ServiceError::Forbidden => "forbidden",
            ServiceError::PhotoStorage(_) => "photo_storage_error",
            ServiceError::Store(_) => "store_error",
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
