//! Error types for the todo store.
//!
//! # Design
//! Two kinds only. `ValidationFailure` is an expected outcome that carries
//! every field-level violation so a form can show them all at once.
//! `StorageError` is the one thing a gateway can raise; the command layer
//! passes it through untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Field name to violation messages, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationFailure {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationFailure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Messages recorded for `field`; empty when the field is fine.
    pub fn messages(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed")?;
        let mut sep = ": ";
        for (field, messages) in &self.errors {
            for message in messages {
                write!(f, "{sep}{field}: {message}")?;
                sep = "; ";
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}

/// Connectivity or store-level fault.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The connection string is missing or names an unsupported store.
    #[error("invalid database configuration: {0}")]
    Config(String),

    /// The store could not be reached or its handle is unusable.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
}

/// Outcome of a rejected command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl CommandError {
    pub fn as_validation(&self) -> Option<&ValidationFailure> {
        match self {
            CommandError::Validation(failure) => Some(failure),
            CommandError::Storage(_) => None,
        }
    }
}
