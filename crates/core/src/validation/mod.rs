//! Form schemas.
//!
//! Each form is a plain struct of the raw text a user typed plus a
//! `validate` method that either yields the typed request body or a
//! [`ValidationErrors`] listing the first failing rule per field. Validation
//! errors stay with the form: nothing here ever reaches the network.

mod auth;
mod listing;
mod wizard;

pub use auth::{LoginForm, RegisterForm, ValidLogin, ValidRegistration};
pub use listing::{ListingForm, validate_update};
pub use wizard::{ListingWizard, WizardStep};

use core::fmt;

/// A single failed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Form field name, e.g. `"password"`.
    pub field: &'static str,
    /// Message shown next to the field.
    pub message: String,
}

/// Field-level validation failures, in form order, at most one per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record a failure unless the field already has one.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        if self.get(field).is_none() {
            self.errors.push(FieldError {
                field,
                message: message.into(),
            });
        }
    }

    /// The message for `field`, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Keep only failures for the given fields.
    #[must_use]
    pub fn restricted_to(mut self, fields: &[&str]) -> Self {
        self.errors.retain(|e| fields.contains(&e.field));
        self
    }

    /// `Ok(value)` when nothing failed.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "validation failed: {}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Required-text rule shared by every form. Returns the trimmed value.
pub(crate) fn required<'a>(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &'a str,
    message: &str,
) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, message);
    }
    trimmed
}

/// Character-count bounds, checked only when the field is non-empty.
pub(crate) fn length_between(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: &str,
    min: Option<(usize, &str)>,
    max: Option<(usize, &str)>,
) {
    if value.is_empty() {
        return;
    }
    let count = value.chars().count();
    if let Some((min, message)) = min
        && count < min
    {
        errors.add(field, message);
    }
    if let Some((max, message)) = max
        && count > max
    {
        errors.add(field, message);
    }
}
