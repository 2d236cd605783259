//! Login and registration schemas.

use crate::types::Email;

use super::{ValidationErrors, length_between, required};

/// Minimum password length for both sign-in and sign-up.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimum full-name length for sign-up.
pub const MIN_FULL_NAME_LENGTH: usize = 2;

const INVALID_EMAIL: &str = "Please enter a valid email address";

/// Raw sign-in form input.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Sign-in credentials that passed validation.
#[derive(Debug, Clone)]
pub struct ValidLogin {
    pub email: Email,
    pub password: String,
}

impl LoginForm {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// # Errors
    ///
    /// Returns every failing field: missing or malformed email, missing or
    /// short password.
    pub fn validate(&self) -> Result<ValidLogin, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let email = validate_email(&mut errors, &self.email);

        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        length_between(
            &mut errors,
            "password",
            &self.password,
            Some((
                MIN_PASSWORD_LENGTH,
                "Password must be at least 8 characters",
            )),
            None,
        );

        match email {
            Some(email) if errors.is_empty() => Ok(ValidLogin {
                email,
                password: self.password.clone(),
            }),
            _ => Err(errors),
        }
    }
}

/// Raw sign-up form input.
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Sign-up details that passed validation.
#[derive(Debug, Clone)]
pub struct ValidRegistration {
    pub full_name: String,
    pub email: Email,
    pub password: String,
}

impl RegisterForm {
    /// # Errors
    ///
    /// Returns every failing field. A mismatched confirmation is reported on
    /// `confirm_password`.
    pub fn validate(&self) -> Result<ValidRegistration, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let full_name = required(
            &mut errors,
            "full_name",
            &self.full_name,
            "Full name is required",
        );
        length_between(
            &mut errors,
            "full_name",
            full_name,
            Some((
                MIN_FULL_NAME_LENGTH,
                "Full name must be at least 2 characters",
            )),
            None,
        );

        let email = validate_email(&mut errors, &self.email);

        if self.password.is_empty() {
            errors.add("password", "Password is required");
        }
        length_between(
            &mut errors,
            "password",
            &self.password,
            Some((
                MIN_PASSWORD_LENGTH,
                "Password must be at least 8 characters",
            )),
            None,
        );
        if !self.password.is_empty() && !has_mixed_case_and_digit(&self.password) {
            errors.add(
                "password",
                "Password must contain at least one uppercase letter, one lowercase letter, and one number",
            );
        }

        if self.password != self.confirm_password {
            errors.add("confirm_password", "Passwords don't match");
        }

        match email {
            Some(email) if errors.is_empty() => Ok(ValidRegistration {
                full_name: full_name.to_owned(),
                email,
                password: self.password.clone(),
            }),
            _ => Err(errors),
        }
    }
}

fn validate_email(errors: &mut ValidationErrors, raw: &str) -> Option<Email> {
    let trimmed = required(errors, "email", raw, "Email is required");
    if trimmed.is_empty() {
        return None;
    }
    Email::parse(trimmed)
        .inspect_err(|_| errors.add("email", INVALID_EMAIL))
        .ok()
}

fn has_mixed_case_and_digit(password: &str) -> bool {
    password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}
