//! Subcommand implementations.

pub mod auth;
pub mod listings;
pub mod profile;

use std::io::Write;

use c2c_client::{Marketplace, MarketplaceError};
use c2c_core::{GuardDecision, Route};
use thiserror::Error;

use crate::render::Renderer;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Failures that are reported to the user rather than logged as bugs.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("not signed in; run `c2c login` first (redirected to {0})")]
    NotSignedIn(&'static str),

    #[error("the form has errors")]
    InvalidInput,

    #[error("{0}")]
    Rejected(String),
}

/// Restore the session and apply the guard for `route`.
///
/// # Errors
///
/// Returns `CliError::NotSignedIn` when the guard redirects to login.
pub async fn require_session(market: &Marketplace, route: &Route) -> Result<(), CliError> {
    if let Err(e) = market.initialize_auth().await {
        tracing::warn!(error = %e, "Could not restore session");
    }
    match market.guard(route) {
        GuardDecision::Allow => Ok(()),
        // initialize_auth always latches, so Loading cannot outlive it
        GuardDecision::Loading | GuardDecision::RedirectToLogin { .. } => {
            Err(CliError::NotSignedIn(c2c_core::LOGIN_PATH))
        }
    }
}

/// Turn a failed action into the error the process exits with, printing
/// per-field messages for validation failures.
pub fn reject<W: Write>(out: &mut Renderer<W>, error: MarketplaceError) -> Box<dyn std::error::Error> {
    match error {
        MarketplaceError::Validation(errors) => {
            if let Err(e) = out.validation(&errors) {
                return e.into();
            }
            CliError::InvalidInput.into()
        }
        MarketplaceError::Request(e) => CliError::Rejected(e.message).into(),
        other => other.into(),
    }
}
