//! Protected-route decisions.
//!
//! The guard is a pure read of the session: it keeps no state of its own.

use crate::state::Session;

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/auth/login";

/// What a protected view should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// The first authentication check has not finished yet.
    Loading,
    /// Checked, and nobody is signed in.
    RedirectToLogin {
        /// Login path to navigate to (replacing the current entry).
        to: &'static str,
    },
    /// Render the protected content.
    Allow,
}

/// Decide what a protected view renders for `session`.
#[must_use]
pub const fn guard(session: &Session) -> GuardDecision {
    if !session.initialized() {
        GuardDecision::Loading
    } else if !session.is_authenticated() {
        GuardDecision::RedirectToLogin { to: LOGIN_PATH }
    } else {
        GuardDecision::Allow
    }
}

/// Views of the marketplace client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    HowItWorks,
    Listings,
    ListingDetail(String),
    Login,
    Register,
    Sell,
    MyListings,
    Profile,
}

impl Route {
    /// Path of the view.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_owned(),
            Self::HowItWorks => "/how-it-works".to_owned(),
            Self::Listings => "/listings".to_owned(),
            Self::ListingDetail(id) => format!("/listings/{id}"),
            Self::Login => LOGIN_PATH.to_owned(),
            Self::Register => "/auth/register".to_owned(),
            Self::Sell => "/sell".to_owned(),
            Self::MyListings => "/my-listings".to_owned(),
            Self::Profile => "/profile".to_owned(),
        }
    }

    /// Whether the view requires a signed-in user.
    #[must_use]
    pub const fn is_protected(&self) -> bool {
        matches!(self, Self::Sell | Self::MyListings | Self::Profile)
    }

    /// Guard decision for this route; public routes are always allowed.
    #[must_use]
    pub const fn decide(&self, session: &Session) -> GuardDecision {
        if self.is_protected() {
            guard(session)
        } else {
            GuardDecision::Allow
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AuthPayload, Merge};
    use crate::types::{AuthToken, UserRecord};

    fn authenticated() -> Session {
        let mut session = Session::new();
        session.merge(AuthPayload::SignedIn {
            user: UserRecord::default(),
            token: AuthToken::new("t"),
        });
        session
    }

    #[test]
    fn test_loading_until_initialized() {
        // Even a signed-in session waits for the first check.
        assert_eq!(guard(&authenticated()), GuardDecision::Loading);
        assert_eq!(guard(&Session::new()), GuardDecision::Loading);
    }

    #[test]
    fn test_redirect_when_signed_out() {
        let mut session = Session::new();
        session.mark_initialized();
        assert_eq!(
            guard(&session),
            GuardDecision::RedirectToLogin { to: "/auth/login" }
        );
    }

    #[test]
    fn test_allow_when_signed_in() {
        let mut session = authenticated();
        session.mark_initialized();
        assert_eq!(guard(&session), GuardDecision::Allow);
    }

    #[test]
    fn test_public_routes_skip_guard() {
        let session = Session::new();
        assert_eq!(Route::Listings.decide(&session), GuardDecision::Allow);
        assert_eq!(
            Route::ListingDetail("42".to_owned()).path(),
            "/listings/42"
        );
        assert_eq!(Route::Sell.decide(&session), GuardDecision::Loading);
    }
}
