//! The signed-in session.

use crate::types::{AuthToken, UserRecord};

use super::Merge;

/// Successful outcomes of auth operations.
#[derive(Debug, Clone)]
pub enum AuthPayload {
    /// Login or registration issued a token.
    SignedIn { user: UserRecord, token: AuthToken },
    /// Session cleared (logout, or a persisted token the server rejected).
    SignedOut,
}

/// `{user, token, isAuthenticated, initialized}`.
///
/// Fields are private so that `initialized` can only ever be latched on and
/// so that logout always clears user and token together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<UserRecord>,
    token: Option<AuthToken>,
    is_authenticated: bool,
    initialized: bool,
}

impl Session {
    /// Empty, uninitialized session (process start).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn token(&self) -> Option<&AuthToken> {
        self.token.as_ref()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    /// Whether the first authentication check has completed.
    #[must_use]
    pub const fn initialized(&self) -> bool {
        self.initialized
    }

    /// Latch `initialized`. Returns true only for the call that flipped it.
    pub const fn mark_initialized(&mut self) -> bool {
        let flipped = !self.initialized;
        self.initialized = true;
        flipped
    }

    /// Clear user, token and the authenticated flag in one step.
    pub fn sign_out(&mut self) {
        self.user = None;
        self.token = None;
        self.is_authenticated = false;
    }
}

impl Merge<AuthPayload> for Session {
    fn merge(&mut self, payload: AuthPayload) {
        match payload {
            AuthPayload::SignedIn { user, token } => {
                self.user = Some(user);
                self.token = Some(token);
                self.is_authenticated = true;
            }
            AuthPayload::SignedOut => self.sign_out(),
        }
    }

    fn on_failure(&mut self) {
        self.is_authenticated = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Event, RequestState, apply};

    fn signed_in() -> AuthPayload {
        AuthPayload::SignedIn {
            user: UserRecord {
                full_name: Some("Kiran".to_owned()),
                ..UserRecord::default()
            },
            token: AuthToken::new("tok-1"),
        }
    }

    #[test]
    fn test_sign_in_sets_token_and_flag() {
        let state = apply(RequestState::new(Session::new()), Event::Succeed(signed_in()));
        assert!(state.data.is_authenticated());
        assert_eq!(state.data.token().map(AuthToken::expose), Some("tok-1"));
        assert_eq!(state.data.user().map(UserRecord::display_name), Some("Kiran"));
    }

    #[test]
    fn test_failed_auth_drops_authenticated_flag() {
        let state = apply(RequestState::new(Session::new()), Event::Succeed(signed_in()));
        let state = apply(state, Event::<AuthPayload>::Start);
        let state = apply(state, Event::<AuthPayload>::Fail("Login failed".to_owned()));
        assert!(!state.data.is_authenticated());
        assert_eq!(state.error.as_deref(), Some("Login failed"));
    }

    #[test]
    fn test_sign_out_clears_everything_from_any_state() {
        for start in [Session::new(), {
            let mut s = Session::new();
            s.merge(signed_in());
            s.mark_initialized();
            s
        }] {
            let mut session = start;
            session.merge(AuthPayload::SignedOut);
            assert_eq!(session.user(), None);
            assert_eq!(session.token(), None);
            assert!(!session.is_authenticated());
        }
    }

    #[test]
    fn test_initialized_latches_once() {
        let mut session = Session::new();
        assert!(!session.initialized());
        assert!(session.mark_initialized());
        assert!(!session.mark_initialized());

        session.merge(signed_in());
        session.merge(AuthPayload::SignedOut);
        session.on_failure();
        assert!(session.initialized());
    }
}
