//! Request lifecycle state.
//!
//! Every resource category (`auth`, `listings`, `profile`) keeps one
//! [`RequestState`] and changes it only through [`apply`]:
//!
//! ```text
//!            Start                Succeed(p)
//!   idle ───────────▶ loading ───────────────▶ success
//!                        │
//!                        │ Fail(reason)
//!                        ▼
//!                      error
//! ```
//!
//! Both terminal states may be re-entered with another `Start`. How a
//! successful payload lands in `data` depends on the category; see
//! [`Merge`].

mod session;
mod slices;

pub use session::{AuthPayload, Session};
pub use slices::{ListingsData, ListingsPayload, ProfileData, ProfilePayload};

/// Lifecycle events for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<P> {
    /// A request was issued.
    Start,
    /// The request resolved with a payload.
    Succeed(P),
    /// The request was rejected with a human-readable reason.
    Fail(String),
}

/// How a successful payload is folded into a category's data.
pub trait Merge<P> {
    /// Fold `payload` into `self`.
    fn merge(&mut self, payload: P);

    /// Adjust data after a failed request. Most categories keep their data.
    fn on_failure(&mut self) {}
}

/// `{data, loading, error, success}` for one resource category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestState<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
    pub success: bool,
}

impl<T> RequestState<T> {
    /// Idle state around `data`.
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self {
            data,
            loading: false,
            error: None,
            success: false,
        }
    }

    /// Apply `event` in place.
    pub fn reduce<P>(&mut self, event: Event<P>)
    where
        T: Merge<P>,
    {
        match event {
            Event::Start => {
                self.loading = true;
                self.error = None;
                self.success = false;
            }
            Event::Succeed(payload) => {
                self.data.merge(payload);
                self.loading = false;
                self.error = None;
                self.success = true;
            }
            Event::Fail(reason) => {
                self.data.on_failure();
                self.loading = false;
                self.error = Some(reason);
                self.success = false;
            }
        }
    }

    /// Drop the last request error.
    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Drop the success flag once the UI has acted on it.
    pub fn clear_success(&mut self) {
        self.success = false;
    }

    /// Neither loading nor holding an error.
    #[must_use]
    pub const fn is_settled_ok(&self) -> bool {
        !self.loading && self.error.is_none()
    }
}

/// Pure transition function: `apply(state, event) -> state'`.
#[must_use]
pub fn apply<T, P>(mut state: RequestState<T>, event: Event<P>) -> RequestState<T>
where
    T: Merge<P>,
{
    state.reduce(event);
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq, Eq)]
    struct Counter(u32);

    impl Merge<u32> for Counter {
        fn merge(&mut self, payload: u32) {
            self.0 += payload;
        }
    }

    #[test]
    fn test_start_then_succeed() {
        let state = apply(RequestState::new(Counter(1)), Event::Start);
        assert!(state.loading);
        assert!(!state.success);

        let state = apply(state, Event::Succeed(2));
        assert!(!state.loading);
        assert!(state.success);
        assert_eq!(state.error, None);
        assert_eq!(state.data, Counter(3));
    }

    #[test]
    fn test_start_then_fail() {
        let state = apply(RequestState::new(Counter(1)), Event::<u32>::Start);
        let state = apply(state, Event::<u32>::Fail("boom".to_owned()));
        assert!(!state.loading);
        assert!(!state.success);
        assert_eq!(state.error.as_deref(), Some("boom"));
        assert_eq!(state.data, Counter(1));
    }

    #[test]
    fn test_restart_clears_terminal_flags() {
        let mut state = RequestState::new(Counter(0));
        state.reduce(Event::<u32>::Fail("first".to_owned()));
        state.reduce(Event::<u32>::Start);
        assert_eq!(state.error, None);
        assert!(state.loading);

        state.reduce(Event::Succeed(1));
        state.reduce(Event::<u32>::Start);
        assert!(!state.success);
    }

    #[test]
    fn test_explicit_clears() {
        let mut state = RequestState::new(Counter(0));
        state.reduce(Event::<u32>::Fail("nope".to_owned()));
        state.clear_error();
        assert!(state.is_settled_ok());

        state.reduce(Event::Succeed(1));
        state.clear_success();
        assert!(!state.success);
    }
}
