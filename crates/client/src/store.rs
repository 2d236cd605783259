//! The request-state store.
//!
//! One [`Slice`] per resource category. Slices are only written through
//! [`Slice::begin`] / [`Slice::settle`] (driven by the dispatcher) and the
//! explicit clear actions; everything else reads snapshots.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use c2c_core::state::{AuthPayload, ListingsData, ListingsPayload, ProfileData, ProfilePayload};
use c2c_core::{Event, Merge, RequestState, Session};
use parking_lot::RwLock;

/// What happens when two requests against one category overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettlementPolicy {
    /// Every settlement is applied, in the order they arrive. Whichever
    /// request resolves last determines the visible state, even if it was
    /// issued first.
    #[default]
    LastSettledWins,
    /// Only the most recently issued request may settle; earlier ones are
    /// dropped when they resolve.
    LatestIssuedWins,
}

impl std::fmt::Display for SettlementPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LastSettledWins => write!(f, "last-settled"),
            Self::LatestIssuedWins => write!(f, "latest-issued"),
        }
    }
}

impl std::str::FromStr for SettlementPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last-settled" => Ok(Self::LastSettledWins),
            "latest-issued" => Ok(Self::LatestIssuedWins),
            _ => Err(format!(
                "invalid settlement policy: {s} (expected last-settled or latest-issued)"
            )),
        }
    }
}

/// Proof that a request was started on a slice; consumed on settlement.
#[derive(Debug)]
#[must_use = "a started request must be settled"]
pub struct Ticket {
    seq: u64,
}

impl Ticket {
    /// Position of the request in its slice's issue order, starting at 1.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }
}

/// `RequestState` for one category plus its issue counter.
pub struct Slice<T, P> {
    name: &'static str,
    state: RwLock<RequestState<T>>,
    issued: AtomicU64,
    policy: SettlementPolicy,
    _payload: PhantomData<fn(P)>,
}

impl<T: std::fmt::Debug, P> std::fmt::Debug for Slice<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slice")
            .field("name", &self.name)
            .field("state", &*self.state.read())
            .field("issued", &self.issued.load(Ordering::Relaxed))
            .field("policy", &self.policy)
            .finish()
    }
}

impl<T, P> Slice<T, P>
where
    T: Merge<P> + Clone,
{
    pub fn new(name: &'static str, data: T, policy: SettlementPolicy) -> Self {
        Self {
            name,
            state: RwLock::new(RequestState::new(data)),
            issued: AtomicU64::new(0),
            policy,
            _payload: PhantomData,
        }
    }

    /// Category name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn policy(&self) -> SettlementPolicy {
        self.policy
    }

    /// Apply `Start` and hand out a ticket for the new request.
    pub fn begin(&self) -> Ticket {
        let mut state = self.state.write();
        let seq = self.issued.fetch_add(1, Ordering::AcqRel) + 1;
        state.reduce(Event::<P>::Start);
        Ticket { seq }
    }

    /// Apply the terminal event of the request behind `ticket`.
    ///
    /// Returns false if the settlement was dropped because a newer request
    /// was issued in the meantime (only under
    /// [`SettlementPolicy::LatestIssuedWins`]).
    pub fn settle(&self, ticket: Ticket, event: Event<P>) -> bool {
        let mut state = self.state.write();
        if self.policy == SettlementPolicy::LatestIssuedWins {
            let latest = self.issued.load(Ordering::Acquire);
            if ticket.seq != latest {
                tracing::debug!(
                    slice = self.name,
                    seq = ticket.seq,
                    latest,
                    "Dropping stale settlement"
                );
                return false;
            }
        }
        state.reduce(event);
        true
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> RequestState<T> {
        self.state.read().clone()
    }

    /// Read the current state without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&RequestState<T>) -> R) -> R {
        f(&self.state.read())
    }

    /// Modify the state outside the request lifecycle (clear actions).
    pub fn update<R>(&self, f: impl FnOnce(&mut RequestState<T>) -> R) -> R {
        f(&mut self.state.write())
    }

    pub fn clear_error(&self) {
        self.update(RequestState::clear_error);
    }

    pub fn clear_success(&self) {
        self.update(RequestState::clear_success);
    }
}

pub type AuthSlice = Slice<Session, AuthPayload>;
pub type ListingsSlice = Slice<ListingsData, ListingsPayload>;
pub type ProfileSlice = Slice<ProfileData, ProfilePayload>;

/// All request state of a running client.
///
/// Constructed once at startup and handed to whatever renders it.
#[derive(Debug)]
pub struct Store {
    pub auth: AuthSlice,
    pub listings: ListingsSlice,
    pub profile: ProfileSlice,
}

impl Store {
    #[must_use]
    pub fn new(policy: SettlementPolicy) -> Self {
        Self {
            auth: Slice::new("auth", Session::new(), policy),
            listings: Slice::new("listings", ListingsData::default(), policy),
            profile: Slice::new("profile", ProfileData::default(), policy),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(SettlementPolicy::default())
    }
}
