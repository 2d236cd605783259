//! Async operation dispatcher.
//!
//! Wraps one API call in the request lifecycle of a slice: `Start` is
//! committed before the call is polled, and exactly one terminal event is
//! committed when it settles. A dispatch dropped before its call settles
//! (timeout, `select!`, aborted task) commits `Fail` with
//! [`CANCELLED_MESSAGE`].

use std::future::Future;

use c2c_core::{Event, Merge};
use thiserror::Error;

use crate::error::{ApiError, ErrorMessageMapping};
use crate::store::{Slice, Ticket};

/// Error committed when a dispatch is dropped before its call settles.
pub const CANCELLED_MESSAGE: &str = "Request cancelled";

/// The operations that go through the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Login,
    Register,
    Logout,
    RestoreSession,
    CreateListing,
    FetchListings,
    FetchListing,
    FetchMyListings,
    UpdateListing,
    DeleteListing,
    FetchProfile,
    UpdateProfile,
}

impl Operation {
    /// Name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Login => "auth/login",
            Self::Register => "auth/register",
            Self::Logout => "auth/logout",
            Self::RestoreSession => "auth/restore",
            Self::CreateListing => "listings/create",
            Self::FetchListings => "listings/fetchAll",
            Self::FetchListing => "listings/fetchOne",
            Self::FetchMyListings => "listings/fetchMine",
            Self::UpdateListing => "listings/update",
            Self::DeleteListing => "listings/delete",
            Self::FetchProfile => "profile/fetch",
            Self::UpdateProfile => "profile/update",
        }
    }

    /// Message shown when the server does not supply one.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::Login => "Login failed. Please try again.",
            Self::Register => "Registration failed. Please try again.",
            Self::Logout => "Logout failed",
            Self::RestoreSession => "Failed to restore session",
            Self::CreateListing => "Failed to create listing",
            Self::FetchListings => "Failed to fetch listings",
            Self::FetchListing => "Failed to fetch listing",
            Self::FetchMyListings => "Failed to fetch listings",
            Self::UpdateListing => "Failed to update listing",
            Self::DeleteListing => "Failed to delete listing",
            Self::FetchProfile => "Failed to fetch profile",
            Self::UpdateProfile => "Failed to update profile",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A dispatched request that failed.
///
/// `message` is what was written into the slice's `error` field.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DispatchError {
    pub operation: Operation,
    pub message: String,
    #[source]
    pub source: ApiError,
}

impl DispatchError {
    /// The server rejected the session token.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.source.is_unauthorized()
    }
}

/// A started request that has not settled yet.
///
/// Dropping it unsettled commits `Fail`, so no request leaves its slice
/// loading.
struct InFlight<'a, T: Merge<P> + Clone, P> {
    slice: &'a Slice<T, P>,
    operation: Operation,
    ticket: Option<Ticket>,
}

impl<'a, T: Merge<P> + Clone, P> InFlight<'a, T, P> {
    fn begin(slice: &'a Slice<T, P>, operation: Operation) -> Self {
        Self {
            slice,
            operation,
            ticket: Some(slice.begin()),
        }
    }

    fn seq(&self) -> u64 {
        self.ticket.as_ref().map_or(0, Ticket::seq)
    }

    fn settle(mut self, event: Event<P>) -> bool {
        self.ticket
            .take()
            .is_some_and(|ticket| self.slice.settle(ticket, event))
    }
}

impl<T: Merge<P> + Clone, P> Drop for InFlight<'_, T, P> {
    fn drop(&mut self) {
        if let Some(ticket) = self.ticket.take() {
            let seq = ticket.seq();
            let applied = self
                .slice
                .settle(ticket, Event::Fail(CANCELLED_MESSAGE.to_owned()));
            tracing::debug!(operation = self.operation.name(), seq, applied, "cancelled");
        }
    }
}

/// Run `call` inside the request lifecycle of `slice`.
///
/// On success `to_payload` builds the payload merged into the slice and the
/// call's own result is returned. On failure the error is mapped to a single
/// message, committed as `Fail`, and returned.
///
/// # Errors
///
/// Returns `DispatchError` when `call` fails.
pub async fn dispatch<T, P, R, F>(
    slice: &Slice<T, P>,
    operation: Operation,
    messages: &ErrorMessageMapping,
    call: F,
    to_payload: impl FnOnce(&R) -> P,
) -> Result<R, DispatchError>
where
    T: Merge<P> + Clone,
    F: Future<Output = Result<R, ApiError>>,
{
    let request = InFlight::begin(slice, operation);
    let seq = request.seq();
    tracing::debug!(
        operation = operation.name(),
        slice = slice.name(),
        policy = %slice.policy(),
        seq,
        "pending"
    );

    match call.await {
        Ok(result) => {
            let applied = request.settle(Event::Succeed(to_payload(&result)));
            tracing::debug!(operation = operation.name(), seq, applied, "fulfilled");
            Ok(result)
        }
        Err(source) => {
            let message = messages.message_for(&source, operation.default_message());
            let applied = request.settle(Event::Fail(message.clone()));
            tracing::warn!(
                operation = operation.name(),
                seq,
                applied,
                error = %source,
                message = %message,
                "rejected"
            );
            Err(DispatchError {
                operation,
                message,
                source,
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::{ListingsSlice, SettlementPolicy};
    use c2c_core::state::{ListingsData, ListingsPayload};
    use c2c_core::{ListingId, ListingRecord, Price};
    use reqwest::StatusCode;
    use std::time::Duration;
    use tokio::sync::oneshot;

    fn listing(id: &str) -> ListingRecord {
        ListingRecord {
            listing_id: ListingId::new(id),
            title: format!("Listing {id}"),
            description: String::new(),
            category: "cars".to_owned(),
            price: Price::from_rupees(250_000),
            city: "Chennai".to_owned(),
            images: Vec::new(),
            availability: c2c_core::Availability::Available,
            created_at: None,
            full_name: None,
        }
    }

    fn slice(policy: SettlementPolicy) -> ListingsSlice {
        ListingsSlice::new("listings", ListingsData::default(), policy)
    }

    fn mine_ids(slice: &ListingsSlice) -> Vec<String> {
        slice.read(|s| {
            s.data
                .my_listings
                .iter()
                .map(|l| l.listing_id.to_string())
                .collect()
        })
    }

    #[tokio::test]
    async fn test_start_is_visible_while_pending() {
        let slice = slice(SettlementPolicy::LastSettledWins);
        let messages = ErrorMessageMapping::default();
        let (tx, rx) = oneshot::channel::<Vec<ListingRecord>>();

        let pending = dispatch(
            &slice,
            Operation::FetchMyListings,
            &messages,
            async { Ok(rx.await.unwrap()) },
            |l: &Vec<ListingRecord>| ListingsPayload::Mine(l.clone()),
        );
        let observe = async {
            tokio::task::yield_now().await;
            assert!(slice.snapshot().loading);
            tx.send(vec![listing("1")]).unwrap();
        };

        let (result, ()) = tokio::join!(pending, observe);
        assert_eq!(result.unwrap().len(), 1);
        let state = slice.snapshot();
        assert!(!state.loading);
        assert!(state.success);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn test_failure_uses_server_message_then_default() {
        let slice = slice(SettlementPolicy::LastSettledWins);
        let messages = ErrorMessageMapping::default();

        let err = dispatch(
            &slice,
            Operation::CreateListing,
            &messages,
            async {
                Err::<ListingRecord, _>(ApiError::Status {
                    status: StatusCode::BAD_REQUEST,
                    body: r#"{"message":"Title already used"}"#.to_owned(),
                })
            },
            |l: &ListingRecord| ListingsPayload::Created(l.clone()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "Title already used");
        assert_eq!(slice.snapshot().error.as_deref(), Some("Title already used"));

        let err = dispatch(
            &slice,
            Operation::CreateListing,
            &messages,
            async {
                Err::<ListingRecord, _>(ApiError::Status {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: String::new(),
                })
            },
            |l: &ListingRecord| ListingsPayload::Created(l.clone()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "Failed to create listing");
        let state = slice.snapshot();
        assert!(!state.loading);
        assert!(!state.success);
    }

    /// Two overlapping fetches of the owner's listings, where the one issued
    /// first resolves last.
    async fn overlapping_my_listings(policy: SettlementPolicy) -> Vec<String> {
        let slice = slice(policy);
        let messages = ErrorMessageMapping::default();
        let (first_tx, first_rx) = oneshot::channel::<Vec<ListingRecord>>();
        let (second_tx, second_rx) = oneshot::channel::<Vec<ListingRecord>>();

        let first = dispatch(
            &slice,
            Operation::FetchMyListings,
            &messages,
            async { Ok(first_rx.await.unwrap()) },
            |l: &Vec<ListingRecord>| ListingsPayload::Mine(l.clone()),
        );
        let second = dispatch(
            &slice,
            Operation::FetchMyListings,
            &messages,
            async { Ok(second_rx.await.unwrap()) },
            |l: &Vec<ListingRecord>| ListingsPayload::Mine(l.clone()),
        );
        let resolve = async {
            tokio::task::yield_now().await;
            second_tx.send(vec![listing("issued-second")]).unwrap();
            // join! rotates its polling order, so wait for the second fetch
            // to settle before releasing the first.
            while mine_ids(&slice).is_empty() {
                tokio::task::yield_now().await;
            }
            assert_eq!(mine_ids(&slice), vec!["issued-second"]);
            first_tx.send(vec![listing("issued-first")]).unwrap();
        };

        let (a, b, ()) = tokio::join!(first, second, resolve);
        a.unwrap();
        b.unwrap();
        assert!(!slice.snapshot().loading);
        mine_ids(&slice)
    }

    #[tokio::test]
    async fn test_overlapping_fetches_last_settled_wins() {
        assert_eq!(
            overlapping_my_listings(SettlementPolicy::LastSettledWins).await,
            vec!["issued-first"]
        );
    }

    #[tokio::test]
    async fn test_overlapping_fetches_latest_issued_wins() {
        assert_eq!(
            overlapping_my_listings(SettlementPolicy::LatestIssuedWins).await,
            vec!["issued-second"]
        );
    }

    #[tokio::test]
    async fn test_dropped_dispatch_does_not_stay_loading() {
        let slice = slice(SettlementPolicy::LastSettledWins);
        let messages = ErrorMessageMapping::default();

        let timed_out = tokio::time::timeout(
            Duration::from_millis(20),
            dispatch(
                &slice,
                Operation::FetchMyListings,
                &messages,
                std::future::pending::<Result<Vec<ListingRecord>, ApiError>>(),
                |l: &Vec<ListingRecord>| ListingsPayload::Mine(l.clone()),
            ),
        )
        .await;
        assert!(timed_out.is_err());

        let state = slice.snapshot();
        assert!(!state.loading);
        assert!(!state.success);
        assert_eq!(state.error.as_deref(), Some(CANCELLED_MESSAGE));
    }

    #[tokio::test]
    async fn test_dropped_stale_dispatch_leaves_newer_request_alone() {
        let slice = slice(SettlementPolicy::LatestIssuedWins);
        let messages = ErrorMessageMapping::default();
        let (tx, rx) = oneshot::channel::<Vec<ListingRecord>>();

        let mut stale = Box::pin(dispatch(
            &slice,
            Operation::FetchMyListings,
            &messages,
            std::future::pending::<Result<Vec<ListingRecord>, ApiError>>(),
            |l: &Vec<ListingRecord>| ListingsPayload::Mine(l.clone()),
        ));
        assert!(futures_poll_once(stale.as_mut()).await.is_none());

        let latest = dispatch(
            &slice,
            Operation::FetchMyListings,
            &messages,
            async { Ok(rx.await.unwrap()) },
            |l: &Vec<ListingRecord>| ListingsPayload::Mine(l.clone()),
        );
        let observe = async {
            tokio::task::yield_now().await;
            drop(stale);
            let state = slice.snapshot();
            assert!(state.loading);
            assert_eq!(state.error, None);
            tx.send(vec![listing("latest")]).unwrap();
        };

        let (result, ()) = tokio::join!(latest, observe);
        result.unwrap();
        assert_eq!(mine_ids(&slice), vec!["latest"]);
    }

    /// Poll `fut` once, returning its output if it completed.
    async fn futures_poll_once<F: Future + Unpin>(mut fut: F) -> Option<F::Output> {
        std::future::poll_fn(|cx| {
            std::task::Poll::Ready(match std::pin::Pin::new(&mut fut).poll(cx) {
                std::task::Poll::Ready(out) => Some(out),
                std::task::Poll::Pending => None,
            })
        })
        .await
    }

    #[test]
    fn test_default_messages() {
        assert_eq!(
            Operation::Login.default_message(),
            "Login failed. Please try again."
        );
        assert_eq!(Operation::Logout.default_message(), "Logout failed");
        assert_eq!(Operation::FetchProfile.to_string(), "profile/fetch");
    }
}
