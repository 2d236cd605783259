//! What a screen should show for the current listings state.
//!
//! An empty result is its own case, separate from a failed request.

use c2c_core::state::ListingsData;
use c2c_core::{ListingRecord, RequestState};

/// Empty-state message on the browse screen.
pub const NO_LISTINGS_FOUND: &str = "No listings found";
/// Empty-state message on the owner's listings screen.
pub const NO_LISTINGS_YET: &str = "No listings yet";
/// Shown for a detail screen with neither a listing nor an error.
pub const LISTING_NOT_FOUND: &str = "Listing not found";

/// A list screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingsView {
    Loading,
    Failed(String),
    Empty(&'static str),
    Items(Vec<ListingRecord>),
}

impl ListingsView {
    /// The public browse list.
    #[must_use]
    pub fn browse(state: &RequestState<ListingsData>) -> Self {
        Self::build(state, &state.data.listings, NO_LISTINGS_FOUND)
    }

    /// The signed-in user's own listings.
    #[must_use]
    pub fn mine(state: &RequestState<ListingsData>) -> Self {
        Self::build(state, &state.data.my_listings, NO_LISTINGS_YET)
    }

    fn build(
        state: &RequestState<ListingsData>,
        items: &[ListingRecord],
        empty: &'static str,
    ) -> Self {
        if state.loading {
            return Self::Loading;
        }
        if let Some(error) = &state.error {
            return Self::Failed(error.clone());
        }
        if items.is_empty() {
            return Self::Empty(empty);
        }
        Self::Items(items.to_vec())
    }
}

/// The listing detail screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailView {
    Loading,
    NotFound(String),
    Found(ListingRecord),
}

impl DetailView {
    #[must_use]
    pub fn from_state(state: &RequestState<ListingsData>) -> Self {
        if state.loading {
            return Self::Loading;
        }
        match (&state.error, &state.data.current_listing) {
            (Some(error), _) => Self::NotFound(error.clone()),
            (None, Some(listing)) => Self::Found(listing.clone()),
            (None, None) => Self::NotFound(LISTING_NOT_FOUND.to_owned()),
        }
    }
}
