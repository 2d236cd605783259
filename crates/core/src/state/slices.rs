//! Data held by the `listings` and `profile` categories.

use crate::types::{ListingRecord, Profile};

use super::Merge;

/// Successful outcomes of listing operations.
#[derive(Debug, Clone)]
pub enum ListingsPayload {
    /// Browse results; replace the whole list.
    All(Vec<ListingRecord>),
    /// The signed-in user's listings; replace the whole list.
    Mine(Vec<ListingRecord>),
    /// A newly created listing; prepend to the user's listings.
    Created(ListingRecord),
    /// One listing's details; replace the current listing.
    Detail(ListingRecord),
    /// Update or delete went through; nothing is patched locally.
    Acknowledged,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingsData {
    pub listings: Vec<ListingRecord>,
    pub my_listings: Vec<ListingRecord>,
    pub current_listing: Option<ListingRecord>,
}

impl ListingsData {
    pub fn clear_current_listing(&mut self) {
        self.current_listing = None;
    }

    pub fn set_current_listing(&mut self, listing: ListingRecord) {
        self.current_listing = Some(listing);
    }
}

impl Merge<ListingsPayload> for ListingsData {
    fn merge(&mut self, payload: ListingsPayload) {
        match payload {
            ListingsPayload::All(listings) => self.listings = listings,
            ListingsPayload::Mine(listings) => self.my_listings = listings,
            ListingsPayload::Created(listing) => self.my_listings.insert(0, listing),
            ListingsPayload::Detail(listing) => self.current_listing = Some(listing),
            ListingsPayload::Acknowledged => {}
        }
    }
}

/// Successful outcomes of profile operations.
#[derive(Debug, Clone)]
pub enum ProfilePayload {
    Fetched(Profile),
    Acknowledged,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileData {
    pub profile: Option<Profile>,
}

impl Merge<ProfilePayload> for ProfileData {
    fn merge(&mut self, payload: ProfilePayload) {
        match payload {
            ProfilePayload::Fetched(profile) => self.profile = Some(profile),
            ProfilePayload::Acknowledged => {}
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::state::{Event, RequestState, apply};
    use crate::types::{ListingId, Price};

    fn listing(id: &str) -> ListingRecord {
        serde_json::from_value(serde_json::json!({
            "listing_id": id,
            "title": format!("Listing {id}"),
            "price": Price::MIN,
        }))
        .unwrap()
    }

    fn ids(list: &[ListingRecord]) -> Vec<&str> {
        list.iter().map(|l| l.listing_id.as_str()).collect()
    }

    #[test]
    fn test_fetch_replaces_whole_list() {
        let mut state = RequestState::new(ListingsData::default());
        state.reduce(Event::Succeed(ListingsPayload::All(vec![listing("1"), listing("2")])));
        state.reduce(Event::Succeed(ListingsPayload::All(vec![listing("3")])));
        assert_eq!(ids(&state.data.listings), vec!["3"]);
    }

    #[test]
    fn test_create_prepends_to_my_listings() {
        let mut state = RequestState::new(ListingsData::default());
        state.reduce(Event::Succeed(ListingsPayload::Mine(vec![listing("1")])));
        state.reduce(Event::<ListingsPayload>::Start);
        state.reduce(Event::Succeed(ListingsPayload::Created(listing("2"))));
        assert_eq!(ids(&state.data.my_listings), vec!["2", "1"]);
        assert!(state.success);
    }

    #[test]
    fn test_detail_replaces_current() {
        let state = apply(
            RequestState::new(ListingsData::default()),
            Event::Succeed(ListingsPayload::Detail(listing("9"))),
        );
        assert_eq!(
            state.data.current_listing.as_ref().map(|l| &l.listing_id),
            Some(&ListingId::new("9"))
        );
    }

    #[test]
    fn test_acknowledged_leaves_lists_untouched() {
        let mut data = ListingsData::default();
        data.merge(ListingsPayload::Mine(vec![listing("1")]));
        data.merge(ListingsPayload::Acknowledged);
        assert_eq!(ids(&data.my_listings), vec!["1"]);
    }

    #[test]
    fn test_empty_fetch_is_success_not_error() {
        let state = apply(
            apply(
                RequestState::new(ListingsData::default()),
                Event::<ListingsPayload>::Start,
            ),
            Event::Succeed(ListingsPayload::All(Vec::new())),
        );
        assert!(state.success);
        assert!(state.error.is_none());
        assert!(state.data.listings.is_empty());
    }

    #[test]
    fn test_profile_fetch() {
        let mut data = ProfileData::default();
        data.merge(ProfilePayload::Fetched(Profile {
            city: Some("Goa".to_owned()),
            ..Profile::default()
        }));
        data.merge(ProfilePayload::Acknowledged);
        assert_eq!(data.profile.unwrap().city.as_deref(), Some("Goa"));
    }
}
