//! Browsing, selling and managing listings against the mock API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::http::StatusCode;
use c2c_client::{DetailView, ListingsView, Marketplace, MemoryTokenStore, SettlementPolicy};
use c2c_core::validation::{ListingForm, ListingWizard, LoginForm, WizardStep};
use c2c_core::{
    Availability, Category, ListingFilters, ListingId, ListingUpdate, Price, ProfileUpdate,
};
use c2c_integration_tests::{ASHA_EMAIL, MockApi, RAVI_EMAIL, SEED_PASSWORD};
use serde_json::json;

async fn signed_in(api: &MockApi, email: &str) -> Marketplace {
    let market = api.marketplace(
        Arc::new(MemoryTokenStore::new()),
        SettlementPolicy::LastSettledWins,
    );
    market
        .login(&LoginForm::new(email, SEED_PASSWORD))
        .await
        .unwrap();
    market
}

fn swift_form() -> ListingForm {
    ListingForm {
        title: "Hyundai Creta SX 2021".to_owned(),
        description: "Diesel automatic, 32,000 km, sunroof, single owner".to_owned(),
        category: "suv".to_owned(),
        price: "14,50,000".to_owned(),
        city: "Bengaluru".to_owned(),
        images: vec!["https://img.example.com/creta-front.jpg".to_owned()],
    }
}

#[tokio::test]
async fn test_browse_with_filters() {
    let api = MockApi::spawn().await;
    let market = api.marketplace(
        Arc::new(MemoryTokenStore::new()),
        SettlementPolicy::LastSettledWins,
    );

    let all = market.fetch_listings(&ListingFilters::default()).await.unwrap();
    assert_eq!(all.len(), 2);

    let bikes = ListingFilters {
        category: Some(Category::Bikes),
        ..ListingFilters::default()
    };
    let found = market.fetch_listings(&bikes).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Royal Enfield Classic 350");
    assert!(found[0].is_sold());

    let cheap_available = ListingFilters {
        max_price: Some(200_000),
        availability: Some(Availability::Available),
        ..ListingFilters::default()
    };
    market.fetch_listings(&cheap_available).await.unwrap();
    assert_eq!(
        ListingsView::browse(&market.listings()),
        ListingsView::Empty("No listings found")
    );
}

#[tokio::test]
async fn test_empty_browse_is_an_empty_state_not_an_error() {
    let api = MockApi::spawn().await;
    let market = api.marketplace(
        Arc::new(MemoryTokenStore::new()),
        SettlementPolicy::LastSettledWins,
    );

    let filters = ListingFilters {
        search: Some("tractor".to_owned()),
        ..ListingFilters::default()
    };
    let listings = market.fetch_listings(&filters).await.unwrap();
    assert!(listings.is_empty());

    let state = market.listings();
    assert_eq!(state.error, None);
    assert!(state.success);
    assert_eq!(
        ListingsView::browse(&state),
        ListingsView::Empty("No listings found")
    );
}

#[tokio::test]
async fn test_browse_failure_uses_default_message() {
    let api = MockApi::spawn().await;
    api.fail_next("GET /api/listings", StatusCode::SERVICE_UNAVAILABLE, json!(null));
    let market = api.marketplace(
        Arc::new(MemoryTokenStore::new()),
        SettlementPolicy::LastSettledWins,
    );

    market
        .fetch_listings(&ListingFilters::default())
        .await
        .unwrap_err();
    assert_eq!(
        ListingsView::browse(&market.listings()),
        ListingsView::Failed("Failed to fetch listings".to_owned())
    );
}

#[tokio::test]
async fn test_create_prepends_to_my_listings() {
    let api = MockApi::spawn().await;
    let market = signed_in(&api, RAVI_EMAIL).await;

    market.fetch_my_listings().await.unwrap();
    assert_eq!(market.listings().data.my_listings.len(), 2);

    let created = market.create_listing(&swift_form()).await.unwrap();
    assert_eq!(created.price, Price::from_rupees(1_450_000));
    assert_eq!(created.known_category(), Some(Category::Suv));

    let state = market.listings();
    assert!(state.success);
    assert_eq!(state.data.my_listings.len(), 3);
    assert_eq!(state.data.my_listings[0].listing_id, created.listing_id);

    let stored = api.listing(created.listing_id.as_str()).unwrap();
    assert_eq!(stored["price"], json!(1_450_000));
    assert_eq!(stored["category"], json!("suv"));

    market.clear_listings_success();
    assert!(!market.listings().success);
}

#[tokio::test]
async fn test_cheap_listing_is_blocked_before_the_network() {
    let api = MockApi::spawn().await;
    let market = signed_in(&api, ASHA_EMAIL).await;
    let before = api.requests().len();

    let form = ListingForm {
        price: "500".to_owned(),
        ..swift_form()
    };
    let err = market.create_listing(&form).await.unwrap_err();
    assert_eq!(
        err.validation().and_then(|e| e.get("price")),
        Some("Price must be at least ₹1,000")
    );
    assert_eq!(api.requests().len(), before);
}

#[tokio::test]
async fn test_wizard_submission() {
    let api = MockApi::spawn().await;
    let market = signed_in(&api, ASHA_EMAIL).await;

    let mut wizard = ListingWizard::default();
    assert!(wizard.next().is_err());
    *wizard.form_mut() = ListingForm {
        images: Vec::new(),
        ..swift_form()
    };
    assert_eq!(wizard.next().unwrap(), WizardStep::PriceAndLocation);
    assert_eq!(wizard.next().unwrap(), WizardStep::Photos);
    assert!(market.submit_wizard(&wizard).await.is_err());

    wizard.add_image();
    assert!(wizard.update_image(0, "https://img.example.com/creta-side.jpg"));
    let created = market.submit_wizard(&wizard).await.unwrap();
    assert_eq!(created.images, vec!["https://img.example.com/creta-side.jpg"]);
}

#[tokio::test]
async fn test_detail_and_not_found() {
    let api = MockApi::spawn().await;
    let market = api.marketplace(
        Arc::new(MemoryTokenStore::new()),
        SettlementPolicy::LastSettledWins,
    );
    let first = market.fetch_listings(&ListingFilters::default()).await.unwrap()[0].clone();

    market.fetch_listing(&first.listing_id).await.unwrap();
    assert_eq!(
        DetailView::from_state(&market.listings()),
        DetailView::Found(first.clone())
    );

    market.clear_current_listing();
    market
        .fetch_listing(&ListingId::new("does-not-exist"))
        .await
        .unwrap_err();
    assert_eq!(
        DetailView::from_state(&market.listings()),
        DetailView::NotFound("Listing not found".to_owned())
    );
}

#[tokio::test]
async fn test_update_and_delete_do_not_patch_local_lists() {
    let api = MockApi::spawn().await;
    let market = signed_in(&api, RAVI_EMAIL).await;
    let mine = market.fetch_my_listings().await.unwrap();
    let target = mine[0].listing_id.clone();

    let update = ListingUpdate {
        availability: Some(Availability::Sold),
        ..ListingUpdate::default()
    };
    market.update_listing(&target, &update).await.unwrap();
    assert_eq!(api.listing(target.as_str()).unwrap()["availability"], json!("sold"));
    assert_eq!(market.listings().data.my_listings, mine);

    market.delete_listing(&target).await.unwrap();
    assert!(api.listing(target.as_str()).is_none());
    assert_eq!(market.listings().data.my_listings.len(), 2);

    let refreshed = market.fetch_my_listings().await.unwrap();
    assert_eq!(refreshed.len(), 1);
}

#[tokio::test]
async fn test_cannot_delete_someone_elses_listing() {
    let api = MockApi::spawn().await;
    let ravi = signed_in(&api, RAVI_EMAIL).await;
    let target = ravi.fetch_my_listings().await.unwrap()[0].listing_id.clone();

    let asha = signed_in(&api, ASHA_EMAIL).await;
    let err = asha.delete_listing(&target).await.unwrap_err();
    assert_eq!(err.to_string(), "You can only delete your own listings");
    assert_eq!(
        asha.listings().error.as_deref(),
        Some("You can only delete your own listings")
    );
    assert!(api.listing(target.as_str()).is_some());
}

#[tokio::test]
async fn test_profile_fetch_and_update() {
    let api = MockApi::spawn().await;
    let market = signed_in(&api, ASHA_EMAIL).await;

    let profile = market.fetch_profile().await.unwrap();
    assert_eq!(profile.full_name.as_deref(), Some("Asha Rao"));
    assert!(!profile.is_complete());

    let update = ProfileUpdate {
        country: Some("India".to_owned()),
        ..ProfileUpdate::default()
    };
    market.update_profile(&update).await.unwrap();
    assert_eq!(market.profile().data.profile, Some(profile));

    let refreshed = market.fetch_profile().await.unwrap();
    assert!(refreshed.is_complete());
    assert_eq!(refreshed.location().as_deref(), Some("Pune, India"));
}

#[tokio::test]
async fn test_profile_failure_then_clear_error() {
    let api = MockApi::spawn().await;
    let market = signed_in(&api, ASHA_EMAIL).await;
    api.fail_next(
        "GET /api/users/profile",
        StatusCode::INTERNAL_SERVER_ERROR,
        json!(null),
    );

    let err = market.fetch_profile().await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to fetch profile");
    assert_eq!(
        market.profile().error.as_deref(),
        Some("Failed to fetch profile")
    );

    market.clear_profile_error();
    let state = market.profile();
    assert_eq!(state.error, None);
    assert!(!state.loading);
}

#[tokio::test]
async fn test_upload_auth_requires_session() {
    let api = MockApi::spawn().await;
    let anonymous = api.marketplace(
        Arc::new(MemoryTokenStore::new()),
        SettlementPolicy::LastSettledWins,
    );
    let err = anonymous.fetch_upload_auth().await.unwrap_err();
    assert!(matches!(
        err,
        c2c_client::MarketplaceError::Client(ref e) if e.is_unauthorized()
    ));

    let market = signed_in(&api, ASHA_EMAIL).await;
    let auth = market.fetch_upload_auth().await.unwrap();
    assert!(!auth.signature.is_empty());
    assert!(!auth.is_expired_at(1_700_000_000));
    assert_eq!(market.listings(), c2c_core::RequestState::default());
}
