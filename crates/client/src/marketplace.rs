//! The marketplace facade.
//!
//! Owns the store, the API client and the token storage, and exposes one
//! method per user action. Forms are validated before anything touches the
//! network or the store.

use std::sync::Arc;

use c2c_core::state::{AuthPayload, ListingsData, ListingsPayload, ProfileData, ProfilePayload};
use c2c_core::validation::{ListingForm, ListingWizard, LoginForm, RegisterForm, validate_update};
use c2c_core::{
    AuthResponse, AuthToken, GuardDecision, ListingFilters, ListingId, ListingRecord,
    ListingUpdate, NewListing, Profile, ProfileUpdate, RequestState, Route, Session, UploadAuth,
    UserRecord, ValidationErrors,
};
use thiserror::Error;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::dispatch::{DispatchError, Operation, dispatch};
use crate::error::{ApiError, ErrorMessageMapping};
use crate::storage::{FileTokenStore, TokenStore, TokenStoreError};
use crate::store::{SettlementPolicy, Store};

/// Errors returned by marketplace actions.
#[derive(Debug, Error)]
pub enum MarketplaceError {
    /// The form was rejected locally; no request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The request failed; the message is also in the slice's `error`.
    #[error(transparent)]
    Request(#[from] DispatchError),

    #[error("Token storage error: {0}")]
    Storage(#[from] TokenStoreError),

    /// A request that bypasses the store failed.
    #[error(transparent)]
    Client(#[from] ApiError),
}

impl MarketplaceError {
    /// Per-field failures, if this was a validation error.
    #[must_use]
    pub const fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Client-side state and actions for the C2C Cars marketplace.
pub struct Marketplace {
    api: ApiClient,
    store: Store,
    tokens: Arc<dyn TokenStore>,
    messages: ErrorMessageMapping,
    /// Held while a session restore runs, so concurrent callers wait for it.
    restoring: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for Marketplace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marketplace")
            .field("api", &self.api)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl Marketplace {
    /// Build a marketplace client with the token persisted to the configured
    /// file.
    ///
    /// # Errors
    ///
    /// Returns `MarketplaceError::Client` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, MarketplaceError> {
        let api = ApiClient::new(config)?;
        Ok(Self::with_parts(
            api,
            Arc::new(FileTokenStore::new(&config.token_file)),
            config.error_messages.clone(),
            config.settlement_policy,
        ))
    }

    /// Assemble a marketplace client from its collaborators.
    #[must_use]
    pub fn with_parts(
        api: ApiClient,
        tokens: Arc<dyn TokenStore>,
        messages: ErrorMessageMapping,
        policy: SettlementPolicy,
    ) -> Self {
        tracing::debug!(api = %api.base_url(), %policy, "Marketplace client ready");
        Self {
            api,
            store: Store::new(policy),
            tokens,
            messages,
            restoring: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn auth(&self) -> RequestState<Session> {
        self.store.auth.snapshot()
    }

    #[must_use]
    pub fn listings(&self) -> RequestState<ListingsData> {
        self.store.listings.snapshot()
    }

    #[must_use]
    pub fn profile(&self) -> RequestState<ProfileData> {
        self.store.profile.snapshot()
    }

    /// What to render for `route` given the current session.
    #[must_use]
    pub fn guard(&self, route: &Route) -> GuardDecision {
        self.store.auth.read(|state| route.decide(&state.data))
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Restore the session from the persisted token, once per process.
    ///
    /// A token the server rejects (401/403) is discarded. Any other failure
    /// keeps the token for the next run and is returned after the session is
    /// marked initialized.
    ///
    /// # Errors
    ///
    /// Returns `MarketplaceError::Request` if restoring failed for a reason
    /// other than a rejected token, or `MarketplaceError::Storage` if a
    /// rejected token cannot be removed.
    pub async fn initialize_auth(&self) -> Result<(), MarketplaceError> {
        if self.is_initialized() {
            return Ok(());
        }
        let _restoring = self.restoring.lock().await;
        if self.is_initialized() {
            return Ok(());
        }

        let token = match self.tokens.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read persisted session token");
                None
            }
        };
        let Some(token) = token else {
            self.mark_initialized();
            return Ok(());
        };

        self.api.set_token(token.expose()).await;
        let result = dispatch(
            &self.store.auth,
            Operation::RestoreSession,
            &self.messages,
            self.api.fetch_profile(),
            |profile: &Profile| AuthPayload::SignedIn {
                user: profile.to_user(),
                token: token.clone(),
            },
        )
        .await;

        let outcome = match result {
            Ok(_) => Ok(()),
            Err(e) if e.is_unauthorized() => {
                tracing::info!("Persisted session token was rejected, signing out");
                self.api.clear_token().await;
                self.store.auth.update(|state| {
                    state.data.sign_out();
                    state.clear_error();
                });
                self.tokens.clear().map_err(MarketplaceError::from)
            }
            Err(e) => Err(e.into()),
        };

        self.mark_initialized();
        outcome
    }

    fn is_initialized(&self) -> bool {
        self.store.auth.read(|state| state.data.initialized())
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `MarketplaceError::Validation` if the form is invalid (nothing
    /// is sent), or `MarketplaceError::Request` if the server rejects it.
    pub async fn login(&self, form: &LoginForm) -> Result<UserRecord, MarketplaceError> {
        let valid = form.validate()?;
        let response = dispatch(
            &self.store.auth,
            Operation::Login,
            &self.messages,
            self.api.login(&valid.email, &valid.password),
            signed_in,
        )
        .await?;

        self.persist_token(&response.token).await;
        self.mark_initialized();
        Ok(response.user)
    }

    /// Create an account and sign in with it.
    ///
    /// # Errors
    ///
    /// Returns `MarketplaceError::Validation` if the form is invalid (nothing
    /// is sent), or `MarketplaceError::Request` if the server rejects it.
    pub async fn register(&self, form: &RegisterForm) -> Result<UserRecord, MarketplaceError> {
        let valid = form.validate()?;
        let response = dispatch(
            &self.store.auth,
            Operation::Register,
            &self.messages,
            self.api
                .register(&valid.full_name, &valid.email, &valid.password),
            signed_in,
        )
        .await?;

        self.persist_token(&response.token).await;
        self.mark_initialized();
        Ok(response.user)
    }

    /// Sign out.
    ///
    /// The server is told first, but the local session and the persisted
    /// token are cleared whether or not it answers.
    ///
    /// # Errors
    ///
    /// Returns `MarketplaceError::Storage` if the persisted token cannot be
    /// removed.
    pub async fn logout(&self) -> Result<(), MarketplaceError> {
        let result = dispatch(
            &self.store.auth,
            Operation::Logout,
            &self.messages,
            self.api.logout(),
            |_: &()| AuthPayload::SignedOut,
        )
        .await;
        if let Err(e) = result {
            tracing::warn!(error = %e, "Server logout failed, signing out locally");
        }

        self.store.auth.update(|state| {
            state.data.sign_out();
            state.clear_error();
        });
        self.api.clear_token().await;
        self.tokens.clear()?;
        Ok(())
    }

    pub fn clear_auth_error(&self) {
        self.store.auth.clear_error();
    }

    async fn persist_token(&self, token: &AuthToken) {
        self.api.set_token(token.expose()).await;
        if let Err(e) = self.tokens.save(token) {
            tracing::warn!(error = %e, "Could not persist session token");
        }
    }

    fn mark_initialized(&self) {
        if self.store.auth.update(|state| state.data.mark_initialized()) {
            tracing::debug!("Session initialized");
        }
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// Validate `form` and publish it as a new listing.
    ///
    /// # Errors
    ///
    /// Returns `MarketplaceError::Validation` if the form is invalid (nothing
    /// is sent), or `MarketplaceError::Request` if the server rejects it.
    pub async fn create_listing(&self, form: &ListingForm) -> Result<ListingRecord, MarketplaceError> {
        let listing = form.validate()?;
        self.publish(&listing).await
    }

    /// Submit a completed sell wizard.
    ///
    /// # Errors
    ///
    /// Same as [`Marketplace::create_listing`].
    pub async fn submit_wizard(&self, wizard: &ListingWizard) -> Result<ListingRecord, MarketplaceError> {
        let listing = wizard.submit()?;
        self.publish(&listing).await
    }

    async fn publish(&self, listing: &NewListing) -> Result<ListingRecord, MarketplaceError> {
        Ok(dispatch(
            &self.store.listings,
            Operation::CreateListing,
            &self.messages,
            self.api.create_listing(listing),
            |created: &ListingRecord| ListingsPayload::Created(created.clone()),
        )
        .await?)
    }

    /// Browse listings matching `filters`.
    ///
    /// # Errors
    ///
    /// Returns `MarketplaceError::Request` if the request fails.
    pub async fn fetch_listings(
        &self,
        filters: &ListingFilters,
    ) -> Result<Vec<ListingRecord>, MarketplaceError> {
        Ok(dispatch(
            &self.store.listings,
            Operation::FetchListings,
            &self.messages,
            self.api.fetch_listings(filters),
            |listings: &Vec<ListingRecord>| ListingsPayload::All(listings.clone()),
        )
        .await?)
    }

    /// Load one listing as the current listing.
    ///
    /// # Errors
    ///
    /// Returns `MarketplaceError::Request` if the request fails.
    pub async fn fetch_listing(&self, id: &ListingId) -> Result<ListingRecord, MarketplaceError> {
        Ok(dispatch(
            &self.store.listings,
            Operation::FetchListing,
            &self.messages,
            self.api.fetch_listing(id),
            |listing: &ListingRecord| ListingsPayload::Detail(listing.clone()),
        )
        .await?)
    }

    /// Load the signed-in user's listings.
    ///
    /// # Errors
    ///
    /// Returns `MarketplaceError::Request` if the request fails.
    pub async fn fetch_my_listings(&self) -> Result<Vec<ListingRecord>, MarketplaceError> {
        Ok(dispatch(
            &self.store.listings,
            Operation::FetchMyListings,
            &self.messages,
            self.api.fetch_my_listings(),
            |listings: &Vec<ListingRecord>| ListingsPayload::Mine(listings.clone()),
        )
        .await?)
    }

    /// Change some fields of a listing. Local lists are not patched; fetch
    /// them again to see the change.
    ///
    /// # Errors
    ///
    /// Returns `MarketplaceError::Validation` for an empty or invalid update,
    /// or `MarketplaceError::Request` if the server rejects it.
    pub async fn update_listing(
        &self,
        id: &ListingId,
        update: &ListingUpdate,
    ) -> Result<(), MarketplaceError> {
        validate_update(update)?;
        Ok(dispatch(
            &self.store.listings,
            Operation::UpdateListing,
            &self.messages,
            self.api.update_listing(id, update),
            acknowledged_listing,
        )
        .await?)
    }

    /// Delete a listing. Local lists are not patched.
    ///
    /// # Errors
    ///
    /// Returns `MarketplaceError::Request` if the request fails.
    pub async fn delete_listing(&self, id: &ListingId) -> Result<(), MarketplaceError> {
        Ok(dispatch(
            &self.store.listings,
            Operation::DeleteListing,
            &self.messages,
            self.api.delete_listing(id),
            acknowledged_listing,
        )
        .await?)
    }

    pub fn clear_listings_error(&self) {
        self.store.listings.clear_error();
    }

    pub fn clear_listings_success(&self) {
        self.store.listings.clear_success();
    }

    pub fn clear_current_listing(&self) {
        self.store
            .listings
            .update(|state| state.data.clear_current_listing());
    }

    /// Show `listing` on the detail screen without fetching it.
    pub fn set_current_listing(&self, listing: ListingRecord) {
        self.store
            .listings
            .update(|state| state.data.set_current_listing(listing));
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Load the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `MarketplaceError::Request` if the request fails.
    pub async fn fetch_profile(&self) -> Result<Profile, MarketplaceError> {
        Ok(dispatch(
            &self.store.profile,
            Operation::FetchProfile,
            &self.messages,
            self.api.fetch_profile(),
            |profile: &Profile| ProfilePayload::Fetched(profile.clone()),
        )
        .await?)
    }

    /// Change some profile fields.
    ///
    /// # Errors
    ///
    /// Returns `MarketplaceError::Request` if the request fails.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), MarketplaceError> {
        Ok(dispatch(
            &self.store.profile,
            Operation::UpdateProfile,
            &self.messages,
            self.api.update_profile(update),
            |_: &()| ProfilePayload::Acknowledged,
        )
        .await?)
    }

    pub fn clear_profile_error(&self) {
        self.store.profile.clear_error();
    }

    // =========================================================================
    // Uploads
    // =========================================================================

    /// Credentials for the hosted image-upload widget. Not tracked in the
    /// store.
    ///
    /// # Errors
    ///
    /// Returns `MarketplaceError::Client` if the request fails.
    pub async fn fetch_upload_auth(&self) -> Result<UploadAuth, MarketplaceError> {
        Ok(self.api.fetch_upload_auth().await?)
    }
}

fn signed_in(response: &AuthResponse) -> AuthPayload {
    AuthPayload::SignedIn {
        user: response.user.clone(),
        token: response.token.clone(),
    }
}

const fn acknowledged_listing(_: &()) -> ListingsPayload {
    ListingsPayload::Acknowledged
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryTokenStore;

    /// Marketplace pointed at a port nothing listens on, so any request that
    /// does get sent fails fast.
    fn offline(tokens: Arc<dyn TokenStore>) -> Marketplace {
        let config = ClientConfig::new("http://127.0.0.1:9/api".parse().unwrap());
        Marketplace::with_parts(
            ApiClient::new(&config).unwrap(),
            tokens,
            ErrorMessageMapping::default(),
            SettlementPolicy::LastSettledWins,
        )
    }

    #[tokio::test]
    async fn test_invalid_login_never_starts_a_request() {
        let market = offline(Arc::new(MemoryTokenStore::new()));
        let err = market
            .login(&LoginForm::new("a@b.com", "short"))
            .await
            .unwrap_err();

        let errors = err.validation().unwrap();
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 8 characters")
        );
        let auth = market.auth();
        assert!(!auth.loading);
        assert_eq!(auth.error, None);
        assert!(!auth.data.initialized());
    }

    #[tokio::test]
    async fn test_cheap_listing_is_blocked_locally() {
        let market = offline(Arc::new(MemoryTokenStore::new()));
        let form = ListingForm {
            title: "Hyundai i20 Asta 2018".to_owned(),
            description: "Single owner, full service history".to_owned(),
            category: "cars".to_owned(),
            price: "500".to_owned(),
            city: "Kochi".to_owned(),
            images: vec!["https://img.example.com/i20.jpg".to_owned()],
        };

        let err = market.create_listing(&form).await.unwrap_err();
        assert_eq!(
            err.validation().unwrap().get("price"),
            Some("Price must be at least ₹1,000")
        );
        assert!(!market.listings().loading);
    }

    #[tokio::test]
    async fn test_initialize_without_token_latches() {
        let market = offline(Arc::new(MemoryTokenStore::new()));
        assert_eq!(market.guard(&Route::Sell), GuardDecision::Loading);

        market.initialize_auth().await.unwrap();
        assert!(market.auth().data.initialized());
        assert!(matches!(
            market.guard(&Route::Sell),
            GuardDecision::RedirectToLogin { .. }
        ));
        assert_eq!(market.guard(&Route::Listings), GuardDecision::Allow);
    }

    #[tokio::test]
    async fn test_initialize_keeps_token_when_server_unreachable() {
        let tokens = Arc::new(MemoryTokenStore::with_token(AuthToken::new("kept")));
        let market = offline(tokens.clone());

        let err = market.initialize_auth().await.unwrap_err();
        assert!(matches!(err, MarketplaceError::Request(_)));

        let auth = market.auth();
        assert!(auth.data.initialized());
        assert!(!auth.data.is_authenticated());
        assert_eq!(auth.error.as_deref(), Some("Failed to restore session"));
        assert!(tokens.load().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_logout_clears_everything_when_server_unreachable() {
        let tokens = Arc::new(MemoryTokenStore::with_token(AuthToken::new("stale")));
        let market = offline(tokens.clone());
        market.api().set_token("stale").await;

        market.logout().await.unwrap();

        let auth = market.auth();
        assert_eq!(auth.data.user(), None);
        assert_eq!(auth.data.token(), None);
        assert!(!auth.data.is_authenticated());
        assert!(!auth.loading);
        assert!(tokens.load().unwrap().is_none());
        assert!(!market.api().has_token().await);
    }

    #[tokio::test]
    async fn test_empty_update_is_rejected_locally() {
        let market = offline(Arc::new(MemoryTokenStore::new()));
        let err = market
            .update_listing(&ListingId::new("1"), &ListingUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.validation().unwrap().get("update"), Some("Nothing to update"));
    }
}
