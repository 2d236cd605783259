//! Marketplace REST API client.
//!
//! Thin typed wrapper over the JSON endpoints. It knows nothing about the
//! request-state store; [`crate::Marketplace`] decides what a response
//! means for the UI.

mod wire;

use std::sync::Arc;

use c2c_core::{
    AuthResponse, Email, ListingFilters, ListingId, ListingRecord, ListingUpdate, NewListing,
    Profile, ProfileUpdate, UploadAuth,
};
use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::instrument;
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;

use wire::{ListingEnvelope, ListingsEnvelope, ProfileEnvelope};

/// Longest response body excerpt written to the log on failure.
const LOGGED_BODY_LIMIT: usize = 500;

/// Marketplace API client.
///
/// Cheap to clone; clones share the connection pool and the bearer token.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    /// Bearer token attached to every request while set.
    token: RwLock<Option<SecretString>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignupBody<'a> {
    full_name: &'a str,
    email: &'a str,
    password: &'a str,
}

impl ApiClient {
    /// Create a client for the configured API.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_base_url.clone(),
                token: RwLock::new(None),
            }),
        })
    }

    /// The API base URL endpoints are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // =========================================================================
    // Bearer token
    // =========================================================================

    /// Attach `token` to subsequent requests.
    pub async fn set_token(&self, token: &str) {
        *self.inner.token.write().await = Some(SecretString::from(token.to_owned()));
    }

    /// Stop attaching a token.
    pub async fn clear_token(&self) {
        *self.inner.token.write().await = None;
    }

    /// Whether a token is currently attached.
    pub async fn has_token(&self) -> bool {
        self.inner.token.read().await.is_some()
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// `POST /auth/login`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, a non-success status, or an
    /// unexpected response body.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &str) -> Result<AuthResponse, ApiError> {
        let body = LoginBody {
            email: email.as_str(),
            password,
        };
        let request = self.inner.client.post(self.endpoint(&["auth", "login"])?);
        self.send_json(request.json(&body)).await
    }

    /// `POST /auth/signup`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, a non-success status, or an
    /// unexpected response body.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        full_name: &str,
        email: &Email,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let body = SignupBody {
            full_name,
            email: email.as_str(),
            password,
        };
        let request = self.inner.client.post(self.endpoint(&["auth", "signup"])?);
        self.send_json(request.json(&body)).await
    }

    /// `POST /auth/logout`. The response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        let request = self.inner.client.post(self.endpoint(&["auth", "logout"])?);
        self.send(request).await.map(drop)
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// `POST /listings/create`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, a non-success status, or an
    /// unexpected response body.
    #[instrument(skip(self, listing), fields(title = %listing.title))]
    pub async fn create_listing(&self, listing: &NewListing) -> Result<ListingRecord, ApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint(&["listings", "create"])?);
        let envelope: ListingEnvelope = self.send_json(request.json(listing)).await?;
        Ok(envelope.into_inner())
    }

    /// `GET /listings` with the given filters as query parameters.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, a non-success status, or an
    /// unexpected response body.
    #[instrument(skip(self, filters))]
    pub async fn fetch_listings(
        &self,
        filters: &ListingFilters,
    ) -> Result<Vec<ListingRecord>, ApiError> {
        let mut url = self.endpoint(&["listings"])?;
        let pairs = filters.to_query_pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        let envelope: ListingsEnvelope = self.send_json(self.inner.client.get(url)).await?;
        Ok(envelope.into_inner())
    }

    /// `GET /listings/:id`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, a non-success status, or an
    /// unexpected response body.
    #[instrument(skip(self), fields(listing_id = %id))]
    pub async fn fetch_listing(&self, id: &ListingId) -> Result<ListingRecord, ApiError> {
        let request = self
            .inner
            .client
            .get(self.endpoint(&["listings", id.as_str()])?);
        let envelope: ListingEnvelope = self.send_json(request).await?;
        Ok(envelope.into_inner())
    }

    /// `GET /listings/my-list`. Requires a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, a non-success status, or an
    /// unexpected response body.
    #[instrument(skip(self))]
    pub async fn fetch_my_listings(&self) -> Result<Vec<ListingRecord>, ApiError> {
        let request = self
            .inner
            .client
            .get(self.endpoint(&["listings", "my-list"])?);
        let envelope: ListingsEnvelope = self.send_json(request).await?;
        Ok(envelope.into_inner())
    }

    /// `PUT /listings/:id`. The response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    #[instrument(skip(self, update), fields(listing_id = %id))]
    pub async fn update_listing(&self, id: &ListingId, update: &ListingUpdate) -> Result<(), ApiError> {
        let request = self
            .inner
            .client
            .put(self.endpoint(&["listings", id.as_str()])?);
        self.send(request.json(update)).await.map(drop)
    }

    /// `DELETE /listings/:id`. The response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    #[instrument(skip(self), fields(listing_id = %id))]
    pub async fn delete_listing(&self, id: &ListingId) -> Result<(), ApiError> {
        let request = self
            .inner
            .client
            .delete(self.endpoint(&["listings", id.as_str()])?);
        self.send(request).await.map(drop)
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// `GET /users/profile`. Requires a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, a non-success status, or an
    /// unexpected response body.
    #[instrument(skip(self))]
    pub async fn fetch_profile(&self) -> Result<Profile, ApiError> {
        let request = self
            .inner
            .client
            .get(self.endpoint(&["users", "profile"])?);
        let envelope: ProfileEnvelope = self.send_json(request).await?;
        Ok(envelope.into_inner())
    }

    /// `PUT /users/profile`. The response body is ignored.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError> {
        let request = self
            .inner
            .client
            .put(self.endpoint(&["users", "profile"])?);
        self.send(request.json(update)).await.map(drop)
    }

    // =========================================================================
    // Uploads
    // =========================================================================

    /// `GET /upload/auth`: the signature triple the hosted image-upload
    /// widget needs.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure, a non-success status, or an
    /// unexpected response body.
    #[instrument(skip(self))]
    pub async fn fetch_upload_auth(&self) -> Result<UploadAuth, ApiError> {
        let request = self
            .inner
            .client
            .get(self.endpoint(&["upload", "auth"])?);
        self.send_json(request).await
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    /// Resolve `segments` below the base URL, escaping each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send `request` with the bearer token attached and return the body of a
    /// successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let request = match self.inner.token.read().await.as_ref() {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %truncate(&body),
                "Marketplace API returned non-success status"
            );
            return Err(ApiError::Status { status, body });
        }

        Ok(body)
    }
}

/// First [`LOGGED_BODY_LIMIT`] characters of `body`.
fn truncate(body: &str) -> &str {
    body.char_indices()
        .nth(LOGGED_BODY_LIMIT)
        .map_or(body, |(end, _)| body.get(..end).unwrap_or(body))
}
