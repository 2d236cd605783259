//! Integration tests for the C2C Cars client.
//!
//! [`MockApi::spawn`] starts an in-memory imitation of the marketplace API on
//! an ephemeral port. Tests drive a real [`Marketplace`] against it, so the
//! HTTP client, the dispatcher and the store are exercised together.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p c2c-integration-tests
//! ```
//!
//! # Seed Data
//!
//! - `asha@example.com` / `Secret123` - Asha Rao, Pune, no listings
//! - `ravi@example.com` / `Secret123` - Ravi Kumar, two listings

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use c2c_client::{
    ApiClient, ClientConfig, ErrorMessageMapping, Marketplace, SettlementPolicy, TokenStore,
};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

pub const ASHA_EMAIL: &str = "asha@example.com";
pub const RAVI_EMAIL: &str = "ravi@example.com";
pub const SEED_PASSWORD: &str = "Secret123";

/// Endpoint key used for request logs and failure injection.
pub const MY_LISTINGS: &str = "GET /api/listings/my-list";

type Shared = Arc<Mutex<MockState>>;

#[derive(Debug, Clone)]
struct MockUser {
    id: u64,
    full_name: String,
    email: String,
    password: String,
    city: Option<String>,
    country: Option<String>,
    profile_image: Option<String>,
}

impl MockUser {
    fn user_json(&self) -> Value {
        json!({ "id": self.id, "fullName": self.full_name, "email": self.email })
    }

    fn profile_json(&self) -> Value {
        json!({
            "user_id": self.id,
            "full_name": self.full_name,
            "email": self.email,
            "city": self.city,
            "country": self.country,
            "profile_image": self.profile_image,
        })
    }
}

#[derive(Debug, Clone)]
struct MockListing {
    owner: u64,
    record: Value,
}

/// Everything the mock server knows.
#[derive(Debug, Default)]
pub struct MockState {
    users: Vec<MockUser>,
    sessions: HashMap<String, u64>,
    listings: Vec<MockListing>,
    next_id: u64,
    requests: Vec<String>,
    failures: HashMap<String, (StatusCode, Value)>,
    delays: HashMap<String, VecDeque<Duration>>,
}

impl MockState {
    fn seeded() -> Self {
        let mut state = Self {
            next_id: 100,
            ..Self::default()
        };
        state.users.push(MockUser {
            id: 1,
            full_name: "Asha Rao".to_owned(),
            email: ASHA_EMAIL.to_owned(),
            password: SEED_PASSWORD.to_owned(),
            city: Some("Pune".to_owned()),
            country: None,
            profile_image: None,
        });
        state.users.push(MockUser {
            id: 2,
            full_name: "Ravi Kumar".to_owned(),
            email: RAVI_EMAIL.to_owned(),
            password: SEED_PASSWORD.to_owned(),
            city: Some("Jaipur".to_owned()),
            country: Some("India".to_owned()),
            profile_image: None,
        });
        state.insert_listing(
            2,
            json!({
                "title": "Maruti Swift VXi 2019",
                "description": "Petrol, 41,000 km, single owner, insurance valid",
                "category": "cars",
                "price": 450_000,
                "city": "Pune",
                "images": ["https://img.example.com/swift.jpg"],
            }),
        );
        state.insert_listing(
            2,
            json!({
                "title": "Royal Enfield Classic 350",
                "description": "2021 model, 12,000 km, serviced at the dealer",
                "category": "bikes",
                "price": 160_000,
                "city": "Jaipur",
                "images": ["https://img.example.com/classic.jpg"],
                "availability": "sold",
            }),
        );
        state
    }

    fn insert_listing(&mut self, owner: u64, mut record: Value) -> Value {
        self.next_id += 1;
        let full_name = self
            .users
            .iter()
            .find(|u| u.id == owner)
            .map(|u| u.full_name.clone());
        if let Some(fields) = record.as_object_mut() {
            fields.insert("listing_id".to_owned(), json!(self.next_id.to_string()));
            fields.insert("full_name".to_owned(), json!(full_name));
            fields
                .entry("availability")
                .or_insert_with(|| json!("available"));
            fields
                .entry("created_at")
                .or_insert_with(|| json!("2024-11-02T09:30:00Z"));
        }
        self.listings.push(MockListing {
            owner,
            record: record.clone(),
        });
        record
    }

    fn user_for(&self, headers: &HeaderMap) -> Option<&MockUser> {
        let token = headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        let id = self.sessions.get(token)?;
        self.users.iter().find(|u| u.id == *id)
    }

    fn issue_token(&mut self, user_id: u64) -> String {
        let token = format!("tok-{}", uuid::Uuid::new_v4());
        self.sessions.insert(token.clone(), user_id);
        token
    }
}

/// A running mock marketplace API.
#[derive(Debug, Clone)]
pub struct MockApi {
    addr: SocketAddr,
    state: Shared,
}

impl MockApi {
    /// Start the mock server on `127.0.0.1` with the seed data.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState::seeded()));
        let app = router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock API listener");
        let addr = listener
            .local_addr()
            .expect("Failed to read mock API address");
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                panic!("mock API stopped: {e}");
            }
        });

        Self { addr, state }
    }

    /// `http://127.0.0.1:<port>/api`.
    ///
    /// # Panics
    ///
    /// Never in practice; the address always forms a valid URL.
    #[must_use]
    pub fn base_url(&self) -> Url {
        format!("http://{}/api", self.addr)
            .parse()
            .expect("mock API URL is valid")
    }

    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url())
    }

    /// A marketplace client talking to this server.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn marketplace(&self, tokens: Arc<dyn TokenStore>, policy: SettlementPolicy) -> Marketplace {
        let api = ApiClient::new(&self.config()).expect("Failed to build API client");
        Marketplace::with_parts(api, tokens, ErrorMessageMapping::default(), policy)
    }

    /// Requests served so far, as `"METHOD /path"`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.state.lock().requests.clone()
    }

    /// How many times `endpoint` (`"METHOD /path"`) was served.
    #[must_use]
    pub fn count(&self, endpoint: &str) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| *r == endpoint)
            .count()
    }

    /// Answer the next request to `endpoint` with `status` and `body`
    /// instead of handling it.
    pub fn fail_next(&self, endpoint: &str, status: StatusCode, body: Value) {
        self.state
            .lock()
            .failures
            .insert(endpoint.to_owned(), (status, body));
    }

    /// Hold the response of the next request to `endpoint` for `delay` after
    /// it has been computed.
    pub fn delay_next(&self, endpoint: &str, delay: Duration) {
        self.state
            .lock()
            .delays
            .entry(endpoint.to_owned())
            .or_default()
            .push_back(delay);
    }

    /// Add a listing owned by the user with `email`, bypassing the API.
    ///
    /// # Panics
    ///
    /// Panics if no such user exists.
    pub fn insert_listing(&self, email: &str, record: Value) -> Value {
        let mut state = self.state.lock();
        let owner = state
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.id)
            .expect("unknown seed user");
        state.insert_listing(owner, record)
    }

    /// A token the server accepts for `email`, as if issued by an earlier
    /// login.
    ///
    /// # Panics
    ///
    /// Panics if no such user exists.
    #[must_use]
    pub fn session_for(&self, email: &str) -> String {
        let mut state = self.state.lock();
        let id = state
            .users
            .iter()
            .find(|u| u.email == email)
            .map(|u| u.id)
            .expect("unknown seed user");
        state.issue_token(id)
    }

    /// Whether the server still accepts `token`.
    #[must_use]
    pub fn is_session_active(&self, token: &str) -> bool {
        self.state.lock().sessions.contains_key(token)
    }

    /// Stored record of the listing with `id`.
    #[must_use]
    pub fn listing(&self, id: &str) -> Option<Value> {
        self.state
            .lock()
            .listings
            .iter()
            .find(|l| l.record["listing_id"] == id)
            .map(|l| l.record.clone())
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/logout", post(logout))
        .route("/api/listings", get(list_listings))
        .route("/api/listings/create", post(create_listing))
        .route("/api/listings/my-list", get(my_listings))
        .route(
            "/api/listings/{id}",
            get(listing_detail).put(update_listing).delete(delete_listing),
        )
        .route("/api/users/profile", get(profile).put(update_profile))
        .route("/api/upload/auth", get(upload_auth))
        .layer(middleware::from_fn_with_state(state.clone(), record_and_inject))
        .with_state(state)
}

/// Logs every request and applies injected failures and delays.
async fn record_and_inject(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let endpoint = format!("{} {}", request.method(), request.uri().path());

    let failure = state.lock().failures.remove(&endpoint);
    if let Some((status, body)) = failure {
        state.lock().requests.push(endpoint);
        return (status, Json(body)).into_response();
    }

    let response = next.run(request).await;

    let delay = {
        let mut state = state.lock();
        state.requests.push(endpoint.clone());
        state
            .delays
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front)
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    response
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

fn unauthorized() -> Response {
    message(StatusCode::UNAUTHORIZED, "Not authorized, token failed")
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignupBody {
    full_name: String,
    email: String,
    password: String,
}

async fn login(State(state): State<Shared>, Json(body): Json<LoginBody>) -> Response {
    let mut state = state.lock();
    let Some(user) = state
        .users
        .iter()
        .find(|u| u.email == body.email && u.password == body.password)
        .cloned()
    else {
        return message(StatusCode::UNAUTHORIZED, "Invalid email or password");
    };
    let token = state.issue_token(user.id);
    Json(json!({ "user": user.user_json(), "token": token })).into_response()
}

async fn signup(State(state): State<Shared>, Json(body): Json<SignupBody>) -> Response {
    let mut state = state.lock();
    if state.users.iter().any(|u| u.email == body.email) {
        return message(StatusCode::CONFLICT, "Email already registered");
    }
    let user = MockUser {
        id: state.users.len() as u64 + 1,
        full_name: body.full_name,
        email: body.email,
        password: body.password,
        city: None,
        country: None,
        profile_image: None,
    };
    let token = state.issue_token(user.id);
    let payload = json!({ "user": user.user_json(), "token": token });
    state.users.push(user);
    (StatusCode::CREATED, Json(payload)).into_response()
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        state.lock().sessions.remove(token);
    }
    message(StatusCode::OK, "Logged out")
}

// =============================================================================
// Listings
// =============================================================================

async fn list_listings(
    State(state): State<Shared>,
    Query(filters): Query<HashMap<String, String>>,
) -> Response {
    let state = state.lock();
    let matches = |record: &Value| {
        let text = |key: &str| record[key].as_str().unwrap_or_default().to_lowercase();
        let price = record["price"].as_i64().unwrap_or_default();
        filters.iter().all(|(key, value)| match key.as_str() {
            "category" | "availability" => text(key) == value.to_lowercase(),
            "city" => text("city") == value.to_lowercase(),
            "minPrice" => value.parse::<i64>().is_ok_and(|min| price >= min),
            "maxPrice" => value.parse::<i64>().is_ok_and(|max| price <= max),
            "search" => {
                let needle = value.to_lowercase();
                text("title").contains(&needle) || text("description").contains(&needle)
            }
            _ => true,
        })
    };
    let listings: Vec<Value> = state
        .listings
        .iter()
        .map(|l| l.record.clone())
        .filter(|r| matches(r))
        .collect();
    Json(listings).into_response()
}

async fn create_listing(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock();
    let Some(owner) = state.user_for(&headers).map(|u| u.id) else {
        return unauthorized();
    };
    if body["price"].as_i64().is_none_or(|price| price < 1_000) {
        return message(StatusCode::BAD_REQUEST, "Price must be at least 1000");
    }
    let listing = state.insert_listing(owner, body);
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Listing created", "listing": listing })),
    )
        .into_response()
}

async fn my_listings(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = state.lock();
    let Some(owner) = state.user_for(&headers).map(|u| u.id) else {
        return unauthorized();
    };
    let listings: Vec<Value> = state
        .listings
        .iter()
        .rev()
        .filter(|l| l.owner == owner)
        .map(|l| l.record.clone())
        .collect();
    Json(json!({ "listings": listings })).into_response()
}

async fn listing_detail(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let state = state.lock();
    state
        .listings
        .iter()
        .find(|l| l.record["listing_id"] == id.as_str())
        .map_or_else(
            || message(StatusCode::NOT_FOUND, "Listing not found"),
            |l| Json(json!({ "listing": l.record })).into_response(),
        )
}

async fn update_listing(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut state = state.lock();
    let Some(user) = state.user_for(&headers).map(|u| u.id) else {
        return unauthorized();
    };
    let Some(listing) = state
        .listings
        .iter_mut()
        .find(|l| l.record["listing_id"] == id.as_str())
    else {
        return message(StatusCode::NOT_FOUND, "Listing not found");
    };
    if listing.owner != user {
        return message(StatusCode::FORBIDDEN, "You can only edit your own listings");
    }
    if let (Some(record), Some(changes)) = (listing.record.as_object_mut(), body.as_object()) {
        for (key, value) in changes {
            record.insert(key.clone(), value.clone());
        }
    }
    message(StatusCode::OK, "Listing updated")
}

async fn delete_listing(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut state = state.lock();
    let Some(user) = state.user_for(&headers).map(|u| u.id) else {
        return unauthorized();
    };
    let Some(index) = state
        .listings
        .iter()
        .position(|l| l.record["listing_id"] == id.as_str())
    else {
        return message(StatusCode::NOT_FOUND, "Listing not found");
    };
    if state.listings.get(index).is_some_and(|l| l.owner != user) {
        return message(StatusCode::FORBIDDEN, "You can only delete your own listings");
    }
    state.listings.remove(index);
    message(StatusCode::OK, "Listing deleted")
}

// =============================================================================
// Profile and uploads
// =============================================================================

async fn profile(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = state.lock();
    state.user_for(&headers).map_or_else(unauthorized, |user| {
        Json(json!({ "profile": user.profile_json() })).into_response()
    })
}

#[derive(Deserialize)]
struct ProfileBody {
    full_name: Option<String>,
    city: Option<String>,
    country: Option<String>,
    profile_image: Option<String>,
}

async fn update_profile(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<ProfileBody>,
) -> Response {
    let mut state = state.lock();
    let Some(id) = state.user_for(&headers).map(|u| u.id) else {
        return unauthorized();
    };
    if let Some(user) = state.users.iter_mut().find(|u| u.id == id) {
        if let Some(full_name) = body.full_name {
            user.full_name = full_name;
        }
        if body.city.is_some() {
            user.city = body.city;
        }
        if body.country.is_some() {
            user.country = body.country;
        }
        if body.profile_image.is_some() {
            user.profile_image = body.profile_image;
        }
    }
    message(StatusCode::OK, "Profile updated")
}

async fn upload_auth(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = state.lock();
    if state.user_for(&headers).is_none() {
        return unauthorized();
    }
    Json(json!({
        "signature": "3b5c9d2e8f",
        "expire": 4_102_444_800_i64,
        "token": uuid::Uuid::new_v4().to_string(),
    }))
    .into_response()
}
