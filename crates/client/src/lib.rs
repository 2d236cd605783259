//! C2C Cars Client - request state, dispatcher and HTTP client.
//!
//! # Architecture
//!
//! ```text
//!   Marketplace ──validate──▶ c2c_core::validation
//!       │
//!       ├─ dispatch ──▶ ApiClient (reqwest) ──▶ marketplace API
//!       │      │
//!       │      └─ Start / Succeed / Fail ──▶ Store { auth, listings, profile }
//!       │
//!       └─ TokenStore (authToken)
//! ```
//!
//! The [`Store`] is constructed explicitly and owned by the [`Marketplace`];
//! there is no process-wide singleton. Renderers read snapshots and the
//! [`view`] models derived from them.
//!
//! # Modules
//!
//! - [`config`] - Environment configuration
//! - [`api`] - Typed client for the REST endpoints
//! - [`error`] - `ApiError` and the server-message mapping
//! - [`storage`] - Session token persistence
//! - [`store`] - Per-category request state and settlement policy
//! - [`dispatch`] - Request lifecycle around one API call
//! - [`marketplace`] - User actions
//! - [`view`] - Empty/loading/error view models

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod marketplace;
pub mod storage;
pub mod store;
pub mod view;

pub use api::ApiClient;
pub use config::{ClientConfig, ConfigError};
pub use dispatch::{DispatchError, Operation};
pub use error::{ApiError, ErrorMessageMapping};
pub use marketplace::{Marketplace, MarketplaceError};
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreError};
pub use store::{SettlementPolicy, Store};
pub use view::{DetailView, ListingsView};
