//! Core types for C2C Cars.
//!
//! This module provides type-safe wrappers for marketplace concepts and the
//! JSON records exchanged with the remote API.

pub mod email;
pub mod id;
pub mod listing;
pub mod price;
pub mod status;
pub mod upload;
pub mod user;

pub use email::{Email, EmailError};
pub use id::*;
pub use listing::{ListingFilters, ListingRecord, ListingUpdate, NewListing};
pub use price::{CurrencyCode, Price, PriceError};
pub use status::*;
pub use upload::UploadAuth;
pub use user::{AuthResponse, AuthToken, Profile, ProfileUpdate, UserRecord};
