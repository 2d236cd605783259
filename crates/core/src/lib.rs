//! C2C Cars Core - Shared types library for the marketplace client.
//!
//! This crate provides the pieces of the client that carry no I/O:
//! - `client` - HTTP collaborator, token storage and the request-state store
//! - `cli` - Terminal front end that renders the store
//! - `integration-tests` - End-to-end tests against a mock marketplace API
//!
//! # Architecture
//!
//! The core crate contains only types, pure reducers and validation rules - no
//! HTTP clients, no file access. Everything here can be exercised with plain
//! unit tests.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails and API records
//! - [`validation`] - Form schemas for login, registration and listing creation
//! - [`state`] - `RequestState<T>` lifecycle reducer and the auth `Session`
//! - [`guard`] - Protected-route decisions derived from the session

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod guard;
pub mod state;
pub mod types;
pub mod validation;

pub use guard::{GuardDecision, LOGIN_PATH, Route, guard};
pub use state::{Event, Merge, RequestState, Session, apply};
pub use types::*;
pub use validation::{FieldError, ValidationErrors};
