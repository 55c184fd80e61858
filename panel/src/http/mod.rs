//! HTTP communication with the Nimbus backend
//!
//! Every request the console makes goes through `ApiClient`, the single place
//! that configures outgoing requests and interprets transport failures.
//!
//! # Request pipeline
//!
//! ```text
//! API module → ApiClient → bearer token (session store) → reqwest (15s timeout)
//!                                                              ↓
//!   caller ← Ok(decoded body) ←─────────────── 2xx ────────────┤
//!   caller ← Err(ApiError) ← toast + 401 logout ← classify_failure
//! ```
//!
//! Callers never see transport errors directly: they get a decoded value or
//! one of the `ApiError` classes, and the user has already been notified.

pub mod client;

pub use client::{classify_failure, ApiClient, SessionEvent};
