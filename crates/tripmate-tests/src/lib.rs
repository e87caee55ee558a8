// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tripmate Integration Tests
//!
//! End-to-end tests over the assembled axum router, plus shared fixtures.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p tripmate-tests
//! cargo test -p tripmate-tests --test integration_auth
//! cargo test -p tripmate-tests --test integration_config
//! ```
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use tripmate_tests::common::{TestApp, USER_EMAIL, PASSWORD};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let app = TestApp::spawn().await;
//!     let tokens = app.login_ok(USER_EMAIL, PASSWORD).await;
//!     let response = app.get("/members/me", Some(&tokens.access)).await;
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::fixtures::*;
    pub use crate::common::init_test_logging;
}
