// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Middleware implementations for the API server.
//!
//! - [`PipelineLayer`]: runs the authentication pipeline in front of handlers

mod pipeline;

pub use pipeline::{PipelineLayer, PipelineMiddleware, REQUEST_ID_HEADER};
