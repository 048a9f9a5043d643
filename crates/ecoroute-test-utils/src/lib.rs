// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Ecoroute integration tests.
//!
//! Provides a scriptable model backend and configuration fixtures for fast,
//! deterministic tests without a running inference server.
//!
//! # Components
//!
//! - [`MockBackend`] - Model backend with per-model latency, failure injection,
//!   and call counters
//! - [`fixtures`] - Ready-made configurations

pub mod fixtures;
pub mod mock_backend;

pub use fixtures::test_config;
pub use mock_backend::MockBackend;
