// SPDX-FileCopyrightText: 2026 Ecoroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP surface for the Ecoroute router.
//!
//! A thin axum layer over [`RoutingEngine`](ecoroute_router::RoutingEngine),
//! its request ledger, and the carbon reader:
//!
//! | Route | Purpose |
//! |---|---|
//! | `POST /api/ask` | select a model and generate an answer |
//! | `POST /router/select-model` | selection only |
//! | `GET /router/request-history?limit=N` | recent selection records |
//! | `GET /router/performance-metrics` | ledger aggregates |
//! | `GET /api/carbon-intensity` | current reading |
//! | `GET /api/health` | engine, backend, and carbon reader health |
//! | `GET /metrics` | Prometheus exposition |

pub mod handlers;
pub mod server;

pub use server::{GatewaySettings, GatewayState, router, start_server};
