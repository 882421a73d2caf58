//! # api-gateway
//!
//! The authentication/authorization boundary of the ordering platform.
//! Every request traverses an ordered pipeline before it reaches a backend:
//!
//! ```text
//! Correlation → Logging → Authentication → HeaderInjection → Authorization
//! ```
//!
//! On success the (header-mutated) request is handed to the routing
//! collaborator; any stage failure short-circuits to the error normalizer,
//! which produces a uniform JSON error document. Backends behind the gateway
//! trust the injected `X-User-Id` / `X-Role` / `X-Table-Id` headers and skip
//! authentication entirely.
//!
//! Routing, service discovery and TLS are not this crate's concern: embedders
//! call [`app::build_router`] with their own upstream `Router`, and the
//! pipeline's hand-off to `next.run()` is the forwarding hook.

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod pipeline;
pub mod routing;
pub mod services;
pub mod state;
