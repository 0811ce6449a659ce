//! # IO Module
//!
//! The HTTP edges of the application.
//!
//! ## Key Responsibilities
//!
//! - **AI proxy**: the `POST /api/ai` endpoint that holds the upstream
//!   credential (`rest`)
//! - **AI gateway client**: how the app calls that endpoint and turns the
//!   answer into UI state (`ai_gateway`)
//!
//! ## Current Implementation
//!
//! - **Web Framework**: Axum, with permissive CORS from tower-http
//! - **HTTP client**: reqwest with rustls
//! - **Error Handling**: upstream failures become JSON `{error, details}`
//!   bodies on the proxy and fallback texts in the client

pub mod ai_gateway;
pub mod rest;

pub use ai_gateway::{AiGatewayClient, AiGatewayError};
pub use rest::{create_router, ProxyState};
