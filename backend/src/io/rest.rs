//! # REST API for the AI Proxy
//!
//! `POST /api/ai` keeps the upstream credential on the server. The browser
//! sends `{prompt, options}`; the proxy adds the system message and the
//! bearer token, forwards the call and passes the upstream JSON back
//! unchanged.
//!
//! ## Responses
//!
//! - **500** `{error}` while no credential is configured
//! - **400** `{error}` when the prompt is missing
//! - upstream status with `{error: "OpenAI error", details}` when upstream fails
//! - **500** `{error}` when upstream cannot be reached
//! - **200** with the upstream body otherwise

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use reqwest::Client;
use serde_json::Value;
use shared::{AiErrorBody, AiRequest, ChatCompletionRequest, ChatMessage};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::config::ProxyConfig;

pub const DEFAULT_SYSTEM_PROMPT: &str = "Du är en hjälpsam svensk vårdassistent.";
pub const DEFAULT_TEMPERATURE: f64 = 0.2;
pub const DEFAULT_MAX_TOKENS: u32 = 600;

const MISSING_KEY_MESSAGE: &str = "OpenAI-nyckel saknas på servern.";
const MISSING_PROMPT_MESSAGE: &str = "prompt saknas i begäran.";
const UNREACHABLE_MESSAGE: &str = "Kunde inte kontakta OpenAI.";
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared state of the proxy handlers
#[derive(Clone)]
pub struct ProxyState {
    config: Arc<ProxyConfig>,
    client: Client,
}

impl ProxyState {
    pub fn new(config: ProxyConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(UPSTREAM_TIMEOUT).build()?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }
}

/// Router with the proxy endpoint; any origin may call it
pub fn create_router(state: ProxyState) -> Router {
    Router::new()
        .route("/api/ai", post(ai_proxy))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn error_response(status: StatusCode, error: &str, details: Option<String>) -> Response {
    let body = AiErrorBody {
        error: Some(error.to_string()),
        details,
    };
    (status, Json(body)).into_response()
}

/// Upstream request for one prompt, with server-side defaults applied
fn upstream_request(config: &ProxyConfig, request: AiRequest) -> ChatCompletionRequest {
    let options = request.options;
    let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    let system_prompt =
        non_blank(options.system_prompt).unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

    ChatCompletionRequest {
        model: non_blank(options.model).unwrap_or_else(|| config.default_model.clone()),
        temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
        max_tokens: options
            .max_tokens
            .filter(|tokens| *tokens > 0)
            .unwrap_or(DEFAULT_MAX_TOKENS),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: system_prompt,
            },
            ChatMessage {
                role: "user".to_string(),
                content: request.prompt,
            },
        ],
    }
}

/// Axum handler for POST /api/ai
pub async fn ai_proxy(State(state): State<ProxyState>, body: Bytes) -> Response {
    let Some(api_key) = state.config.api_key.as_deref() else {
        warn!("POST /api/ai rejected, no OpenAI key configured");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, MISSING_KEY_MESSAGE, None);
    };

    // An unreadable body counts as a missing prompt
    let request = serde_json::from_slice::<AiRequest>(&body)
        .ok()
        .filter(|request| !request.prompt.trim().is_empty());
    let Some(request) = request else {
        return error_response(StatusCode::BAD_REQUEST, MISSING_PROMPT_MESSAGE, None);
    };

    let upstream = upstream_request(&state.config, request);
    info!(model = %upstream.model, max_tokens = upstream.max_tokens, "POST /api/ai");

    let response = match state
        .client
        .post(&state.config.upstream_url)
        .bearer_auth(api_key)
        .json(&upstream)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "Proxy could not reach upstream");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, UNREACHABLE_MESSAGE, None);
        }
    };

    let status = response.status();
    if !status.is_success() {
        let details = response.text().await.unwrap_or_default();
        error!(status = status.as_u16(), details = %details, "Upstream API error");
        let status =
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return error_response(status, "OpenAI error", Some(details));
    }

    match response.json::<Value>().await {
        Ok(completion) => (StatusCode::OK, Json(completion)).into_response(),
        Err(e) => {
            error!(error = %e, "Upstream returned unreadable JSON");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, UNREACHABLE_MESSAGE, None)
        }
    }
}
