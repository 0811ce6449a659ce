//! Client side of the AI gateway.
//!
//! Prompts are posted to the proxy as `{prompt, options}`; the proxy answers
//! with the upstream chat-completion JSON. Nothing is retried.

use reqwest::Client;
use shared::{AiErrorBody, AiOptions, AiRequest, ChatCompletionResponse};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::AiClientConfig;
use crate::domain::AppStore;

/// Shown when the gateway answered but without any text
pub const NO_ANSWER_TEXT: &str = "Kunde inte få svar från AI.";

/// Shown for every other failure
pub const ANALYSIS_FAILED_TEXT: &str = "Ett fel uppstod vid AI-analysen. Försök igen senare.";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum AiGatewayError {
    #[error("could not reach the AI gateway: {0}")]
    Transport(String),

    #[error("AI gateway answered {status}: {}", .error.as_deref().unwrap_or("no details"))]
    Status { status: u16, error: Option<String> },

    #[error("AI gateway returned no answer")]
    EmptyResponse,

    #[error("unreadable AI gateway response: {0}")]
    InvalidResponse(String),
}

#[derive(Clone)]
pub struct AiGatewayClient {
    client: Client,
    endpoint: String,
    default_model: String,
}

impl AiGatewayClient {
    pub fn new(config: &AiClientConfig) -> Result<Self, AiGatewayError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AiGatewayError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            default_model: config.default_model.clone(),
        })
    }

    /// Send one prompt and return the trimmed answer text
    pub async fn complete(
        &self,
        prompt: &str,
        mut options: AiOptions,
    ) -> Result<String, AiGatewayError> {
        if options.model.as_deref().map_or(true, |model| model.trim().is_empty()) {
            options.model = Some(self.default_model.clone());
        }

        debug!(endpoint = %self.endpoint, model = ?options.model, "Sending AI request");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AiRequest {
                prompt: prompt.to_string(),
                options,
            })
            .send()
            .await
            .map_err(|e| AiGatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body: AiErrorBody = response.json().await.unwrap_or_default();
            return Err(AiGatewayError::Status {
                status: status.as_u16(),
                error: body.error,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AiGatewayError::InvalidResponse(e.to_string()))?;

        completion.first_content().ok_or(AiGatewayError::EmptyResponse)
    }

    /// Run a prompt on behalf of the UI.
    ///
    /// Toggles the store's loading flag around the call and leaves the text
    /// in `ai_response`. Always returns something displayable.
    pub async fn analyze(&self, store: &AppStore, prompt: &str, options: AiOptions) -> String {
        store.set_loading(true);
        store.set_ai_response(None);

        let text = match self.complete(prompt, options).await {
            Ok(answer) => answer,
            Err(AiGatewayError::EmptyResponse) => NO_ANSWER_TEXT.to_string(),
            Err(e) => {
                error!(error = %e, "AI analysis failed");
                ANALYSIS_FAILED_TEXT.to_string()
            }
        };

        store.set_ai_response(Some(text.clone()));
        store.set_loading(false);
        text
    }
}
