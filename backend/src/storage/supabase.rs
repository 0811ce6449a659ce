//! Remote profile store on Supabase, spoken to through its PostgREST API.
//!
//! Profiles live in the `health_profiles` table as `(id text primary key,
//! data jsonb)`. A read selects `data` for one id, a write is an upsert that
//! replaces the row.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::traits::{RemoteProfileStorage, RemoteStoreError};
use crate::config::{RemoteStoreConfig, RemoteStoreStatus};

pub const PROFILES_TABLE: &str = "health_profiles";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct ProfileRow {
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Serialize)]
struct ProfileUpsert<'a> {
    id: &'a str,
    data: &'a Value,
}

#[derive(Clone)]
pub struct SupabaseProfileStore {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseProfileStore {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, RemoteStoreError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| RemoteStoreError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        })
    }

    /// Store for the configured project, or `None` in local-only mode
    pub fn from_config(config: &RemoteStoreConfig) -> Result<Option<Self>, RemoteStoreError> {
        match config.status() {
            RemoteStoreStatus::Enabled { url, anon_key } => Self::new(url, anon_key).map(Some),
            RemoteStoreStatus::MissingConfig => Ok(None),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, PROFILES_TABLE)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }
}

async fn status_error(response: reqwest::Response) -> RemoteStoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    RemoteStoreError::Status { status, body }
}

#[async_trait]
impl RemoteProfileStorage for SupabaseProfileStore {
    async fn fetch_profile(&self, profile_id: &str) -> Result<Option<Value>, RemoteStoreError> {
        let filter = format!("eq.{}", profile_id);
        let response = self
            .authorized(self.client.get(self.table_url()))
            .query(&[("id", filter.as_str()), ("select", "data")])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| RemoteStoreError::Transport(e.to_string()))?;

        // PostgREST answers 406 when a single-object read finds no row
        if response.status() == StatusCode::NOT_ACCEPTABLE {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let rows: Vec<ProfileRow> = response
            .json()
            .await
            .map_err(|e| RemoteStoreError::InvalidResponse(e.to_string()))?;

        debug!(profile_id, rows = rows.len(), "Fetched remote profile");
        Ok(rows
            .into_iter()
            .next()
            .and_then(|row| row.data)
            .filter(|data| !data.is_null()))
    }

    async fn upsert_profile(
        &self,
        profile_id: &str,
        document: &Value,
    ) -> Result<(), RemoteStoreError> {
        let response = self
            .authorized(self.client.post(self.table_url()))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&ProfileUpsert {
                id: profile_id,
                data: document,
            })
            .send()
            .await
            .map_err(|e| RemoteStoreError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        debug!(profile_id, "Upserted remote profile");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_from_config_needs_url_and_key() {
        let missing = RemoteStoreConfig {
            url: Some("https://x.supabase.co".to_string()),
            anon_key: None,
        };
        assert!(SupabaseProfileStore::from_config(&missing).unwrap().is_none());

        let enabled = RemoteStoreConfig {
            url: Some("https://x.supabase.co/".to_string()),
            anon_key: Some("anon-key".to_string()),
        };
        let store = SupabaseProfileStore::from_config(&enabled).unwrap().unwrap();
        assert_eq!(store.table_url(), "https://x.supabase.co/rest/v1/health_profiles");
    }

    fn profile_query(id: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("id".into(), format!("eq.{}", id)),
            Matcher::UrlEncoded("select".into(), "data".into()),
        ])
    }

    #[tokio::test]
    async fn test_fetch_existing_profile() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/health_profiles")
            .match_query(profile_query("p1"))
            .match_header("apikey", "anon-key")
            .match_header("authorization", "Bearer anon-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"data": {"notes": [{"id": "n1"}]}}]"#)
            .create_async()
            .await;

        let store = SupabaseProfileStore::new(&server.url(), "anon-key").unwrap();
        let profile = store.fetch_profile("p1").await.unwrap();

        assert_eq!(profile, Some(json!({ "notes": [{ "id": "n1" }] })));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_missing_profile_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/v1/health_profiles")
            .match_query(profile_query("nobody"))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let store = SupabaseProfileStore::new(&server.url(), "anon-key").unwrap();
        assert_eq!(store.fetch_profile("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fetch_server_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/v1/health_profiles")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let store = SupabaseProfileStore::new(&server.url(), "anon-key").unwrap();
        match store.fetch_profile("p1").await {
            Err(RemoteStoreError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_unreachable_server() {
        let store = SupabaseProfileStore::new("http://127.0.0.1:1", "anon-key").unwrap();
        assert!(matches!(
            store.fetch_profile("p1").await,
            Err(RemoteStoreError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_upsert_sends_whole_document() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/v1/health_profiles")
            .match_header("prefer", Matcher::Regex("resolution=merge-duplicates".into()))
            .match_body(Matcher::Json(json!({
                "id": "p1",
                "data": { "diagnoses": [{ "id": "d1" }] }
            })))
            .with_status(201)
            .create_async()
            .await;

        let store = SupabaseProfileStore::new(&format!("{}/", server.url()), "anon-key").unwrap();
        store
            .upsert_profile("p1", &json!({ "diagnoses": [{ "id": "d1" }] }))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upsert_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rest/v1/health_profiles")
            .with_status(401)
            .with_body(r#"{"message":"Invalid API key"}"#)
            .create_async()
            .await;

        let store = SupabaseProfileStore::new(&server.url(), "wrong").unwrap();
        let result = store.upsert_profile("p1", &json!({})).await;
        assert!(matches!(result, Err(RemoteStoreError::Status { status: 401, .. })));
    }
}
