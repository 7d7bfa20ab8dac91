//! HTTP client for a running section server.
//!
//! Maps HTTP outcomes back onto [`SectionError`] so callers (and the offline
//! queue) can tell a rejected mutation from an unreachable server. Only
//! transport failures and 5xx become `Persistence` and are retryable; any
//! other 4xx is a permanent rejection.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::models::*;
use super::writer::SectionWriter;
use crate::errors::SectionError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Clone)]
pub struct RemoteStore {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl RemoteStore {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, SectionError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(SectionError::persistence)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn execute(
        &self,
        req: RequestBuilder,
        id: Option<&str>,
    ) -> Result<reqwest::Response, SectionError> {
        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(SectionError::persistence)?;
        let status = resp.status();
        debug!(status = %status, url = %resp.url(), "remote response");
        if status.is_success() {
            return Ok(resp);
        }

        let message = match resp.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        Err(match status {
            StatusCode::BAD_REQUEST => SectionError::Validation(message),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SectionError::Unauthorized,
            StatusCode::NOT_FOUND => SectionError::not_found(id.unwrap_or(message.as_str())),
            s if s.is_client_error() => {
                SectionError::Validation(format!("server rejected request ({}): {}", s, message))
            }
            _ => SectionError::persistence(format!("server returned {}: {}", status, message)),
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        id: Option<&str>,
    ) -> Result<T, SectionError> {
        self.execute(req, id)
            .await?
            .json::<T>()
            .await
            .map_err(SectionError::persistence)
    }

    pub async fn health(&self) -> Result<(), SectionError> {
        self.execute(self.client.get(self.url("/health")), None)
            .await
            .map(drop)
    }

    pub async fn list_sections(&self) -> Result<Vec<SectionInstance>, SectionError> {
        self.send_json(self.client.get(self.url("/api/sections")), None)
            .await
    }

    pub async fn get_section(&self, id: &str) -> Result<SectionInstance, SectionError> {
        let url = self.url(&format!("/api/sections/{}", id));
        self.send_json(self.client.get(url), Some(id)).await
    }
}

#[async_trait]
impl SectionWriter for RemoteStore {
    async fn create_section(&self, new: NewSection) -> Result<SectionInstance, SectionError> {
        let req = self.client.post(self.url("/api/sections")).json(&new);
        self.send_json(req, None).await
    }

    async fn update_section(
        &self,
        id: &str,
        patch: SectionPatch,
    ) -> Result<SectionInstance, SectionError> {
        let req = self
            .client
            .put(self.url(&format!("/api/sections/{}", id)))
            .json(&patch);
        self.send_json(req, Some(id)).await
    }

    async fn save_form(
        &self,
        id: &str,
        fields: BTreeMap<String, String>,
    ) -> Result<ConfigMap, SectionError> {
        let req = self
            .client
            .post(self.url(&format!("/api/sections/{}/form", id)))
            .json(&fields);
        self.send_json(req, Some(id)).await
    }

    async fn delete_section(&self, id: &str) -> Result<SectionInstance, SectionError> {
        let req = self
            .client
            .delete(self.url(&format!("/api/sections/{}", id)));
        self.send_json(req, Some(id)).await
    }

    async fn reorder_sections(&self, updates: Vec<OrderUpdate>) -> Result<(), SectionError> {
        let req = self
            .client
            .post(self.url("/api/sections/reorder"))
            .json(&updates);
        self.execute(req, None).await.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::api::{AppState, api_router};
    use crate::sections::compose::RendererRegistry;
    use crate::sections::db::{DbHandle, SectionDb};
    use std::sync::Arc;
    use tokio::sync::broadcast;

    fn hide() -> SectionPatch {
        SectionPatch {
            enabled: Some(false),
            ..SectionPatch::default()
        }
    }

    async fn serve(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// A server that answers every request with `status`.
    async fn spawn_fixed_status(status: StatusCode) -> String {
        serve(axum::Router::new().fallback(move || async move { status })).await
    }

    /// Serve the API on an ephemeral port and return its base URL.
    async fn spawn_server(admin_token: Option<&str>) -> String {
        let db = SectionDb::new_in_memory().unwrap();
        db.reset_to_defaults().unwrap();
        let (ws_tx, _) = broadcast::channel(16);
        let state = Arc::new(AppState {
            db: DbHandle::new(db),
            ws_tx,
            renderers: RendererRegistry::builtin(),
            admin_token: admin_token.map(str::to_string),
            site_title: "Remote".to_string(),
        });
        serve(api_router().with_state(state)).await
    }

    #[tokio::test]
    async fn test_remote_list_and_hide() {
        let base = spawn_server(None).await;
        let store = RemoteStore::new(&base, None).unwrap();
        store.health().await.unwrap();

        let sections = store.list_sections().await.unwrap();
        assert_eq!(sections.len(), 7);

        let hidden = store.update_section("hero", hide()).await.unwrap();
        assert!(!hidden.enabled);
        assert!(!store.get_section("hero").await.unwrap().enabled);
    }

    #[tokio::test]
    async fn test_remote_errors_map_to_section_errors() {
        let base = spawn_server(None).await;
        let store = RemoteStore::new(&base, None).unwrap();

        let err = store.delete_section("ghost").await.unwrap_err();
        assert!(matches!(err, SectionError::NotFound { ref id } if id == "ghost"));

        let err = store
            .create_section(NewSection::of("Marquee"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_remote_form_save_and_reorder() {
        let base = spawn_server(None).await;
        let store = RemoteStore::new(&format!("{}/", base), None).unwrap();

        let mut fields = BTreeMap::new();
        fields.insert("membersPerRow".to_string(), "6".to_string());
        let config = store.save_form("team", fields).await.unwrap();
        assert_eq!(config["membersPerRow"], ConfigValue::Integer(6));

        store
            .reorder_sections(vec![OrderUpdate {
                id: "team".into(),
                order: -1,
            }])
            .await
            .unwrap();
        let sections = store.list_sections().await.unwrap();
        assert_eq!(sections[0].id, "team");
    }

    #[tokio::test]
    async fn test_remote_token_handling() {
        let base = spawn_server(Some("tok")).await;

        let anonymous = RemoteStore::new(&base, None).unwrap();
        let err = anonymous.update_section("cta", hide()).await.unwrap_err();
        assert!(matches!(err, SectionError::Unauthorized));

        let admin = RemoteStore::new(&base, Some("tok".into())).unwrap();
        assert!(!admin.update_section("cta", hide()).await.unwrap().enabled);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_retryable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let store = RemoteStore::new(&format!("http://{}", addr), None).unwrap();
        let err = store.update_section("hero", hide()).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_client_errors_are_permanent_server_errors_retryable() {
        for status in [
            StatusCode::PAYLOAD_TOO_LARGE,
            StatusCode::METHOD_NOT_ALLOWED,
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            StatusCode::UNPROCESSABLE_ENTITY,
        ] {
            let store = RemoteStore::new(&spawn_fixed_status(status).await, None).unwrap();
            let err = store.delete_section("hero").await.unwrap_err();
            assert!(err.is_validation(), "{} mapped to {:?}", status, err);
            assert!(!err.is_retryable());
        }

        let store = RemoteStore::new(
            &spawn_fixed_status(StatusCode::SERVICE_UNAVAILABLE).await,
            None,
        )
        .unwrap();
        let err = store.delete_section("hero").await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_flush_drops_entry_the_server_refuses() {
        use crate::sections::offline::{Mutation, OfflineQueue};

        let dir = tempfile::TempDir::new().unwrap();
        let mut queue = OfflineQueue::open(&dir.path().join("pending.json")).unwrap();
        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), "too big".to_string());
        queue
            .enqueue(Mutation::SaveForm {
                id: "hero".into(),
                fields,
            })
            .unwrap();

        let store = RemoteStore::new(
            &spawn_fixed_status(StatusCode::PAYLOAD_TOO_LARGE).await,
            None,
        )
        .unwrap();
        let report = queue.flush(&store).await.unwrap();
        assert_eq!(report.dropped.len(), 1);
        assert_eq!(report.remaining, 0);
        assert!(queue.is_empty());
    }
}
