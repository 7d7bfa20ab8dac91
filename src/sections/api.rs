use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, State},
    http::{StatusCode, header, request::Parts},
    response::{Html, IntoResponse, Response},
    routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use super::catalog::{self, SectionKind};
use super::compose::RendererRegistry;
use super::db::DbHandle;
use super::editor;
use super::models::*;
use super::schema::{self, FieldSpec};
use super::ws::{WsMessage, broadcast_message};
use crate::errors::SectionError;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub db: DbHandle,
    pub ws_tx: broadcast::Sender<String>,
    pub renderers: RendererRegistry,
    /// Bearer token required on admin routes. `None` leaves them open.
    pub admin_token: Option<String>,
    pub site_title: String,
}

pub type SharedState = Arc<AppState>;

// ── Request payload types ─────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSectionRequest {
    pub id: Option<String>,
    pub name: Option<String>,
    pub component: String,
    pub enabled: Option<bool>,
    #[serde(default)]
    pub config: serde_json::Map<String, serde_json::Value>,
    pub order: Option<i64>,
    pub author_id: Option<String>,
}

impl CreateSectionRequest {
    fn into_new_section(self) -> Result<NewSection, SectionError> {
        Ok(NewSection {
            id: self.id,
            name: self.name,
            component: self.component,
            enabled: self.enabled,
            config: config_from_json(self.config)?,
            order: self.order,
            author_id: self.author_id,
        })
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSectionRequest {
    pub name: Option<String>,
    pub component: Option<String>,
    pub enabled: Option<bool>,
    pub config: Option<serde_json::Map<String, serde_json::Value>>,
    pub order: Option<i64>,
}

impl UpdateSectionRequest {
    fn into_patch(self) -> Result<SectionPatch, SectionError> {
        Ok(SectionPatch {
            name: self.name,
            component: self.component,
            enabled: self.enabled,
            config: self.config.map(config_from_json).transpose()?,
            order: self.order,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaResponse {
    pub component: &'static str,
    pub display_name: &'static str,
    pub fields: &'static [FieldSpec],
}

// ── Error handling ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized,
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Missing or invalid admin token".to_string(),
            ),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

impl From<SectionError> for ApiError {
    fn from(err: SectionError) -> Self {
        match err {
            SectionError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            SectionError::Unauthorized => ApiError::Unauthorized,
            err if err.is_validation() => ApiError::BadRequest(err.to_string()),
            err => {
                // Storage details stay in the log.
                error!(error = %err, "section store failure");
                ApiError::Internal("Section store unavailable".to_string())
            }
        }
    }
}

// ── Admin guard ───────────────────────────────────────────────────────

/// Extractor that rejects admin requests without the configured bearer token.
pub struct AdminGuard;

impl FromRequestParts<SharedState> for AdminGuard {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token.as_deref() else {
            return Ok(AdminGuard);
        };
        let provided = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));
        match provided {
            Some(token) if token == expected => Ok(AdminGuard),
            _ => {
                warn!(path = %parts.uri.path(), "admin request rejected");
                Err(ApiError::Unauthorized)
            }
        }
    }
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/catalog", get(get_catalog))
        .route("/api/catalog/{component}/schema", get(get_schema))
        .route("/api/sections", get(list_sections).post(create_section))
        .route("/api/sections/reorder", post(reorder_sections))
        .route("/api/sections/normalize", post(normalize_sections))
        .route("/api/sections/reset", post(reset_sections))
        .route(
            "/api/sections/{id}",
            get(get_section).put(update_section).delete(delete_section),
        )
        .route("/api/sections/{id}/toggle", patch(toggle_section))
        .route("/api/sections/{id}/editor", get(get_editor))
        .route("/api/sections/{id}/config", axum::routing::put(save_config))
        .route("/api/sections/{id}/form", post(save_form))
        .route("/api/page", get(get_page))
        .route("/", get(homepage))
        .route("/health", get(health_check))
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn get_catalog() -> impl IntoResponse {
    Json(catalog::catalog())
}

async fn get_schema(Path(component): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let kind = SectionKind::from_str(&component).map_err(|e| ApiError::NotFound(e.to_string()))?;
    Ok(Json(SchemaResponse {
        component: kind.component_ref(),
        display_name: kind.display_name(),
        fields: schema::schema_for(kind),
    }))
}

async fn list_sections(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let sections = state.db.call(|db| db.list_sections()).await?;
    Ok(Json(sections))
}

async fn get_section(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let section = state.db.call(move |db| db.require_section(&id)).await?;
    Ok(Json(section))
}

async fn create_section(
    State(state): State<SharedState>,
    _admin: AdminGuard,
    Json(req): Json<CreateSectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new = req.into_new_section()?;
    let section = state.db.call(move |db| db.create_section(new)).await?;
    info!(section_id = %section.id, component = %section.component, "section created");
    broadcast_message(&state.ws_tx, &WsMessage::SectionCreated { section: section.clone() });
    Ok((StatusCode::CREATED, Json(section)))
}

async fn update_section(
    State(state): State<SharedState>,
    _admin: AdminGuard,
    Path(id): Path<String>,
    Json(req): Json<UpdateSectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = req.into_patch()?;
    let section = state.db.call(move |db| db.update_section(&id, patch)).await?;
    info!(section_id = %section.id, "section updated");
    broadcast_message(&state.ws_tx, &WsMessage::SectionUpdated { section: section.clone() });
    Ok(Json(section))
}

async fn delete_section(
    State(state): State<SharedState>,
    _admin: AdminGuard,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let section = state.db.call(move |db| db.delete_section(&id)).await?;
    info!(section_id = %section.id, "section deleted");
    broadcast_message(
        &state.ws_tx,
        &WsMessage::SectionDeleted {
            section_id: section.id.clone(),
        },
    );
    Ok(Json(section))
}

async fn toggle_section(
    State(state): State<SharedState>,
    _admin: AdminGuard,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let section = state.db.call(move |db| db.toggle_section(&id)).await?;
    info!(section_id = %section.id, enabled = section.enabled, "section toggled");
    broadcast_message(&state.ws_tx, &WsMessage::SectionUpdated { section: section.clone() });
    Ok(Json(section))
}

async fn get_editor(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let section = state.db.call(move |db| db.require_section(&id)).await?;
    Ok(Json(editor::load(&section)?))
}

async fn save_config(
    State(state): State<SharedState>,
    _admin: AdminGuard,
    Path(id): Path<String>,
    Json(body): Json<serde_json::Map<String, serde_json::Value>>,
) -> Result<impl IntoResponse, ApiError> {
    let edits = config_from_json(body)?;
    let section = state
        .db
        .call(move |db| {
            editor::save(db, &id, edits)?;
            db.require_section(&id)
        })
        .await?;
    info!(section_id = %section.id, "section config saved");
    let config = section.config.clone();
    broadcast_message(&state.ws_tx, &WsMessage::SectionUpdated { section });
    Ok(Json(config))
}

async fn save_form(
    State(state): State<SharedState>,
    _admin: AdminGuard,
    Path(id): Path<String>,
    Json(fields): Json<BTreeMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let section = state
        .db
        .call(move |db| {
            editor::save_form(db, &id, &fields)?;
            db.require_section(&id)
        })
        .await?;
    info!(section_id = %section.id, "section form saved");
    let config = section.config.clone();
    broadcast_message(&state.ws_tx, &WsMessage::SectionUpdated { section });
    Ok(Json(config))
}

async fn reorder_sections(
    State(state): State<SharedState>,
    _admin: AdminGuard,
    Json(updates): Json<Vec<OrderUpdate>>,
) -> Result<impl IntoResponse, ApiError> {
    let applied = updates.clone();
    state.db.call(move |db| db.reorder_sections(&applied)).await?;
    info!(count = updates.len(), "sections reordered");
    broadcast_message(&state.ws_tx, &WsMessage::SectionsReordered { updates });
    Ok(StatusCode::NO_CONTENT)
}

async fn normalize_sections(
    State(state): State<SharedState>,
    _admin: AdminGuard,
) -> Result<impl IntoResponse, ApiError> {
    let sections = state.db.call(|db| db.normalize_order()).await?;
    let updates = sections
        .iter()
        .map(|s| OrderUpdate {
            id: s.id.clone(),
            order: s.order,
        })
        .collect();
    broadcast_message(&state.ws_tx, &WsMessage::SectionsReordered { updates });
    Ok(Json(sections))
}

async fn reset_sections(
    State(state): State<SharedState>,
    _admin: AdminGuard,
) -> Result<impl IntoResponse, ApiError> {
    let sections = state.db.call(|db| db.reset_to_defaults()).await?;
    info!(count = sections.len(), "sections reset to defaults");
    broadcast_message(
        &state.ws_tx,
        &WsMessage::SectionsReset {
            sections: sections.clone(),
        },
    );
    Ok(Json(sections))
}

async fn get_page(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let sections = state.db.call(|db| db.list_sections()).await?;
    Ok(Json(state.renderers.compose(&sections)))
}

async fn homepage(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let sections = state.db.call(|db| db.list_sections()).await?;
    let page = state.renderers.compose(&sections);
    Ok(Html(page.to_document(&state.site_title)))
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::db::SectionDb;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn test_state(admin_token: Option<&str>) -> SharedState {
        let db = SectionDb::new_in_memory().unwrap();
        let (ws_tx, _) = broadcast::channel(16);
        Arc::new(AppState {
            db: DbHandle::new(db),
            ws_tx,
            renderers: RendererRegistry::builtin(),
            admin_token: admin_token.map(str::to_string),
            site_title: "Test Marathon".to_string(),
        })
    }

    fn test_app() -> Router {
        api_router().with_state(test_state(None))
    }

    async fn body_json<T: serde::de::DeserializeOwned>(body: Body) -> T {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn reset(app: &Router) {
        let response = app
            .clone()
            .oneshot(empty_request("POST", "/api/sections/reset"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = test_app().oneshot(empty_request("GET", "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_catalog_lists_seven_kinds() {
        let response = test_app().oneshot(empty_request("GET", "/api/catalog")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let catalog: Vec<Value> = body_json(response.into_body()).await;
        assert_eq!(catalog.len(), 7);
        assert_eq!(catalog[0]["componentRef"], "HeroSection");
        assert_eq!(catalog[6]["id"], "cta");
    }

    #[tokio::test]
    async fn test_schema_known_and_unknown() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(empty_request("GET", "/api/catalog/team/schema"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let schema: Value = body_json(response.into_body()).await;
        assert_eq!(schema["component"], "TeamSection");
        let fields = schema["fields"].as_array().unwrap();
        let per_row = fields.iter().find(|f| f["name"] == "membersPerRow").unwrap();
        assert_eq!(per_row["type"], "number");
        assert_eq!(per_row["min"], 2);

        let response = app
            .oneshot(empty_request("GET", "/api/catalog/Carousel/schema"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_sections_empty() {
        let response = test_app().oneshot(empty_request("GET", "/api/sections")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let sections: Vec<Value> = body_json(response.into_body()).await;
        assert!(sections.is_empty());
    }

    #[tokio::test]
    async fn test_create_section_seeds_defaults() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/sections",
                json!({"component": "HeroSection", "config": {"title": "Run 2025"}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let section: Value = body_json(response.into_body()).await;
        assert_eq!(section["name"], "Hero Section");
        assert_eq!(section["enabled"], true);
        assert_eq!(section["config"]["title"], "Run 2025");
        assert_eq!(section["config"]["showAnimations"], true);

        let id = section["id"].as_str().unwrap();
        let response = app
            .oneshot(empty_request("GET", &format!("/api/sections/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_unknown_component_is_bad_request() {
        let response = test_app()
            .oneshot(json_request("POST", "/api/sections", json!({"component": "Marquee"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = body_json(response.into_body()).await;
        assert!(body["error"].as_str().unwrap().contains("Marquee"));
    }

    #[tokio::test]
    async fn test_create_rejects_nested_config_value() {
        let response = test_app()
            .oneshot(json_request(
                "POST",
                "/api/sections",
                json!({"component": "AboutSection", "config": {"title": ["a", "b"]}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_missing_section_is_404() {
        let response = test_app()
            .oneshot(empty_request("GET", "/api/sections/ghost"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_merges_config() {
        let app = test_app();
        reset(&app).await;
        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/sections/about",
                json!({"name": "Who we are", "config": {"title": "Về VSM"}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let section: Value = body_json(response.into_body()).await;
        assert_eq!(section["name"], "Who we are");
        assert_eq!(section["config"]["title"], "Về VSM");
        assert!(section["config"]["description"].is_string());
    }

    #[tokio::test]
    async fn test_toggle_and_delete() {
        let app = test_app();
        reset(&app).await;

        let response = app
            .clone()
            .oneshot(empty_request("PATCH", "/api/sections/gallery/toggle"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let section: Value = body_json(response.into_body()).await;
        assert_eq!(section["enabled"], false);

        let response = app
            .clone()
            .oneshot(empty_request("DELETE", "/api/sections/gallery"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let removed: Value = body_json(response.into_body()).await;
        assert_eq!(removed["id"], "gallery");

        let response = app
            .oneshot(empty_request("DELETE", "/api/sections/gallery"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reorder_then_list_follows_order() {
        let app = test_app();
        reset(&app).await;
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/sections/reorder",
                json!([{"id": "cta", "order": 0}, {"id": "hero", "order": 6}]),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app.oneshot(empty_request("GET", "/api/sections")).await.unwrap();
        let sections: Vec<Value> = body_json(response.into_body()).await;
        assert_eq!(sections[0]["id"], "cta");
        assert_eq!(sections[6]["id"], "hero");
    }

    #[tokio::test]
    async fn test_reorder_unknown_id_is_404() {
        let app = test_app();
        reset(&app).await;
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/sections/reorder",
                json!([{"id": "hero", "order": 3}, {"id": "ghost", "order": 0}]),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_normalize_compacts_order() {
        let app = test_app();
        reset(&app).await;
        app.clone()
            .oneshot(empty_request("DELETE", "/api/sections/about"))
            .await
            .unwrap();
        let response = app
            .oneshot(empty_request("POST", "/api/sections/normalize"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let sections: Vec<Value> = body_json(response.into_body()).await;
        let orders: Vec<i64> = sections.iter().map(|s| s["order"].as_i64().unwrap()).collect();
        assert_eq!(orders, vec![0, 1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_editor_view_and_form_save() {
        let app = test_app();
        reset(&app).await;

        let response = app
            .clone()
            .oneshot(empty_request("GET", "/api/sections/news/editor"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let view: Value = body_json(response.into_body()).await;
        assert_eq!(view["component"], "NewsSection");
        assert_eq!(view["fields"].as_array().unwrap().len(), 4);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/sections/news/form",
                json!({"postsPerRow": "2", "showViewAllButton": "off"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let config: Value = body_json(response.into_body()).await;
        assert_eq!(config["postsPerRow"], 2);
        assert_eq!(config["showViewAllButton"], false);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/sections/news/form",
                json!({"postsPerRow": "many"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_save_typed_config() {
        let app = test_app();
        reset(&app).await;
        let response = app
            .oneshot(json_request(
                "PUT",
                "/api/sections/team/config",
                json!({"membersPerRow": 5}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let config: Value = body_json(response.into_body()).await;
        assert_eq!(config["membersPerRow"], 5);
        assert!(config["title"].is_string());
    }

    #[tokio::test]
    async fn test_page_skips_disabled_sections() {
        let app = test_app();
        reset(&app).await;
        app.clone()
            .oneshot(empty_request("PATCH", "/api/sections/hero/toggle"))
            .await
            .unwrap();

        let response = app.clone().oneshot(empty_request("GET", "/api/page")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page: Value = body_json(response.into_body()).await;
        let blocks = page["blocks"].as_array().unwrap();
        assert_eq!(blocks.len(), 6);
        assert_eq!(blocks[0]["sectionId"], "about");

        let response = app.oneshot(empty_request("GET", "/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("<title>Test Marathon</title>"));
        assert!(!html.contains("data-component=\"HeroSection\""));
    }

    #[tokio::test]
    async fn test_admin_token_required_when_configured() {
        let app = api_router().with_state(test_state(Some("s3cret")));

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/sections", json!({"component": "CTASection"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut request = json_request("POST", "/api/sections", json!({"component": "CTASection"}));
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, "Bearer wrong".parse().unwrap());
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let mut request = json_request("POST", "/api/sections", json!({"component": "CTASection"}));
        request
            .headers_mut()
            .insert(header::AUTHORIZATION, "Bearer s3cret".parse().unwrap());
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        // Reads stay public.
        let response = app.oneshot(empty_request("GET", "/api/sections")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_section_broadcasts_ws() {
        let state = test_state(None);
        let mut rx = state.ws_tx.subscribe();
        let app = api_router().with_state(state);

        let response = app
            .oneshot(json_request("POST", "/api/sections", json!({"component": "EventsSection"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let msg = rx.recv().await.unwrap();
        let parsed: Value = serde_json::from_str(&msg).unwrap();
        assert_eq!(parsed["type"], "SectionCreated");
        assert_eq!(parsed["data"]["section"]["component"], "EventsSection");
    }

    #[test]
    fn test_persistence_error_maps_to_generic_500() {
        let err = ApiError::from(SectionError::persistence("disk I/O error at /var/db"));
        match err {
            ApiError::Internal(msg) => assert!(!msg.contains("/var/db")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
