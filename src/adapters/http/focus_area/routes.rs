//! Route configuration for package and focus-area endpoints.

use axum::routing::{delete, get, post};
use axum::Router;

use super::handlers::{
    create_focus_area, create_package, delete_focus_area, get_package_state,
    get_unresolved_feedback, get_version_snapshot, revise_focus_area, submit_feedback,
    FocusAreaAppState,
};

/// Creates the focus-area router with all endpoints.
///
/// Routes:
/// - `POST /api/packages` - Create a package
/// - `GET /api/packages/:package_id/focus-areas` - Current state (`includeDeleted`, `includeHistory`)
/// - `POST /api/packages/:package_id/focus-areas` - Create a focus area
/// - `DELETE /api/packages/:package_id/focus-areas/:focus_area_id` - Soft-delete a focus area
/// - `GET /api/packages/:package_id/focus-areas/:focus_area_id/feedback` - Unresolved feedback
/// - `POST /api/packages/:package_id/focus-areas/:focus_area_id/feedback` - Submit feedback
/// - `GET /api/packages/:package_id/focus-areas/:focus_area_id/versions/:version_number` - One version
/// - `POST /api/packages/:package_id/revisions` - Commit a revision
pub fn focus_area_router() -> Router<FocusAreaAppState> {
    Router::new()
        .route("/api/packages", post(create_package))
        .route(
            "/api/packages/:package_id/focus-areas",
            get(get_package_state).post(create_focus_area),
        )
        .route(
            "/api/packages/:package_id/focus-areas/:focus_area_id",
            delete(delete_focus_area),
        )
        .route(
            "/api/packages/:package_id/focus-areas/:focus_area_id/feedback",
            get(get_unresolved_feedback).post(submit_feedback),
        )
        .route(
            "/api/packages/:package_id/focus-areas/:focus_area_id/versions/:version_number",
            get(get_version_snapshot),
        )
        .route("/api/packages/:package_id/revisions", post(revise_focus_area))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryRecordStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let store = InMemoryRecordStore::new();
        let state = FocusAreaAppState::new(Arc::new(store.clone()), Arc::new(store));
        focus_area_router().with_state(state)
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("X-User-Id", "analyst")
            .header("X-Organization-Id", "acme")
            .header("content-type", "application/json");
        match body {
            Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ───────────────────────────────────────────────────────────────
    // Routing
    // ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn create_package_route_returns_created() {
        let response = app()
            .oneshot(request("POST", "/api/packages", Some(json!({"name": "Q3 review"}))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["name"], "Q3 review");
    }

    #[tokio::test]
    async fn missing_identity_headers_are_unauthorized() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/packages")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name":"Q3"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["kind"], "unauthorized");
    }

    #[tokio::test]
    async fn malformed_package_id_is_bad_request() {
        let response = app()
            .oneshot(request("GET", "/api/packages/not-a-uuid/focus-areas", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_package_is_not_found() {
        let uri = format!("/api/packages/{}/focus-areas", uuid::Uuid::new_v4());
        let response = app().oneshot(request("GET", &uri, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["kind"], "not_found");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/packages")
                    .header("X-User-Id", "analyst")
                    .header("X-Organization-Id", "acme")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["status"], "error");
    }

    #[tokio::test]
    async fn version_zero_is_bad_request() {
        let uri = format!(
            "/api/packages/{}/focus-areas/{}/versions/0",
            uuid::Uuid::new_v4(),
            uuid::Uuid::new_v4()
        );
        let response = app().oneshot(request("GET", &uri, None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
