use std::any::Any;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::Uri;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use chrono::Utc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::envelope;
use crate::error::ApiError;
use crate::info::{AppInfo, EnvSnapshot};

/// Read-only state shared by every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Debug)]
struct AppStateInner {
    app_info: AppInfo,
    env: EnvSnapshot,
}

impl AppState {
    /// Wraps the startup metadata and environment snapshot for sharing across handlers.
    pub fn new(app_info: AppInfo, env: EnvSnapshot) -> Self {
        Self {
            inner: Arc::new(AppStateInner { app_info, env }),
        }
    }

    pub fn app_info(&self) -> &AppInfo {
        &self.inner.app_info
    }

    pub fn env(&self) -> &EnvSnapshot {
        &self.inner.env
    }
}

impl From<&AppConfig> for AppState {
    fn from(config: &AppConfig) -> Self {
        Self::new(config.app_info.clone(), config.env.clone())
    }
}

/// OpenAPI description of the app, served at `/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(title = "Assure360 Test App", description = "Serverless app for CI/CD testing"),
    paths(root, health, hello, time, status, info, test),
    components(schemas(
        AppInfo,
        envelope::Welcome,
        envelope::Health,
        envelope::Greeting,
        envelope::TimeReport,
        envelope::StatusReport,
        envelope::InfoReport,
        envelope::TestReport,
        envelope::ErrorEnvelope,
    )),
    tags((name = "app", description = "Informational endpoints"))
)]
pub struct ApiDoc;

/// Builds the application router: the seven informational routes, the API
/// docs (`/openapi.json`, Swagger UI at `/docs`, ReDoc at `/redoc`), the
/// not-found fallback and the middleware stack.
pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/hello", get(hello))
        .route("/time", get(time))
        .route("/status", get(status))
        .route("/info", get(info))
        .route("/test", get(test))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .merge(Redoc::with_url("/redoc", ApiDoc::openapi()));

    with_middleware(routes)
}

/// Adds the JSON 404 fallback, the panic-to-500 conversion, CORS and request tracing.
pub(crate) fn with_middleware(routes: Router) -> Router {
    routes
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
}

/// Welcome message with the app metadata.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Welcome message", body = envelope::Welcome)),
    tag = "app"
)]
async fn root(State(state): State<AppState>) -> Response {
    Json(envelope::welcome(state.app_info(), Utc::now())).into_response()
}

/// Health check for monitoring.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy", body = envelope::Health)),
    tag = "app"
)]
async fn health(State(state): State<AppState>) -> Response {
    Json(envelope::health(state.app_info(), Utc::now())).into_response()
}

/// Greets `name`, defaulting to `World`.
#[utoipa::path(
    get,
    path = "/hello",
    params(("name" = Option<String>, Query, description = "Name to greet; the last value wins when repeated")),
    responses((status = 200, description = "Greeting", body = envelope::Greeting)),
    tag = "app"
)]
async fn hello(
    State(state): State<AppState>,
    params: Option<Query<Vec<(String, String)>>>,
) -> Response {
    let name = params.and_then(|Query(params)| {
        params
            .into_iter()
            .rev()
            .find(|(key, _)| key == "name")
            .map(|(_, value)| value)
    });

    Json(envelope::greeting(
        state.app_info(),
        name.as_deref(),
        Utc::now(),
    ))
    .into_response()
}

/// Current time as ISO-8601, Unix seconds and a readable string.
#[utoipa::path(
    get,
    path = "/time",
    responses((status = 200, description = "Current UTC time", body = envelope::TimeReport)),
    tag = "app"
)]
async fn time(State(state): State<AppState>) -> Response {
    Json(envelope::time_report(state.app_info(), Utc::now())).into_response()
}

/// Static operational status with version, environment and region.
#[utoipa::path(
    get,
    path = "/status",
    responses((status = 200, description = "Operational status", body = envelope::StatusReport)),
    tag = "app"
)]
async fn status(State(state): State<AppState>) -> Response {
    Json(envelope::status_report(state.app_info(), Utc::now())).into_response()
}

/// App metadata, runtime version and the `AWS_`, `LAMBDA_` and `ENVIRONMENT*` variables.
#[utoipa::path(
    get,
    path = "/info",
    responses((status = 200, description = "Detailed app information", body = envelope::InfoReport)),
    tag = "app"
)]
async fn info(State(state): State<AppState>) -> Response {
    Json(envelope::info_report(
        state.app_info(),
        state.env().exposed(),
        Utc::now(),
    ))
    .into_response()
}

/// Fixed payload confirming a deployment.
#[utoipa::path(
    get,
    path = "/test",
    responses((status = 200, description = "Deployment verified", body = envelope::TestReport)),
    tag = "app"
)]
async fn test() -> Response {
    Json(envelope::test_report(Utc::now())).into_response()
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound {
        path: uri.path().to_owned(),
    }
}

fn handle_panic(cause: Box<dyn Any + Send + 'static>) -> Response {
    let cause = if let Some(message) = cause.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = cause.downcast_ref::<&str>() {
        (*message).to_owned()
    } else {
        "handler panicked".to_owned()
    };

    ApiError::Internal(cause).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use chrono::DateTime;
    use serde_json::Value;
    use tower::ServiceExt;

    const ROUTES: [&str; 7] = ["/", "/health", "/hello", "/time", "/status", "/info", "/test"];

    fn test_state() -> AppState {
        let env: EnvSnapshot = [
            ("ENVIRONMENT", "test"),
            ("AWS_REGION", "eu-central-1"),
            ("AWS_SECRET_ACCESS_KEY", "shh"),
            ("LAMBDA_TASK_ROOT", "/var/task"),
            ("HOME", "/root"),
            ("DATABASE_URL", "postgres://localhost"),
        ]
        .into_iter()
        .collect();
        AppState::new(AppInfo::from_snapshot(&env), env)
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn assert_timestamp(body: &Value) {
        let timestamp = body["timestamp"].as_str().expect("timestamp field");
        assert!(timestamp.ends_with('Z'), "{timestamp}");
        DateTime::parse_from_rfc3339(timestamp).expect("iso-8601 timestamp");
    }

    #[tokio::test]
    async fn every_route_returns_ok_with_timestamp() {
        for route in ROUTES {
            let (status, body) = get_json(router(test_state()), route).await;
            assert_eq!(status, StatusCode::OK, "{route}");
            assert_timestamp(&body);
        }
    }

    #[tokio::test]
    async fn responses_are_json() {
        let response = router(test_state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
    }

    #[tokio::test]
    async fn root_and_health_carry_app_info() {
        let (_, body) = get_json(router(test_state()), "/").await;
        assert_eq!(body["message"], "Welcome to Assure360 Test App!");
        assert_eq!(body["app"]["environment"], "test");
        assert_eq!(body["app"]["region"], "eu-central-1");

        let (_, body) = get_json(router(test_state()), "/health").await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["app"]["name"], "Assure360 Test App");
    }

    #[tokio::test]
    async fn hello_defaults_to_world() {
        let (_, body) = get_json(router(test_state()), "/hello").await;
        assert!(body["message"].as_str().unwrap().contains("World"));
    }

    #[tokio::test]
    async fn hello_greets_by_name() {
        let (_, body) = get_json(router(test_state()), "/hello?name=Ann").await;
        assert_eq!(body["message"], "Hello Ann from Assure360!");

        let (_, body) = get_json(router(test_state()), "/hello?name=Mary%20Jane").await;
        assert_eq!(body["message"], "Hello Mary Jane from Assure360!");
    }

    #[tokio::test]
    async fn hello_uses_last_repeated_name() {
        let (status, body) = get_json(router(test_state()), "/hello?name=Ann&name=Bob").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Hello Bob from Assure360!");

        let (_, body) = get_json(router(test_state()), "/hello?name=Ann&other=1").await;
        assert_eq!(body["message"], "Hello Ann from Assure360!");
    }

    #[tokio::test]
    async fn hello_ignores_unrelated_parameters() {
        let (status, body) = get_json(router(test_state()), "/hello?other=1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Hello World from Assure360!");
    }

    #[tokio::test]
    async fn time_unix_matches_utc() {
        let (_, body) = get_json(router(test_state()), "/time").await;
        let utc = DateTime::parse_from_rfc3339(body["utc"].as_str().unwrap()).unwrap();

        assert_eq!(body["unix"], utc.timestamp());
        assert!(body["formatted"].as_str().unwrap().ends_with(" UTC"));
        assert_eq!(body["app"]["region"], "eu-central-1");
    }

    #[tokio::test]
    async fn status_is_operational() {
        let (_, body) = get_json(router(test_state()), "/status").await;
        assert_eq!(body["status"], "operational");
        assert_eq!(body["uptime"], "unknown");
        assert_eq!(body["environment"], "test");
        assert_eq!(body["version"], crate::info::APP_VERSION);
    }

    #[tokio::test]
    async fn info_exposes_only_prefixed_variables() {
        let (_, body) = get_json(router(test_state()), "/info").await;
        let vars = body["environment_variables"].as_object().unwrap();

        assert!(!vars.is_empty());
        for key in vars.keys() {
            assert!(
                ["AWS_", "LAMBDA_", "ENVIRONMENT"]
                    .iter()
                    .any(|prefix| key.starts_with(prefix)),
                "{key}"
            );
        }
        assert!(vars.contains_key("LAMBDA_TASK_ROOT"));
        assert!(!vars.contains_key("HOME"));
        assert!(body["runtime_version"].is_string());
    }

    #[tokio::test]
    async fn test_endpoint_signals_success() {
        let (_, body) = get_json(router(test_state()), "/test").await;
        assert_eq!(body["message"], "Test endpoint working!");
        assert_eq!(body["ci_cd_status"], "success");
        assert_eq!(body["deployment"], "verified");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found_envelope() {
        let (status, body) = get_json(router(test_state()), "/nonexistent").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not Found");
        assert_eq!(
            body["message"],
            "The requested endpoint /nonexistent was not found"
        );
        assert_timestamp(&body);
    }

    #[tokio::test]
    async fn panicking_handler_is_internal_error_envelope() {
        async fn boom() -> &'static str {
            panic!("kaboom")
        }

        let routes = Router::new().route("/boom", get(boom));

        let (status, body) = get_json(with_middleware(routes), "/boom").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal Server Error");
        assert_eq!(body["message"], "An unexpected error occurred");
        assert_timestamp(&body);
    }

    #[tokio::test]
    async fn openapi_lists_every_route() {
        let (status, body) = get_json(router(test_state()), "/openapi.json").await;
        assert_eq!(status, StatusCode::OK);

        let paths = body["paths"].as_object().expect("paths");
        for route in ROUTES {
            assert!(paths.contains_key(route), "{route}");
            assert!(paths[route].get("get").is_some(), "{route}");
        }
        assert_eq!(body["info"]["title"], "Assure360 Test App");
        assert!(body["components"]["schemas"].get("ErrorEnvelope").is_some());
    }

    #[tokio::test]
    async fn serves_interactive_docs() {
        for uri in ["/docs/", "/redoc"] {
            let response = router(test_state())
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK, "{uri}");
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert!(String::from_utf8_lossy(&body).contains("<html"), "{uri}");
        }
    }

    #[tokio::test]
    async fn cors_allows_any_origin() {
        let response = router(test_state())
            .oneshot(
                Request::get("/health")
                    .header(header::ORIGIN, "https://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://example.com"
        );
    }
}
