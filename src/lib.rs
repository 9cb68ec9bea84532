use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod payments;
pub mod policy;
pub mod query;
pub mod repository;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes the state types easily accessible to the entry point (main.rs).
pub use config::{AppConfig, Env};
pub use error::ApiError;
pub use payments::{MockPaymentProcessor, PaymentState, StripeClient};
pub use repository::{MemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Auto-generates the OpenAPI documentation for the application by
/// aggregating every `#[utoipa::path]` handler and `ToSchema` model. The
/// resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::issue_token, handlers::upsert_user, handlers::get_user,
        handlers::get_users, handlers::promote_user, handlers::update_profile,
        handlers::get_user_counts, handlers::submit_article, handlers::get_articles,
        handlers::get_admin_articles, handlers::get_article, handlers::get_my_articles,
        handlers::delete_article, handlers::update_article, handlers::get_publisher_shares,
        handlers::get_publishers, handlers::create_publisher, handlers::get_tags,
        handlers::submit_tags, handlers::record_pending_payment, handlers::get_pending_payment,
        handlers::settle_payment, handlers::create_payment_intent,
        handlers::get_subscription_stats, handlers::health_check
    ),
    components(
        schemas(
            models::User, models::Role, models::Article, models::ArticleStatus,
            models::ArticleSummary, models::ArticleAdminRow, models::Publisher,
            models::Tag, models::Payment, models::PaymentStatus,
            models::UpsertUserRequest, models::PromoteUserRequest,
            models::UpdateProfileRequest, models::SubmitArticleRequest,
            models::UpdateArticleRequest, models::TagSubmission, models::PlanRequest,
            models::SettlementRequest, models::CreateIntentRequest,
            models::CreateIntentResponse, models::UserCounts, models::PublisherShare,
            models::PlanStat, models::Notice,
            auth::TokenRequest, auth::TokenResponse, auth::TokenKind,
        )
    ),
    tags(
        (name = "nexus-portal", description = "Nexus article portal API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, thread-safe container holding the application services and
/// configuration, shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: persistence access behind the trait object.
    pub repo: RepositoryState,
    /// Payment Layer: card-processor access behind the trait object.
    pub payments: PaymentState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors (notably AuthUser) pull individual components from the
// shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for PaymentState {
    fn from_ref(app_state: &AppState) -> PaymentState {
        app_state.payments.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Enforces authentication for the authenticated router.
///
/// *Mechanism*: runs the `AuthUser` extractor before the handler. A failed
/// extraction (bad token, expired token, unknown user) rejects the request
/// with the uniform 401 body and the handler never executes.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure, applies global and scoped middleware,
/// and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: no middleware applied.
        .merge(public::public_routes())
        // Authenticated Routes: protected by the auth middleware.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin Routes: nested under '/admin'. Authentication and the role
        // check both run inside the handlers.
        .nest("/admin", admin::admin_routes())
        // Apply the unified state to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: a unique UUID per request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: wraps the request/response lifecycle
                // in a span carrying the request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS (outermost).
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: includes the `x-request-id` header in the
/// structured metadata alongside the HTTP method and URI, so every log line
/// of one request correlates.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
