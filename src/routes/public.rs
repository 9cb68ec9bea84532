use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token: the sign-in plumbing (token minting
/// and the idempotent profile upsert the client fires after its identity
/// provider confirms a login) and the read-only catalog data every visitor
/// sees.
///
/// Security Mandate:
/// The article listing here must only ever serve Approved content. That
/// predicate is fixed in the Reader-view query builder, not left to
/// parameters.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for monitors and load balancers.
        .route("/health", get(handlers::health_check))
        // POST /auth/token
        // Mints a session (default) or short-lived login token for the given
        // email. The token is only usable once the profile exists, since
        // verification re-reads the store.
        .route("/auth/token", post(handlers::issue_token))
        // POST /users
        // Idempotent profile upsert fired on login/register/profile-sync.
        // Never touches role or entitlement on the update path.
        .route("/users", post(handlers::upsert_user))
        // GET /users/count
        // Total/free/premium subscriber counts for the public stats banner.
        .route("/users/count", get(handlers::get_user_counts))
        // GET /articles?tag=...&publisher=...&premium=...&search=...&sort=...&size=...
        // Approved-article listing with filters, keyed sorting and an
        // optional row cap.
        .route("/articles", get(handlers::get_articles))
        // GET /publishers
        // Publisher catalog for submission forms and filter menus.
        .route("/publishers", get(handlers::get_publishers))
        // GET /tags
        // Tag catalog backing the submission form's select widget.
        .route("/tags", get(handlers::get_tags))
}
