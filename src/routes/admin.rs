use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Oversight endpoints nested under `/admin`: the moderation listing and the
/// dashboard aggregations.
///
/// Access Control:
/// These routes are not behind the authentication middleware; each handler
/// takes the `AuthUser` extractor directly (which rejects anonymous
/// requests) and then calls `require_admin`, so the role check is never
/// skippable by mounting mistakes.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/articles?size=...&page=...&role=admin&...
        // Paginated moderation listing with the reduced projection. The
        // all-statuses view additionally requires the explicit role=admin
        // parameter.
        .route("/articles", get(handlers::get_admin_articles))
        // GET /admin/articles/publisher-shares
        // Per-publisher share of the article corpus for the dashboard chart.
        .route(
            "/articles/publisher-shares",
            get(handlers::get_publisher_shares),
        )
        // GET /admin/payments/subscription-stats
        // Settled subscriptions per plan: subscriber share and revenue.
        .route(
            "/payments/subscription-stats",
            get(handlers::get_subscription_stats),
        )
}
