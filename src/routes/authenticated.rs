use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Authenticated Router Module
///
/// Routes for any signed-in user: article submission and reading, tag
/// creation, profile access and the subscription checkout flow.
///
/// Access Control Strategy:
/// The `AuthUser` middleware on this router guarantees every handler runs
/// with a verified identity whose role and entitlement were read from the
/// store on this request. Owner-Only operations compare that identity
/// against the resource; the user-management and moderation handlers mounted
/// here additionally call `require_admin`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /users/single?email=...
        // Resolves one profile; the client uses it to learn its role and
        // entitlement after sign-in.
        .route("/users/single", get(handlers::get_user))
        // GET /users (admin) lists every profile for the management table;
        // PUT /users (admin) promotes the named user to the admin role.
        .route(
            "/users",
            get(handlers::get_users).put(handlers::promote_user),
        )
        // PATCH /users/{email}
        // Owner-Only partial profile update.
        .route("/users/{email}", patch(handlers::update_profile))
        // POST /articles
        // New submission. Quota policy first, duplicate-headline check
        // second; both miss as soft notices.
        .route("/articles", post(handlers::submit_article))
        // GET/DELETE/PATCH /articles/{id}
        // Single fetch (counts the view atomically), Owner-Only delete, and
        // the admin-only moderation update.
        .route(
            "/articles/{id}",
            get(handlers::get_article)
                .delete(handlers::delete_article)
                .patch(handlers::update_article),
        )
        // GET /articles/user/{email}
        // The caller's own submissions in every status. Owner-Only.
        .route("/articles/user/{email}", get(handlers::get_my_articles))
        // POST /publishers
        // Registers a publisher. Admin-only inside the handler; duplicate
        // names come back as a soft notice.
        .route("/publishers", post(handlers::create_publisher))
        // POST /tags
        // Deduplicated insert of client-flagged-new tags.
        .route("/tags", post(handlers::submit_tags))
        // --- Subscription Checkout ---
        // POST /payments
        // Records the picked plan as the caller's single pending payment.
        .route("/payments", post(handlers::record_pending_payment))
        // POST /payments/create-intent
        // Asks the card processor for a client secret.
        .route(
            "/payments/create-intent",
            post(handlers::create_payment_intent),
        )
        // GET/PATCH /payments/{email}
        // Owner-Only: fetch the pending record, and settle it (pending to
        // paid, flips the profile to premium).
        .route(
            "/payments/{email}",
            get(handlers::get_pending_payment).patch(handlers::settle_payment),
        )
}
