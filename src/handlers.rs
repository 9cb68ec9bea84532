use crate::{
    AppState,
    auth::{AuthUser, TokenRequest, TokenResponse, TokenService},
    error::ApiError,
    models::{
        Article, ArticleAdminRow, ArticleSummary, CreateIntentRequest, CreateIntentResponse,
        Notice, Payment, PlanRequest, PlanStat, PromoteUserRequest, Publisher, PublisherShare,
        SettlementRequest, SubmitArticleRequest, Tag, TagSubmission, UpdateArticleRequest,
        UpdateProfileRequest, UpsertUserRequest, User, UserCounts,
    },
    payments::amount_cents,
    policy::{PublishDecision, can_publish, dedupe_new_tags},
    query::{ArticleListParams, CallerView, build_list_query},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

// --- Filter Structs ---

/// EmailQuery
///
/// Query parameter wrapper for the single-profile lookup endpoint.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct EmailQuery {
    pub email: String,
}

// --- Token Handlers ---

/// issue_token
///
/// [Public Route] Mints a signed token for the given email after the client
/// completes sign-in with its identity provider. `kind` selects the session
/// (default, long-lived) or login (one hour) mode.
///
/// *Note*: issuing is unconditional; the token only becomes usable once the
/// profile upsert has stored the user, because verification re-reads the
/// store on every request.
#[utoipa::path(
    post,
    path = "/auth/token",
    request_body = TokenRequest,
    responses((status = 200, description = "Signed token", body = TokenResponse))
)]
pub async fn issue_token(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = TokenService::new(&state.config).issue(&payload.email, payload.kind)?;
    Ok(Json(TokenResponse { token }))
}

// --- User Handlers ---

/// upsert_user
///
/// [Public Route] Idempotent profile write fired on every login, register and
/// profile-sync event.
///
/// *Invariant*: `role` is assigned only on first insert; a re-login can
/// refresh the display fields but never resets role or entitlement. When
/// nothing would change, the soft notice `Profile Up to Date!` is returned
/// instead of a write.
#[utoipa::path(
    post,
    path = "/users",
    request_body = UpsertUserRequest,
    responses(
        (status = 200, description = "Stored profile or up-to-date notice", body = User)
    )
)]
pub async fn upsert_user(
    State(state): State<AppState>,
    Json(payload): Json<UpsertUserRequest>,
) -> Result<Response, ApiError> {
    if let Some(existing) = state.repo.find_user(&payload.email).await? {
        if existing.name == payload.name && existing.profile_image == payload.profile_image {
            return Ok(Json(Notice::new("Profile Up to Date!")).into_response());
        }
    }
    let user = state.repo.upsert_user(&payload).await?;
    Ok(Json(user).into_response())
}

/// get_user
///
/// [Authenticated Route] Fetches one profile by email. The client uses this
/// to resolve the role and entitlement of the signed-in user.
#[utoipa::path(
    get,
    path = "/users/single",
    params(EmailQuery),
    responses(
        (status = 200, description = "Profile", body = User),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn get_user(
    _auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<User>, ApiError> {
    match state.repo.find_user(&query.email).await? {
        Some(user) => Ok(Json(user)),
        None => Err(ApiError::NotFound),
    }
}

/// get_users
///
/// [Admin Route] Lists every registered profile for the user-management
/// table.
#[utoipa::path(
    get,
    path = "/users",
    responses((status = 200, description = "All users", body = [User]))
)]
pub async fn get_users(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>, ApiError> {
    auth.require_admin()?;
    Ok(Json(state.repo.list_users().await?))
}

/// promote_user
///
/// [Admin Route] Grants the admin role to the named user and stamps the
/// promotion time.
#[utoipa::path(
    put,
    path = "/users",
    request_body = PromoteUserRequest,
    responses(
        (status = 200, description = "Promoted profile", body = User),
        (status = 404, description = "Unknown email")
    )
)]
pub async fn promote_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PromoteUserRequest>,
) -> Result<Json<User>, ApiError> {
    auth.require_admin()?;
    match state.repo.promote_user(&payload.email).await? {
        Some(user) => Ok(Json(user)),
        None => Err(ApiError::NotFound),
    }
}

/// update_profile
///
/// [Authenticated Route] Partial update of the caller's own profile.
///
/// *Authorization*: **Owner-Only**; the path email must match the verified
/// identity.
#[utoipa::path(
    patch,
    path = "/users/{email}",
    params(("email" = String, Path, description = "Profile email")),
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Updated profile", body = User))
)]
pub async fn update_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    auth.require_owner(&email)?;
    match state.repo.update_profile(&email, &payload).await? {
        Some(user) => Ok(Json(user)),
        None => Err(ApiError::NotFound),
    }
}

/// get_user_counts
///
/// [Public Route] Total, free-tier and premium subscriber counts for the
/// public stats banner.
#[utoipa::path(
    get,
    path = "/users/count",
    responses((status = 200, description = "Tier counts", body = UserCounts))
)]
pub async fn get_user_counts(
    State(state): State<AppState>,
) -> Result<Json<UserCounts>, ApiError> {
    Ok(Json(state.repo.user_counts().await?))
}

// --- Article Handlers ---

/// submit_article
///
/// [Authenticated Route] Accepts a new article submission into Pending
/// status.
///
/// *Gating order*: the quota policy runs first (free tier is limited to one
/// article in any status; premium and admin are unlimited), then the
/// duplicate-headline check. Both failures are soft 200 notices the client
/// inspects, never error statuses.
#[utoipa::path(
    post,
    path = "/articles",
    request_body = SubmitArticleRequest,
    responses(
        (status = 200, description = "Created article, or quota/duplicate notice", body = Article)
    )
)]
pub async fn submit_article(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitArticleRequest>,
) -> Result<Response, ApiError> {
    let existing = state.repo.count_articles_by_author(&auth.email).await?;
    if let PublishDecision::Deny(reason) = can_publish(auth.role, auth.is_premium, existing) {
        return Ok(Json(Notice::new(reason)).into_response());
    }

    match state.repo.create_article(&payload, &auth.email).await? {
        Some(article) => Ok(Json(article).into_response()),
        None => Ok(Json(Notice::new("Article Already Exists!")).into_response()),
    }
}

/// get_articles
///
/// [Public Route] Approved-article listing with tag/publisher/premium/search
/// filters, keyed sorting and an optional row cap via `size`.
///
/// *Security*: the visibility predicate is fixed to Approved in the query
/// builder for the Reader view; no parameter combination can widen it.
#[utoipa::path(
    get,
    path = "/articles",
    params(ArticleListParams),
    responses((status = 200, description = "Approved articles", body = [ArticleSummary]))
)]
pub async fn get_articles(
    State(state): State<AppState>,
    Query(params): Query<ArticleListParams>,
) -> Result<Json<Vec<ArticleSummary>>, ApiError> {
    let query = build_list_query(&params, CallerView::Reader);
    Ok(Json(state.repo.list_articles(&query).await?))
}

/// get_admin_articles
///
/// [Admin Route] Paginated moderation listing over every status, using the
/// reduced oversight projection.
///
/// *Note*: non-approved statuses only appear when the request explicitly
/// carries `role=admin`; without it even an admin session sees the approved
/// subset.
#[utoipa::path(
    get,
    path = "/admin/articles",
    params(ArticleListParams),
    responses((status = 200, description = "Moderation rows", body = [ArticleAdminRow]))
)]
pub async fn get_admin_articles(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ArticleListParams>,
) -> Result<Json<Vec<ArticleAdminRow>>, ApiError> {
    auth.require_admin()?;
    let query = build_list_query(&params, CallerView::Admin);
    Ok(Json(state.repo.list_articles_admin(&query).await?))
}

/// get_article
///
/// [Authenticated Route] Single-article fetch. The view counter is
/// incremented atomically in the same statement as the read, so concurrent
/// fetches never lose a count.
#[utoipa::path(
    get,
    path = "/articles/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article", body = Article),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_article(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Article>, ApiError> {
    match state.repo.read_article(id).await? {
        Some(article) => Ok(Json(article)),
        None => Err(ApiError::NotFound),
    }
}

/// get_my_articles
///
/// [Authenticated Route] The caller's own submissions in every status.
///
/// *Authorization*: **Owner-Only** against the path email.
#[utoipa::path(
    get,
    path = "/articles/user/{email}",
    params(("email" = String, Path, description = "Author email")),
    responses((status = 200, description = "Author's articles", body = [Article]))
)]
pub async fn get_my_articles(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Article>>, ApiError> {
    auth.require_owner(&email)?;
    Ok(Json(state.repo.articles_by_author(&email).await?))
}

/// delete_article
///
/// [Authenticated Route] Deletes one of the caller's own articles.
///
/// *Authorization*: the owner email comes from the verified identity, never
/// from the request, and the ownership check and delete are one statement.
/// A miss is reported as 404 whether the article was absent or owned by
/// someone else.
#[utoipa::path(
    delete,
    path = "/articles/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found or Not Yours")
    )
)]
pub async fn delete_article(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<axum::http::StatusCode, ApiError> {
    if state.repo.delete_article(id, &auth.email).await? {
        Ok(axum::http::StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// update_article
///
/// [Admin Route] Moderation update: status transitions, premium flag and
/// content edits, all partial.
#[utoipa::path(
    patch,
    path = "/articles/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Updated article", body = Article),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_article(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateArticleRequest>,
) -> Result<Json<Article>, ApiError> {
    auth.require_admin()?;
    match state.repo.update_article(id, &payload).await? {
        Some(article) => Ok(Json(article)),
        None => Err(ApiError::NotFound),
    }
}

/// get_publisher_shares
///
/// [Admin Route] Per-publisher share of the article corpus for the dashboard
/// chart.
#[utoipa::path(
    get,
    path = "/admin/articles/publisher-shares",
    responses((status = 200, description = "Shares", body = [PublisherShare]))
)]
pub async fn get_publisher_shares(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PublisherShare>>, ApiError> {
    auth.require_admin()?;
    Ok(Json(state.repo.publisher_shares().await?))
}

// --- Publisher Handlers ---

/// get_publishers
///
/// [Public Route] The publisher catalog, used by submission forms and filter
/// menus.
#[utoipa::path(
    get,
    path = "/publishers",
    responses((status = 200, description = "Publishers", body = [Publisher]))
)]
pub async fn get_publishers(
    State(state): State<AppState>,
) -> Result<Json<Vec<Publisher>>, ApiError> {
    Ok(Json(state.repo.list_publishers().await?))
}

/// create_publisher
///
/// [Admin Route] Registers a publisher. A duplicate name is a soft notice,
/// not an error; the unique index underneath keeps a racing double-submit
/// from writing twice.
#[utoipa::path(
    post,
    path = "/publishers",
    request_body = Publisher,
    responses(
        (status = 200, description = "Created publisher, or duplicate notice", body = Publisher)
    )
)]
pub async fn create_publisher(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<Publisher>,
) -> Result<Response, ApiError> {
    auth.require_admin()?;
    if state.repo.create_publisher(&payload).await? {
        Ok(Json(payload).into_response())
    } else {
        Ok(Json(Notice::new("Publisher Already Exists!")).into_response())
    }
}

// --- Tag Handlers ---

/// get_tags
///
/// [Public Route] The tag catalog backing the submission form's select
/// widget.
#[utoipa::path(
    get,
    path = "/tags",
    responses((status = 200, description = "Tags", body = [Tag]))
)]
pub async fn get_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.repo.list_tags().await?))
}

/// submit_tags
///
/// [Authenticated Route] Inserts the tags the client flagged as newly
/// created, after dropping values already in the catalog and repeats within
/// the batch. An empty remainder yields the notice `No New Tags to Add`.
#[utoipa::path(
    post,
    path = "/tags",
    request_body = [TagSubmission],
    responses(
        (status = 200, description = "Inserted tags, or nothing-to-add notice", body = [Tag])
    )
)]
pub async fn submit_tags(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<Vec<TagSubmission>>,
) -> Result<Response, ApiError> {
    let catalog = state.repo.tag_values().await?.into_iter().collect();
    let fresh = dedupe_new_tags(&payload, &catalog);
    if fresh.is_empty() {
        return Ok(Json(Notice::new("No New Tags to Add")).into_response());
    }
    state.repo.insert_tags(&fresh).await?;
    Ok(Json(fresh).into_response())
}

// --- Payment Handlers ---

/// record_pending_payment
///
/// [Authenticated Route] Records the plan the caller picked at checkout as
/// their pending payment, replacing any earlier pending record.
///
/// *Security*: the payment owner is the verified identity; the body only
/// carries plan and price.
#[utoipa::path(
    post,
    path = "/payments",
    request_body = PlanRequest,
    responses((status = 200, description = "Pending payment", body = Payment))
)]
pub async fn record_pending_payment(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PlanRequest>,
) -> Result<Json<Payment>, ApiError> {
    let payment = state
        .repo
        .upsert_pending_payment(&auth.email, &payload.plan, payload.price)
        .await?;
    Ok(Json(payment))
}

/// get_pending_payment
///
/// [Authenticated Route] The caller's pending payment, shown on the checkout
/// page.
///
/// *Authorization*: **Owner-Only** against the path email.
#[utoipa::path(
    get,
    path = "/payments/{email}",
    params(("email" = String, Path, description = "Payer email")),
    responses(
        (status = 200, description = "Pending payment", body = Payment),
        (status = 404, description = "Nothing pending")
    )
)]
pub async fn get_pending_payment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    auth.require_owner(&email)?;
    match state.repo.pending_payment(&email).await? {
        Some(payment) => Ok(Json(payment)),
        None => Err(ApiError::NotFound),
    }
}

/// settle_payment
///
/// [Authenticated Route] Marks the caller's pending payment as paid once the
/// client reports the charge succeeded, and switches the profile to premium.
/// A settlement with no pending record still writes a paid row, so a
/// confirmed charge is never dropped.
#[utoipa::path(
    patch,
    path = "/payments/{email}",
    params(("email" = String, Path, description = "Payer email")),
    request_body = SettlementRequest,
    responses((status = 200, description = "Settled payment", body = Payment))
)]
pub async fn settle_payment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(payload): Json<SettlementRequest>,
) -> Result<Json<Payment>, ApiError> {
    auth.require_owner(&email)?;
    let payment = state
        .repo
        .settle_payment(&email, payload.transaction_id.as_deref())
        .await?;
    state.repo.set_premium(&email, true).await?;
    Ok(Json(payment))
}

/// create_payment_intent
///
/// [Authenticated Route] Asks the card processor for a payment intent and
/// returns its client secret for the browser-side confirmation step.
#[utoipa::path(
    post,
    path = "/payments/create-intent",
    request_body = CreateIntentRequest,
    responses((status = 200, description = "Client secret", body = CreateIntentResponse))
)]
pub async fn create_payment_intent(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateIntentRequest>,
) -> Result<Json<CreateIntentResponse>, ApiError> {
    match state.payments.create_intent(amount_cents(payload.price)).await {
        Ok(client_secret) => Ok(Json(CreateIntentResponse { client_secret })),
        Err(e) => Err(ApiError::Upstream(e)),
    }
}

/// get_subscription_stats
///
/// [Admin Route] Settled subscriptions grouped by plan: subscriber share and
/// revenue for the dashboard charts.
#[utoipa::path(
    get,
    path = "/admin/payments/subscription-stats",
    responses((status = 200, description = "Plan stats", body = [PlanStat]))
)]
pub async fn get_subscription_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PlanStat>>, ApiError> {
    auth.require_admin()?;
    Ok(Json(state.repo.plan_stats().await?))
}

// --- Misc Handlers ---

/// health_check
///
/// [Public Route] Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Alive"))
)]
pub async fn health_check() -> &'static str {
    "OK"
}
