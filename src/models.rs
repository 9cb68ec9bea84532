use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Core Application Schemas (Mapped to Database) ---

/// Role
///
/// The RBAC field stored on the user's profile. Defaults to `user` on first
/// write; only an existing admin can change it (see the promote endpoint).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// User
///
/// Canonical identity record, keyed by email. Created/updated via the
/// idempotent upsert triggered on every login/profile-sync event; never
/// hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    // The user's primary identifier.
    pub email: String,
    pub name: String,
    pub profile_image: Option<String>,
    pub role: Role,
    /// Premium entitlement flag. Read by the quota policy; flipped when a
    /// payment settles.
    #[serde(rename = "isPremium")]
    pub is_premium: bool,
    /// Set exactly once, on promotion to admin.
    #[ts(type = "string | null")]
    pub admin_since: Option<DateTime<Utc>>,
}

/// ArticleStatus
///
/// Moderation lifecycle of an article. New submissions start `Pending`;
/// administrators move them to `Approved` or `Rejected`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[sqlx(type_name = "article_status")]
#[ts(export)]
pub enum ArticleStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// Article
///
/// The full article record. The `id` is a monotonically increasing sequence,
/// which doubles as the natural (insertion) order for listings.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Article {
    pub id: i64,
    /// Unique across the corpus; enforced by a pre-check plus a storage
    /// unique index (the pre-check supplies the soft duplicate message).
    pub headline: String,
    pub description: String,
    pub publisher: String,
    pub tags: Vec<String>,
    /// Owner. Delete is restricted to this email; moderation to admins.
    pub posted_by_email: String,
    #[ts(type = "string")]
    pub posted_on: DateTime<Utc>,
    /// Monotonically non-decreasing; incremented exactly once per
    /// single-article read.
    pub view_count: i64,
    pub status: ArticleStatus,
    #[serde(rename = "isPremium")]
    pub is_premium: bool,
}

/// ArticleSummary
///
/// Public listing projection: everything except the article body.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct ArticleSummary {
    pub id: i64,
    pub headline: String,
    pub publisher: String,
    pub tags: Vec<String>,
    pub posted_by_email: String,
    #[ts(type = "string")]
    pub posted_on: DateTime<Utc>,
    pub view_count: i64,
    pub status: ArticleStatus,
    #[serde(rename = "isPremium")]
    pub is_premium: bool,
}

/// ArticleAdminRow
///
/// The fixed lightweight projection returned by the administrator listing:
/// id, headline, author, publish time, status, publisher and premium flag.
/// Never the body.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct ArticleAdminRow {
    pub id: i64,
    pub headline: String,
    pub posted_by_email: String,
    #[ts(type = "string")]
    pub posted_on: DateTime<Utc>,
    pub status: ArticleStatus,
    pub publisher: String,
    #[serde(rename = "isPremium")]
    pub is_premium: bool,
}

impl From<Article> for ArticleSummary {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            headline: article.headline,
            publisher: article.publisher,
            tags: article.tags,
            posted_by_email: article.posted_by_email,
            posted_on: article.posted_on,
            view_count: article.view_count,
            status: article.status,
            is_premium: article.is_premium,
        }
    }
}

impl From<Article> for ArticleAdminRow {
    fn from(article: Article) -> Self {
        Self {
            id: article.id,
            headline: article.headline,
            posted_by_email: article.posted_by_email,
            posted_on: article.posted_on,
            status: article.status,
            publisher: article.publisher,
            is_premium: article.is_premium,
        }
    }
}

/// Publisher
///
/// Keyed by name; created only by an administrator.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Publisher {
    pub name: String,
    pub logo: String,
}

/// Tag
///
/// Keyed by its value (unique label). Created opportunistically the first
/// time it is used on an article; never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Tag {
    pub value: String,
    pub label: String,
}

/// PaymentStatus
///
/// pending = checkout initiated, paid = settled. The only transition is
/// from pending to paid; there is no refund/cancel path.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

/// Payment
///
/// Subscription payment record. At most one `pending` record exists per user
/// at any time (partial unique index); re-submission overwrites in place.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Payment {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_email: String,
    pub plan: String,
    pub price: f64,
    pub status: PaymentStatus,
    #[serde(rename = "transactionId")]
    pub transaction_id: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub settled_at: Option<DateTime<Utc>>,
}

// --- Request Payloads (Input Schemas) ---

/// UpsertUserRequest
///
/// Body of the profile-sync upsert (POST /users), fired by the client on
/// every register/login/profile edit. Role is never accepted from here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpsertUserRequest {
    pub email: String,
    pub name: String,
    pub profile_image: Option<String>,
}

/// PromoteUserRequest
///
/// Body of the admin-only promotion endpoint (PUT /users).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PromoteUserRequest {
    pub email: String,
}

/// UpdateProfileRequest
///
/// Partial owner update (PATCH /users/{email}); all fields optional so only
/// provided values are written.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,

    #[serde(rename = "isPremium", skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
}

/// SubmitArticleRequest
///
/// Input payload for submitting a new article (POST /articles). The author,
/// timestamp, initial status (`Pending`) and view count are all set by the
/// server from the verified identity, never taken from the body.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SubmitArticleRequest {
    pub headline: String,
    pub description: String,
    pub publisher: String,
    pub tags: Vec<String>,
    #[serde(rename = "isPremium", default)]
    pub is_premium: bool,
}

/// UpdateArticleRequest
///
/// Admin moderation update (PATCH /articles/{id}): approve/reject, premium
/// flag, or text edits. Partial, COALESCE-style.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateArticleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ArticleStatus>,

    #[serde(rename = "isPremium", skip_serializing_if = "Option::is_none")]
    pub is_premium: Option<bool>,
}

/// TagSubmission
///
/// One entry of the tag batch submitted alongside an article. `__isNew__` is
/// the flag the client's select widget sets on options it created on the fly;
/// entries without it are assumed already persisted and are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TagSubmission {
    pub value: String,
    pub label: String,
    #[serde(rename = "__isNew__", default)]
    pub is_new: bool,
}

/// PlanRequest
///
/// Body of the pending-subscription upsert (POST /payments). The user is the
/// verified identity.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PlanRequest {
    pub plan: String,
    pub price: f64,
}

/// SettlementRequest
///
/// Reported by the client once the processor confirms the charge
/// (PATCH /payments/{email}).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SettlementRequest {
    #[serde(rename = "transactionId")]
    pub transaction_id: Option<String>,
}

/// CreateIntentRequest
///
/// Asks the payment processor for a client-confirmable intent.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateIntentRequest {
    pub price: f64,
}

/// CreateIntentResponse
///
/// The opaque client secret the frontend hands to the processor's SDK.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateIntentResponse {
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
}

// --- Dashboard & Aggregate Schemas (Output) ---

/// UserCounts
///
/// Tier counts for the public stats widget (GET /users/count).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserCounts {
    pub total_users: i64,
    pub normal_users: i64,
    pub premium_users: i64,
}

/// PublisherShare
///
/// One row of the publisher-share aggregation: a publisher's article count
/// and its percentage share of the whole corpus. Percentages sum to 100.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct PublisherShare {
    pub publisher: String,
    pub count: i64,
    pub percentage: f64,
}

/// PlanStat
///
/// One row of the subscription-plan aggregation over `paid` payments:
/// per-plan count, percentage share of all paid payments, summed revenue.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct PlanStat {
    pub plan: String,
    pub count: i64,
    pub percentage: f64,
    pub revenue: f64,
}

/// Notice
///
/// The message-bearing 200 body used for soft business failures (duplicate
/// headline/publisher, quota exhaustion, empty tag batch, up-to-date
/// profile). Callers must inspect it; the status code alone says nothing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Notice {
    pub message: String,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
