use crate::models::{
    Article, ArticleAdminRow, ArticleStatus, ArticleSummary, Payment, PaymentStatus, PlanStat,
    Publisher, PublisherShare, Role, SubmitArticleRequest, Tag, UpdateArticleRequest,
    UpdateProfileRequest, UpsertUserRequest, User, UserCounts,
};
use crate::query::ArticleQuery;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. Handlers
/// interact with the data layer through this trait only, so every endpoint
/// can run against either the PostgreSQL store or the in-memory store.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    // Identity lookup; the auth extractor calls this on every request.
    async fn find_user(&self, email: &str) -> sqlx::Result<Option<User>>;
    // Insert-or-refresh of the login profile. Never touches role or
    // entitlement on the update path.
    async fn upsert_user(&self, req: &UpsertUserRequest) -> sqlx::Result<User>;
    async fn list_users(&self) -> sqlx::Result<Vec<User>>;
    // Admin action: grants the admin role and stamps the promotion time.
    async fn promote_user(&self, email: &str) -> sqlx::Result<Option<User>>;
    // Owner action: partial profile update.
    async fn update_profile(
        &self,
        email: &str,
        req: &UpdateProfileRequest,
    ) -> sqlx::Result<Option<User>>;
    async fn user_counts(&self) -> sqlx::Result<UserCounts>;
    // Flips the premium entitlement; returns false when the user is unknown.
    async fn set_premium(&self, email: &str, premium: bool) -> sqlx::Result<bool>;

    // --- Articles ---
    // Returns None when the headline is already taken (soft duplicate).
    async fn create_article(
        &self,
        req: &SubmitArticleRequest,
        author_email: &str,
    ) -> sqlx::Result<Option<Article>>;
    async fn list_articles(&self, query: &ArticleQuery) -> sqlx::Result<Vec<ArticleSummary>>;
    async fn list_articles_admin(
        &self,
        query: &ArticleQuery,
    ) -> sqlx::Result<Vec<ArticleAdminRow>>;
    // Single-article read; atomically counts the view.
    async fn read_article(&self, id: i64) -> sqlx::Result<Option<Article>>;
    async fn articles_by_author(&self, email: &str) -> sqlx::Result<Vec<Article>>;
    async fn count_articles_by_author(&self, email: &str) -> sqlx::Result<i64>;
    // Owner-Only: deletes only when the author email matches.
    async fn delete_article(&self, id: i64, owner_email: &str) -> sqlx::Result<bool>;
    // Admin action: partial update, including status transitions.
    async fn update_article(
        &self,
        id: i64,
        req: &UpdateArticleRequest,
    ) -> sqlx::Result<Option<Article>>;
    async fn publisher_shares(&self) -> sqlx::Result<Vec<PublisherShare>>;

    // --- Publishers ---
    async fn list_publishers(&self) -> sqlx::Result<Vec<Publisher>>;
    // Returns false when a publisher with the same name already exists.
    async fn create_publisher(&self, publisher: &Publisher) -> sqlx::Result<bool>;

    // --- Tags ---
    async fn list_tags(&self) -> sqlx::Result<Vec<Tag>>;
    async fn tag_values(&self) -> sqlx::Result<Vec<String>>;
    // Inserts the batch, skipping values that raced in since the dedup pass.
    // Returns the number of rows actually written.
    async fn insert_tags(&self, tags: &[Tag]) -> sqlx::Result<i64>;

    // --- Payments ---
    // One pending payment per user: replaces the existing pending row.
    async fn upsert_pending_payment(
        &self,
        email: &str,
        plan: &str,
        price: f64,
    ) -> sqlx::Result<Payment>;
    async fn pending_payment(&self, email: &str) -> sqlx::Result<Option<Payment>>;
    // Marks the pending payment paid; records a paid row even when no
    // pending one exists, so a settlement is never lost.
    async fn settle_payment(
        &self,
        email: &str,
        transaction_id: Option<&str>,
    ) -> sqlx::Result<Payment>;
    async fn plan_stats(&self) -> sqlx::Result<Vec<PlanStat>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

const ARTICLE_COLUMNS: &str =
    "id, headline, description, publisher, tags, posted_by_email, posted_on, view_count, status, is_premium";
const SUMMARY_COLUMNS: &str =
    "id, headline, publisher, tags, posted_by_email, posted_on, view_count, status, is_premium";
const ADMIN_COLUMNS: &str =
    "id, headline, posted_by_email, posted_on, status, publisher, is_premium";
const USER_COLUMNS: &str = "email, name, profile_image, role, is_premium, admin_since";
const PAYMENT_COLUMNS: &str =
    "id, user_email, plan, price, status, transaction_id, created_at, settled_at";

/// article_list_query
///
/// Renders an ArticleQuery into a parameterised SELECT over the given column
/// list. The visibility rule lives in the base string so no parameter
/// combination can widen it; everything caller-supplied goes through
/// `push_bind`. Must stay in agreement with `ArticleQuery::admits`.
pub fn article_list_query(
    columns: &str,
    query: &ArticleQuery,
) -> QueryBuilder<'static, Postgres> {
    let base = match query.visibility {
        crate::query::Visibility::ApprovedOnly => {
            format!("SELECT {} FROM articles WHERE status = 'Approved'", columns)
        }
        crate::query::Visibility::All => {
            format!("SELECT {} FROM articles WHERE TRUE", columns)
        }
    };
    let mut builder: QueryBuilder<'static, Postgres> = QueryBuilder::new(base);

    if query.tags.len() == 1 {
        builder.push(" AND ");
        builder.push_bind(query.tags[0].clone());
        builder.push(" = ANY(tags)");
    } else if !query.tags.is_empty() {
        // Overlap: any shared tag admits the article.
        builder.push(" AND tags && ");
        builder.push_bind(query.tags.clone());
    }

    if let Some(publisher) = &query.publisher {
        builder.push(" AND publisher = ");
        builder.push_bind(publisher.clone());
    }

    if let Some(premium) = query.premium {
        builder.push(" AND is_premium = ");
        builder.push_bind(premium);
    }

    if let Some(search) = &query.search {
        // Case-insensitive substring match on the headline only.
        let search_pattern = format!("%{}%", search);
        builder.push(" AND headline ILIKE ");
        builder.push_bind(search_pattern);
    }

    builder.push(" ORDER BY ");
    builder.push(query.sort.order_clause());

    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }
    if let Some(offset) = query.offset {
        builder.push(" OFFSET ");
        builder.push_bind(offset);
    }

    builder
}

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// PostgreSQL database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- USERS ---

    async fn find_user(&self, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    /// upsert_user
    ///
    /// Insert-or-refresh keyed on email. The conflict path only touches the
    /// display fields; role and entitlement are assigned elsewhere and a
    /// re-login must never reset them.
    async fn upsert_user(&self, req: &UpsertUserRequest) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, name, profile_image)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO UPDATE
                SET name = EXCLUDED.name,
                    profile_image = EXCLUDED.profile_image
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&req.email)
        .bind(&req.name)
        .bind(&req.profile_image)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_users(&self) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY email ASC",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
    }

    /// promote_user
    ///
    /// Grants the admin role and stamps the promotion time. Returns None when
    /// no such user exists.
    async fn promote_user(&self, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = 'admin', admin_since = NOW() WHERE email = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    /// update_profile
    ///
    /// Partial update using COALESCE so only the fields present in the
    /// request change.
    async fn update_profile(
        &self,
        email: &str,
        req: &UpdateProfileRequest,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                profile_image = COALESCE($3, profile_image),
                is_premium = COALESCE($4, is_premium)
            WHERE email = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(email)
        .bind(&req.name)
        .bind(&req.profile_image)
        .bind(req.is_premium)
        .fetch_optional(&self.pool)
        .await
    }

    /// user_counts
    ///
    /// Compiles the subscriber counters for the admin dashboard.
    async fn user_counts(&self) -> sqlx::Result<UserCounts> {
        let total_users = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        let premium_users =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE is_premium = true")
                .fetch_one(&self.pool)
                .await?;
        Ok(UserCounts {
            total_users,
            normal_users: total_users - premium_users,
            premium_users,
        })
    }

    async fn set_premium(&self, email: &str, premium: bool) -> sqlx::Result<bool> {
        let result = sqlx::query("UPDATE users SET is_premium = $2 WHERE email = $1")
            .bind(email)
            .bind(premium)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- ARTICLES ---

    /// create_article
    ///
    /// Inserts a new submission in Pending status. Uses `ON CONFLICT DO
    /// NOTHING` against the unique headline index, so a duplicate comes back
    /// as None instead of an error even when two submissions race.
    async fn create_article(
        &self,
        req: &SubmitArticleRequest,
        author_email: &str,
    ) -> sqlx::Result<Option<Article>> {
        sqlx::query_as::<_, Article>(&format!(
            r#"
            INSERT INTO articles (headline, description, publisher, tags, posted_by_email, is_premium)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (headline) DO NOTHING
            RETURNING {}
            "#,
            ARTICLE_COLUMNS
        ))
        .bind(&req.headline)
        .bind(&req.description)
        .bind(&req.publisher)
        .bind(&req.tags)
        .bind(author_email)
        .bind(req.is_premium)
        .fetch_optional(&self.pool)
        .await
    }

    /// list_articles
    ///
    /// Public listing. The query value was built for the Reader view, so the
    /// rendered SQL always carries the approved-only predicate.
    async fn list_articles(&self, query: &ArticleQuery) -> sqlx::Result<Vec<ArticleSummary>> {
        let mut builder = article_list_query(SUMMARY_COLUMNS, query);
        builder
            .build_query_as::<ArticleSummary>()
            .fetch_all(&self.pool)
            .await
    }

    /// list_articles_admin
    ///
    /// Moderation listing with the reduced oversight projection.
    async fn list_articles_admin(
        &self,
        query: &ArticleQuery,
    ) -> sqlx::Result<Vec<ArticleAdminRow>> {
        let mut builder = article_list_query(ADMIN_COLUMNS, query);
        builder
            .build_query_as::<ArticleAdminRow>()
            .fetch_all(&self.pool)
            .await
    }

    /// read_article
    ///
    /// Fetches one article and counts the view in the same statement, so
    /// concurrent reads never lose increments.
    async fn read_article(&self, id: i64) -> sqlx::Result<Option<Article>> {
        sqlx::query_as::<_, Article>(&format!(
            "UPDATE articles SET view_count = view_count + 1 WHERE id = $1 RETURNING {}",
            ARTICLE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn articles_by_author(&self, email: &str) -> sqlx::Result<Vec<Article>> {
        sqlx::query_as::<_, Article>(&format!(
            "SELECT {} FROM articles WHERE posted_by_email = $1 ORDER BY id ASC",
            ARTICLE_COLUMNS
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await
    }

    async fn count_articles_by_author(&self, email: &str) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM articles WHERE posted_by_email = $1")
            .bind(email)
            .fetch_one(&self.pool)
            .await
    }

    /// delete_article
    ///
    /// **Owner-Only**: the row is removed only when the author email matches,
    /// so the authorization check and the delete are one statement.
    async fn delete_article(&self, id: i64, owner_email: &str) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1 AND posted_by_email = $2")
            .bind(id)
            .bind(owner_email)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// update_article
    ///
    /// Admin moderation update. COALESCE keeps absent fields untouched,
    /// which is how a bare status change avoids rewriting the content.
    async fn update_article(
        &self,
        id: i64,
        req: &UpdateArticleRequest,
    ) -> sqlx::Result<Option<Article>> {
        sqlx::query_as::<_, Article>(&format!(
            r#"
            UPDATE articles
            SET headline = COALESCE($2, headline),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                is_premium = COALESCE($5, is_premium)
            WHERE id = $1
            RETURNING {}
            "#,
            ARTICLE_COLUMNS
        ))
        .bind(id)
        .bind(&req.headline)
        .bind(&req.description)
        .bind(req.status)
        .bind(req.is_premium)
        .fetch_optional(&self.pool)
        .await
    }

    /// publisher_shares
    ///
    /// Per-publisher share of all articles, percentage computed over the
    /// window total so the slices always sum to 100.
    async fn publisher_shares(&self) -> sqlx::Result<Vec<PublisherShare>> {
        sqlx::query_as::<_, PublisherShare>(
            r#"
            SELECT publisher,
                   COUNT(*) AS count,
                   (COUNT(*) * 100.0 / SUM(COUNT(*)) OVER ())::float8 AS percentage
            FROM articles
            GROUP BY publisher
            ORDER BY count DESC, publisher ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    // --- PUBLISHERS ---

    async fn list_publishers(&self) -> sqlx::Result<Vec<Publisher>> {
        sqlx::query_as::<_, Publisher>("SELECT name, logo FROM publishers ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
    }

    /// create_publisher
    ///
    /// Idempotent insert against the unique name. Returns true only if a new
    /// row was written (`rows_affected > 0`).
    async fn create_publisher(&self, publisher: &Publisher) -> sqlx::Result<bool> {
        let result = sqlx::query(
            "INSERT INTO publishers (name, logo) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
        )
        .bind(&publisher.name)
        .bind(&publisher.logo)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- TAGS ---

    async fn list_tags(&self) -> sqlx::Result<Vec<Tag>> {
        sqlx::query_as::<_, Tag>("SELECT value, label FROM tags ORDER BY value ASC")
            .fetch_all(&self.pool)
            .await
    }

    async fn tag_values(&self) -> sqlx::Result<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT value FROM tags")
            .fetch_all(&self.pool)
            .await
    }

    /// insert_tags
    ///
    /// Writes the deduplicated batch one row at a time. `ON CONFLICT DO
    /// NOTHING` absorbs a concurrent insert of the same value between the
    /// dedup pass and this write.
    async fn insert_tags(&self, tags: &[Tag]) -> sqlx::Result<i64> {
        let mut inserted = 0;
        for tag in tags {
            let result = sqlx::query(
                "INSERT INTO tags (value, label) VALUES ($1, $2) ON CONFLICT (value) DO NOTHING",
            )
            .bind(&tag.value)
            .bind(&tag.label)
            .execute(&self.pool)
            .await?;
            inserted += result.rows_affected() as i64;
        }
        Ok(inserted)
    }

    // --- PAYMENTS ---

    /// upsert_pending_payment
    ///
    /// One pending payment per user, enforced by the partial unique index on
    /// `(user_email) WHERE status = 'pending'`. Choosing a new plan before
    /// checkout replaces the old pending row in place.
    async fn upsert_pending_payment(
        &self,
        email: &str,
        plan: &str,
        price: f64,
    ) -> sqlx::Result<Payment> {
        sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (id, user_email, plan, price)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_email) WHERE status = 'pending' DO UPDATE
                SET plan = EXCLUDED.plan,
                    price = EXCLUDED.price,
                    created_at = NOW()
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(plan)
        .bind(price)
        .fetch_one(&self.pool)
        .await
    }

    async fn pending_payment(&self, email: &str) -> sqlx::Result<Option<Payment>> {
        sqlx::query_as::<_, Payment>(&format!(
            "SELECT {} FROM payments WHERE user_email = $1 AND status = 'pending'",
            PAYMENT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    /// settle_payment
    ///
    /// Flips the pending payment to paid and stamps the settlement. When no
    /// pending row exists the settlement is still recorded as a paid row, so
    /// a confirmed charge is never dropped.
    async fn settle_payment(
        &self,
        email: &str,
        transaction_id: Option<&str>,
    ) -> sqlx::Result<Payment> {
        let settled = sqlx::query_as::<_, Payment>(&format!(
            r#"
            UPDATE payments
            SET status = 'paid',
                transaction_id = $2,
                settled_at = NOW()
            WHERE user_email = $1 AND status = 'pending'
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(email)
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(payment) = settled {
            return Ok(payment);
        }

        sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (id, user_email, plan, price, status, transaction_id, settled_at)
            VALUES ($1, $2, '', 0, 'paid', $3, NOW())
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(transaction_id)
        .fetch_one(&self.pool)
        .await
    }

    /// plan_stats
    ///
    /// Settled subscriptions grouped by plan: share of subscribers and
    /// revenue per plan in one query.
    async fn plan_stats(&self) -> sqlx::Result<Vec<PlanStat>> {
        sqlx::query_as::<_, PlanStat>(
            r#"
            SELECT plan,
                   COUNT(*) AS count,
                   (COUNT(*) * 100.0 / SUM(COUNT(*)) OVER ())::float8 AS percentage,
                   SUM(price)::float8 AS revenue
            FROM payments
            WHERE status = 'paid'
            GROUP BY plan
            ORDER BY count DESC, plan ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }
}

/// MemoryRepository
///
/// In-memory implementation of the `Repository` trait, backing the handler
/// and router tests so they run without a database. Every method mirrors the
/// PostgreSQL semantics, including conflict behaviour and result ordering.
#[derive(Default)]
pub struct MemoryRepository {
    inner: Mutex<MemoryStore>,
}

#[derive(Default)]
struct MemoryStore {
    users: Vec<User>,
    articles: Vec<Article>,
    publishers: Vec<Publisher>,
    tags: Vec<Tag>,
    payments: Vec<Payment>,
    // Monotonic id source; articles keep insertion order by construction.
    next_article_id: i64,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, MemoryStore> {
        self.inner.lock().expect("memory store poisoned")
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    // --- USERS ---

    async fn find_user(&self, email: &str) -> sqlx::Result<Option<User>> {
        let store = self.store();
        Ok(store.users.iter().find(|u| u.email == email).cloned())
    }

    async fn upsert_user(&self, req: &UpsertUserRequest) -> sqlx::Result<User> {
        let mut store = self.store();
        if let Some(user) = store.users.iter_mut().find(|u| u.email == req.email) {
            user.name = req.name.clone();
            user.profile_image = req.profile_image.clone();
            return Ok(user.clone());
        }
        let user = User {
            email: req.email.clone(),
            name: req.name.clone(),
            profile_image: req.profile_image.clone(),
            role: Role::User,
            is_premium: false,
            admin_since: None,
        };
        store.users.push(user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> sqlx::Result<Vec<User>> {
        let store = self.store();
        let mut users = store.users.clone();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn promote_user(&self, email: &str) -> sqlx::Result<Option<User>> {
        let mut store = self.store();
        Ok(store.users.iter_mut().find(|u| u.email == email).map(|u| {
            u.role = Role::Admin;
            u.admin_since = Some(Utc::now());
            u.clone()
        }))
    }

    async fn update_profile(
        &self,
        email: &str,
        req: &UpdateProfileRequest,
    ) -> sqlx::Result<Option<User>> {
        let mut store = self.store();
        Ok(store.users.iter_mut().find(|u| u.email == email).map(|u| {
            if let Some(name) = &req.name {
                u.name = name.clone();
            }
            if let Some(image) = &req.profile_image {
                u.profile_image = Some(image.clone());
            }
            if let Some(premium) = req.is_premium {
                u.is_premium = premium;
            }
            u.clone()
        }))
    }

    async fn user_counts(&self) -> sqlx::Result<UserCounts> {
        let store = self.store();
        let total_users = store.users.len() as i64;
        let premium_users = store.users.iter().filter(|u| u.is_premium).count() as i64;
        Ok(UserCounts {
            total_users,
            normal_users: total_users - premium_users,
            premium_users,
        })
    }

    async fn set_premium(&self, email: &str, premium: bool) -> sqlx::Result<bool> {
        let mut store = self.store();
        match store.users.iter_mut().find(|u| u.email == email) {
            Some(user) => {
                user.is_premium = premium;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // --- ARTICLES ---

    async fn create_article(
        &self,
        req: &SubmitArticleRequest,
        author_email: &str,
    ) -> sqlx::Result<Option<Article>> {
        let mut store = self.store();
        if store.articles.iter().any(|a| a.headline == req.headline) {
            return Ok(None);
        }
        store.next_article_id += 1;
        let article = Article {
            id: store.next_article_id,
            headline: req.headline.clone(),
            description: req.description.clone(),
            publisher: req.publisher.clone(),
            tags: req.tags.clone(),
            posted_by_email: author_email.to_string(),
            posted_on: Utc::now(),
            view_count: 0,
            status: ArticleStatus::Pending,
            is_premium: req.is_premium,
        };
        store.articles.push(article.clone());
        Ok(Some(article))
    }

    async fn list_articles(&self, query: &ArticleQuery) -> sqlx::Result<Vec<ArticleSummary>> {
        let store = self.store();
        Ok(query
            .apply(store.articles.clone())
            .into_iter()
            .map(ArticleSummary::from)
            .collect())
    }

    async fn list_articles_admin(
        &self,
        query: &ArticleQuery,
    ) -> sqlx::Result<Vec<ArticleAdminRow>> {
        let store = self.store();
        Ok(query
            .apply(store.articles.clone())
            .into_iter()
            .map(ArticleAdminRow::from)
            .collect())
    }

    async fn read_article(&self, id: i64) -> sqlx::Result<Option<Article>> {
        let mut store = self.store();
        Ok(store.articles.iter_mut().find(|a| a.id == id).map(|a| {
            a.view_count += 1;
            a.clone()
        }))
    }

    async fn articles_by_author(&self, email: &str) -> sqlx::Result<Vec<Article>> {
        let store = self.store();
        Ok(store
            .articles
            .iter()
            .filter(|a| a.posted_by_email == email)
            .cloned()
            .collect())
    }

    async fn count_articles_by_author(&self, email: &str) -> sqlx::Result<i64> {
        let store = self.store();
        Ok(store
            .articles
            .iter()
            .filter(|a| a.posted_by_email == email)
            .count() as i64)
    }

    async fn delete_article(&self, id: i64, owner_email: &str) -> sqlx::Result<bool> {
        let mut store = self.store();
        let before = store.articles.len();
        store
            .articles
            .retain(|a| !(a.id == id && a.posted_by_email == owner_email));
        Ok(store.articles.len() < before)
    }

    async fn update_article(
        &self,
        id: i64,
        req: &UpdateArticleRequest,
    ) -> sqlx::Result<Option<Article>> {
        let mut store = self.store();
        Ok(store.articles.iter_mut().find(|a| a.id == id).map(|a| {
            if let Some(headline) = &req.headline {
                a.headline = headline.clone();
            }
            if let Some(description) = &req.description {
                a.description = description.clone();
            }
            if let Some(status) = req.status {
                a.status = status;
            }
            if let Some(premium) = req.is_premium {
                a.is_premium = premium;
            }
            a.clone()
        }))
    }

    async fn publisher_shares(&self) -> sqlx::Result<Vec<PublisherShare>> {
        let store = self.store();
        let total = store.articles.len() as f64;
        let mut counts: std::collections::BTreeMap<String, i64> = std::collections::BTreeMap::new();
        for article in &store.articles {
            *counts.entry(article.publisher.clone()).or_default() += 1;
        }
        let mut shares: Vec<PublisherShare> = counts
            .into_iter()
            .map(|(publisher, count)| PublisherShare {
                publisher,
                count,
                percentage: count as f64 * 100.0 / total,
            })
            .collect();
        shares.sort_by(|a, b| b.count.cmp(&a.count).then(a.publisher.cmp(&b.publisher)));
        Ok(shares)
    }

    // --- PUBLISHERS ---

    async fn list_publishers(&self) -> sqlx::Result<Vec<Publisher>> {
        let store = self.store();
        let mut publishers = store.publishers.clone();
        publishers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(publishers)
    }

    async fn create_publisher(&self, publisher: &Publisher) -> sqlx::Result<bool> {
        let mut store = self.store();
        if store.publishers.iter().any(|p| p.name == publisher.name) {
            return Ok(false);
        }
        store.publishers.push(publisher.clone());
        Ok(true)
    }

    // --- TAGS ---

    async fn list_tags(&self) -> sqlx::Result<Vec<Tag>> {
        let store = self.store();
        let mut tags = store.tags.clone();
        tags.sort_by(|a, b| a.value.cmp(&b.value));
        Ok(tags)
    }

    async fn tag_values(&self) -> sqlx::Result<Vec<String>> {
        let store = self.store();
        Ok(store.tags.iter().map(|t| t.value.clone()).collect())
    }

    async fn insert_tags(&self, tags: &[Tag]) -> sqlx::Result<i64> {
        let mut store = self.store();
        let mut inserted = 0;
        for tag in tags {
            if store.tags.iter().any(|t| t.value == tag.value) {
                continue;
            }
            store.tags.push(tag.clone());
            inserted += 1;
        }
        Ok(inserted)
    }

    // --- PAYMENTS ---

    async fn upsert_pending_payment(
        &self,
        email: &str,
        plan: &str,
        price: f64,
    ) -> sqlx::Result<Payment> {
        let mut store = self.store();
        if let Some(payment) = store
            .payments
            .iter_mut()
            .find(|p| p.user_email == email && p.status == PaymentStatus::Pending)
        {
            payment.plan = plan.to_string();
            payment.price = price;
            payment.created_at = Utc::now();
            return Ok(payment.clone());
        }
        let payment = Payment {
            id: Uuid::new_v4(),
            user_email: email.to_string(),
            plan: plan.to_string(),
            price,
            status: PaymentStatus::Pending,
            transaction_id: None,
            created_at: Utc::now(),
            settled_at: None,
        };
        store.payments.push(payment.clone());
        Ok(payment)
    }

    async fn pending_payment(&self, email: &str) -> sqlx::Result<Option<Payment>> {
        let store = self.store();
        Ok(store
            .payments
            .iter()
            .find(|p| p.user_email == email && p.status == PaymentStatus::Pending)
            .cloned())
    }

    async fn settle_payment(
        &self,
        email: &str,
        transaction_id: Option<&str>,
    ) -> sqlx::Result<Payment> {
        let mut store = self.store();
        if let Some(payment) = store
            .payments
            .iter_mut()
            .find(|p| p.user_email == email && p.status == PaymentStatus::Pending)
        {
            payment.status = PaymentStatus::Paid;
            payment.transaction_id = transaction_id.map(str::to_string);
            payment.settled_at = Some(Utc::now());
            return Ok(payment.clone());
        }
        let payment = Payment {
            id: Uuid::new_v4(),
            user_email: email.to_string(),
            plan: String::new(),
            price: 0.0,
            status: PaymentStatus::Paid,
            transaction_id: transaction_id.map(str::to_string),
            created_at: Utc::now(),
            settled_at: Some(Utc::now()),
        };
        store.payments.push(payment.clone());
        Ok(payment)
    }

    async fn plan_stats(&self) -> sqlx::Result<Vec<PlanStat>> {
        let store = self.store();
        let paid: Vec<&Payment> = store
            .payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Paid)
            .collect();
        let total = paid.len() as f64;
        let mut grouped: std::collections::BTreeMap<String, (i64, f64)> =
            std::collections::BTreeMap::new();
        for payment in paid {
            let entry = grouped.entry(payment.plan.clone()).or_default();
            entry.0 += 1;
            entry.1 += payment.price;
        }
        let mut stats: Vec<PlanStat> = grouped
            .into_iter()
            .map(|(plan, (count, revenue))| PlanStat {
                plan,
                count,
                percentage: count as f64 * 100.0 / total,
                revenue,
            })
            .collect();
        stats.sort_by(|a, b| b.count.cmp(&a.count).then(a.plan.cmp(&b.plan)));
        Ok(stats)
    }
}
