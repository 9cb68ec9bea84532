use nexus_portal::error::ApiError;
use nexus_portal::models::{Publisher, SubmitArticleRequest, Tag, UpdateProfileRequest, UpsertUserRequest};
use nexus_portal::query::{ArticleQuery, ArticleSort, Visibility};
use nexus_portal::repository::{MemoryRepository, Repository, article_list_query};

// --- Helpers ---

fn base_query() -> ArticleQuery {
    ArticleQuery {
        visibility: Visibility::ApprovedOnly,
        tags: vec![],
        publisher: None,
        premium: None,
        search: None,
        sort: ArticleSort::Natural,
        limit: None,
        offset: None,
    }
}

fn article_request(headline: &str, publisher: &str) -> SubmitArticleRequest {
    SubmitArticleRequest {
        headline: headline.to_string(),
        description: "Body.".to_string(),
        publisher: publisher.to_string(),
        tags: vec!["general".to_string()],
        is_premium: false,
    }
}

// --- SQL Rendering ---

#[test]
fn test_sql_visibility_is_baked_into_the_base_clause() {
    let approved = article_list_query("id, headline", &base_query());
    assert!(
        approved
            .sql()
            .starts_with("SELECT id, headline FROM articles WHERE status = 'Approved'")
    );

    let all = article_list_query(
        "id, headline",
        &ArticleQuery {
            visibility: Visibility::All,
            ..base_query()
        },
    );
    assert!(all.sql().starts_with("SELECT id, headline FROM articles WHERE TRUE"));
}

#[test]
fn test_sql_defaults_to_natural_order_without_pagination() {
    let builder = article_list_query("id", &base_query());
    let sql = builder.sql();
    assert!(sql.contains("ORDER BY id ASC"));
    assert!(!sql.contains("LIMIT"));
    assert!(!sql.contains("OFFSET"));
}

#[test]
fn test_sql_single_tag_uses_membership() {
    let builder = article_list_query(
        "id",
        &ArticleQuery {
            tags: vec!["rust".to_string()],
            ..base_query()
        },
    );
    assert!(builder.sql().contains("$1 = ANY(tags)"));
}

#[test]
fn test_sql_multiple_tags_use_overlap() {
    let builder = article_list_query(
        "id",
        &ArticleQuery {
            tags: vec!["rust".to_string(), "web".to_string()],
            ..base_query()
        },
    );
    assert!(builder.sql().contains("tags && $1"));
}

#[test]
fn test_sql_filters_are_bound_not_spliced() {
    let builder = article_list_query(
        "id",
        &ArticleQuery {
            publisher: Some("Crab Tribune".to_string()),
            premium: Some(true),
            search: Some("rust".to_string()),
            ..base_query()
        },
    );
    let sql = builder.sql();
    // The caller-supplied values never appear in the SQL text.
    assert!(!sql.contains("Crab Tribune"));
    assert!(!sql.contains("rust"));
    assert!(sql.contains("publisher = $1"));
    assert!(sql.contains("is_premium = $2"));
    assert!(sql.contains("headline ILIKE $3"));
}

#[test]
fn test_sql_sort_keys_map_to_order_clauses() {
    let builder = article_list_query(
        "id",
        &ArticleQuery {
            sort: ArticleSort::ViewsDesc,
            ..base_query()
        },
    );
    assert!(builder.sql().contains("ORDER BY view_count DESC, id ASC"));
}

#[test]
fn test_sql_pagination_binds_limit_and_offset() {
    let builder = article_list_query(
        "id",
        &ArticleQuery {
            limit: Some(20),
            offset: Some(40),
            ..base_query()
        },
    );
    let sql = builder.sql();
    assert!(sql.contains("LIMIT $1"));
    assert!(sql.contains("OFFSET $2"));
}

#[test]
fn test_sql_limit_renders_without_an_offset() {
    let builder = article_list_query(
        "id",
        &ArticleQuery {
            limit: Some(20),
            ..base_query()
        },
    );
    let sql = builder.sql();
    assert!(sql.contains("LIMIT $1"));
    assert!(!sql.contains("OFFSET"));
}

// --- In-Memory Store Semantics ---

#[tokio::test]
async fn test_memory_upsert_inserts_then_updates_in_place() {
    let repo = MemoryRepository::new();

    let created = repo
        .upsert_user(&UpsertUserRequest {
            email: "a@example.com".to_string(),
            name: "First".to_string(),
            profile_image: None,
        })
        .await
        .unwrap();
    assert_eq!(created.name, "First");

    let updated = repo
        .upsert_user(&UpsertUserRequest {
            email: "a@example.com".to_string(),
            name: "Second".to_string(),
            profile_image: Some("pic.png".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(updated.name, "Second");
    assert_eq!(updated.profile_image.as_deref(), Some("pic.png"));

    let counts = repo.user_counts().await.unwrap();
    assert_eq!(counts.total_users, 1);
}

#[tokio::test]
async fn test_memory_update_profile_can_flip_premium() {
    let repo = MemoryRepository::new();
    repo.upsert_user(&UpsertUserRequest {
        email: "a@example.com".to_string(),
        name: "A".to_string(),
        profile_image: None,
    })
    .await
    .unwrap();

    let updated = repo
        .update_profile(
            "a@example.com",
            &UpdateProfileRequest {
                is_premium: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert!(updated.is_premium);
    // Fields left out of the patch are untouched.
    assert_eq!(updated.name, "A");
}

#[tokio::test]
async fn test_memory_set_premium_reports_unknown_users() {
    let repo = MemoryRepository::new();
    assert!(!repo.set_premium("ghost@example.com", true).await.unwrap());
}

#[tokio::test]
async fn test_memory_article_ids_are_sequential() {
    let repo = MemoryRepository::new();
    let first = repo
        .create_article(&article_request("One", "P"), "a@example.com")
        .await
        .unwrap()
        .unwrap();
    let second = repo
        .create_article(&article_request("Two", "P"), "a@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.id, first.id + 1);
}

#[tokio::test]
async fn test_memory_author_scoping() {
    let repo = MemoryRepository::new();
    repo.create_article(&article_request("Mine", "P"), "a@example.com")
        .await
        .unwrap();
    repo.create_article(&article_request("Theirs", "P"), "b@example.com")
        .await
        .unwrap();

    let mine = repo.articles_by_author("a@example.com").await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].headline, "Mine");
    assert_eq!(repo.count_articles_by_author("b@example.com").await.unwrap(), 1);
    assert_eq!(repo.count_articles_by_author("c@example.com").await.unwrap(), 0);
}

#[tokio::test]
async fn test_memory_delete_misses_on_wrong_id() {
    let repo = MemoryRepository::new();
    repo.create_article(&article_request("Kept", "P"), "a@example.com")
        .await
        .unwrap();
    assert!(!repo.delete_article(42, "a@example.com").await.unwrap());
}

#[tokio::test]
async fn test_memory_widened_listing_includes_pending() {
    let repo = MemoryRepository::new();
    repo.create_article(&article_request("Unreviewed", "P"), "a@example.com")
        .await
        .unwrap();

    let approved_only = repo.list_articles(&base_query()).await.unwrap();
    assert!(approved_only.is_empty());

    let widened = repo
        .list_articles(&ArticleQuery {
            visibility: Visibility::All,
            ..base_query()
        })
        .await
        .unwrap();
    assert_eq!(widened.len(), 1);
}

#[tokio::test]
async fn test_memory_publisher_catalog_rejects_duplicates() {
    let repo = MemoryRepository::new();
    let publisher = Publisher {
        name: "Crab Tribune".to_string(),
        logo: String::new(),
    };
    assert!(repo.create_publisher(&publisher).await.unwrap());
    assert!(!repo.create_publisher(&publisher).await.unwrap());
    assert_eq!(repo.list_publishers().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_memory_insert_tags_skips_existing_values() {
    let repo = MemoryRepository::new();
    let rust = Tag {
        value: "rust".to_string(),
        label: "Rust".to_string(),
    };
    let web = Tag {
        value: "web".to_string(),
        label: "Web".to_string(),
    };

    assert_eq!(repo.insert_tags(&[rust.clone()]).await.unwrap(), 1);
    assert_eq!(repo.insert_tags(&[rust, web]).await.unwrap(), 1);

    let values = repo.tag_values().await.unwrap();
    assert_eq!(values.len(), 2);
}

#[tokio::test]
async fn test_memory_pending_payment_keeps_its_id_across_replacement() {
    let repo = MemoryRepository::new();
    let first = repo
        .upsert_pending_payment("payer@example.com", "silver", 9.99)
        .await
        .unwrap();
    let replaced = repo
        .upsert_pending_payment("payer@example.com", "gold", 19.99)
        .await
        .unwrap();

    assert_eq!(replaced.id, first.id);
    assert_eq!(replaced.plan, "gold");
}

#[tokio::test]
async fn test_memory_settling_clears_the_pending_slot() {
    let repo = MemoryRepository::new();
    repo.upsert_pending_payment("payer@example.com", "gold", 19.99)
        .await
        .unwrap();
    repo.settle_payment("payer@example.com", Some("txn_9"))
        .await
        .unwrap();

    assert!(repo.pending_payment("payer@example.com").await.unwrap().is_none());

    // The next checkout starts a fresh pending record.
    let next = repo
        .upsert_pending_payment("payer@example.com", "silver", 9.99)
        .await
        .unwrap();
    assert_eq!(next.plan, "silver");
}

#[tokio::test]
async fn test_memory_aggregates_break_count_ties_alphabetically() {
    let repo = MemoryRepository::new();
    repo.upsert_pending_payment("a@example.com", "silver", 10.0)
        .await
        .unwrap();
    repo.settle_payment("a@example.com", None).await.unwrap();
    repo.upsert_pending_payment("b@example.com", "gold", 20.0)
        .await
        .unwrap();
    repo.settle_payment("b@example.com", None).await.unwrap();

    let stats = repo.plan_stats().await.unwrap();
    let plans: Vec<&str> = stats.iter().map(|s| s.plan.as_str()).collect();
    assert_eq!(plans, vec!["gold", "silver"]);

    repo.create_article(&article_request("A", "Zeta Press"), "a@example.com")
        .await
        .unwrap();
    repo.create_article(&article_request("B", "Alpha Daily"), "a@example.com")
        .await
        .unwrap();

    let shares = repo.publisher_shares().await.unwrap();
    let names: Vec<&str> = shares.iter().map(|s| s.publisher.as_str()).collect();
    assert_eq!(names, vec!["Alpha Daily", "Zeta Press"]);
}

#[tokio::test]
async fn test_memory_counts_on_an_empty_store() {
    let repo = MemoryRepository::new();
    let counts = repo.user_counts().await.unwrap();
    assert_eq!(counts.total_users, 0);
    assert_eq!(counts.normal_users, 0);
    assert_eq!(counts.premium_users, 0);
}

// --- Store Error Mapping ---

#[test]
fn test_row_not_found_maps_to_404() {
    assert_eq!(ApiError::from(sqlx::Error::RowNotFound), ApiError::NotFound);
}

#[test]
fn test_other_store_errors_map_to_internal() {
    assert!(matches!(
        ApiError::from(sqlx::Error::PoolTimedOut),
        ApiError::Upstream(_)
    ));
}
