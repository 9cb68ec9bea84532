use chrono::{TimeZone, Utc};

use nexus_portal::models::{Article, ArticleStatus};
use nexus_portal::query::{
    ArticleListParams, ArticleSort, CallerView, Visibility, build_list_query,
};

// --- Helpers ---

fn article(id: i64, headline: &str, status: ArticleStatus) -> Article {
    Article {
        id,
        headline: headline.to_string(),
        description: "body text".to_string(),
        publisher: "Crab Tribune".to_string(),
        tags: vec!["general".to_string()],
        posted_by_email: "author@example.com".to_string(),
        posted_on: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
        view_count: 0,
        status,
        is_premium: false,
    }
}

fn approved(id: i64, headline: &str) -> Article {
    article(id, headline, ArticleStatus::Approved)
}

// --- Sort Key Parsing ---

#[test]
fn test_sort_parse_recognised_keys() {
    assert_eq!(
        ArticleSort::parse(Some("view_descending")),
        ArticleSort::ViewsDesc
    );
    assert_eq!(
        ArticleSort::parse(Some("view_ascending")),
        ArticleSort::ViewsAsc
    );
    assert_eq!(
        ArticleSort::parse(Some("time_descending")),
        ArticleSort::TimeDesc
    );
    assert_eq!(
        ArticleSort::parse(Some("time_ascending")),
        ArticleSort::TimeAsc
    );
    assert_eq!(
        ArticleSort::parse(Some("title_descending")),
        ArticleSort::TitleDesc
    );
    assert_eq!(
        ArticleSort::parse(Some("title_ascending")),
        ArticleSort::TitleAsc
    );
}

#[test]
fn test_sort_parse_is_lenient() {
    assert_eq!(ArticleSort::parse(None), ArticleSort::Natural);
    assert_eq!(ArticleSort::parse(Some("")), ArticleSort::Natural);
    assert_eq!(ArticleSort::parse(Some("garbage")), ArticleSort::Natural);
    assert_eq!(
        ArticleSort::parse(Some("VIEW_DESCENDING")),
        ArticleSort::Natural
    );
}

#[test]
fn test_every_order_clause_resolves_ties_by_id() {
    let sorts = [
        ArticleSort::Natural,
        ArticleSort::ViewsDesc,
        ArticleSort::ViewsAsc,
        ArticleSort::TimeDesc,
        ArticleSort::TimeAsc,
        ArticleSort::TitleDesc,
        ArticleSort::TitleAsc,
    ];
    for sort in sorts {
        assert!(sort.order_clause().ends_with("id ASC"));
    }
}

// --- Parameter Normalisation ---

#[test]
fn test_reader_view_applies_size_but_ignores_page() {
    let params = ArticleListParams {
        size: Some(5),
        page: Some(2),
        role: Some("admin".to_string()),
        ..Default::default()
    };
    let query = build_list_query(&params, CallerView::Reader);
    assert_eq!(query.visibility, Visibility::ApprovedOnly);
    assert_eq!(query.limit, Some(5));
    assert_eq!(query.offset, None);
}

#[test]
fn test_reader_view_without_a_positive_size_is_unlimited() {
    let bare = build_list_query(&ArticleListParams::default(), CallerView::Reader);
    assert_eq!(bare.limit, None);
    assert_eq!(bare.offset, None);

    let zero = ArticleListParams {
        size: Some(0),
        ..Default::default()
    };
    assert_eq!(build_list_query(&zero, CallerView::Reader).limit, None);
}

#[test]
fn test_admin_view_defaults_to_approved_subset() {
    let query = build_list_query(&ArticleListParams::default(), CallerView::Admin);
    assert_eq!(query.visibility, Visibility::ApprovedOnly);
}

#[test]
fn test_admin_view_widens_only_on_the_literal_role_value() {
    let admin = ArticleListParams {
        role: Some("admin".to_string()),
        ..Default::default()
    };
    let other = ArticleListParams {
        role: Some("administrator".to_string()),
        ..Default::default()
    };
    assert_eq!(
        build_list_query(&admin, CallerView::Admin).visibility,
        Visibility::All
    );
    assert_eq!(
        build_list_query(&other, CallerView::Admin).visibility,
        Visibility::ApprovedOnly
    );
}

#[test]
fn test_tag_parameter_splits_on_commas() {
    let params = ArticleListParams {
        tag: Some("rust, tokio ,,web ".to_string()),
        ..Default::default()
    };
    let query = build_list_query(&params, CallerView::Reader);
    assert_eq!(query.tags, vec!["rust", "tokio", "web"]);
}

#[test]
fn test_blank_filters_are_treated_as_absent() {
    let params = ArticleListParams {
        publisher: Some("   ".to_string()),
        search: Some("".to_string()),
        ..Default::default()
    };
    let query = build_list_query(&params, CallerView::Reader);
    assert_eq!(query.publisher, None);
    assert_eq!(query.search, None);
}

#[test]
fn test_pagination_requires_a_positive_size() {
    let sized = ArticleListParams {
        size: Some(10),
        page: Some(2),
        ..Default::default()
    };
    let query = build_list_query(&sized, CallerView::Admin);
    assert_eq!(query.limit, Some(10));
    assert_eq!(query.offset, Some(20));

    let zero = ArticleListParams {
        size: Some(0),
        page: Some(2),
        ..Default::default()
    };
    let query = build_list_query(&zero, CallerView::Admin);
    assert_eq!(query.limit, None);
    assert_eq!(query.offset, None);

    let negative = ArticleListParams {
        size: Some(-3),
        ..Default::default()
    };
    let query = build_list_query(&negative, CallerView::Admin);
    assert_eq!(query.limit, None);
}

#[test]
fn test_missing_or_negative_page_means_first_page() {
    let no_page = ArticleListParams {
        size: Some(10),
        ..Default::default()
    };
    assert_eq!(build_list_query(&no_page, CallerView::Admin).offset, Some(0));

    let negative_page = ArticleListParams {
        size: Some(10),
        page: Some(-4),
        ..Default::default()
    };
    assert_eq!(
        build_list_query(&negative_page, CallerView::Admin).offset,
        Some(0)
    );
}

// --- Admission Predicate ---

#[test]
fn test_admits_hides_unapproved_for_readers() {
    let query = build_list_query(&ArticleListParams::default(), CallerView::Reader);
    assert!(query.admits(&approved(1, "Visible")));
    assert!(!query.admits(&article(2, "Hidden", ArticleStatus::Pending)));
    assert!(!query.admits(&article(3, "Gone", ArticleStatus::Rejected)));
}

#[test]
fn test_admits_every_status_when_widened() {
    let params = ArticleListParams {
        role: Some("admin".to_string()),
        ..Default::default()
    };
    let query = build_list_query(&params, CallerView::Admin);
    assert!(query.admits(&article(1, "Pending", ArticleStatus::Pending)));
    assert!(query.admits(&article(2, "Rejected", ArticleStatus::Rejected)));
}

#[test]
fn test_admits_on_any_shared_tag() {
    let params = ArticleListParams {
        tag: Some("rust,web".to_string()),
        ..Default::default()
    };
    let query = build_list_query(&params, CallerView::Reader);

    let mut matching = approved(1, "Overlap");
    matching.tags = vec!["web".to_string(), "misc".to_string()];
    assert!(query.admits(&matching));

    let mut disjoint = approved(2, "Disjoint");
    disjoint.tags = vec!["cooking".to_string()];
    assert!(!query.admits(&disjoint));
}

#[test]
fn test_admits_publisher_is_an_exact_match() {
    let params = ArticleListParams {
        publisher: Some("Crab Tribune".to_string()),
        ..Default::default()
    };
    let query = build_list_query(&params, CallerView::Reader);
    assert!(query.admits(&approved(1, "Match")));

    let mut other = approved(2, "Other");
    other.publisher = "Crab".to_string();
    assert!(!query.admits(&other));
}

#[test]
fn test_admits_premium_filter_both_ways() {
    let premium_only = ArticleListParams {
        premium: Some(true),
        ..Default::default()
    };
    let free_only = ArticleListParams {
        premium: Some(false),
        ..Default::default()
    };

    let mut paid = approved(1, "Paid");
    paid.is_premium = true;
    let free = approved(2, "Free");

    let query = build_list_query(&premium_only, CallerView::Reader);
    assert!(query.admits(&paid));
    assert!(!query.admits(&free));

    let query = build_list_query(&free_only, CallerView::Reader);
    assert!(!query.admits(&paid));
    assert!(query.admits(&free));
}

#[test]
fn test_admits_search_is_case_insensitive_and_headline_only() {
    let params = ArticleListParams {
        search: Some("RUST".to_string()),
        ..Default::default()
    };
    let query = build_list_query(&params, CallerView::Reader);

    assert!(query.admits(&approved(1, "Learning rust the hard way")));

    let mut body_only = approved(2, "Unrelated headline");
    body_only.description = "all about rust".to_string();
    assert!(!query.admits(&body_only));
}

// --- In-Memory Interpretation ---

#[test]
fn test_apply_natural_order_follows_ids() {
    let query = build_list_query(&ArticleListParams::default(), CallerView::Reader);
    let shuffled = vec![approved(3, "C"), approved(1, "A"), approved(2, "B")];
    let ids: Vec<i64> = query.apply(shuffled).iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_apply_view_sort_breaks_ties_by_id() {
    let params = ArticleListParams {
        sort: Some("view_descending".to_string()),
        ..Default::default()
    };
    let query = build_list_query(&params, CallerView::Reader);

    let mut high = approved(2, "High");
    high.view_count = 10;
    let mut tied_late = approved(3, "Tied Late");
    tied_late.view_count = 5;
    let mut tied_early = approved(1, "Tied Early");
    tied_early.view_count = 5;

    let ids: Vec<i64> = query
        .apply(vec![tied_late, high, tied_early])
        .iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(ids, vec![2, 1, 3]);
}

#[test]
fn test_apply_title_sort() {
    let params = ArticleListParams {
        sort: Some("title_ascending".to_string()),
        ..Default::default()
    };
    let query = build_list_query(&params, CallerView::Reader);
    let input = vec![approved(1, "Zebra"), approved(2, "Apple"), approved(3, "Mango")];
    let headlines: Vec<String> = query
        .apply(input)
        .into_iter()
        .map(|a| a.headline)
        .collect();
    assert_eq!(headlines, vec!["Apple", "Mango", "Zebra"]);
}

#[test]
fn test_apply_slices_the_requested_page() {
    let params = ArticleListParams {
        size: Some(2),
        page: Some(1),
        ..Default::default()
    };
    let query = build_list_query(&params, CallerView::Admin);
    let input = (1..=5).map(|id| approved(id, "Row")).collect();
    let ids: Vec<i64> = query.apply(input).iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![3, 4]);
}

#[test]
fn test_apply_page_past_the_end_is_empty() {
    let params = ArticleListParams {
        size: Some(4),
        page: Some(9),
        ..Default::default()
    };
    let query = build_list_query(&params, CallerView::Admin);
    let input = (1..=5).map(|id| approved(id, "Row")).collect::<Vec<_>>();
    assert!(query.apply(input).is_empty());
}

#[test]
fn test_apply_filters_before_paging() {
    // Two pending rows sit between the approved ones; the page must be cut
    // from the filtered set, not the raw storage order.
    let params = ArticleListParams {
        size: Some(2),
        page: Some(0),
        ..Default::default()
    };
    let query = build_list_query(&params, CallerView::Admin);
    let input = vec![
        approved(1, "A"),
        article(2, "P1", ArticleStatus::Pending),
        article(3, "P2", ArticleStatus::Pending),
        approved(4, "B"),
        approved(5, "C"),
    ];
    let ids: Vec<i64> = query.apply(input).iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![1, 4]);
}
