use serde::Deserialize;
use utoipa::IntoParams;

use crate::models::{Article, ArticleStatus};

/// ArticleListParams
///
/// Query-string parameters accepted by the article listing endpoints. All
/// fields are optional; blank values are treated as absent. `tag` takes a
/// comma-separated list so a single parameter can request an overlap match
/// against the article's tag array.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ArticleListParams {
    /// Comma-separated tag values. One value filters by membership, several
    /// by overlap (any shared tag admits the article).
    pub tag: Option<String>,
    /// Exact publisher name.
    pub publisher: Option<String>,
    /// Entitlement filter: true for premium-only, false for free-only.
    pub premium: Option<bool>,
    /// Case-insensitive headline substring.
    pub search: Option<String>,
    /// One of the recognised sort keys; anything else falls back to natural
    /// order.
    pub sort: Option<String>,
    /// Maximum rows to return. Without a positive size the full result set
    /// is returned.
    pub size: Option<i64>,
    /// Zero-based page index for the moderation listing. Offset is
    /// page * size; the public listing ignores it.
    pub page: Option<i64>,
    /// Moderation listings only widen to non-approved statuses when this is
    /// literally "admin". The session role alone does not widen the view.
    pub role: Option<String>,
}

/// CallerView
///
/// Which listing surface is asking: the public reader endpoint or the
/// moderation endpoint. Readers can never see unapproved content regardless
/// of parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerView {
    Reader,
    Admin,
}

/// Visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    ApprovedOnly,
    All,
}

/// ArticleSort
///
/// Recognised sort keys and the natural fallback. Natural order is insertion
/// order; every keyed sort breaks ties the same way so paging is stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArticleSort {
    #[default]
    Natural,
    ViewsDesc,
    ViewsAsc,
    TimeDesc,
    TimeAsc,
    TitleDesc,
    TitleAsc,
}

impl ArticleSort {
    /// parse
    ///
    /// Lenient: an unrecognised or absent key means natural order, never an
    /// error. Listing must not 400 over a bad sort value.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("view_descending") => ArticleSort::ViewsDesc,
            Some("view_ascending") => ArticleSort::ViewsAsc,
            Some("time_descending") => ArticleSort::TimeDesc,
            Some("time_ascending") => ArticleSort::TimeAsc,
            Some("title_descending") => ArticleSort::TitleDesc,
            Some("title_ascending") => ArticleSort::TitleAsc,
            _ => ArticleSort::Natural,
        }
    }

    /// order_clause
    ///
    /// The ORDER BY body for the SQL store. Ties always resolve by id so the
    /// ordering is total.
    pub fn order_clause(&self) -> &'static str {
        match self {
            ArticleSort::Natural => "id ASC",
            ArticleSort::ViewsDesc => "view_count DESC, id ASC",
            ArticleSort::ViewsAsc => "view_count ASC, id ASC",
            ArticleSort::TimeDesc => "posted_on DESC, id ASC",
            ArticleSort::TimeAsc => "posted_on ASC, id ASC",
            ArticleSort::TitleDesc => "headline DESC, id ASC",
            ArticleSort::TitleAsc => "headline ASC, id ASC",
        }
    }

    fn compare(&self, a: &Article, b: &Article) -> std::cmp::Ordering {
        let keyed = match self {
            ArticleSort::Natural => std::cmp::Ordering::Equal,
            ArticleSort::ViewsDesc => b.view_count.cmp(&a.view_count),
            ArticleSort::ViewsAsc => a.view_count.cmp(&b.view_count),
            ArticleSort::TimeDesc => b.posted_on.cmp(&a.posted_on),
            ArticleSort::TimeAsc => a.posted_on.cmp(&b.posted_on),
            ArticleSort::TitleDesc => b.headline.cmp(&a.headline),
            ArticleSort::TitleAsc => a.headline.cmp(&b.headline),
        };
        keyed.then(a.id.cmp(&b.id))
    }
}

/// ArticleQuery
///
/// A validated, caller-aware description of one listing request. Both stores
/// interpret the same value: the SQL store renders it into a WHERE/ORDER
/// BY/LIMIT clause chain, the in-memory store runs `apply` directly. Keeping
/// the interpretation here means the two stores cannot drift apart on
/// filtering semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleQuery {
    pub visibility: Visibility,
    pub tags: Vec<String>,
    pub publisher: Option<String>,
    pub premium: Option<bool>,
    pub search: Option<String>,
    pub sort: ArticleSort,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// build_list_query
///
/// Normalises raw listing parameters for the given surface.
///
/// Readers always get approved-only visibility; a positive size caps the row
/// count but page is ignored. The moderation surface honours size and page
/// and widens to all statuses only when the request explicitly carries
/// role=admin.
pub fn build_list_query(params: &ArticleListParams, view: CallerView) -> ArticleQuery {
    let tags = params
        .tag
        .as_deref()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let visibility = match view {
        CallerView::Reader => Visibility::ApprovedOnly,
        CallerView::Admin => {
            if params.role.as_deref() == Some("admin") {
                Visibility::All
            } else {
                Visibility::ApprovedOnly
            }
        }
    };

    let limit = match params.size {
        Some(size) if size > 0 => Some(size),
        _ => None,
    };

    let offset = match view {
        CallerView::Reader => None,
        CallerView::Admin => limit.map(|size| params.page.unwrap_or(0).max(0) * size),
    };

    ArticleQuery {
        visibility,
        tags,
        publisher: non_blank(params.publisher.as_deref()),
        premium: params.premium,
        search: non_blank(params.search.as_deref()),
        sort: ArticleSort::parse(params.sort.as_deref()),
        limit,
        offset,
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ArticleQuery {
    /// admits
    ///
    /// Whether one article passes every filter of this query. The SQL WHERE
    /// clause must agree with this predicate.
    pub fn admits(&self, article: &Article) -> bool {
        if self.visibility == Visibility::ApprovedOnly && article.status != ArticleStatus::Approved
        {
            return false;
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|t| article.tags.contains(t)) {
            return false;
        }
        if let Some(publisher) = &self.publisher {
            if &article.publisher != publisher {
                return false;
            }
        }
        if let Some(premium) = self.premium {
            if article.is_premium != premium {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !article.headline.to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }

    /// apply
    ///
    /// Full in-memory interpretation: filter, sort with the stable id
    /// tie-break, then slice out the requested page.
    pub fn apply(&self, articles: Vec<Article>) -> Vec<Article> {
        let mut selected: Vec<Article> = articles
            .into_iter()
            .filter(|a| self.admits(a))
            .collect();
        selected.sort_by(|a, b| self.sort.compare(a, b));

        let start = self.offset.unwrap_or(0).max(0) as usize;
        let mut page: Vec<Article> = selected.into_iter().skip(start).collect();
        if let Some(limit) = self.limit {
            page.truncate(limit.max(0) as usize);
        }
        page
    }
}
