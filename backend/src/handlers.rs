//! Public reader-site handlers: the homepage, article pages, category
//! archives, tags, the 404 fallback data, and the contact form.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use echhapa_shared::article_store::ArticleRecord;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    composer::{self, ArticleCard, Homepage},
    error::{ApiError, ApiResult},
    state::AppState,
};

const PAGE_SIZE: i64 = 12;
const MAX_PAGE: i64 = 100_000;
const RELATED_COUNT: i64 = 4;
const POPULAR_COUNT: i64 = 3;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ArticleListResponse {
    pub articles: Vec<ArticleCard>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct ArticleDetailResponse {
    pub article: ArticleRecord,
    pub tags: Vec<String>,
    pub related: Vec<ArticleCard>,
}

/// `GET /api/homepage`
pub async fn homepage(State(state): State<AppState>) -> ApiResult<Json<Homepage>> {
    let homepage = composer::compose(
        &state.layout,
        &state.articles,
        &state.taxonomy,
        &state.settings,
    )?;
    Ok(Json(homepage))
}

/// `GET /api/articles` — published articles, newest first, optionally scoped
/// to a category slug.
pub async fn list_articles(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ArticleListResponse>> {
    let category_id = match &query.category {
        Some(slug) => Some(
            state
                .taxonomy
                .category_by_slug(slug)?
                .ok_or(ApiError::NotFound("category"))?
                .id,
        ),
        None => None,
    };
    paginated(&state, category_id, query.page).map(Json)
}

/// `GET /api/articles/:slug` — one published article. Each hit bumps the
/// view counter and returns the same-category "related" block.
pub async fn get_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<ArticleDetailResponse>> {
    let article = state
        .articles
        .published_by_slug(&slug)?
        .ok_or(ApiError::NotFound("article"))?;

    state.articles.record_view(article.id)?;
    let tags = state.articles.tags_for(article.id)?;
    let related = state
        .articles
        .related(article.id, article.category_id, RELATED_COUNT)?
        .iter()
        .map(ArticleCard::from)
        .collect();

    Ok(Json(ArticleDetailResponse {
        article,
        tags,
        related,
    }))
}

/// `GET /api/categories`
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let categories = state.taxonomy.list_categories()?;
    Ok(Json(json!({ "categories": categories })))
}

/// `GET /api/categories/:slug` — the category plus a page of its articles.
pub async fn category_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Value>> {
    let category = state
        .taxonomy
        .category_by_slug(&slug)?
        .ok_or(ApiError::NotFound("category"))?;
    let listing = paginated(&state, Some(category.id), query.page)?;
    Ok(Json(json!({ "category": category, "listing": listing })))
}

/// `GET /api/tags`
pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let tags = state.taxonomy.list_tags()?;
    Ok(Json(json!({ "tags": tags })))
}

/// `GET /api/popular` — recent published articles, served alongside the 404
/// page as its fallback content.
pub async fn popular(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let articles: Vec<ArticleCard> = state
        .articles
        .list_published(POPULAR_COUNT, 0, None)?
        .iter()
        .map(ArticleCard::from)
        .collect();
    Ok(Json(json!({ "articles": articles })))
}

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

/// `POST /api/contact` — validate and acknowledge. Nothing is persisted;
/// delivery is an external concern.
pub async fn contact(Json(request): Json<ContactRequest>) -> ApiResult<Json<Value>> {
    for (value, field) in [
        (&request.name, "name"),
        (&request.email, "email"),
        (&request.subject, "subject"),
        (&request.message, "message"),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::validation(format!("{field} is required")));
        }
    }
    if !is_plausible_email(&request.email) {
        return Err(ApiError::validation("invalid email address"));
    }
    Ok(Json(json!({ "success": true, "message": "Thank you for your message" })))
}

fn paginated(
    state: &AppState,
    category_id: Option<i64>,
    page: Option<i64>,
) -> Result<ArticleListResponse, ApiError> {
    let page = requested_page(page);
    let offset = (page - 1) * PAGE_SIZE;
    let articles: Vec<ArticleCard> = state
        .articles
        .list_published(PAGE_SIZE, offset, category_id)?
        .iter()
        .map(ArticleCard::from)
        .collect();
    let total = state.articles.count_published(category_id)?;
    Ok(ArticleListResponse {
        articles,
        total,
        page,
        total_pages: (total + PAGE_SIZE - 1) / PAGE_SIZE,
    })
}

// Bounded so the offset multiplication cannot overflow on a hostile `?page=`.
fn requested_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).clamp(1, MAX_PAGE)
}

fn is_plausible_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::{is_plausible_email, requested_page, MAX_PAGE, PAGE_SIZE};

    #[test]
    fn page_numbers_are_clamped_to_sane_bounds() {
        assert_eq!(requested_page(None), 1);
        assert_eq!(requested_page(Some(-3)), 1);
        assert_eq!(requested_page(Some(42)), 42);
        assert_eq!(requested_page(Some(i64::MAX)), MAX_PAGE);
        // The offset computation must stay well inside i64 at the ceiling.
        let _offset = (requested_page(Some(i64::MAX)) - 1) * PAGE_SIZE;
    }

    #[test]
    fn email_shapes() {
        assert!(is_plausible_email("reader@example.com"));
        assert!(is_plausible_email("a.b+c@news.example.co"));
        assert!(!is_plausible_email("not-an-email"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("user@nodot"));
        assert!(!is_plausible_email("user@.com"));
    }
}
