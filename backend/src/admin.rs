//! Admin-panel handlers: article lifecycle, category management, user
//! administration, and site settings.
//!
//! Every handler takes an [`AuthSession`] extracted from the request, so a
//! missing or stale session cookie is rejected before any work happens.
//! Role checks follow the ladder: authors manage their own articles, editors
//! manage all content and the layout, admins additionally manage users and
//! settings.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use echhapa_shared::{
    article_store::{ArticleStatus, NewArticleInput},
    settings_store::SettingType,
    taxonomy_store::NewCategoryInput,
    user_store::{NewUserInput, Role},
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    auth::AuthSession,
    error::{ApiError, ApiResult},
    state::AppState,
};

// ---------------------------------------------------------------------------
// Articles

#[derive(Debug, Deserialize)]
pub struct ArticlePayload {
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    pub content: String,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    pub status: ArticleStatus,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ArticlePayload {
    fn into_input(self, author_id: i64) -> Result<NewArticleInput, ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::validation("title is required"));
        }
        if self.content.trim().is_empty() {
            return Err(ApiError::validation("content is required"));
        }
        Ok(NewArticleInput {
            title: self.title,
            slug: self.slug,
            excerpt: self.excerpt,
            content: self.content,
            featured_image: self.featured_image,
            author_id,
            category_id: self.category_id,
            status: self.status,
            scheduled_at: self.scheduled_at,
            tags: self.tags,
        })
    }
}

/// `GET /api/admin/articles` — every article regardless of status.
pub async fn list_articles(
    session: AuthSession,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    session.require(Role::Author)?;
    let articles = state.articles.list_all()?;
    Ok(Json(json!({ "articles": articles })))
}

/// `POST /api/admin/articles`
pub async fn create_article(
    session: AuthSession,
    State(state): State<AppState>,
    Json(payload): Json<ArticlePayload>,
) -> ApiResult<Json<Value>> {
    session.require(Role::Author)?;
    let input = payload.into_input(session.user_id)?;
    let id = state.articles.create(input)?;
    Ok(Json(json!({ "success": true, "id": id })))
}

/// `PUT /api/admin/articles/:id` — authors may only touch their own
/// articles; editors and admins may touch any.
pub async fn update_article(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ArticlePayload>,
) -> ApiResult<Json<Value>> {
    let existing = require_article_access(&session, &state, id)?;
    let input = payload.into_input(existing.author_id)?;
    state.articles.update(id, input)?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct StatusPayload {
    pub status: ArticleStatus,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

/// `POST /api/admin/articles/:id/status` — flat transitions: any status may
/// move to any other.
pub async fn set_article_status(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<StatusPayload>,
) -> ApiResult<Json<Value>> {
    require_article_access(&session, &state, id)?;
    state
        .articles
        .set_status(id, payload.status, payload.scheduled_at)?;
    Ok(Json(json!({ "success": true })))
}

/// `DELETE /api/admin/articles/:id`
pub async fn delete_article(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    require_article_access(&session, &state, id)?;
    state.articles.delete(id)?;
    Ok(Json(json!({ "success": true })))
}

fn require_article_access(
    session: &AuthSession,
    state: &AppState,
    id: i64,
) -> Result<echhapa_shared::article_store::ArticleRecord, ApiError> {
    session.require(Role::Author)?;
    let article = state.articles.by_id(id)?.ok_or(ApiError::NotFound("article"))?;
    if article.author_id != session.user_id {
        session.require(Role::Editor)?;
    }
    Ok(article)
}

// ---------------------------------------------------------------------------
// Categories

#[derive(Debug, Deserialize)]
pub struct CategoryPayload {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

impl CategoryPayload {
    fn into_input(self) -> Result<NewCategoryInput, ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::validation("name is required"));
        }
        Ok(NewCategoryInput {
            name: self.name,
            slug: self.slug,
            description: self.description,
            parent_id: self.parent_id,
        })
    }
}

/// `POST /api/admin/categories`
pub async fn create_category(
    session: AuthSession,
    State(state): State<AppState>,
    Json(payload): Json<CategoryPayload>,
) -> ApiResult<Json<Value>> {
    session.require(Role::Editor)?;
    let category = state.taxonomy.create_category(payload.into_input()?)?;
    Ok(Json(json!({ "success": true, "category": category })))
}

/// `PUT /api/admin/categories/:id`
pub async fn update_category(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryPayload>,
) -> ApiResult<Json<Value>> {
    session.require(Role::Editor)?;
    state.taxonomy.update_category(id, payload.into_input()?)?;
    Ok(Json(json!({ "success": true })))
}

/// `DELETE /api/admin/categories/:id` — children are detached, not deleted;
/// articles in the category fall back to uncategorized.
pub async fn delete_category(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    session.require(Role::Editor)?;
    state.taxonomy.delete_category(id)?;
    Ok(Json(json!({ "success": true })))
}

// ---------------------------------------------------------------------------
// Users

#[derive(Debug, Deserialize)]
pub struct NewUserPayload {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserPayload {
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// `GET /api/admin/users`
pub async fn list_users(
    session: AuthSession,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    session.require(Role::Admin)?;
    let users = state.users.list()?;
    Ok(Json(json!({ "users": users })))
}

/// `POST /api/admin/users`
pub async fn create_user(
    session: AuthSession,
    State(state): State<AppState>,
    Json(payload): Json<NewUserPayload>,
) -> ApiResult<Json<Value>> {
    session.require(Role::Admin)?;
    if payload.username.trim().is_empty() || payload.email.trim().is_empty() {
        return Err(ApiError::validation("username and email are required"));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::validation("password must be at least 8 characters"));
    }
    let user = state.users.create(NewUserInput {
        username: payload.username,
        email: payload.email,
        password: payload.password,
        role: payload.role,
    })?;
    Ok(Json(json!({ "success": true, "user": user })))
}

/// `PUT /api/admin/users/:id`
pub async fn update_user(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserPayload>,
) -> ApiResult<Json<Value>> {
    session.require(Role::Admin)?;
    state
        .users
        .update(id, &payload.username, &payload.email, payload.role)?;
    state.users.set_active(id, payload.is_active)?;
    Ok(Json(json!({ "success": true })))
}

/// `DELETE /api/admin/users/:id` — an admin cannot delete their own account.
pub async fn delete_user(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    session.require(Role::Admin)?;
    if id == session.user_id {
        return Err(ApiError::validation("cannot delete your own account"));
    }
    state.users.delete(id)?;
    Ok(Json(json!({ "success": true })))
}

// ---------------------------------------------------------------------------
// Media

/// `GET /api/admin/media` — uploaded files, newest first. Any staff role may
/// browse the library, matching the upload gate.
pub async fn list_media(
    session: AuthSession,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    session.require(Role::Author)?;
    let media = state.media.list()?;
    Ok(Json(json!({ "media": media })))
}

// ---------------------------------------------------------------------------
// Settings

#[derive(Debug, Deserialize)]
pub struct SettingPayload {
    pub value: String,
    #[serde(default)]
    pub setting_type: Option<SettingType>,
}

/// `GET /api/admin/settings`
pub async fn list_settings(
    session: AuthSession,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    session.require(Role::Admin)?;
    let settings = state.settings.all()?;
    Ok(Json(json!({ "settings": settings })))
}

/// `PUT /api/admin/settings/:key` — upsert; unknown keys are created.
pub async fn update_setting(
    session: AuthSession,
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(payload): Json<SettingPayload>,
) -> ApiResult<Json<Value>> {
    session.require(Role::Admin)?;
    if key.trim().is_empty() {
        return Err(ApiError::validation("setting key is required"));
    }
    let setting_type = payload.setting_type.unwrap_or(SettingType::Text);
    state.settings.set(&key, &payload.value, setting_type)?;
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use echhapa_shared::user_store::Role;

    use crate::auth::AuthSession;

    fn session(role: Role) -> AuthSession {
        AuthSession {
            user_id: 7,
            username: "probe".into(),
            role,
        }
    }

    #[test]
    fn authors_cannot_reach_admin_gates() {
        assert!(session(Role::Author).require(Role::Editor).is_err());
        assert!(session(Role::Author).require(Role::Admin).is_err());
        assert!(session(Role::Editor).require(Role::Admin).is_err());
    }

    #[test]
    fn admins_pass_every_gate() {
        let admin = session(Role::Admin);
        assert!(admin.require(Role::Author).is_ok());
        assert!(admin.require(Role::Editor).is_ok());
        assert!(admin.require(Role::Admin).is_ok());
    }
}
