//! Homepage layout administration.
//!
//! The layout panel drives everything through a single endpoint,
//! `POST /api/admin/layout`, whose body carries an `action` discriminant.
//! Each action is a small idempotent mutation; the drag-and-drop UI can
//! re-send a full ordering without caring what the previous state was.

use axum::{extract::State, Json};
use echhapa_shared::{
    layout_store::{LayoutType, NewSectionInput},
    user_store::Role,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    auth::AuthSession,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LayoutAction {
    UpdateSectionOrder {
        section_ids: Vec<i64>,
    },
    UpdateArticleOrder {
        section_id: i64,
        article_ids: Vec<i64>,
    },
    AssignArticle {
        article_id: i64,
        section_id: i64,
    },
    UnassignArticle {
        article_id: i64,
    },
    ToggleSection {
        section_id: i64,
        is_active: bool,
    },
    DeleteSection {
        section_id: i64,
    },
    ToggleFeatured {
        article_id: i64,
        section_id: i64,
        is_featured: bool,
    },
    CreateSection {
        name: String,
        #[serde(default)]
        slug: Option<String>,
        layout_type: LayoutType,
        max_articles: i64,
    },
    UpdateSection {
        section_id: i64,
        name: String,
        #[serde(default)]
        slug: Option<String>,
        layout_type: LayoutType,
        max_articles: i64,
    },
}

/// `POST /api/admin/layout` — dispatch on the `action` field.
pub async fn dispatch(
    session: AuthSession,
    State(state): State<AppState>,
    Json(action): Json<LayoutAction>,
) -> ApiResult<Json<Value>> {
    session.require(Role::Editor)?;
    let message = match action {
        LayoutAction::UpdateSectionOrder { section_ids } => {
            state.layout.reorder_sections(&section_ids)?;
            "Section order updated"
        }
        LayoutAction::UpdateArticleOrder {
            section_id,
            article_ids,
        } => {
            state.layout.reorder_articles(section_id, &article_ids)?;
            "Article order updated"
        }
        LayoutAction::AssignArticle {
            article_id,
            section_id,
        } => {
            state
                .layout
                .section_by_id(section_id)?
                .ok_or(ApiError::NotFound("section"))?;
            state
                .articles
                .by_id(article_id)?
                .ok_or(ApiError::NotFound("article"))?;
            state.layout.assign(article_id, section_id)?;
            "Article assigned to section"
        }
        LayoutAction::UnassignArticle { article_id } => {
            state.layout.unassign(article_id)?;
            "Article removed from section"
        }
        LayoutAction::ToggleSection {
            section_id,
            is_active,
        } => {
            state.layout.set_active(section_id, is_active)?;
            "Section visibility updated"
        }
        LayoutAction::DeleteSection { section_id } => {
            state.layout.delete_section(section_id)?;
            "Section deleted"
        }
        LayoutAction::ToggleFeatured {
            article_id,
            section_id,
            is_featured,
        } => {
            state
                .layout
                .toggle_featured(article_id, section_id, is_featured)?;
            "Featured flag updated"
        }
        LayoutAction::CreateSection {
            name,
            slug,
            layout_type,
            max_articles,
        } => {
            validate_section(&name, max_articles)?;
            state.layout.create_section(NewSectionInput {
                name,
                slug,
                layout_type,
                max_articles,
            })?;
            "Section created"
        }
        LayoutAction::UpdateSection {
            section_id,
            name,
            slug,
            layout_type,
            max_articles,
        } => {
            validate_section(&name, max_articles)?;
            state.layout.update_section(
                section_id,
                NewSectionInput {
                    name,
                    slug,
                    layout_type,
                    max_articles,
                },
            )?;
            "Section updated"
        }
    };
    Ok(Json(json!({ "success": true, "message": message })))
}

/// `GET /api/admin/layout` — every section (active or not) with its
/// assigned articles, for the management screen.
pub async fn layout_state(
    session: AuthSession,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    session.require(Role::Editor)?;
    let sections = state.layout.all_sections()?;
    let mut out = Vec::with_capacity(sections.len());
    for section in sections {
        let articles = state.layout.section_articles(section.id, None)?;
        out.push(json!({ "section": section, "articles": articles }));
    }
    Ok(Json(json!({ "sections": out })))
}

fn validate_section(name: &str, max_articles: i64) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::validation("section name is required"));
    }
    if max_articles < 1 {
        return Err(ApiError::validation("max_articles must be at least 1"));
    }
    Ok(())
}
