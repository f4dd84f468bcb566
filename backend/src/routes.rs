use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};

use crate::{
    admin, auth, config::MAX_FILE_SIZE, handlers, layout_api, request_context, state::AppState,
    upload,
};

pub fn create_router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let uploads = ServeDir::new(&state.config.uploads_dir);

    Router::new()
        // Reader site
        .route("/api/homepage", get(handlers::homepage))
        .route("/api/articles", get(handlers::list_articles))
        .route("/api/articles/:slug", get(handlers::get_article))
        .route("/api/categories", get(handlers::list_categories))
        .route("/api/categories/:slug", get(handlers::category_page))
        .route("/api/tags", get(handlers::list_tags))
        .route("/api/popular", get(handlers::popular))
        .route("/api/contact", post(handlers::contact))
        // Sessions
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        // Admin panel
        .route(
            "/api/admin/articles",
            get(admin::list_articles).post(admin::create_article),
        )
        .route(
            "/api/admin/articles/:id",
            put(admin::update_article).delete(admin::delete_article),
        )
        .route(
            "/api/admin/articles/:id/status",
            post(admin::set_article_status),
        )
        .route("/api/admin/categories", post(admin::create_category))
        .route(
            "/api/admin/categories/:id",
            put(admin::update_category).delete(admin::delete_category),
        )
        .route(
            "/api/admin/users",
            get(admin::list_users).post(admin::create_user),
        )
        .route(
            "/api/admin/users/:id",
            put(admin::update_user).delete(admin::delete_user),
        )
        .route("/api/admin/media", get(admin::list_media))
        .route("/api/admin/settings", get(admin::list_settings))
        .route("/api/admin/settings/:key", put(admin::update_setting))
        .route(
            "/api/admin/layout",
            get(layout_api::layout_state).post(layout_api::dispatch),
        )
        .route("/api/admin/upload", post(upload::upload))
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(MAX_FILE_SIZE + 1024))
        .layer(middleware::from_fn(
            request_context::request_context_middleware,
        ))
        .layer(cors)
        .with_state(state)
}
