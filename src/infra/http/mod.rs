mod admin;
pub mod middleware;
mod public;
pub mod session;

pub use session::{Flash, FlashKind};

use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use sqlx::Error as SqlxError;

use crate::application::admin::{AdminError, AdminService};
use crate::application::auth::AuthService;
use crate::application::error::{ErrorReport, HttpError};
use crate::application::feed::{FeedError, FeedService};
use crate::application::repos::{RepoError, UploadsRepo};
use crate::infra::db::SqliteRepositories;
use crate::infra::uploads::UploadStorage;

use middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<FeedService>,
    pub admin: Arc<AdminService>,
    pub auth: Arc<AuthService>,
    pub uploads: Arc<dyn UploadsRepo>,
    pub upload_storage: Arc<UploadStorage>,
    pub db: Arc<SqliteRepositories>,
}

pub fn build_router(state: AppState, upload_body_limit: usize) -> Router {
    let gated = Router::new()
        .route(
            "/new",
            get(admin::new_post_form).post(admin::new_post_submit),
        )
        .route(
            "/edit/{slug}",
            get(admin::edit_post_form).post(admin::edit_post_submit),
        )
        .route("/delete/{slug}", post(admin::delete_post))
        .route("/dashboard", get(admin::dashboard))
        .route("/uploads", get(admin::list_uploads))
        .route("/delete-image/{filename}", post(admin::delete_image))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            session::require_session,
        ));

    let public = Router::new()
        .route("/", get(public::home))
        .route("/blog", get(public::blog))
        .route("/tag/{tag}", get(public::posts_by_tag))
        .route("/archives", get(public::archives))
        .route("/search", get(public::search))
        .route("/post/{slug}", get(public::post_detail))
        .route("/about", get(public::about))
        .route("/portfolio", get(public::portfolio))
        .route(
            "/contact",
            get(public::contact_form).post(public::contact_submit),
        )
        .route(
            "/login",
            get(admin::login_form).post(admin::login_submit),
        )
        .route("/logout", get(admin::logout))
        .route(
            "/upload",
            get(public::upload_form)
                .post(public::upload_submit)
                .layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route("/static/uploads/{filename}", get(public::serve_upload))
        .route("/_health/db", get(db_health));

    public
        .merge(gated)
        .fallback(public::not_found)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn db_health(State(state): State<AppState>) -> Response {
    db_health_response(state.db.health_check().await)
}

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

/// Map a repository error to a consistent HTTP error response.
pub(crate) fn repo_error_to_http(source: &'static str, err: RepoError) -> HttpError {
    match err {
        RepoError::Duplicate { constraint } => {
            HttpError::new(source, StatusCode::CONFLICT, "Duplicate record", constraint)
        }
        RepoError::NotFound => HttpError::new(
            source,
            StatusCode::NOT_FOUND,
            "Resource not found",
            "resource not found",
        ),
        RepoError::Integrity { message } => HttpError::new(
            source,
            StatusCode::CONFLICT,
            "Integrity constraint violated",
            message,
        ),
        RepoError::Persistence(message) => HttpError::new(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Persistence error",
            message,
        ),
    }
}

pub(crate) fn feed_error_to_response(source: &'static str, err: FeedError) -> Response {
    match err {
        FeedError::Repo(repo) => repo_error_to_http(source, repo).into_response(),
    }
}

/// For admin errors that escaped the flash-and-redirect flow (storage-layer
/// failures); validation errors never reach this.
pub(crate) fn admin_error_to_response(source: &'static str, err: AdminError) -> Response {
    match err {
        AdminError::Repo(repo) => repo_error_to_http(source, repo).into_response(),
        AdminError::Validation(message) => {
            HttpError::new(source, StatusCode::BAD_REQUEST, "Invalid input", message)
                .into_response()
        }
        AdminError::DuplicateSlug(slug) => HttpError::new(
            source,
            StatusCode::CONFLICT,
            "Duplicate slug",
            format!("slug `{slug}` already exists"),
        )
        .into_response(),
    }
}
