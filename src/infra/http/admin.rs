//! Session-gated handlers: login, the dashboard, post CRUD forms, and the
//! image shelf. Everything except login/logout sits behind
//! [`require_session`](super::session::require_session).

use axum::{
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{error, info};

use crate::application::admin::{AdminError, DashboardOutcome, EditPostInput, NewPostInput};
use crate::presentation::views::{
    DashboardTemplate, LayoutContext, LoginContext, LoginTemplate, PostFormContext,
    PostFormTemplate, UploadCard, UploadsContext, UploadsTemplate, format_size_bytes,
    render_not_found_response, render_template_response,
};

use super::session::{self, Flash};
use super::{AppState, admin_error_to_response, repo_error_to_http};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct PageQuery {
    page: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct LoginForm {
    username: String,
    password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct NewPostForm {
    title: String,
    content: String,
    tags: String,
    status: String,
    format: String,
    slug: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct EditPostForm {
    title: String,
    content: String,
    tags: String,
    status: String,
    format: String,
}

pub(super) async fn login_form(State(state): State<AppState>, jar: CookieJar) -> Response {
    let logged_in = session::is_logged_in(&state, &jar);
    let (jar, flash) = session::take_flash(jar);

    (
        jar,
        render_template_response(
            LoginTemplate {
                view: LayoutContext::new("Log in", logged_in, LoginContext { error: None })
                    .with_flash(flash),
            },
            StatusCode::OK,
        ),
    )
        .into_response()
}

pub(super) async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.auth.login(&form.username, &form.password) {
        Some(token) => {
            info!(target: "foglio::auth", username = %form.username, "login succeeded");
            let jar = jar.add(session::session_cookie(token));
            (jar, Redirect::to("/dashboard")).into_response()
        }
        None => {
            info!(target: "foglio::auth", username = %form.username, "login rejected");
            render_template_response(
                LoginTemplate {
                    view: LayoutContext::new(
                        "Log in",
                        false,
                        LoginContext {
                            error: Some("Invalid credentials".to_string()),
                        },
                    ),
                },
                StatusCode::OK,
            )
        }
    }
}

pub(super) async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(token) = session::session_token(&jar) {
        state.auth.logout(&token);
    }
    let jar = session::remove_session_cookie(jar);
    (jar, Redirect::to("/login")).into_response()
}

pub(super) async fn dashboard(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> Response {
    let requested = query.page.unwrap_or(1);

    match state.admin.dashboard_page(requested).await {
        Ok(DashboardOutcome::Redirect(page)) => {
            Redirect::to(&format!("/dashboard?page={page}")).into_response()
        }
        Ok(DashboardOutcome::Page(content)) => {
            let (jar, flash) = session::take_flash(jar);
            (
                jar,
                render_template_response(
                    DashboardTemplate {
                        view: LayoutContext::new("Dashboard", true, content).with_flash(flash),
                    },
                    StatusCode::OK,
                ),
            )
                .into_response()
        }
        Err(err) => admin_error_to_response("infra::http::admin::dashboard", err),
    }
}

pub(super) async fn new_post_form(jar: CookieJar) -> Response {
    let (jar, flash) = session::take_flash(jar);

    (
        jar,
        render_template_response(
            PostFormTemplate {
                view: LayoutContext::new("New post", true, empty_post_form()).with_flash(flash),
            },
            StatusCode::OK,
        ),
    )
        .into_response()
}

pub(super) async fn new_post_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<NewPostForm>,
) -> Response {
    let input = NewPostInput {
        title: form.title,
        content: form.content,
        tags: form.tags,
        status: form.status,
        format: form.format,
        slug: form.slug,
    };

    match state.admin.create_post(input).await {
        Ok(_) => {
            let jar = session::push_flash(jar, Flash::success("Post created successfully!"));
            (jar, Redirect::to("/dashboard")).into_response()
        }
        Err(err @ (AdminError::Validation(_) | AdminError::DuplicateSlug(_))) => {
            let jar = session::push_flash(jar, Flash::error(err.to_string()));
            (jar, Redirect::to("/new")).into_response()
        }
        Err(err) => admin_error_to_response("infra::http::admin::new_post_submit", err),
    }
}

pub(super) async fn edit_post_form(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(slug): Path<String>,
) -> Response {
    let post = match state.admin.load_post(&slug).await {
        Ok(Some(post)) => post,
        Ok(None) => return render_not_found_response(true),
        Err(err) => return admin_error_to_response("infra::http::admin::edit_post_form", err),
    };

    let (jar, flash) = session::take_flash(jar);
    let content = PostFormContext {
        heading: "Edit post",
        action: format!("/edit/{}", post.slug),
        slug_editable: false,
        title: post.title,
        content: post.content,
        tags: post.tags,
        slug: post.slug,
        status: post.status.as_str(),
        format: post.format.as_str(),
    };

    (
        jar,
        render_template_response(
            PostFormTemplate {
                view: LayoutContext::new("Edit post", true, content).with_flash(flash),
            },
            StatusCode::OK,
        ),
    )
        .into_response()
}

pub(super) async fn edit_post_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(slug): Path<String>,
    Form(form): Form<EditPostForm>,
) -> Response {
    // Distinguishing "unknown slug" from a silent no-op requires the
    // existence check up front.
    match state.admin.load_post(&slug).await {
        Ok(Some(_)) => {}
        Ok(None) => return render_not_found_response(true),
        Err(err) => return admin_error_to_response("infra::http::admin::edit_post_submit", err),
    }

    let input = EditPostInput {
        title: form.title,
        content: form.content,
        tags: form.tags,
        status: form.status,
        format: form.format,
    };

    match state.admin.update_post(&slug, input).await {
        Ok(()) => Redirect::to("/dashboard").into_response(),
        Err(err @ AdminError::Validation(_)) => {
            let jar = session::push_flash(jar, Flash::error(err.to_string()));
            (jar, Redirect::to(&format!("/edit/{slug}"))).into_response()
        }
        Err(err) => admin_error_to_response("infra::http::admin::edit_post_submit", err),
    }
}

pub(super) async fn delete_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Response {
    match state.admin.delete_post(&slug).await {
        Ok(()) => Redirect::to("/dashboard").into_response(),
        Err(err) => admin_error_to_response("infra::http::admin::delete_post", err),
    }
}

pub(super) async fn list_uploads(State(state): State<AppState>, jar: CookieJar) -> Response {
    let records = match state.uploads.list_uploads().await {
        Ok(records) => records,
        Err(err) => {
            return repo_error_to_http("infra::http::admin::list_uploads", err).into_response();
        }
    };

    let images = records
        .into_iter()
        .map(|record| UploadCard {
            url: format!("/static/uploads/{}", record.filename),
            size_label: format_size_bytes(record.size_bytes),
            filename: record.filename,
            content_type: record.content_type,
        })
        .collect();

    let (jar, flash) = session::take_flash(jar);
    (
        jar,
        render_template_response(
            UploadsTemplate {
                view: LayoutContext::new("Uploads", true, UploadsContext { images })
                    .with_flash(flash),
            },
            StatusCode::OK,
        ),
    )
        .into_response()
}

pub(super) async fn delete_image(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(filename): Path<String>,
) -> Response {
    const SOURCE: &str = "infra::http::admin::delete_image";

    let known = match state.uploads.find_upload(&filename).await {
        Ok(record) => record.is_some(),
        Err(err) => return repo_error_to_http(SOURCE, err).into_response(),
    };

    if !known {
        let jar = session::push_flash(jar, Flash::warning("Image not found."));
        return (jar, Redirect::to("/uploads")).into_response();
    }

    if let Err(err) = state.upload_storage.delete(&filename).await {
        error!(target: SOURCE, filename = %filename, error = %err, "failed to delete image");
        let jar = session::push_flash(
            jar,
            Flash::error(format!("Error deleting image: {err}")),
        );
        return (jar, Redirect::to("/uploads")).into_response();
    }

    if let Err(err) = state.uploads.delete_upload(&filename).await {
        return repo_error_to_http(SOURCE, err).into_response();
    }

    info!(target: "foglio::uploads", filename = %filename, "image deleted");
    let jar = session::push_flash(jar, Flash::success("Image deleted successfully."));
    (jar, Redirect::to("/uploads")).into_response()
}

fn empty_post_form() -> PostFormContext {
    PostFormContext {
        heading: "New post",
        action: "/new".to_string(),
        slug_editable: true,
        title: String::new(),
        content: String::new(),
        tags: String::new(),
        slug: String::new(),
        status: "draft",
        format: "standard",
    }
}
