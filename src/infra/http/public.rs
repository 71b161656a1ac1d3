//! Public-facing handlers: feed, listings, search, single posts, the
//! contact form, and the image upload surface.

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use bytes::Bytes;
use serde::Deserialize;
use tracing::{error, info};

use crate::application::pagination::sanitize_page;
use crate::application::repos::NewUpload;
use crate::domain::entities::timestamp_now;
use crate::infra::uploads::{UploadStorageError, image_extension};
use crate::presentation::views::{
    AboutTemplate, ArchivesTemplate, BlogTemplate, ContactContext, ContactTemplate, HomeTemplate,
    LayoutContext, PortfolioTemplate, PostTemplate, SearchTemplate, StaticPageContext,
    TagTemplate, UploadFormContext, UploadSuccessContext, UploadSuccessTemplate, UploadTemplate,
    render_not_found_response, render_template_response,
};

use super::session::{self, Flash};
use super::{AppState, feed_error_to_response, repo_error_to_http};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct PageQuery {
    page: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct SearchQuery {
    q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct ContactForm {
    name: String,
    email: String,
    message: String,
}

pub(super) async fn home(State(state): State<AppState>, jar: CookieJar) -> Response {
    let logged_in = session::is_logged_in(&state, &jar);

    match state.feed.home().await {
        Ok(content) => render_template_response(
            HomeTemplate {
                view: LayoutContext::new("Home", logged_in, content),
            },
            StatusCode::OK,
        ),
        Err(err) => feed_error_to_response("infra::http::public::home", err),
    }
}

pub(super) async fn blog(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> Response {
    let logged_in = session::is_logged_in(&state, &jar);
    let page = sanitize_page(query.page);

    match state.feed.blog_page(page).await {
        Ok(content) => render_template_response(
            BlogTemplate {
                view: LayoutContext::new("Blog", logged_in, content),
            },
            StatusCode::OK,
        ),
        Err(err) => feed_error_to_response("infra::http::public::blog", err),
    }
}

pub(super) async fn posts_by_tag(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(tag): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    let logged_in = session::is_logged_in(&state, &jar);
    let page = sanitize_page(query.page);

    match state.feed.tag_page(&tag, page).await {
        Ok(content) => render_template_response(
            TagTemplate {
                view: LayoutContext::new(format!("Tag: {tag}"), logged_in, content),
            },
            StatusCode::OK,
        ),
        Err(err) => feed_error_to_response("infra::http::public::posts_by_tag", err),
    }
}

pub(super) async fn archives(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> Response {
    let logged_in = session::is_logged_in(&state, &jar);
    let page = sanitize_page(query.page);

    match state.feed.archives_page(page).await {
        Ok(content) => render_template_response(
            ArchivesTemplate {
                view: LayoutContext::new("Archives", logged_in, content),
            },
            StatusCode::OK,
        ),
        Err(err) => feed_error_to_response("infra::http::public::archives", err),
    }
}

pub(super) async fn search(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<SearchQuery>,
) -> Response {
    let logged_in = session::is_logged_in(&state, &jar);
    let q = query.q.unwrap_or_default();

    match state.feed.search(&q).await {
        Ok(content) => render_template_response(
            SearchTemplate {
                view: LayoutContext::new("Search", logged_in, content),
            },
            StatusCode::OK,
        ),
        Err(err) => feed_error_to_response("infra::http::public::search", err),
    }
}

pub(super) async fn post_detail(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(slug): Path<String>,
) -> Response {
    let logged_in = session::is_logged_in(&state, &jar);

    match state.feed.post_detail(&slug).await {
        Ok(Some(content)) => {
            let title = content.title.clone();
            render_template_response(
                PostTemplate {
                    view: LayoutContext::new(title, logged_in, content),
                },
                StatusCode::OK,
            )
        }
        Ok(None) => render_not_found_response(logged_in),
        Err(err) => feed_error_to_response("infra::http::public::post_detail", err),
    }
}

pub(super) async fn about(State(state): State<AppState>, jar: CookieJar) -> Response {
    let logged_in = session::is_logged_in(&state, &jar);
    render_template_response(
        AboutTemplate {
            view: LayoutContext::new("About", logged_in, StaticPageContext),
        },
        StatusCode::OK,
    )
}

pub(super) async fn portfolio(State(state): State<AppState>, jar: CookieJar) -> Response {
    let logged_in = session::is_logged_in(&state, &jar);
    render_template_response(
        PortfolioTemplate {
            view: LayoutContext::new("Portfolio", logged_in, StaticPageContext),
        },
        StatusCode::OK,
    )
}

pub(super) async fn contact_form(State(state): State<AppState>, jar: CookieJar) -> Response {
    let logged_in = session::is_logged_in(&state, &jar);
    let (jar, flash) = session::take_flash(jar);

    (
        jar,
        render_template_response(
            ContactTemplate {
                view: LayoutContext::new("Contact", logged_in, ContactContext).with_flash(flash),
            },
            StatusCode::OK,
        ),
    )
        .into_response()
}

/// Submissions are logged, not persisted.
pub(super) async fn contact_submit(
    jar: CookieJar,
    axum::extract::Form(form): axum::extract::Form<ContactForm>,
) -> Response {
    info!(
        target: "foglio::contact",
        name = %form.name,
        email = %form.email,
        message = %form.message,
        "contact form submission"
    );

    let jar = session::push_flash(jar, Flash::success("Message sent successfully!"));
    (jar, Redirect::to("/contact")).into_response()
}

pub(super) async fn upload_form(State(state): State<AppState>, jar: CookieJar) -> Response {
    let logged_in = session::is_logged_in(&state, &jar);
    let (jar, flash) = session::take_flash(jar);

    (
        jar,
        render_template_response(
            UploadTemplate {
                view: LayoutContext::new("Upload", logged_in, UploadFormContext).with_flash(flash),
            },
            StatusCode::OK,
        ),
    )
        .into_response()
}

pub(super) async fn upload_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    multipart: Multipart,
) -> Response {
    const SOURCE: &str = "infra::http::public::upload_submit";
    let logged_in = session::is_logged_in(&state, &jar);

    let (original_name, data) = match read_file_field(multipart).await {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            let jar = session::push_flash(jar, Flash::error("No file was selected."));
            return (jar, Redirect::to("/upload")).into_response();
        }
        Err(response) => return response,
    };

    if image_extension(&original_name).is_none() {
        let jar = session::push_flash(jar, Flash::error("Invalid file or unsupported format."));
        return (jar, Redirect::to("/upload")).into_response();
    }

    let size_bytes = data.len() as i64;
    let filename = match state.upload_storage.store(&original_name, data).await {
        Ok(filename) => filename,
        Err(UploadStorageError::EmptyPayload) => {
            let jar = session::push_flash(jar, Flash::error("Uploaded file is empty."));
            return (jar, Redirect::to("/upload")).into_response();
        }
        Err(err) => {
            error!(target: SOURCE, error = %err, "failed to store upload");
            let jar = session::push_flash(jar, Flash::error("Could not store the uploaded file."));
            return (jar, Redirect::to("/upload")).into_response();
        }
    };

    let content_type = mime_guess::from_path(&filename)
        .first_or_octet_stream()
        .to_string();
    let record = state
        .uploads
        .record_upload(NewUpload {
            filename: filename.clone(),
            content_type,
            size_bytes,
            created_at: timestamp_now(),
        })
        .await;

    if let Err(err) = record {
        return repo_error_to_http(SOURCE, err).into_response();
    }

    info!(target: "foglio::uploads", filename = %filename, size_bytes, "image stored");

    render_template_response(
        UploadSuccessTemplate {
            view: LayoutContext::new(
                "Upload complete",
                logged_in,
                UploadSuccessContext {
                    file_url: format!("/static/uploads/{filename}"),
                },
            ),
        },
        StatusCode::OK,
    )
}

async fn read_file_field(mut multipart: Multipart) -> Result<Option<(String, Bytes)>, Response> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(None),
            Err(err) => {
                return Err(crate::application::error::HttpError::new(
                    "infra::http::public::read_file_field",
                    StatusCode::BAD_REQUEST,
                    "Malformed upload request",
                    err.to_string(),
                )
                .into_response());
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let data = match field.bytes().await {
            Ok(data) => data,
            Err(err) => {
                return Err(crate::application::error::HttpError::new(
                    "infra::http::public::read_file_field",
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "Uploaded file is too large",
                    err.to_string(),
                )
                .into_response());
            }
        };

        return Ok(Some((original_name, data)));
    }
}

pub(super) async fn serve_upload(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Response {
    const SOURCE: &str = "infra::http::public::serve_upload";

    match state.upload_storage.read(&filename).await {
        Ok(bytes) => build_upload_response(&filename, bytes),
        Err(UploadStorageError::InvalidPath) => not_found_upload(SOURCE),
        Err(UploadStorageError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            not_found_upload(SOURCE)
        }
        Err(err) => {
            error!(
                target: SOURCE,
                filename = %filename,
                error = %err,
                "failed to read stored upload"
            );
            crate::application::error::HttpError::new(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read uploaded file",
                err.to_string(),
            )
            .into_response()
        }
    }
}

fn not_found_upload(source: &'static str) -> Response {
    crate::application::error::HttpError::new(
        source,
        StatusCode::NOT_FOUND,
        "Upload not found",
        "The requested upload is not available",
    )
    .into_response()
}

fn build_upload_response(filename: &str, bytes: Bytes) -> Response {
    let mut response = Response::new(Body::from(bytes.clone()));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(filename).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&bytes.len().to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    response
}

pub(super) async fn not_found(State(state): State<AppState>, jar: CookieJar) -> Response {
    let logged_in = session::is_logged_in(&state, &jar);
    render_not_found_response(logged_in)
}
