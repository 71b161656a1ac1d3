use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::application::error::{ErrorReport, HttpError};

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(source, StatusCode::INTERNAL_SERVER_ERROR, public_message, &error)
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(logged_in: bool) -> Response {
    let view = LayoutContext::new("Page not found", logged_in, NotFoundContext);
    let mut response =
        render_template_response(NotFoundTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

/// One consumed flash message, ready for the layout.
#[derive(Debug, Clone)]
pub struct FlashView {
    pub kind: &'static str,
    pub text: String,
}

/// Shared page shell: title, session state, and an optional flash, wrapped
/// around the page-specific content.
pub struct LayoutContext<T> {
    pub title: String,
    pub logged_in: bool,
    pub flash: Option<FlashView>,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(title: impl Into<String>, logged_in: bool, content: T) -> Self {
        Self {
            title: title.into(),
            logged_in,
            flash: None,
            content,
        }
    }

    pub fn with_flash(mut self, flash: Option<FlashView>) -> Self {
        self.flash = flash;
        self
    }
}

#[derive(Debug, Clone)]
pub struct PostCard {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub first_image: Option<String>,
    pub tags: Vec<String>,
    pub created_at: String,
    pub truncated: bool,
}

pub struct FeedContext {
    pub posts: Vec<PostCard>,
}

pub struct BlogContext {
    pub posts: Vec<PostCard>,
    pub page: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone)]
pub struct YearGroup {
    pub year: String,
    pub posts: Vec<PostCard>,
}

pub struct TagContext {
    pub tag: String,
    pub years: Vec<YearGroup>,
    pub page: u32,
    pub total_pages: u32,
}

pub struct ArchivesContext {
    pub years: Vec<YearGroup>,
    pub page: u32,
    pub total_pages: u32,
}

pub struct SearchContext {
    pub query: String,
    pub posts: Vec<PostCard>,
}

pub struct PostDetailContext {
    pub slug: String,
    pub title: String,
    pub content_html: String,
    pub tags: Vec<String>,
    pub created_at: String,
}

pub struct DashboardRow {
    pub slug: String,
    pub title: String,
    pub status_label: &'static str,
    pub created_at: String,
}

pub struct DashboardContext {
    pub rows: Vec<DashboardRow>,
    pub page: u32,
    pub total_pages: u32,
}

/// Shared by the create and edit forms; `slug_editable` is false on edit
/// because slugs are immutable after creation.
pub struct PostFormContext {
    pub heading: &'static str,
    pub action: String,
    pub slug_editable: bool,
    pub title: String,
    pub content: String,
    pub tags: String,
    pub slug: String,
    pub status: &'static str,
    pub format: &'static str,
}

pub struct LoginContext {
    pub error: Option<String>,
}

pub struct ContactContext;

pub struct StaticPageContext;

pub struct UploadFormContext;

pub struct UploadSuccessContext {
    pub file_url: String,
}

pub struct UploadCard {
    pub filename: String,
    pub url: String,
    pub content_type: String,
    pub size_label: String,
}

pub struct UploadsContext {
    pub images: Vec<UploadCard>,
}

pub struct NotFoundContext;

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub view: LayoutContext<FeedContext>,
}

#[derive(Template)]
#[template(path = "blog.html")]
pub struct BlogTemplate {
    pub view: LayoutContext<BlogContext>,
}

#[derive(Template)]
#[template(path = "tag_posts.html")]
pub struct TagTemplate {
    pub view: LayoutContext<TagContext>,
}

#[derive(Template)]
#[template(path = "archives.html")]
pub struct ArchivesTemplate {
    pub view: LayoutContext<ArchivesContext>,
}

#[derive(Template)]
#[template(path = "search_results.html")]
pub struct SearchTemplate {
    pub view: LayoutContext<SearchContext>,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate {
    pub view: LayoutContext<PostDetailContext>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub view: LayoutContext<DashboardContext>,
}

#[derive(Template)]
#[template(path = "post_form.html")]
pub struct PostFormTemplate {
    pub view: LayoutContext<PostFormContext>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub view: LayoutContext<LoginContext>,
}

#[derive(Template)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub view: LayoutContext<ContactContext>,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub view: LayoutContext<StaticPageContext>,
}

#[derive(Template)]
#[template(path = "portfolio.html")]
pub struct PortfolioTemplate {
    pub view: LayoutContext<StaticPageContext>,
}

#[derive(Template)]
#[template(path = "upload.html")]
pub struct UploadTemplate {
    pub view: LayoutContext<UploadFormContext>,
}

#[derive(Template)]
#[template(path = "upload_success.html")]
pub struct UploadSuccessTemplate {
    pub view: LayoutContext<UploadSuccessContext>,
}

#[derive(Template)]
#[template(path = "uploads.html")]
pub struct UploadsTemplate {
    pub view: LayoutContext<UploadsContext>,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub view: LayoutContext<NotFoundContext>,
}

/// Human-readable byte count for the upload shelf.
pub fn format_size_bytes(size: i64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = size.max(0) as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{size} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_labels_scale_with_magnitude() {
        assert_eq!(format_size_bytes(512), "512 B");
        assert_eq!(format_size_bytes(2048), "2.0 KiB");
        assert_eq!(format_size_bytes(5 * 1024 * 1024), "5.0 MiB");
    }
}
