//! Session cookie plumbing and flash messages.
//!
//! The cookie carries only an opaque token; all session state lives
//! server-side in the [`AuthService`](crate::application::auth::AuthService)
//! store. Flash messages ride a short-lived cookie that the next rendered
//! page consumes and clears.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use crate::presentation::views::FlashView;

use super::AppState;

pub const SESSION_COOKIE: &str = "foglio_session";
const FLASH_COOKIE: &str = "foglio_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Success,
    Error,
    Warning,
}

impl FlashKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FlashKind::Success => "success",
            FlashKind::Error => "error",
            FlashKind::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub text: String,
}

impl Flash {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Warning,
            text: text.into(),
        }
    }
}

impl From<Flash> for FlashView {
    fn from(flash: Flash) -> Self {
        FlashView {
            kind: flash.kind.as_str(),
            text: flash.text,
        }
    }
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn session_token(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
}

pub fn remove_session_cookie(jar: CookieJar) -> CookieJar {
    let mut removal = Cookie::from(SESSION_COOKIE);
    removal.set_path("/");
    jar.remove(removal)
}

pub fn is_logged_in(state: &AppState, jar: &CookieJar) -> bool {
    session_token(jar)
        .map(|token| state.auth.is_authenticated(&token))
        .unwrap_or(false)
}

/// Attach a flash message to be consumed by the next rendered page.
pub fn push_flash(jar: CookieJar, flash: Flash) -> CookieJar {
    let payload = serde_json::to_vec(&flash).unwrap_or_default();
    jar.add(
        Cookie::build((FLASH_COOKIE, URL_SAFE_NO_PAD.encode(payload)))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build(),
    )
}

/// Read and clear the pending flash message, if any.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<FlashView>) {
    let flash = jar
        .get(FLASH_COOKIE)
        .and_then(|cookie| URL_SAFE_NO_PAD.decode(cookie.value()).ok())
        .and_then(|bytes| serde_json::from_slice::<Flash>(&bytes).ok())
        .map(FlashView::from);

    let mut removal = Cookie::from(FLASH_COOKIE);
    removal.set_path("/");
    (jar.remove(removal), flash)
}

/// Gate for the administrative routes: requests without a live session are
/// redirected to the login page before any handler runs, so gated handlers
/// never execute (and never mutate state) unauthenticated.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    if is_logged_in(&state, &jar) {
        next.run(request).await
    } else {
        Redirect::to("/login").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_round_trips_through_the_cookie_payload() {
        let flash = Flash::warning("Image not found.");
        let encoded = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&flash).expect("serialize"));
        let decoded: Flash =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(encoded).expect("decode"))
                .expect("deserialize");
        assert_eq!(decoded, flash);
    }

    #[test]
    fn flash_kinds_map_to_css_classes() {
        assert_eq!(FlashKind::Success.as_str(), "success");
        assert_eq!(FlashKind::Error.as_str(), "error");
        assert_eq!(FlashKind::Warning.as_str(), "warning");
    }
}
