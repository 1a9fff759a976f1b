//! Session resolution, the login gate and HTML error pages

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, warn};

use crate::{error::ErrorPage, models::User, state::AppState};

/// Name of the cookie holding the session token
pub const SESSION_COOKIE: &str = "market_session";

/// The user bound to the request's session, if any
///
/// Inserted by [`session_middleware`]; extracting it never fails.
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    pub fn username(&self) -> Option<&str> {
        self.0.as_ref().map(|user| user.username.as_str())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .unwrap_or_default())
    }
}

/// An authenticated user; requests without a session are redirected to the
/// login page.
#[derive(Debug, Clone)]
pub struct RequireUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .and_then(|current| current.0.clone())
            .map(RequireUser)
            .ok_or_else(|| Redirect::to("/login"))
    }
}

/// Resolve the session cookie into a [`CurrentUser`] request extension
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(req.headers());

    let user = match jar.get(SESSION_COOKIE) {
        Some(cookie) => match state.identity.current_session_user(cookie.value()).await {
            Ok(user) => user,
            Err(e) => {
                // Treat the request as anonymous rather than failing it
                warn!("Failed to resolve session: {}", e);
                None
            }
        },
        None => None,
    };

    req.extensions_mut().insert(CurrentUser(user));
    next.run(req).await
}

/// Render responses produced from a `MarketError` as HTML pages
pub async fn error_pages(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let current = req
        .extensions()
        .get::<CurrentUser>()
        .cloned()
        .unwrap_or_default();

    let response = next.run(req).await;

    let Some(page) = response.extensions().get::<ErrorPage>().cloned() else {
        return response;
    };

    let template = if page.status == StatusCode::NOT_FOUND {
        "404.html"
    } else {
        "error.html"
    };

    let mut context = state.templates.context(&current);
    context.insert("status", &page.status.as_u16());
    context.insert("message", &page.message);

    match state.templates.render(template, &context) {
        Ok(html) => (page.status, html).into_response(),
        Err(e) => {
            error!("Failed to render error page: {}", e);
            response
        }
    }
}
