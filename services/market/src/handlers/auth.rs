//! Registration, login, logout and the profile page

use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::{
    error::{MarketError, MarketResult},
    identity::Registration,
    middleware::{CurrentUser, RequireUser, SESSION_COOKIE},
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginQuery {
    pub registered: Option<String>,
}

pub async fn registration_form(
    State(state): State<AppState>,
    current: CurrentUser,
) -> MarketResult<Html<String>> {
    let context = state.templates.context(&current);
    state.templates.render("registration.html", &context)
}

/// Register and send the user to the login page; form errors are shown inline
pub async fn register(
    State(state): State<AppState>,
    current: CurrentUser,
    Form(form): Form<RegistrationForm>,
) -> MarketResult<Response> {
    let registration = Registration {
        username: form.username.clone(),
        email: form.email.clone(),
        password: form.password,
        confirm_password: form.confirm_password,
    };

    match state.identity.register(registration).await {
        Ok(_) => Ok(Redirect::to("/login?registered=1").into_response()),
        Err(err @ (MarketError::Validation(_) | MarketError::Conflict(_))) => {
            let mut context = state.templates.context(&current);
            context.insert("error", &err.user_message());
            context.insert("username", &form.username);
            context.insert("email", &form.email);
            let page = state.templates.render("registration.html", &context)?;
            Ok((err.status(), page).into_response())
        }
        Err(err) => Err(err),
    }
}

pub async fn login_form(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(query): Query<LoginQuery>,
) -> MarketResult<Html<String>> {
    let mut context = state.templates.context(&current);
    if query.registered.is_some() {
        context.insert("notice", "Registration complete, you can now log in.");
    }
    state.templates.render("login.html", &context)
}

/// Check credentials, open a session and set the session cookie
pub async fn login(
    State(state): State<AppState>,
    current: CurrentUser,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> MarketResult<Response> {
    match state
        .identity
        .authenticate(&form.username, &form.password)
        .await
    {
        Ok((user, token)) => {
            let cookie = Cookie::build((SESSION_COOKIE, token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(state.config.secure_cookies);
            let target = format!("/profile/{}", user.username);
            Ok((jar.add(cookie), Redirect::to(&target)).into_response())
        }
        Err(err @ MarketError::Auth) => {
            let mut context = state.templates.context(&current);
            context.insert("error", &err.user_message());
            context.insert("username", &form.username);
            let page = state.templates.render("login.html", &context)?;
            Ok((err.status(), page).into_response())
        }
        Err(err) => Err(err),
    }
}

/// End the session and clear the cookie
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> MarketResult<Response> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.identity.logout(cookie.value()).await?;
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Redirect::to("/")).into_response())
}

/// Profile of the session user; other users' profiles are not viewable
pub async fn profile(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(username): Path<String>,
) -> MarketResult<Response> {
    if user.username != username {
        return Ok(Redirect::to("/login").into_response());
    }

    let listings = state.listings.listings_of(&user.username).await?;

    let mut context = state.templates.context(&CurrentUser(Some(user.clone())));
    context.insert("user", &user);
    context.insert("listings", &listings);
    Ok(state.templates.render("profile.html", &context)?.into_response())
}
