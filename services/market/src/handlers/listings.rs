//! Feed, listing detail, creation, edit and delete

use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::info;

use crate::{
    error::{MarketError, MarketResult},
    listings::ListingInput,
    middleware::{CurrentUser, RequireUser},
    models::{Listing, User},
    state::AppState,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListingForm {
    pub title: String,
    pub description: String,
    pub images: Option<String>,
    pub characteristics: Option<String>,
}

impl From<ListingForm> for ListingInput {
    fn from(form: ListingForm) -> Self {
        ListingInput {
            title: form.title,
            description: form.description,
            images: form.images,
            characteristics: form.characteristics,
        }
    }
}

/// Fetch a listing the session user is allowed to change
async fn editable_listing(state: &AppState, id: &str, user: &User) -> MarketResult<Listing> {
    let listing = state.listings.get_listing(id).await?;
    if !listing.editable_by(&user.username) {
        info!(listing_id = %id, username = %user.username, "Refused change to foreign listing");
        return Err(MarketError::Forbidden);
    }
    Ok(listing)
}

fn form_context(state: &AppState, user: &User, form: &ListingForm, error: &str) -> tera::Context {
    let mut context = state.templates.context(&CurrentUser(Some(user.clone())));
    context.insert("error", error);
    context.insert("title", &form.title);
    context.insert("description", &form.description);
    context.insert("images", &form.images);
    context.insert("characteristics", &form.characteristics);
    context
}

pub async fn feed(
    State(state): State<AppState>,
    current: CurrentUser,
) -> MarketResult<Html<String>> {
    let listings = state.listings.list_feed().await?;

    let mut context = state.templates.context(&current);
    context.insert("listings", &listings);
    state.templates.render("feed.html", &context)
}

pub async fn show(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> MarketResult<Html<String>> {
    let listing = state.listings.get_listing(&id).await?;
    let can_edit = current
        .username()
        .is_some_and(|username| listing.editable_by(username));

    let mut context = state.templates.context(&current);
    context.insert("listing", &listing);
    context.insert("can_edit", &can_edit);
    state.templates.render("listing.html", &context)
}

pub async fn create_form(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> MarketResult<Html<String>> {
    let context = state.templates.context(&CurrentUser(Some(user)));
    state.templates.render("create_position.html", &context)
}

/// Create a listing owned by the session user
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Form(form): Form<ListingForm>,
) -> MarketResult<Response> {
    let input = ListingInput::from(form.clone());

    match state.listings.create_listing(input, Some(&user)).await {
        Ok(listing) => Ok(Redirect::to(&format!("/feed/{}", listing.id)).into_response()),
        Err(err @ MarketError::Validation(_)) => {
            let context = form_context(&state, &user, &form, &err.user_message());
            let page = state.templates.render("create_position.html", &context)?;
            Ok((err.status(), page).into_response())
        }
        Err(err) => Err(err),
    }
}

pub async fn edit_form(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> MarketResult<Html<String>> {
    let listing = editable_listing(&state, &id, &user).await?;

    let mut context = state.templates.context(&CurrentUser(Some(user)));
    context.insert("id", &listing.id);
    context.insert("title", &listing.title);
    context.insert("description", &listing.description);
    context.insert("images", &listing.images);
    state.templates.render("update_position.html", &context)
}

pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
    Form(form): Form<ListingForm>,
) -> MarketResult<Response> {
    editable_listing(&state, &id, &user).await?;

    // Characteristics are fixed at creation
    let input = ListingInput {
        characteristics: None,
        ..form.clone().into()
    };

    match state.listings.update_listing(&id, input).await {
        Ok(listing) => Ok(Redirect::to(&format!("/feed/{}", listing.id)).into_response()),
        Err(err @ MarketError::Validation(_)) => {
            let mut context = form_context(&state, &user, &form, &err.user_message());
            context.insert("id", &id);
            let page = state.templates.render("update_position.html", &context)?;
            Ok((err.status(), page).into_response())
        }
        Err(err) => Err(err),
    }
}

/// Delete immediately, without a confirmation step
pub async fn delete(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<String>,
) -> MarketResult<Redirect> {
    editable_listing(&state, &id, &user).await?;
    state.listings.delete_listing(&id).await?;
    Ok(Redirect::to("/feed"))
}
