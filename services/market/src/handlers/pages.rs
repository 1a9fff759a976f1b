//! Static and landing pages

use axum::{extract::State, response::Html};

use crate::{error::MarketResult, middleware::CurrentUser, state::AppState};

/// Landing page with every listing, newest first
pub async fn index(
    State(state): State<AppState>,
    current: CurrentUser,
) -> MarketResult<Html<String>> {
    let listings = state.listings.list_feed().await?;

    let mut context = state.templates.context(&current);
    context.insert("listings", &listings);
    state.templates.render("index.html", &context)
}

pub async fn about(
    State(state): State<AppState>,
    current: CurrentUser,
) -> MarketResult<Html<String>> {
    let context = state.templates.context(&current);
    state.templates.render("about.html", &context)
}
