//! HTTP handlers, one module per area of the site

pub mod auth;
pub mod listings;
pub mod pages;
