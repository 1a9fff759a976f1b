//! Server-rendered pages
//!
//! Templates are compiled into the binary and registered with Tera at
//! startup. Autoescaping is on for every `.html` template.

use axum::response::Html;
use std::sync::Arc;
use tera::{Context, Tera};

use crate::error::MarketResult;
use crate::middleware::CurrentUser;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("about.html", include_str!("../templates/about.html")),
    ("registration.html", include_str!("../templates/registration.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("profile.html", include_str!("../templates/profile.html")),
    ("feed.html", include_str!("../templates/feed.html")),
    ("listing.html", include_str!("../templates/listing.html")),
    ("listing_form.html", include_str!("../templates/listing_form.html")),
    ("create_position.html", include_str!("../templates/create_position.html")),
    ("update_position.html", include_str!("../templates/update_position.html")),
    ("404.html", include_str!("../templates/404.html")),
    ("error.html", include_str!("../templates/error.html")),
];

#[derive(Clone)]
pub struct Templates {
    tera: Arc<Tera>,
}

impl Templates {
    /// Compile the embedded templates
    pub fn new() -> MarketResult<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())?;
        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    /// Base context for a page, carrying the session user for the navigation bar
    pub fn context(&self, current: &CurrentUser) -> Context {
        let mut context = Context::new();
        context.insert("current_user", &current.0);
        context
    }

    pub fn render(&self, name: &str, context: &Context) -> MarketResult<Html<String>> {
        Ok(Html(self.tera.render(name, context)?))
    }
}
