//! Router tests for the marketplace
//!
//! These drive the full router (session middleware, error pages, handlers)
//! over in-memory stores, carrying the session cookie between requests the
//! way a browser would.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use market::{
    AppState, MarketError, MarketResult,
    config::ServerConfig,
    create_router,
    error::GENERIC_FAILURE_MESSAGE,
    id::is_listing_id,
    models::{Comment, Listing, ListingChanges, NewListing},
    repositories::{InMemoryListingStore, InMemoryUserStore, ListingStore, UserStore},
    session::InMemorySessionStore,
};
use tower::ServiceExt; // For oneshot()

struct TestClient {
    router: Router,
    cookie: Option<String>,
}

impl TestClient {
    fn new(router: Router) -> Self {
        Self {
            router,
            cookie: None,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> (StatusCode, Option<String>, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        self.remember_cookie(&response);

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|value| value.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, location, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn remember_cookie(&mut self, response: &Response<Body>) {
        for value in response.headers().get_all(header::SET_COOKIE) {
            let value = value.to_str().unwrap();
            let Some(pair) = value.split(';').next() else {
                continue;
            };
            if let Some(token) = pair.strip_prefix("market_session=") {
                self.cookie = if token.is_empty() {
                    None
                } else {
                    Some(pair.to_string())
                };
            }
        }
    }

    async fn get(&mut self, uri: &str) -> (StatusCode, Option<String>, String) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post_form(&mut self, uri: &str, body: &str) -> (StatusCode, Option<String>, String) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn register_and_login(&mut self, username: &str) {
        let (status, _, _) = self
            .post_form(
                "/registration",
                &format!(
                    "username={username}&email={username}%40example.com&password=pw123&confirm_password=pw123"
                ),
            )
            .await;
        assert_eq!(status, StatusCode::SEE_OTHER);

        let (status, _, _) = self
            .post_form("/login", &format!("username={username}&password=pw123"))
            .await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert!(self.cookie.is_some());
    }

    async fn create_listing(&mut self, body: &str) -> String {
        let (status, location, _) = self.post_form("/create_position", body).await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        location
            .unwrap()
            .strip_prefix("/feed/")
            .unwrap()
            .to_string()
    }
}

struct Fixture {
    router: Router,
    users: InMemoryUserStore,
    listings: InMemoryListingStore,
}

fn fixture() -> Fixture {
    let users = InMemoryUserStore::new();
    let listings = InMemoryListingStore::new();
    let state = AppState::new(
        ServerConfig::default(),
        Arc::new(users.clone()),
        Arc::new(listings.clone()),
        Arc::new(InMemorySessionStore::new()),
    )
    .unwrap();

    Fixture {
        router: create_router(state),
        users,
        listings,
    }
}

#[tokio::test]
async fn test_register_login_create_feed_delete_scenario() {
    let fixture = fixture();
    let mut client = TestClient::new(fixture.router.clone());

    let (status, location, _) = client
        .post_form(
            "/registration",
            "username=alice&email=alice%40example.com&password=pw123&confirm_password=pw123",
        )
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/login?registered=1"));
    assert!(client.cookie.is_none(), "registration must not log in");

    let (status, _, body) = client
        .post_form(
            "/registration",
            "username=alice&email=other%40example.com&password=pw123&confirm_password=pw123",
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("already exists"));
    assert_eq!(fixture.users.count().await.unwrap(), 1);

    let (status, location, _) = client
        .post_form("/login", "username=alice&password=pw123")
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/profile/alice"));
    assert!(client.cookie.is_some());

    let (status, _, body) = client.get("/profile/alice").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("alice@example.com"));

    let older = fixture.listings.len().await;
    let id = client
        .create_listing("title=Chair&description=Wooden+chair")
        .await;
    assert!(is_listing_id(&id));
    assert_eq!(fixture.listings.len().await, older + 1);

    let (status, _, body) = client.get("/feed").await;
    assert_eq!(status, StatusCode::OK);
    let first = body.find("id=\"listing-").unwrap();
    assert_eq!(&body[first + 12..first + 21], id);
    assert!(body.contains("Chair"));

    let (status, location, _) = client.get(&format!("/feed/{id}/delete")).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/feed"));

    let (status, _, body) = client.get(&format!("/feed/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Page not found"));
}

#[tokio::test]
async fn test_feed_lists_newest_first() {
    let fixture = fixture();
    let mut client = TestClient::new(fixture.router);
    client.register_and_login("alice").await;

    let first = client.create_listing("title=Lamp&description=Desk+lamp").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = client.create_listing("title=Table&description=Oak+table").await;

    let (_, _, body) = client.get("/").await;
    let first_pos = body.find(&format!("/feed/{first}")).unwrap();
    let second_pos = body.find(&format!("/feed/{second}")).unwrap();
    assert!(second_pos < first_pos);
}

#[tokio::test]
async fn test_protected_pages_redirect_to_login() {
    let fixture = fixture();
    let mut client = TestClient::new(fixture.router);

    for uri in ["/create_position", "/profile/alice", "/feed/123456789/delete"] {
        let (status, location, _) = client.get(uri).await;
        assert_eq!(status, StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location.as_deref(), Some("/login"), "{uri}");
    }

    let (status, location, _) = client
        .post_form("/create_position", "title=Chair&description=Wooden+chair")
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/login"));
    assert!(fixture.listings.is_empty().await);
}

#[tokio::test]
async fn test_profile_of_another_user_redirects_to_login() {
    let fixture = fixture();
    let mut client = TestClient::new(fixture.router);
    client.register_and_login("alice").await;

    let (status, location, _) = client.get("/profile/bob").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_logout_ends_the_session() {
    let fixture = fixture();
    let mut client = TestClient::new(fixture.router);
    client.register_and_login("alice").await;
    let old_cookie = client.cookie.clone();

    let (status, location, _) = client.get("/logout").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/"));
    assert!(client.cookie.is_none());

    // Replaying the old token no longer authenticates
    client.cookie = old_cookie;
    let (status, location, _) = client.get("/create_position").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/login"));
}

#[tokio::test]
async fn test_form_errors_are_rendered_inline() {
    let fixture = fixture();
    let mut client = TestClient::new(fixture.router);

    let (status, _, body) = client
        .post_form(
            "/registration",
            "username=alice&email=alice%40example.com&password=pw123&confirm_password=pw999",
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Passwords do not match"));
    assert!(body.contains("value=\"alice\""));
    assert_eq!(fixture.users.count().await.unwrap(), 0);

    client.register_and_login("alice").await;

    let (status, _, body) = client
        .post_form("/create_position", "title=&description=Wooden+chair")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Title is required"));
    assert!(body.contains("Wooden chair"));
    assert!(fixture.listings.is_empty().await);

    let (status, _, body) = client
        .post_form("/create_position", "title=Ch%00air&description=Wooden+chair")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Title must not contain NUL characters"));
    assert!(fixture.listings.is_empty().await);
}

#[tokio::test]
async fn test_bad_credentials_are_rejected() {
    let fixture = fixture();
    let mut client = TestClient::new(fixture.router);
    client.register_and_login("alice").await;
    client.get("/logout").await;

    let (status, _, body) = client
        .post_form("/login", "username=alice&password=wrong")
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.contains("Invalid username or password"));
    assert!(client.cookie.is_none());

    let (status, _, _) = client
        .post_form("/login", "username=mallory&password=pw123")
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_listing_detail_update_and_product_alias() {
    let fixture = fixture();
    let mut client = TestClient::new(fixture.router);
    client.register_and_login("alice").await;

    let id = client
        .create_listing(
            "title=Chair&description=Wooden+chair&images=chair.jpg&characteristics=%7B%22legs%22%3A4%7D",
        )
        .await;

    let (status, _, body) = client.get(&format!("/product/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("chair.jpg"));
    assert!(body.contains("legs"));
    assert!(body.contains(&format!("/feed/{id}/update")));

    let (status, location, _) = client
        .post_form(
            &format!("/feed/{id}/update"),
            "title=Armchair&description=Comfy+armchair&images=",
        )
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location, Some(format!("/feed/{id}")));

    let (_, _, body) = client.get(&format!("/feed/{id}")).await;
    assert!(body.contains("Armchair"));
    assert!(!body.contains("chair.jpg"));
    assert!(body.contains("legs"));
}

#[tokio::test]
async fn test_create_and_edit_forms_render_for_a_session_user() {
    let fixture = fixture();
    let mut client = TestClient::new(fixture.router);
    client.register_and_login("alice").await;

    let (status, _, body) = client.get("/create_position").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("action=\"/create_position\""));
    assert!(body.contains("name=\"characteristics\""));

    let id = client
        .create_listing("title=Chair&description=Wooden+chair&images=chair.jpg")
        .await;

    let (status, _, body) = client.get(&format!("/feed/{id}/update")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&format!("action=\"/feed/{id}/update\"")));
    assert!(body.contains("value=\"Chair\""));
    assert!(body.contains("Wooden chair"));
    assert!(body.contains("value=\"chair.jpg\""));

    let (status, _, body) = client
        .post_form(&format!("/feed/{id}/update"), "title=&description=x")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Title is required"));
    assert!(body.contains(&format!("action=\"/feed/{id}/update\"")));

    // The stored listing is untouched by the rejected edit
    let (_, _, body) = client.get(&format!("/feed/{id}")).await;
    assert!(body.contains("Chair"));
    assert!(body.contains("chair.jpg"));
}

#[tokio::test]
async fn test_only_the_owner_can_change_a_listing() {
    let fixture = fixture();
    let mut alice = TestClient::new(fixture.router.clone());
    alice.register_and_login("alice").await;
    let id = alice
        .create_listing("title=Chair&description=Wooden+chair")
        .await;

    let mut bob = TestClient::new(fixture.router.clone());
    bob.register_and_login("bob").await;

    let (status, _, _) = bob.get(&format!("/feed/{id}/delete")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = bob
        .post_form(&format!("/feed/{id}/update"), "title=Mine&description=Now")
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = bob.get(&format!("/feed/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Chair"));
    assert!(!body.contains(&format!("/feed/{id}/delete")));
}

#[tokio::test]
async fn test_unknown_routes_and_ids_render_not_found_page() {
    let fixture = fixture();
    let mut client = TestClient::new(fixture.router);

    let (status, _, body) = client.get("/no/such/page").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("<!doctype html>"));
    assert!(body.contains("Page not found"));

    let (status, _, _) = client.get("/feed/000000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    client.register_and_login("alice").await;
    let (status, _, _) = client.get("/feed/000000000/delete").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_static_pages_and_health() {
    let fixture = fixture();
    let mut client = TestClient::new(fixture.router);

    for uri in ["/", "/home", "/about", "/registration", "/login"] {
        let (status, _, _) = client.get(uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }

    let (_, _, body) = client.get("/login?registered=1").await;
    assert!(body.contains("Registration complete"));

    let (status, _, body) = client.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    let health: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(health["status"], "ok");
}

/// Listing store whose every operation fails like a dropped connection
struct BrokenListingStore;

fn broken() -> MarketError {
    MarketError::Persistence("connection reset by 10.1.2.3:5432".to_string())
}

#[async_trait]
impl ListingStore for BrokenListingStore {
    async fn insert_if_absent(&self, _listing: NewListing) -> MarketResult<Option<Listing>> {
        Err(broken())
    }
    async fn list_feed(&self) -> MarketResult<Vec<Listing>> {
        Err(broken())
    }
    async fn list_by_owner(&self, _username: &str) -> MarketResult<Vec<Listing>> {
        Err(broken())
    }
    async fn get(&self, _id: &str) -> MarketResult<Option<Listing>> {
        Err(broken())
    }
    async fn update(&self, _id: &str, _changes: ListingChanges) -> MarketResult<Listing> {
        Err(broken())
    }
    async fn delete(&self, _id: &str) -> MarketResult<()> {
        Err(broken())
    }
    async fn add_comment(&self, _listing_id: &str, _content: &str) -> MarketResult<Comment> {
        Err(broken())
    }
    async fn comments_for(&self, _listing_id: &str) -> MarketResult<Vec<Comment>> {
        Err(broken())
    }
}

#[tokio::test]
async fn test_persistence_failures_show_a_generic_message() {
    let state = AppState::new(
        ServerConfig::default(),
        Arc::new(InMemoryUserStore::new()),
        Arc::new(BrokenListingStore),
        Arc::new(InMemorySessionStore::new()),
    )
    .unwrap();
    let mut client = TestClient::new(create_router(state));

    let (status, _, body) = client.get("/feed").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains(GENERIC_FAILURE_MESSAGE));
    assert!(!body.contains("10.1.2.3"));

    client.register_and_login("alice").await;
    let (status, _, body) = client
        .post_form("/create_position", "title=Chair&description=Wooden+chair")
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("connection reset"));
}
