//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per server endpoint.
//! When API routes or request formats change, update only this file.
#![allow(dead_code)]

use super::constants::*;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

/// A file to attach to a note form.
pub struct PhotoPart {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl PhotoPart {
    pub fn png() -> Self {
        Self {
            file_name: "photo.png".to_string(),
            bytes: PNG_BYTES.to_vec(),
        }
    }

    pub fn jpeg() -> Self {
        Self {
            file_name: "photo.jpg".to_string(),
            bytes: JPEG_BYTES.to_vec(),
        }
    }
}

/// HTTP test client with cookie-based session management
///
/// Redirects are not followed, so tests can assert on them.
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

fn note_form(title: &str, text: &str, photo: Option<PhotoPart>, clear_photo: bool) -> Form {
    let mut form = Form::new()
        .text("title", title.to_string())
        .text("text", text.to_string());
    if let Some(photo) = photo {
        form = form.part("photo", Part::bytes(photo.bytes).file_name(photo.file_name));
    }
    if clear_photo {
        form = form.text("clear_photo", "on");
    }
    form
}

impl TestClient {
    /// Creates a new unauthenticated client
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client logged in as the regular test user
    ///
    /// # Panics
    ///
    /// Panics if authentication fails (indicates test infrastructure problem).
    pub async fn authenticated(base_url: String) -> Self {
        Self::authenticated_as(base_url, TEST_USER, TEST_PASS).await
    }

    /// Creates a client logged in as the second test user
    pub async fn authenticated_other(base_url: String) -> Self {
        Self::authenticated_as(base_url, OTHER_USER, OTHER_PASS).await
    }

    async fn authenticated_as(base_url: String, handle: &str, password: &str) -> Self {
        let client = Self::new(base_url);

        let response = client.login(handle, password).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::CREATED,
            "Authentication of {} failed: {:?}",
            handle,
            response.text().await
        );

        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .unwrap_or_else(|e| panic!("GET {} failed: {}", path, e))
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// POST /v1/auth/login
    pub async fn login(&self, username: &str, password: &str) -> Response {
        self.client
            .post(self.url("/v1/auth/login"))
            .json(&json!({
                "username": username,
                "password": password,
            }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// POST /v1/auth/register
    pub async fn register(&self, form: Value) -> Response {
        self.client
            .post(self.url("/v1/auth/register"))
            .json(&form)
            .send()
            .await
            .expect("Register request failed")
    }

    /// GET /v1/auth/logout
    pub async fn logout(&self) -> Response {
        self.get("/v1/auth/logout").await
    }

    /// GET /
    pub async fn get_home(&self) -> Response {
        self.get("/").await
    }

    // ========================================================================
    // Listing Endpoints
    // ========================================================================

    /// GET /v1/artists
    pub async fn list_artists(&self, search_name: Option<&str>, page: Option<&str>) -> Response {
        let mut query = vec![];
        if let Some(search_name) = search_name {
            query.push(("search_name", search_name));
        }
        if let Some(page) = page {
            query.push(("page", page));
        }
        self.client
            .get(self.url("/v1/artists"))
            .query(&query)
            .send()
            .await
            .expect("List artists request failed")
    }

    /// GET /v1/artists/{id}
    pub async fn get_artist(&self, id: i64) -> Response {
        self.get(&format!("/v1/artists/{}", id)).await
    }

    /// GET /v1/artists/{id}/shows
    pub async fn get_artist_shows(&self, id: i64) -> Response {
        self.get(&format!("/v1/artists/{}/shows", id)).await
    }

    /// GET /v1/venues
    pub async fn list_venues(&self, search_name: Option<&str>, page: Option<&str>) -> Response {
        let mut query = vec![];
        if let Some(search_name) = search_name {
            query.push(("search_name", search_name));
        }
        if let Some(page) = page {
            query.push(("page", page));
        }
        self.client
            .get(self.url("/v1/venues"))
            .query(&query)
            .send()
            .await
            .expect("List venues request failed")
    }

    /// GET /v1/venues/{id}
    pub async fn get_venue(&self, id: i64) -> Response {
        self.get(&format!("/v1/venues/{}", id)).await
    }

    /// GET /v1/venues/{id}/shows
    pub async fn get_venue_shows(&self, id: i64) -> Response {
        self.get(&format!("/v1/venues/{}/shows", id)).await
    }

    /// GET /v1/shows/{id}
    pub async fn get_show(&self, id: i64) -> Response {
        self.get(&format!("/v1/shows/{}", id)).await
    }

    // ========================================================================
    // Note Endpoints
    // ========================================================================

    /// GET /v1/shows/{id}/notes
    pub async fn get_show_notes(&self, show_id: i64, page: Option<&str>) -> Response {
        match page {
            Some(page) => {
                self.get(&format!("/v1/shows/{}/notes?page={}", show_id, page))
                    .await
            }
            None => self.get(&format!("/v1/shows/{}/notes", show_id)).await,
        }
    }

    /// POST /v1/shows/{id}/notes
    pub async fn post_note(
        &self,
        show_id: i64,
        title: &str,
        text: &str,
        photo: Option<PhotoPart>,
    ) -> Response {
        self.client
            .post(self.url(&format!("/v1/shows/{}/notes", show_id)))
            .multipart(note_form(title, text, photo, false))
            .send()
            .await
            .expect("Post note request failed")
    }

    /// Posts a note and returns its JSON, panicking on failure.
    pub async fn create_note(
        &self,
        show_id: i64,
        title: &str,
        text: &str,
        photo: Option<PhotoPart>,
    ) -> Value {
        let response = self.post_note(show_id, title, text, photo).await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        response.json().await.expect("Note response is not JSON")
    }

    /// PUT /v1/notes/{id}
    pub async fn put_note(
        &self,
        note_id: i64,
        title: &str,
        text: &str,
        photo: Option<PhotoPart>,
        clear_photo: bool,
    ) -> Response {
        self.client
            .put(self.url(&format!("/v1/notes/{}", note_id)))
            .multipart(note_form(title, text, photo, clear_photo))
            .send()
            .await
            .expect("Put note request failed")
    }

    /// DELETE /v1/notes/{id}
    pub async fn delete_note(&self, note_id: i64) -> Response {
        self.client
            .delete(self.url(&format!("/v1/notes/{}", note_id)))
            .send()
            .await
            .expect("Delete note request failed")
    }

    /// GET /v1/notes/{id}
    pub async fn get_note(&self, note_id: i64) -> Response {
        self.get(&format!("/v1/notes/{}", note_id)).await
    }

    /// GET /v1/notes/{id}/photo
    pub async fn get_note_photo(&self, note_id: i64) -> Response {
        self.get(&format!("/v1/notes/{}/photo", note_id)).await
    }

    /// GET /v1/notes
    pub async fn get_latest_notes(&self, page: Option<&str>) -> Response {
        match page {
            Some(page) => self.get(&format!("/v1/notes?page={}", page)).await,
            None => self.get("/v1/notes").await,
        }
    }

    // ========================================================================
    // User Endpoints
    // ========================================================================

    /// GET /v1/users/{id}
    pub async fn get_user(&self, user_id: i64) -> Response {
        self.get(&format!("/v1/users/{}", user_id)).await
    }

    /// GET /v1/users/me
    pub async fn get_me(&self) -> Response {
        self.get("/v1/users/me").await
    }
}
