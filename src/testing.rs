//! In-memory stores and a router harness for handler tests.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use shelf_authz::TokenKeys;
use shelf_db::{StoreError, StoreResult};
use shelf_kernel::{settings::Settings, ModuleRegistry};
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;
use tower::ServiceExt;

use crate::modules::auth::models::{NewUser, User};
use crate::modules::auth::store::{UserStore, EMAIL_CONSTRAINT};
use crate::modules::books::models::{Book, BookFilter, NewBook, Page};
use crate::modules::books::store::{BookStore, TITLE_AUTHOR_CONSTRAINT};
use crate::modules::reviews::models::{NewReview, Review, ReviewWithAuthor};
use crate::modules::reviews::store::{ReviewStore, LIVE_REVIEW_INDEX};
use crate::{build_registry, AppContext};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    books: Vec<Book>,
    reviews: Vec<Review>,
}

/// Vec-backed stand-in for Postgres with the same unique constraints.
#[derive(Default)]
pub struct MemoryDb {
    tables: RwLock<Tables>,
    hide_existing: AtomicBool,
}

impl MemoryDb {
    /// Make existence checks miss, as if a concurrent request inserted the
    /// row between the check and the write.
    pub fn hide_existing(&self) {
        self.hide_existing.store(true, Ordering::SeqCst);
    }

    fn hiding(&self) -> bool {
        self.hide_existing.load(Ordering::SeqCst)
    }

    /// Every stored review, soft-deleted ones included.
    pub async fn all_reviews(&self) -> Vec<Review> {
        self.tables.read().await.reviews.clone()
    }
}

fn violation(constraint: &str) -> StoreError {
    StoreError::UniqueViolation {
        constraint: constraint.to_string(),
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches_filter(book: &Book, filter: &BookFilter) -> bool {
    let author = filter
        .author
        .as_deref()
        .map_or(true, |author| contains_ignore_case(&book.author, author));
    let genre = filter.genre.as_deref().map_or(true, |genre| {
        book.genre
            .as_deref()
            .is_some_and(|value| contains_ignore_case(value, genre))
    });
    author && genre
}

#[async_trait]
impl UserStore for MemoryDb {
    async fn create(&self, user: NewUser) -> StoreResult<i64> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(violation(EMAIL_CONSTRAINT));
        }
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(violation("users_username_key"));
        }

        let id = tables.users.len() as i64 + 1;
        tables.users.push(User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        });
        Ok(id)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        if self.hiding() {
            return Ok(None);
        }
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl BookStore for MemoryDb {
    async fn create(&self, book: NewBook) -> StoreResult<Book> {
        let mut tables = self.tables.write().await;
        if tables
            .books
            .iter()
            .any(|b| b.title == book.title && b.author == book.author)
        {
            return Err(violation(TITLE_AUTHOR_CONSTRAINT));
        }

        let book = Book {
            id: tables.books.len() as i64 + 1,
            title: book.title,
            author: book.author,
            genre: book.genre,
            description: book.description,
            published_year: book.published_year,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.books.push(book.clone());
        Ok(book)
    }

    async fn find_by_title_and_author(
        &self,
        title: &str,
        author: &str,
    ) -> StoreResult<Option<Book>> {
        if self.hiding() {
            return Ok(None);
        }
        let tables = self.tables.read().await;
        Ok(tables
            .books
            .iter()
            .find(|b| b.title == title && b.author == author)
            .cloned())
    }

    async fn find_all(&self, filter: &BookFilter, page: Page) -> StoreResult<Vec<Book>> {
        let tables = self.tables.read().await;
        Ok(tables
            .books
            .iter()
            .rev()
            .filter(|book| matches_filter(book, filter))
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &BookFilter) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .books
            .iter()
            .filter(|book| matches_filter(book, filter))
            .count() as i64)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Book>> {
        let tables = self.tables.read().await;
        Ok(tables.books.iter().find(|b| b.id == id).cloned())
    }

    async fn search(&self, term: &str) -> StoreResult<Vec<Book>> {
        let tables = self.tables.read().await;
        Ok(tables
            .books
            .iter()
            .rev()
            .filter(|b| contains_ignore_case(&b.title, term) || contains_ignore_case(&b.author, term))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReviewStore for MemoryDb {
    async fn create(&self, review: NewReview) -> StoreResult<i64> {
        let mut tables = self.tables.write().await;
        if tables.reviews.iter().any(|r| {
            r.deleted_at.is_none() && r.user_id == review.user_id && r.book_id == review.book_id
        }) {
            return Err(violation(LIVE_REVIEW_INDEX));
        }

        let id = tables.reviews.len() as i64 + 1;
        tables.reviews.push(Review {
            id,
            book_id: review.book_id,
            user_id: review.user_id,
            rating: review.rating,
            comment: review.comment,
            created_at: OffsetDateTime::now_utc(),
            deleted_at: None,
        });
        Ok(id)
    }

    async fn find_by_book_id(&self, book_id: i64) -> StoreResult<Vec<ReviewWithAuthor>> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .iter()
            .rev()
            .filter(|r| r.book_id == book_id && r.deleted_at.is_none())
            .filter_map(|r| {
                let author = tables.users.iter().find(|u| u.id == r.user_id)?;
                Some(ReviewWithAuthor {
                    id: r.id,
                    book_id: r.book_id,
                    user_id: r.user_id,
                    username: author.username.clone(),
                    rating: r.rating,
                    comment: r.comment.clone(),
                    created_at: r.created_at,
                })
            })
            .collect())
    }

    async fn find_by_user_and_book(
        &self,
        user_id: i64,
        book_id: i64,
    ) -> StoreResult<Option<Review>> {
        if self.hiding() {
            return Ok(None);
        }
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .iter()
            .find(|r| r.user_id == user_id && r.book_id == book_id && r.deleted_at.is_none())
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Review>> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .iter()
            .find(|r| r.id == id && r.deleted_at.is_none())
            .cloned())
    }

    async fn update(&self, id: i64, rating: i32, comment: Option<String>) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .reviews
            .iter_mut()
            .find(|r| r.id == id && r.deleted_at.is_none())
        {
            Some(review) => {
                review.rating = rating;
                review.comment = comment;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn soft_delete(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .reviews
            .iter_mut()
            .find(|r| r.id == id && r.deleted_at.is_none())
        {
            Some(review) => {
                review.deleted_at = Some(OffsetDateTime::now_utc());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn average_rating(&self, book_id: i64) -> StoreResult<f64> {
        let tables = self.tables.read().await;
        let ratings: Vec<i32> = tables
            .reviews
            .iter()
            .filter(|r| r.book_id == book_id && r.deleted_at.is_none())
            .map(|r| r.rating)
            .collect();
        if ratings.is_empty() {
            return Ok(0.0);
        }
        Ok(ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64)
    }
}

/// The full router over a fresh [`MemoryDb`].
pub struct TestApp {
    pub router: Router,
    pub registry: ModuleRegistry,
    pub db: Arc<MemoryDb>,
    pub tokens: Arc<TokenKeys>,
}

impl TestApp {
    pub fn new() -> Self {
        let db = Arc::new(MemoryDb::default());
        let tokens = Arc::new(TokenKeys::new(b"test-secret", Duration::days(7)));
        let ctx = AppContext {
            users: db.clone(),
            books: db.clone(),
            reviews: db.clone(),
            tokens: tokens.clone(),
            // bcrypt's minimum cost keeps signups fast
            bcrypt_cost: 4,
        };
        let registry = build_registry(&ctx).unwrap();
        let router = shelf_http::build_router(&registry, &Settings::default());

        Self {
            router,
            registry,
            db,
            tokens,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, None).await
    }

    /// Sign up and return `(user_id, token)`.
    pub async fn signup(&self, email: &str) -> (i64, String) {
        let (status, body) = self
            .request(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({ "email": email, "password": "secret123" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let id = body["user"]["id"].as_i64().unwrap();
        let token = body["token"].as_str().unwrap().to_string();
        (id, token)
    }

    /// Create a book and return its id.
    pub async fn add_book(&self, token: &str, title: &str, author: &str) -> i64 {
        let (status, body) = self
            .request(
                Method::POST,
                "/books",
                Some(token),
                Some(book_body(title, author)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["book"]["id"].as_i64().unwrap()
    }

    /// Review a book and return the review id.
    pub async fn add_review(&self, token: &str, book_id: i64, rating: i32) -> i64 {
        let (status, body) = self
            .request(
                Method::POST,
                &format!("/books/{book_id}/reviews"),
                Some(token),
                Some(json!({ "rating": rating })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["review"]["id"].as_i64().unwrap()
    }
}

pub fn book_body(title: &str, author: &str) -> Value {
    json!({
        "title": title,
        "author": author,
        "genre": "Fantasy",
        "description": "A story",
        "publishedYear": 1990
    })
}
