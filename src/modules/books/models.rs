use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::modules::reviews::models::ReviewWithAuthor;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;
pub const MIN_PUBLISHED_YEAR: i32 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub description: String,
    pub published_year: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Body of `POST /books`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateBook {
    #[validate(
        length(max = 255, message = "\"title\" length must be less than or equal to 255 characters long"),
        custom(function = "not_empty", message = "\"title\" is not allowed to be empty")
    )]
    pub title: String,
    #[validate(
        length(max = 255, message = "\"author\" length must be less than or equal to 255 characters long"),
        custom(function = "not_empty", message = "\"author\" is not allowed to be empty")
    )]
    pub author: String,
    #[validate(
        length(max = 100, message = "\"genre\" length must be less than or equal to 100 characters long"),
        custom(function = "not_empty", message = "\"genre\" is not allowed to be empty")
    )]
    #[serde(default)]
    pub genre: Option<String>,
    #[validate(custom(function = "not_empty", message = "\"description\" is not allowed to be empty"))]
    pub description: String,
    #[validate(custom(function = "published_year_in_range"))]
    #[schema(minimum = 1000)]
    pub published_year: i32,
}

fn not_empty(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new("length"));
    }
    Ok(())
}

/// The upper bound moves with the calendar, so it cannot be a `range`.
fn published_year_in_range(year: i32) -> Result<(), ValidationError> {
    let current_year = OffsetDateTime::now_utc().year();
    let message = if year < MIN_PUBLISHED_YEAR {
        format!("\"publishedYear\" must be greater than or equal to {MIN_PUBLISHED_YEAR}")
    } else if year > current_year {
        format!("\"publishedYear\" must be less than or equal to {current_year}")
    } else {
        return Ok(());
    };
    Err(ValidationError::new("range").with_message(Cow::Owned(message)))
}

#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: Option<String>,
    pub description: String,
    pub published_year: i32,
}

impl From<CreateBook> for NewBook {
    fn from(body: CreateBook) -> Self {
        Self {
            title: body.title,
            author: body.author,
            genre: body.genre,
            description: body.description,
            published_year: body.published_year,
        }
    }
}

/// Query string of `GET /books`. Page and limit stay raw so that junk
/// values fall back to the defaults instead of failing the request.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBooksQuery {
    /// Page number, starting at 1
    #[param(value_type = Option<i64>)]
    pub page: Option<String>,
    /// Page size, at most 100
    #[param(value_type = Option<i64>)]
    pub limit: Option<String>,
    /// Case-insensitive substring of the author
    pub author: Option<String>,
    /// Case-insensitive substring of the genre
    pub genre: Option<String>,
}

impl ListBooksQuery {
    pub fn page(&self) -> Page {
        let number = parse_positive(self.page.as_deref()).unwrap_or(DEFAULT_PAGE);
        let limit = parse_positive(self.limit.as_deref())
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        Page { number, limit }
    }

    pub fn filter(&self) -> BookFilter {
        BookFilter {
            author: non_empty(self.author.as_deref()),
            genre: non_empty(self.genre.as_deref()),
        }
    }
}

fn parse_positive(raw: Option<&str>) -> Option<i64> {
    raw?.trim().parse::<i64>().ok().filter(|value| *value >= 1)
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.filter(|value| !value.is_empty()).map(str::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub limit: i64,
}

impl Page {
    pub fn offset(&self) -> i64 {
        (self.number - 1).saturating_mul(self.limit)
    }
}

/// Optional substring filters, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub author: Option<String>,
    pub genre: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_books: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: Page, total_books: i64) -> Self {
        Self {
            current_page: page.number,
            total_pages: (total_books + page.limit - 1) / page.limit,
            total_books,
            has_next: page.number.saturating_mul(page.limit) < total_books,
            has_prev: page.number > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookList {
    pub books: Vec<Book>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookCreated {
    pub message: String,
    pub book: Book,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookWithStats {
    #[serde(flatten)]
    pub book: Book,
    pub average_rating: f64,
    pub total_reviews: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetail {
    pub book: BookWithStats,
    pub reviews: Vec<ReviewWithAuthor>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Matched against title and author
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub books: Vec<Book>,
    pub search_term: String,
    pub total_results: usize,
}

/// Round to one decimal place.
pub fn round_rating(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
