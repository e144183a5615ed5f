use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shelf_authz::AuthUser;
use shelf_http::{error::ErrorResponse, AppError, QueryParams, ValidatedJson};

use super::models::{
    round_rating, BookCreated, BookDetail, BookList, BookWithStats, CreateBook, ListBooksQuery,
    NewBook, Pagination, SearchQuery, SearchResults,
};
use super::store::TITLE_AUTHOR_CONSTRAINT;
use crate::modules::{parse_id, CatalogState};

pub fn book_not_found(raw_id: &str) -> AppError {
    AppError::not_found(format!("Book not found for id = {raw_id}"))
}

fn duplicate_book(title: &str, author: &str) -> AppError {
    AppError::conflict(
        vec![],
        format!("Book already exists for title = {title} and author = {author}"),
    )
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/",
    tag = "Books",
    request_body = CreateBook,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Book created", body = BookCreated),
        (status = 400, description = "Invalid body or duplicate title and author", body = ErrorResponse),
        (status = 401, description = "Missing token", body = ErrorResponse),
        (status = 403, description = "Invalid token", body = ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<CatalogState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<CreateBook>,
) -> Result<(StatusCode, Json<BookCreated>), AppError> {
    if state
        .books
        .find_by_title_and_author(&body.title, &body.author)
        .await?
        .is_some()
    {
        return Err(duplicate_book(&body.title, &body.author));
    }

    let (title, author) = (body.title.clone(), body.author.clone());
    let book = state
        .books
        .create(NewBook::from(body))
        .await
        .map_err(|err| {
            if err.violates(TITLE_AUTHOR_CONSTRAINT) {
                duplicate_book(&title, &author)
            } else {
                AppError::from(err)
            }
        })?;

    tracing::info!(book_id = book.id, user_id = user.user_id, "book created");

    Ok((
        StatusCode::CREATED,
        Json(BookCreated {
            message: "Book created successfully".to_string(),
            book,
        }),
    ))
}

/// List books, newest first
#[utoipa::path(
    get,
    path = "/",
    tag = "Books",
    params(ListBooksQuery),
    responses((status = 200, description = "One page of books", body = BookList))
)]
pub async fn list_books(
    State(state): State<CatalogState>,
    QueryParams(query): QueryParams<ListBooksQuery>,
) -> Result<Json<BookList>, AppError> {
    let page = query.page();
    let filter = query.filter();

    let books = state.books.find_all(&filter, page).await?;
    let total = state.books.count(&filter).await?;

    Ok(Json(BookList {
        books,
        pagination: Pagination::new(page, total),
    }))
}

/// A book with its live reviews and rating summary
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Books",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 200, description = "Book with reviews", body = BookDetail),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<CatalogState>,
    Path(raw_id): Path<String>,
) -> Result<Json<BookDetail>, AppError> {
    let id = parse_id(&raw_id).ok_or_else(|| book_not_found(&raw_id))?;
    let book = state
        .books
        .find_by_id(id)
        .await?
        .ok_or_else(|| book_not_found(&raw_id))?;

    let reviews = state.reviews.find_by_book_id(id).await?;
    let average = state.reviews.average_rating(id).await?;

    Ok(Json(BookDetail {
        book: BookWithStats {
            book,
            average_rating: round_rating(average),
            total_reviews: reviews.len(),
        },
        reviews,
    }))
}

/// Case-insensitive search over titles and authors
#[utoipa::path(
    get,
    path = "/search",
    tag = "Books",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching books", body = SearchResults),
        (status = 400, description = "Missing search term", body = ErrorResponse)
    )
)]
pub async fn search_books(
    State(state): State<CatalogState>,
    QueryParams(query): QueryParams<SearchQuery>,
) -> Result<Json<SearchResults>, AppError> {
    let term = query.q.as_deref().map(str::trim).unwrap_or_default();
    if term.is_empty() {
        return Err(AppError::bad_request("Search query is required"));
    }

    let books = state.books.search(term).await?;

    Ok(Json(SearchResults {
        total_results: books.len(),
        search_term: term.to_string(),
        books,
    }))
}
