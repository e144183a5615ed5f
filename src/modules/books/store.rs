use async_trait::async_trait;
use shelf_db::StoreResult;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::models::{Book, BookFilter, NewBook, Page};

/// Unique constraint on `books (title, author)`.
pub const TITLE_AUTHOR_CONSTRAINT: &str = "books_title_author_key";

const BOOK_COLUMNS: &str = "id, title, author, genre, description, published_year, created_at";

#[async_trait]
pub trait BookStore: Send + Sync {
    async fn create(&self, book: NewBook) -> StoreResult<Book>;

    async fn find_by_title_and_author(&self, title: &str, author: &str)
        -> StoreResult<Option<Book>>;

    /// One page of books, newest first.
    async fn find_all(&self, filter: &BookFilter, page: Page) -> StoreResult<Vec<Book>>;

    async fn count(&self, filter: &BookFilter) -> StoreResult<i64>;

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Book>>;

    /// Books whose title or author contains `term`, ignoring case.
    async fn search(&self, term: &str) -> StoreResult<Vec<Book>>;
}

pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn create(&self, book: NewBook) -> StoreResult<Book> {
        let sql = format!(
            "INSERT INTO books (title, author, genre, description, published_year) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {BOOK_COLUMNS}"
        );
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.genre)
            .bind(&book.description)
            .bind(book.published_year)
            .fetch_one(&self.pool)
            .await?;
        Ok(book)
    }

    async fn find_by_title_and_author(
        &self,
        title: &str,
        author: &str,
    ) -> StoreResult<Option<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE title = $1 AND author = $2");
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(title)
            .bind(author)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn find_all(&self, filter: &BookFilter, page: Page) -> StoreResult<Vec<Book>> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {BOOK_COLUMNS} FROM books"));
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let books = query.build_query_as::<Book>().fetch_all(&self.pool).await?;
        Ok(books)
    }

    async fn count(&self, filter: &BookFilter) -> StoreResult<i64> {
        let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books");
        push_filters(&mut query, filter);

        let total = query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Book>> {
        let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = $1");
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn search(&self, term: &str) -> StoreResult<Vec<Book>> {
        let sql = format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE title ILIKE $1 OR author ILIKE $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let books = sqlx::query_as::<_, Book>(&sql)
            .bind(contains_pattern(term))
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
    let mut separator = " WHERE ";
    if let Some(author) = &filter.author {
        query
            .push(separator)
            .push("author ILIKE ")
            .push_bind(contains_pattern(author));
        separator = " AND ";
    }
    if let Some(genre) = &filter.genre {
        query
            .push(separator)
            .push("genre ILIKE ")
            .push_bind(contains_pattern(genre));
    }
}

/// `ILIKE` pattern matching `term` anywhere, with its wildcards escaped.
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
