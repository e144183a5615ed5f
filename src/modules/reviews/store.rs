use async_trait::async_trait;
use shelf_db::StoreResult;
use sqlx::PgPool;

use super::models::{NewReview, Review, ReviewWithAuthor};

/// Partial unique index allowing one live review per user and book.
pub const LIVE_REVIEW_INDEX: &str = "reviews_user_book_live_key";

const REVIEW_COLUMNS: &str = "id, book_id, user_id, rating, comment, created_at, deleted_at";

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn create(&self, review: NewReview) -> StoreResult<i64>;

    /// Live reviews of a book with their authors, newest first.
    async fn find_by_book_id(&self, book_id: i64) -> StoreResult<Vec<ReviewWithAuthor>>;

    async fn find_by_user_and_book(&self, user_id: i64, book_id: i64)
        -> StoreResult<Option<Review>>;

    /// A live review; soft-deleted rows are treated as absent.
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Review>>;

    /// Overwrite rating and comment. `false` when no live row matched.
    async fn update(&self, id: i64, rating: i32, comment: Option<String>) -> StoreResult<bool>;

    /// Stamp `deleted_at`. `false` when no live row matched.
    async fn soft_delete(&self, id: i64) -> StoreResult<bool>;

    /// Mean rating of live reviews, 0 when there are none.
    async fn average_rating(&self, book_id: i64) -> StoreResult<f64>;
}

pub struct PgReviewStore {
    pool: PgPool,
}

impl PgReviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewStore for PgReviewStore {
    async fn create(&self, review: NewReview) -> StoreResult<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO reviews (book_id, user_id, rating, comment) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(review.book_id)
        .bind(review.user_id)
        .bind(review.rating)
        .bind(&review.comment)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn find_by_book_id(&self, book_id: i64) -> StoreResult<Vec<ReviewWithAuthor>> {
        let reviews = sqlx::query_as::<_, ReviewWithAuthor>(
            r#"
            SELECT r.id, r.book_id, r.user_id, u.username, r.rating, r.comment, r.created_at
            FROM reviews r
            JOIN users u ON u.id = r.user_id
            WHERE r.book_id = $1 AND r.deleted_at IS NULL
            ORDER BY r.created_at DESC, r.id DESC
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    async fn find_by_user_and_book(
        &self,
        user_id: i64,
        book_id: i64,
    ) -> StoreResult<Option<Review>> {
        let sql = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews \
             WHERE user_id = $1 AND book_id = $2 AND deleted_at IS NULL"
        );
        let review = sqlx::query_as::<_, Review>(&sql)
            .bind(user_id)
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(review)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Review>> {
        let sql =
            format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1 AND deleted_at IS NULL");
        let review = sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(review)
    }

    async fn update(&self, id: i64, rating: i32, comment: Option<String>) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE reviews SET rating = $1, comment = $2 WHERE id = $3 AND deleted_at IS NULL",
        )
        .bind(rating)
        .bind(comment)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn soft_delete(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE reviews SET deleted_at = now() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn average_rating(&self, book_id: i64) -> StoreResult<f64> {
        let average = sqlx::query_scalar::<_, f64>(
            "SELECT COALESCE(AVG(rating), 0)::float8 FROM reviews \
             WHERE book_id = $1 AND deleted_at IS NULL",
        )
        .bind(book_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(average)
    }
}
