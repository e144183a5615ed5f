use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub book_id: i64,
    pub user_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
}

/// A live review joined with its author's display name.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewWithAuthor {
    pub id: i64,
    pub book_id: i64,
    pub user_id: i64,
    pub username: String,
    pub rating: i32,
    pub comment: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Body of review create and update.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ReviewInput {
    #[validate(range(min = 1, max = 5, message = "\"rating\" must be between 1 and 5"))]
    #[schema(minimum = 1, maximum = 5)]
    pub rating: i32,
    #[validate(length(min = 1, message = "\"comment\" is not allowed to be empty"))]
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub book_id: i64,
    pub user_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedReview {
    pub id: i64,
    pub book_id: i64,
    pub user_id: i64,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewCreated {
    pub message: String,
    pub review: CreatedReview,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UpdatedReview {
    pub id: i64,
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewUpdated {
    pub message: String,
    pub review: UpdatedReview,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewDeleted {
    pub message: String,
}
