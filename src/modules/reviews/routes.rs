use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use shelf_authz::AuthUser;
use shelf_http::{error::ErrorResponse, AppError, ValidatedJson};

use super::models::{
    CreatedReview, NewReview, ReviewCreated, ReviewDeleted, ReviewInput, ReviewUpdated,
    UpdatedReview,
};
use super::store::LIVE_REVIEW_INDEX;
use crate::modules::{books::routes::book_not_found, parse_id, CatalogState};

const DUPLICATE_REVIEW: &str = "You have already reviewed this book";

fn review_not_found(raw_id: &str) -> AppError {
    AppError::not_found(format!("Review not found for id = {raw_id}"))
}

/// Review a book. One live review per user and book.
#[utoipa::path(
    post,
    path = "/{id}/reviews",
    tag = "Reviews",
    params(("id" = i64, Path, description = "Book id")),
    request_body = ReviewInput,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Review created", body = ReviewCreated),
        (status = 400, description = "Invalid body or book already reviewed", body = ErrorResponse),
        (status = 401, description = "Missing token", body = ErrorResponse),
        (status = 403, description = "Invalid token", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn create_review(
    State(state): State<CatalogState>,
    user: AuthUser,
    Path(raw_id): Path<String>,
    ValidatedJson(body): ValidatedJson<ReviewInput>,
) -> Result<(StatusCode, Json<ReviewCreated>), AppError> {
    let book_id = parse_id(&raw_id).ok_or_else(|| book_not_found(&raw_id))?;
    if state.books.find_by_id(book_id).await?.is_none() {
        return Err(book_not_found(&raw_id));
    }

    if let Some(existing) = state
        .reviews
        .find_by_user_and_book(user.user_id, book_id)
        .await?
    {
        return Err(AppError::conflict(
            vec![json!({ "existingReview": { "id": existing.id, "rating": existing.rating } })],
            DUPLICATE_REVIEW,
        ));
    }

    let id = state
        .reviews
        .create(NewReview {
            book_id,
            user_id: user.user_id,
            rating: body.rating,
            comment: body.comment.clone(),
        })
        .await
        .map_err(|err| {
            if err.violates(LIVE_REVIEW_INDEX) {
                AppError::conflict(vec![], DUPLICATE_REVIEW)
            } else {
                AppError::from(err)
            }
        })?;

    tracing::info!(review_id = id, book_id, user_id = user.user_id, "review created");

    Ok((
        StatusCode::CREATED,
        Json(ReviewCreated {
            message: "Review created successfully".to_string(),
            review: CreatedReview {
                id,
                book_id,
                user_id: user.user_id,
                rating: body.rating,
                comment: body.comment,
            },
        }),
    ))
}

/// Replace the rating and comment of your own review
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Reviews",
    params(("id" = i64, Path, description = "Review id")),
    request_body = ReviewInput,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Review updated", body = ReviewUpdated),
        (status = 400, description = "Invalid body", body = ErrorResponse),
        (status = 401, description = "Missing token", body = ErrorResponse),
        (status = 403, description = "Invalid token or not the author", body = ErrorResponse),
        (status = 404, description = "Review not found", body = ErrorResponse)
    )
)]
pub async fn update_review(
    State(state): State<CatalogState>,
    user: AuthUser,
    Path(raw_id): Path<String>,
    ValidatedJson(body): ValidatedJson<ReviewInput>,
) -> Result<Json<ReviewUpdated>, AppError> {
    let id = parse_id(&raw_id).ok_or_else(|| review_not_found(&raw_id))?;
    let review = state
        .reviews
        .find_by_id(id)
        .await?
        .ok_or_else(|| review_not_found(&raw_id))?;

    if review.user_id != user.user_id {
        return Err(AppError::forbidden("You can only update your own reviews"));
    }

    if !state
        .reviews
        .update(id, body.rating, body.comment.clone())
        .await?
    {
        return Err(review_not_found(&raw_id));
    }

    tracing::info!(review_id = id, user_id = user.user_id, "review updated");

    Ok(Json(ReviewUpdated {
        message: "Review updated successfully".to_string(),
        review: UpdatedReview {
            id,
            rating: body.rating,
            comment: body.comment,
        },
    }))
}

/// Soft-delete your own review
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Reviews",
    params(("id" = i64, Path, description = "Review id")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Review deleted", body = ReviewDeleted),
        (status = 401, description = "Missing token", body = ErrorResponse),
        (status = 403, description = "Invalid token or not the author", body = ErrorResponse),
        (status = 404, description = "Review not found", body = ErrorResponse)
    )
)]
pub async fn delete_review(
    State(state): State<CatalogState>,
    user: AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<ReviewDeleted>, AppError> {
    let id = parse_id(&raw_id).ok_or_else(|| review_not_found(&raw_id))?;
    let review = state
        .reviews
        .find_by_id(id)
        .await?
        .ok_or_else(|| review_not_found(&raw_id))?;

    if review.user_id != user.user_id {
        return Err(AppError::forbidden("You can only delete your own reviews"));
    }

    if !state.reviews.soft_delete(id).await? {
        return Err(review_not_found(&raw_id));
    }

    tracing::info!(review_id = id, user_id = user.user_id, "review deleted");

    Ok(Json(ReviewDeleted {
        message: "Review deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use super::DUPLICATE_REVIEW;
    use crate::testing::TestApp;

    async fn setup() -> (TestApp, String, i64) {
        let app = TestApp::new();
        let (_, token) = app.signup("critic@example.com").await;
        let book_id = app.add_book(&token, "Emma", "Jane Austen").await;
        (app, token, book_id)
    }

    #[tokio::test]
    async fn reviewing_requires_a_token() {
        let (app, _, book_id) = setup().await;
        let (status, _) = app
            .request(
                Method::POST,
                &format!("/books/{book_id}/reviews"),
                None,
                Some(json!({ "rating": 5 })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn review_is_created_for_the_caller() {
        let (app, token, book_id) = setup().await;
        let (status, body) = app
            .request(
                Method::POST,
                &format!("/books/{book_id}/reviews"),
                Some(&token),
                Some(json!({ "rating": 5, "comment": "Lovely" })),
            )
            .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Review created successfully");
        assert_eq!(body["review"]["bookId"], book_id);
        assert_eq!(body["review"]["userId"], 1);
        assert_eq!(body["review"]["comment"], "Lovely");
    }

    #[tokio::test]
    async fn reviewing_a_missing_book_is_not_found() {
        let (app, token, _) = setup().await;
        let (status, body) = app
            .request(
                Method::POST,
                "/books/404/reviews",
                Some(&token),
                Some(json!({ "rating": 3 })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Book not found for id = 404");
    }

    #[tokio::test]
    async fn out_of_range_rating_is_rejected() {
        let (app, token, book_id) = setup().await;
        let (status, body) = app
            .request(
                Method::POST,
                &format!("/books/{book_id}/reviews"),
                Some(&token),
                Some(json!({ "rating": 6 })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn second_review_points_at_the_first() {
        let (app, token, book_id) = setup().await;
        let first = app.add_review(&token, book_id, 4).await;

        let (status, body) = app
            .request(
                Method::POST,
                &format!("/books/{book_id}/reviews"),
                Some(&token),
                Some(json!({ "rating": 2 })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], DUPLICATE_REVIEW);
        assert_eq!(body["error"]["details"][0]["existingReview"]["id"], first);
        assert_eq!(body["error"]["details"][0]["existingReview"]["rating"], 4);
    }

    #[tokio::test]
    async fn racing_second_review_caught_by_live_index() {
        let (app, token, book_id) = setup().await;
        app.add_review(&token, book_id, 4).await;
        app.db.hide_existing();

        let (status, body) = app
            .request(
                Method::POST,
                &format!("/books/{book_id}/reviews"),
                Some(&token),
                Some(json!({ "rating": 2 })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], DUPLICATE_REVIEW);
        assert_eq!(body["error"]["details"], json!([]));
    }

    #[tokio::test]
    async fn only_the_author_may_update() {
        let (app, token, book_id) = setup().await;
        let (_, other) = app.signup("other@example.com").await;
        let review_id = app.add_review(&token, book_id, 2).await;
        let uri = format!("/reviews/{review_id}");

        let (status, body) = app
            .request(Method::PATCH, &uri, Some(&other), Some(json!({ "rating": 5 })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["message"], "You can only update your own reviews");

        let (status, body) = app
            .request(
                Method::PATCH,
                &uri,
                Some(&token),
                Some(json!({ "rating": 5, "comment": "Grew on me" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Review updated successfully");
        assert_eq!(
            body["review"],
            json!({ "id": review_id, "rating": 5, "comment": "Grew on me" })
        );

        let (_, detail) = app.get(&format!("/books/{book_id}")).await;
        assert_eq!(detail["book"]["averageRating"], json!(5.0));
    }

    #[tokio::test]
    async fn updating_a_missing_review_is_not_found() {
        let (app, token, _) = setup().await;
        let (status, body) = app
            .request(Method::PATCH, "/reviews/77", Some(&token), Some(json!({ "rating": 3 })))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "Review not found for id = 77");

        let (status, _) = app
            .request(Method::PATCH, "/reviews/x", Some(&token), Some(json!({ "rating": 3 })))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn only_the_author_may_delete() {
        let (app, token, book_id) = setup().await;
        let (_, other) = app.signup("other@example.com").await;
        let review_id = app.add_review(&token, book_id, 2).await;

        let (status, body) = app
            .request(Method::DELETE, &format!("/reviews/{review_id}"), Some(&other), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["message"], "You can only delete your own reviews");
    }

    #[tokio::test]
    async fn soft_deleted_review_disappears_but_is_kept() {
        let (app, token, book_id) = setup().await;
        let (_, other) = app.signup("other@example.com").await;
        let mine = app.add_review(&token, book_id, 1).await;
        app.add_review(&other, book_id, 5).await;
        let uri = format!("/reviews/{mine}");

        let (status, body) = app.request(Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Review deleted successfully");

        let (_, detail) = app.get(&format!("/books/{book_id}")).await;
        assert_eq!(detail["book"]["totalReviews"], 1);
        assert_eq!(detail["book"]["averageRating"], json!(5.0));
        assert_eq!(detail["reviews"].as_array().unwrap().len(), 1);

        let stored = app.db.all_reviews().await;
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().any(|r| r.id == mine && r.deleted_at.is_some()));

        let (status, _) = app.request(Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app
            .request(Method::PATCH, &uri, Some(&token), Some(json!({ "rating": 2 })))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // A fresh review is allowed once the old one is gone.
        app.add_review(&token, book_id, 3).await;
    }
}
