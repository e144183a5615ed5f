//! JSON body extraction with schema validation.
//!
//! Every failure, whether the body is unparsable, a field is missing or a
//! constraint is violated, becomes a 400 `validation_error` whose details hold
//! one message per problem.

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::{Validate, ValidationErrors};

use crate::error::AppError;

pub const VALIDATION_FAILED: &str = "Validation failed";

/// Extractor that deserializes a JSON body and runs `Validate` on it
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                AppError::validation(vec![Value::String(rejection.body_text())], VALIDATION_FAILED)
            })?;

        validate(&value)?;
        Ok(Self(value))
    }
}

/// Run `value`'s schema and convert failures into an `AppError`.
pub fn validate<T: Validate>(value: &T) -> Result<(), AppError> {
    value.validate().map_err(|errors| {
        let details = messages(&errors).into_iter().map(Value::String).collect();
        AppError::validation(details, VALIDATION_FAILED)
    })
}

/// Flatten field errors into readable messages, ordered by field name.
pub fn messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("\"{}\" failed the {} check", field, error.code),
            })
        })
        .collect()
}
