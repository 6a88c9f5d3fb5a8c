//! The page to display when a user tries to access something they are not allowed to.
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

pub struct ForbiddenError;

impl IntoResponse for ForbiddenError {
    fn into_response(self) -> Response {
        (
            StatusCode::FORBIDDEN,
            Html(
                error_view(
                    "Forbidden",
                    "403",
                    "Unauthorized access.",
                    "You do not have permission to view this page.",
                )
                .into_string(),
            ),
        )
            .into_response()
    }
}
