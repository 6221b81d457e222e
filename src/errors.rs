use rocket::http::Status;
use rocket::response::{self, Responder, Response};
use rocket::Request;
use sea_orm::DbErr;
use std::io::Cursor;

use crate::validation::FieldErrors;

/// アプリケーション全体で使用するエラー型。
/// Djangoの例外クラス (Http404, ValidationError 等) に相当します。
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// データベースエラー (500 Internal Server Error)
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// リソースが見つからない (404 Not Found)
    #[error("Not found")]
    NotFound,
    /// フォームのバリデーションエラー。
    /// 通常はコントローラでフォーム再表示に変換されるので、ここまで届くのは想定外のケースのみ。
    #[error("Invalid form: {0}")]
    Validation(FieldErrors),
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let (status, message) = match &self {
            AppError::NotFound => (Status::NotFound, "Not Found".to_string()),
            AppError::Validation(errors) => (Status::BadRequest, errors.to_string()),
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                (Status::InternalServerError, "Database Error".to_string())
            }
        };

        Response::build()
            .status(status)
            .sized_body(message.len(), Cursor::new(message))
            .ok()
    }
}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        AppError::Validation(errors)
    }
}
