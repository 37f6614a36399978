use axum::extract::FromRequest;

use crate::error::ApiError;

/// `axum::Json` whose rejections are reported in the service's error format.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);
