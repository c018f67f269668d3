//! Success envelope shared by every handler: `{ "data": ... }`.
//!
//! Errors use a different shape, see [`crate::error::AppError`].

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
