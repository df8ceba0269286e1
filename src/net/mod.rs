//! Backend networking: wire types and the HTTP client.

pub mod api;
pub mod types;

pub use api::{HttpMathApi, MathApi};
pub use types::ApiError;
