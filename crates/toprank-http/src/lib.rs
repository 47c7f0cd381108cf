//! HTTP service layer for Toprank.
//!
//! - **Router**: maps `GET /countries`, `GET /global/{page}`,
//!   `GET /{countryCode}/{page}` and `GET /health` to a [`TopRankOperation`]
//! - **Handler trait**: defines the boundary between HTTP and business logic
//! - **Service**: hyper `Service` implementation
//! - **Response helpers**: JSON success/error response formatting
//!
//! [`TopRankOperation`]: toprank_model::TopRankOperation

pub mod body;
pub mod dispatch;
pub mod response;
pub mod router;
pub mod service;

pub use body::TopRankResponseBody;
pub use dispatch::{NotImplementedHandler, TopRankHandler};
pub use service::TopRankHttpService;
