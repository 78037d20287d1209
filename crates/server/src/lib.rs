//! HTTP layer: routing, extractors, bearer-token authorization, error
//! mapping and the OpenAPI document.

pub mod auth;
pub mod errors;
pub mod extract;
pub mod openapi;
pub mod routes;
pub mod startup;
pub mod state;

pub use startup::{build_app, run};
