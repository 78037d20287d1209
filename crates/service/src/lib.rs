//! Service layer: the generic resource-collection contract and its four
//! instantiations.
//! - `resource` holds the `Resource` configuration trait, the `Repository`
//!   contract and the generic `ResourceService`.
//! - `catalog` and `audience` configure the concrete collections and ship
//!   their SeaORM repositories.
//! - `policy` is the authorization gate; `mock` is an in-memory store.

pub mod errors;
pub mod pagination;
pub mod policy;
pub mod resource;
pub mod search;
pub mod catalog;
pub mod audience;
pub mod mock;
#[cfg(test)]
pub mod test_support;

pub use errors::ServiceError;
