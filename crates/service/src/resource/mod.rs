//! The paginated resource-collection contract.
//!
//! A collection is a zero-sized marker implementing [`Resource`]: it names
//! the id, input and output types plus the parent reference, and the generic
//! [`ResourceService`] does the rest against a [`Repository`].

use std::fmt::{Debug, Display};

use serde::{de::DeserializeOwned, Serialize};

use crate::errors::ServiceError;

pub mod repository;
pub mod service;

pub use repository::Repository;
pub use service::ResourceService;

/// Field-level validation of an input DTO.
pub trait Validate {
    fn validate(&self) -> Result<(), ServiceError>;
}

pub trait Resource: Send + Sync + 'static {
    type Id: Copy + Display + Debug + PartialEq + Send + Sync + DeserializeOwned + 'static;
    /// `Infallible` for collections without a parent.
    type ParentId: Copy + Display + Debug + Send + Sync + 'static;
    type Create: Validate + DeserializeOwned + Debug + Send + Sync + 'static;
    type Update: Validate + DeserializeOwned + Debug + Send + Sync + 'static;
    type View: Serialize + Clone + Debug + Send + Sync + 'static;

    /// Singular name used in messages: "Category".
    const LABEL: &'static str;
    /// Path segment and policy key: "categories".
    const COLLECTION: &'static str;
    const PARENT_LABEL: Option<&'static str> = None;

    fn parent_on_create(_input: &Self::Create) -> Option<Self::ParentId> { None }

    /// Only a relationship field present in the patch is checked.
    fn parent_on_update(_input: &Self::Update) -> Option<Self::ParentId> { None }

    fn id_of(view: &Self::View) -> Self::Id;
}
