//! SeaORM entities for the catalog (categories, products) and the audience
//! (subscribers, subscriptions), plus the field validators the service layer
//! runs before anything reaches the database.

pub mod errors;
pub mod db;
pub mod validation;
pub mod category;
pub mod product;
pub mod subscriber;
pub mod subscription;
