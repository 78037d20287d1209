//! Categories and their products.

use std::convert::Infallible;

use uuid::Uuid;

use crate::resource::Resource;

pub mod domain;
pub mod repo;

pub use domain::{CategoryView, CreateCategory, CreateProduct, ProductView, UpdateCategory, UpdateProduct};

pub struct Categories;

impl Resource for Categories {
    type Id = Uuid;
    type ParentId = Infallible;
    type Create = CreateCategory;
    type Update = UpdateCategory;
    type View = CategoryView;

    const LABEL: &'static str = "Category";
    const COLLECTION: &'static str = "categories";

    fn id_of(view: &CategoryView) -> Uuid { view.category.id }
}

pub struct Products;

impl Resource for Products {
    type Id = Uuid;
    type ParentId = Uuid;
    type Create = CreateProduct;
    type Update = UpdateProduct;
    type View = ProductView;

    const LABEL: &'static str = "Product";
    const COLLECTION: &'static str = "products";
    const PARENT_LABEL: Option<&'static str> = Some(Categories::LABEL);

    fn parent_on_create(input: &CreateProduct) -> Option<Uuid> { Some(input.category_id) }

    fn parent_on_update(input: &UpdateProduct) -> Option<Uuid> { input.category_id }

    fn id_of(view: &ProductView) -> Uuid { view.product.id }
}
