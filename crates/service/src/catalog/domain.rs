//! Catalog DTOs and views.

use models::{category, product};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::resource::Validate;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Absent fields are kept; `null` clears `description` or `image`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategory {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub image: Option<Option<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub image: Option<String>,
    pub category_id: Uuid,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub image: Option<Option<String>>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
}

/// A category, with its products when loaded eagerly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryView {
    #[serde(flatten)]
    pub category: category::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<product::Model>>,
}

/// A product, with its category when loaded eagerly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: product::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<category::Model>,
}

impl Validate for CreateCategory {
    fn validate(&self) -> Result<(), ServiceError> {
        category::validate_name(&self.name)?;
        if let Some(image) = &self.image {
            category::validate_image(image)?;
        }
        Ok(())
    }
}

impl Validate for UpdateCategory {
    fn validate(&self) -> Result<(), ServiceError> {
        if let Some(name) = &self.name {
            category::validate_name(name)?;
        }
        if let Some(Some(image)) = &self.image {
            category::validate_image(image)?;
        }
        Ok(())
    }
}

impl Validate for CreateProduct {
    fn validate(&self) -> Result<(), ServiceError> {
        product::validate_name(&self.name)?;
        product::validate_price(self.price)?;
        if let Some(image) = &self.image {
            product::validate_image(image)?;
        }
        Ok(())
    }
}

impl Validate for UpdateProduct {
    fn validate(&self) -> Result<(), ServiceError> {
        if let Some(name) = &self.name {
            product::validate_name(name)?;
        }
        if let Some(price) = self.price {
            product::validate_price(price)?;
        }
        if let Some(Some(image)) = &self.image {
            product::validate_image(image)?;
        }
        Ok(())
    }
}

impl CreateCategory {
    pub fn into_model(self, id: Uuid, now: DateTimeWithTimeZone) -> category::Model {
        category::Model {
            id,
            name: self.name,
            description: self.description,
            image: self.image,
            created_at: now,
            updated_at: now,
        }
    }
}

impl UpdateCategory {
    pub fn apply(self, m: &mut category::Model, now: DateTimeWithTimeZone) {
        if let Some(name) = self.name {
            m.name = name;
        }
        if let Some(description) = self.description {
            m.description = description;
        }
        if let Some(image) = self.image {
            m.image = image;
        }
        m.updated_at = now;
    }
}

impl CreateProduct {
    pub fn into_model(self, id: Uuid, now: DateTimeWithTimeZone) -> product::Model {
        product::Model {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            image: self.image,
            category_id: self.category_id,
            created_at: now,
            updated_at: now,
        }
    }
}

impl UpdateProduct {
    pub fn apply(self, m: &mut product::Model, now: DateTimeWithTimeZone) {
        if let Some(name) = self.name {
            m.name = name;
        }
        if let Some(description) = self.description {
            m.description = description;
        }
        if let Some(price) = self.price {
            m.price = price;
        }
        if let Some(image) = self.image {
            m.image = image;
        }
        if let Some(category_id) = self.category_id {
            m.category_id = category_id;
        }
        m.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn electronics() -> category::Model {
        let t = Utc::now().into();
        CreateCategory { name: "Electronics".into(), description: Some("Gadgets".into()), image: None }
            .into_model(Uuid::new_v4(), t)
    }

    #[test]
    fn absent_and_null_are_different() {
        let keep: UpdateCategory = serde_json::from_value(json!({"name": "Devices"})).unwrap();
        let clear: UpdateCategory = serde_json::from_value(json!({"description": null})).unwrap();
        assert_eq!(keep.description, None);
        assert_eq!(clear.description, Some(None));

        let mut m = electronics();
        keep.apply(&mut m, Utc::now().into());
        assert_eq!(m.name, "Devices");
        assert_eq!(m.description.as_deref(), Some("Gadgets"));
        clear.apply(&mut m, Utc::now().into());
        assert_eq!(m.description, None);
    }

    #[test]
    fn empty_patch_only_touches_updated_at() {
        let mut m = electronics();
        let before = m.clone();
        let later = (Utc::now() + chrono::Duration::seconds(5)).into();
        UpdateCategory::default().apply(&mut m, later);
        assert_eq!(m.name, before.name);
        assert_eq!(m.created_at, before.created_at);
        assert_eq!(m.updated_at, later);
    }

    #[test]
    fn product_validation_names_the_field() {
        let bad = CreateProduct {
            name: "Phone".into(),
            description: None,
            price: -1.0,
            image: None,
            category_id: Uuid::new_v4(),
        };
        match bad.validate() {
            Err(ServiceError::Validation(msg)) => assert!(msg.starts_with("price")),
            other => panic!("expected validation error, got {other:?}"),
        }
        let bad_image = UpdateProduct { image: Some(Some("nope".into())), ..Default::default() };
        assert!(bad_image.validate().is_err());
        let clear_image = UpdateProduct { image: Some(None), ..Default::default() };
        assert!(clear_image.validate().is_ok());
    }

    #[test]
    fn missing_required_field_fails_to_deserialize() {
        let r: Result<CreateProduct, _> = serde_json::from_value(json!({"name": "Phone", "price": 1.0}));
        assert!(r.is_err());
    }

    #[test]
    fn eager_view_nests_category_and_lazy_view_omits_it() {
        let cat = electronics();
        let t = Utc::now().into();
        let p = CreateProduct { name: "Phone".into(), description: None, price: 299.99, image: None, category_id: cat.id }
            .into_model(Uuid::new_v4(), t);
        let eager = serde_json::to_value(ProductView { product: p.clone(), category: Some(cat) }).unwrap();
        assert_eq!(eager["category"]["name"], "Electronics");
        assert_eq!(eager["price"], 299.99);
        let lazy = serde_json::to_value(ProductView { product: p, category: None }).unwrap();
        assert!(lazy.get("category").is_none());
        assert!(lazy["description"].is_null());
    }
}
