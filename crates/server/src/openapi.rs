//! OpenAPI document.
//!
//! The collection handlers are generic, so their paths are generated by
//! [`CollectionPaths`] from one table instead of per-handler annotations.
//! The `*Doc` structs mirror the wire shapes for the schema section.

use chrono::{DateTime, Utc};
use utoipa::openapi::path::{OperationBuilder, ParameterBuilder, ParameterIn, PathItemBuilder, PathItemType};
use utoipa::openapi::request_body::RequestBodyBuilder;
use utoipa::openapi::response::ResponseBuilder;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityRequirement, SecurityScheme};
use utoipa::openapi::{
    ContentBuilder, KnownFormat, ObjectBuilder, Ref, RefOr, Required, Schema, SchemaFormat, SchemaType,
};
use utoipa::{Modify, OpenApi, ToSchema};
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct ErrorBodyDoc {
    #[schema(example = "Not Found")]
    pub error: String,
    #[schema(example = "Category with ID 0b7c5e7e-4f7e-4a39-9d0b-6b1f0f7a3c11 not found")]
    pub message: String,
}

#[derive(ToSchema)]
pub struct PageMetaDoc {
    pub total_items: u64,
    pub item_count: u64,
    pub items_per_page: u64,
    pub total_pages: u64,
    pub current_page: u64,
}

#[derive(ToSchema)]
pub struct CategoryDoc {
    pub id: Uuid,
    #[schema(example = "Electronics")]
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Present on single-item responses and list items.
    pub products: Option<Vec<ProductDoc>>,
}

#[derive(ToSchema)]
pub struct CreateCategoryDoc {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
}

/// Absent fields are kept; `null` clears a nullable field.
#[derive(ToSchema)]
pub struct UpdateCategoryDoc {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

#[derive(ToSchema)]
pub struct ProductDoc {
    pub id: Uuid,
    #[schema(example = "Phone")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = 299.99)]
    pub price: f64,
    pub image: Option<String>,
    pub category_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category: Option<Box<CategoryDoc>>,
}

#[derive(ToSchema)]
pub struct CreateProductDoc {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub image: Option<String>,
    pub category_id: Uuid,
}

#[derive(ToSchema)]
pub struct UpdateProductDoc {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image: Option<String>,
    pub category_id: Option<Uuid>,
}

#[derive(ToSchema)]
pub struct SubscriberDoc {
    pub id: i32,
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub subscriptions: Option<Vec<SubscriptionDoc>>,
}

#[derive(ToSchema)]
pub struct CreateSubscriberDoc {
    pub email: String,
    pub name: String,
}

#[derive(ToSchema)]
pub struct UpdateSubscriberDoc {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(ToSchema)]
pub struct SubscriptionDoc {
    pub id: i32,
    pub subscriber_id: i32,
    pub service: String,
    pub topic: String,
    #[schema(value_type = Option<Object>)]
    pub payload: Option<serde_json::Value>,
    pub expired_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub subscriber: Option<Box<SubscriberDoc>>,
}

#[derive(ToSchema)]
pub struct CreateSubscriptionDoc {
    pub subscriber_id: i32,
    pub service: String,
    pub topic: String,
    #[schema(value_type = Option<Object>)]
    pub payload: Option<serde_json::Value>,
    pub expired_at: Option<DateTime<Utc>>,
}

#[derive(ToSchema)]
pub struct UpdateSubscriptionDoc {
    pub subscriber_id: Option<i32>,
    pub service: Option<String>,
    pub topic: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub payload: Option<serde_json::Value>,
    pub expired_at: Option<DateTime<Utc>>,
}

#[derive(ToSchema)]
pub struct CategoryPageDoc { pub items: Vec<CategoryDoc>, pub meta: PageMetaDoc }

#[derive(ToSchema)]
pub struct ProductPageDoc { pub items: Vec<ProductDoc>, pub meta: PageMetaDoc }

#[derive(ToSchema)]
pub struct SubscriberPageDoc { pub items: Vec<SubscriberDoc>, pub meta: PageMetaDoc }

#[derive(ToSchema)]
pub struct SubscriptionPageDoc { pub items: Vec<SubscriptionDoc>, pub meta: PageMetaDoc }

/// One row per collection: path segment, item schema prefix, id format.
struct CollectionDoc {
    collection: &'static str,
    schema: &'static str,
    uuid_id: bool,
}

const COLLECTIONS: [CollectionDoc; 4] = [
    CollectionDoc { collection: "categories", schema: "Category", uuid_id: true },
    CollectionDoc { collection: "products", schema: "Product", uuid_id: true },
    CollectionDoc { collection: "subscribers", schema: "Subscriber", uuid_id: false },
    CollectionDoc { collection: "subscriptions", schema: "Subscription", uuid_id: false },
];

fn json_ref(name: &str) -> utoipa::openapi::Content {
    ContentBuilder::new().schema(Ref::from_schema_name(name)).build()
}

fn response(description: &str, schema: Option<&str>) -> utoipa::openapi::Response {
    let b = ResponseBuilder::new().description(description);
    match schema {
        Some(name) => b.content("application/json", json_ref(name)).build(),
        None => b.build(),
    }
}

fn scalar(ty: SchemaType, format: Option<KnownFormat>) -> RefOr<Schema> {
    let mut b = ObjectBuilder::new().schema_type(ty);
    if let Some(f) = format {
        b = b.format(Some(SchemaFormat::KnownFormat(f)));
    }
    RefOr::T(Schema::Object(b.build()))
}

fn query_param(name: &str, ty: SchemaType, description: &str) -> utoipa::openapi::path::Parameter {
    ParameterBuilder::new()
        .name(name)
        .parameter_in(ParameterIn::Query)
        .required(Required::False)
        .description(Some(description))
        .schema(Some(scalar(ty, None)))
        .build()
}

pub struct CollectionPaths;

impl Modify for CollectionPaths {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        for entry in &COLLECTIONS {
            let c = entry.collection;
            let item = format!("{}Doc", entry.schema);
            let page = format!("{}PageDoc", entry.schema);
            let create_body = format!("Create{}Doc", entry.schema);
            let update_body = format!("Update{}Doc", entry.schema);
            let error = "ErrorBodyDoc";
            let id_schema = if entry.uuid_id {
                scalar(SchemaType::String, Some(KnownFormat::Uuid))
            } else {
                scalar(SchemaType::Integer, Some(KnownFormat::Int32))
            };
            let id_param = ParameterBuilder::new()
                .name("id")
                .parameter_in(ParameterIn::Path)
                .required(Required::True)
                .schema(Some(id_schema))
                .build();
            let bearer = SecurityRequirement::new("bearer", Vec::<String>::new());

            let op = |verb: &str| {
                OperationBuilder::new()
                    .tag(c)
                    .operation_id(Some(format!("{verb}_{c}")))
                    .security(bearer.clone())
                    .response("401", response("Missing or invalid token", Some(error)))
                    .response("403", response("Insufficient role", Some(error)))
            };

            let list = op("list")
                .summary(Some(format!("List {c}")))
                .parameter(query_param("page", SchemaType::Integer, "1-based page; paginates only together with limit"))
                .parameter(query_param("limit", SchemaType::Integer, "page size, 1..=100"))
                .parameter(query_param("search", SchemaType::String, "case-insensitive substring"))
                .response("200", response("Page of items", Some(&page)))
                .response("400", response("Invalid page or limit", Some(error)))
                .build();
            let create = op("create")
                .summary(Some(format!("Create one of {c}")))
                .request_body(Some(
                    RequestBodyBuilder::new()
                        .content("application/json", json_ref(&create_body))
                        .required(Some(Required::True))
                        .build(),
                ))
                .response("201", response("Created", Some(&item)))
                .response("400", response("Validation Error", Some(error)))
                .response("404", response("Referenced parent not found", Some(error)))
                .response("409", response("Conflict", Some(error)))
                .build();
            let get_one = op("get")
                .parameter(id_param.clone())
                .response("200", response("Item with relations", Some(&item)))
                .response("404", response("Not Found", Some(error)))
                .build();
            let update = op("update")
                .parameter(id_param.clone())
                .request_body(Some(
                    RequestBodyBuilder::new()
                        .content("application/json", json_ref(&update_body))
                        .required(Some(Required::True))
                        .build(),
                ))
                .response("200", response("Updated", Some(&item)))
                .response("400", response("Validation Error", Some(error)))
                .response("404", response("Not Found", Some(error)))
                .response("409", response("Conflict", Some(error)))
                .build();
            let delete = op("delete")
                .parameter(id_param)
                .response("204", response("Deleted", None))
                .response("404", response("Not Found", Some(error)))
                .build();

            openapi.paths.paths.insert(
                format!("/{c}"),
                PathItemBuilder::new()
                    .operation(PathItemType::Get, list)
                    .operation(PathItemType::Post, create)
                    .build(),
            );
            openapi.paths.paths.insert(
                format!("/{c}/{{id}}"),
                PathItemBuilder::new()
                    .operation(PathItemType::Get, get_one)
                    .operation(PathItemType::Put, update)
                    .operation(PathItemType::Delete, delete)
                    .build(),
            );
        }
    }
}

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(crate::routes::health),
    components(
        schemas(
            HealthResponse,
            ErrorBodyDoc,
            PageMetaDoc,
            CategoryDoc,
            CreateCategoryDoc,
            UpdateCategoryDoc,
            CategoryPageDoc,
            ProductDoc,
            CreateProductDoc,
            UpdateProductDoc,
            ProductPageDoc,
            SubscriberDoc,
            CreateSubscriberDoc,
            UpdateSubscriberDoc,
            SubscriberPageDoc,
            SubscriptionDoc,
            CreateSubscriptionDoc,
            UpdateSubscriptionDoc,
            SubscriptionPageDoc,
        )
    ),
    modifiers(&SecurityAddon, &CollectionPaths),
    tags(
        (name = "health"),
        (name = "categories"),
        (name = "products"),
        (name = "subscribers"),
        (name = "subscriptions")
    )
)]
pub struct ApiDoc;
