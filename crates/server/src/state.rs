use std::sync::Arc;

use axum::extract::FromRef;
use sea_orm::DatabaseConnection;
use service::audience::repo::{SeaOrmSubscriberRepository, SeaOrmSubscriptionRepository};
use service::audience::{Subscribers, Subscriptions};
use service::catalog::repo::{SeaOrmCategoryRepository, SeaOrmProductRepository};
use service::catalog::{Categories, Products};
use service::mock::MemoryStore;
use service::resource::ResourceService;

use crate::auth::{Authorizer, Gate};

/// Everything a handler can reach. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub categories: ResourceService<Categories>,
    pub products: ResourceService<Products>,
    pub subscribers: ResourceService<Subscribers>,
    pub subscriptions: ResourceService<Subscriptions>,
    pub gate: Gate,
    pub authorizer: Arc<dyn Authorizer>,
}

impl AppState {
    pub fn with_database(db: DatabaseConnection, gate: Gate, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            categories: ResourceService::<Categories>::new(Arc::new(SeaOrmCategoryRepository { db: db.clone() })),
            products: ResourceService::<Products>::new(Arc::new(SeaOrmProductRepository { db: db.clone() })),
            subscribers: ResourceService::<Subscribers>::new(Arc::new(SeaOrmSubscriberRepository { db: db.clone() })),
            subscriptions: ResourceService::<Subscriptions>::new(Arc::new(SeaOrmSubscriptionRepository { db })),
            gate,
            authorizer,
        }
    }

    pub fn in_memory(store: Arc<MemoryStore>, gate: Gate, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            categories: ResourceService::<Categories>::new(store.clone()),
            products: ResourceService::<Products>::new(store.clone()),
            subscribers: ResourceService::<Subscribers>::new(store.clone()),
            subscriptions: ResourceService::<Subscriptions>::new(store),
            gate,
            authorizer,
        }
    }
}

impl FromRef<AppState> for ResourceService<Categories> {
    fn from_ref(s: &AppState) -> Self { s.categories.clone() }
}

impl FromRef<AppState> for ResourceService<Products> {
    fn from_ref(s: &AppState) -> Self { s.products.clone() }
}

impl FromRef<AppState> for ResourceService<Subscribers> {
    fn from_ref(s: &AppState) -> Self { s.subscribers.clone() }
}

impl FromRef<AppState> for ResourceService<Subscriptions> {
    fn from_ref(s: &AppState) -> Self { s.subscriptions.clone() }
}

impl FromRef<AppState> for Gate {
    fn from_ref(s: &AppState) -> Self { s.gate.clone() }
}
