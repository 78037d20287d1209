//! In-memory implementation of every repository.
//!
//! Mirrors the Postgres behaviour the service relies on: newest-first
//! ordering with id as tie-breaker, case-insensitive search, cascading
//! deletes, foreign-key checks and unique subscriber emails. Used by the
//! service and HTTP tests and for running the server without a database.

use std::cmp::Ordering;
use std::convert::Infallible;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use models::{category, product, subscriber, subscription};
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

use crate::audience::domain::email_taken;
use crate::audience::{
    CreateSubscriber, CreateSubscription, SubscriberView, Subscribers, SubscriptionView, Subscriptions, UpdateSubscriber,
    UpdateSubscription,
};
use crate::catalog::{Categories, CategoryView, CreateCategory, CreateProduct, ProductView, Products, UpdateCategory, UpdateProduct};
use crate::errors::ServiceError;
use crate::pagination::PageQuery;
use crate::resource::{Repository, Resource};
use crate::search::matches_any;

#[derive(Default)]
struct Tables {
    categories: Vec<category::Model>,
    products: Vec<product::Model>,
    subscribers: Vec<subscriber::Model>,
    subscriptions: Vec<subscription::Model>,
    last_subscriber_id: i32,
    last_subscription_id: i32,
    clock: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, ServiceError> {
        self.tables
            .lock()
            .map_err(|_| ServiceError::Unavailable("memory store lock poisoned".into()))
    }
}

impl Tables {
    /// Strictly increasing timestamps, so ordering and `updated_at` checks
    /// never depend on clock resolution.
    fn tick(&mut self) -> DateTimeWithTimeZone {
        let now = Utc::now();
        let next = match self.clock {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.clock = Some(next);
        next.into()
    }

    fn products_of(&self, category_id: Uuid) -> Vec<product::Model> {
        let mut out: Vec<_> = self.products.iter().filter(|p| p.category_id == category_id).cloned().collect();
        out.sort_by(|a, b| newest_first((&a.created_at, a.id), (&b.created_at, b.id)));
        out
    }

    fn subscriptions_of(&self, subscriber_id: i32) -> Vec<subscription::Model> {
        let mut out: Vec<_> = self
            .subscriptions
            .iter()
            .filter(|s| s.subscriber_id == subscriber_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| newest_first((&a.created_at, a.id), (&b.created_at, b.id)));
        out
    }

    fn category(&self, id: Uuid) -> Option<&category::Model> { self.categories.iter().find(|c| c.id == id) }

    fn subscriber(&self, id: i32) -> Option<&subscriber::Model> { self.subscribers.iter().find(|s| s.id == id) }

    fn email_in_use(&self, email: &str, except: Option<i32>) -> bool {
        self.subscribers.iter().any(|s| s.email == email && Some(s.id) != except)
    }
}

fn newest_first<K: Ord>(a: (&DateTimeWithTimeZone, K), b: (&DateTimeWithTimeZone, K)) -> Ordering {
    b.0.cmp(a.0).then(a.1.cmp(&b.1))
}

fn window<T>(items: Vec<T>, query: &PageQuery) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    match query.window {
        Some(w) => {
            let skip = usize::try_from(w.offset()).unwrap_or(usize::MAX);
            let page = items.into_iter().skip(skip).take(w.limit as usize).collect();
            (page, total)
        }
        None => (items, total),
    }
}

#[async_trait]
impl Repository<Categories> for MemoryStore {
    async fn insert(&self, input: CreateCategory) -> Result<CategoryView, ServiceError> {
        let mut t = self.lock()?;
        let now = t.tick();
        let model = input.into_model(Uuid::new_v4(), now);
        t.categories.push(model.clone());
        Ok(CategoryView { category: model, products: Some(Vec::new()) })
    }

    async fn find_by_id(&self, id: Uuid, eager: bool) -> Result<Option<CategoryView>, ServiceError> {
        let t = self.lock()?;
        Ok(t.category(id).map(|c| CategoryView {
            category: c.clone(),
            products: eager.then(|| t.products_of(c.id)),
        }))
    }

    async fn find_page(&self, query: &PageQuery) -> Result<(Vec<CategoryView>, u64), ServiceError> {
        let t = self.lock()?;
        let mut rows: Vec<_> = t
            .categories
            .iter()
            .filter(|c| match &query.search {
                Some(term) => matches_any(term, [Some(c.name.as_str()), c.description.as_deref()]),
                None => true,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| newest_first((&a.created_at, a.id), (&b.created_at, b.id)));
        let (rows, total) = window(rows, query);
        let items = rows
            .into_iter()
            .map(|c| {
                let products = Some(t.products_of(c.id));
                CategoryView { category: c, products }
            })
            .collect();
        Ok((items, total))
    }

    async fn save(&self, id: Uuid, changes: UpdateCategory) -> Result<Option<CategoryView>, ServiceError> {
        let mut t = self.lock()?;
        let now = t.tick();
        let Some(row) = t.categories.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        changes.apply(row, now);
        let category = row.clone();
        let products = Some(t.products_of(id));
        Ok(Some(CategoryView { category, products }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        let mut t = self.lock()?;
        let before = t.categories.len();
        t.categories.retain(|c| c.id != id);
        if t.categories.len() == before {
            return Ok(false);
        }
        t.products.retain(|p| p.category_id != id);
        Ok(true)
    }

    async fn parent_exists(&self, parent: Infallible) -> Result<bool, ServiceError> {
        match parent {}
    }
}

#[async_trait]
impl Repository<Products> for MemoryStore {
    async fn insert(&self, input: CreateProduct) -> Result<ProductView, ServiceError> {
        let mut t = self.lock()?;
        let Some(category) = t.category(input.category_id).cloned() else {
            return Err(ServiceError::not_found(Categories::LABEL, input.category_id));
        };
        let now = t.tick();
        let model = input.into_model(Uuid::new_v4(), now);
        t.products.push(model.clone());
        Ok(ProductView { product: model, category: Some(category) })
    }

    async fn find_by_id(&self, id: Uuid, eager: bool) -> Result<Option<ProductView>, ServiceError> {
        let t = self.lock()?;
        Ok(t.products.iter().find(|p| p.id == id).map(|p| ProductView {
            product: p.clone(),
            category: if eager { t.category(p.category_id).cloned() } else { None },
        }))
    }

    async fn find_page(&self, query: &PageQuery) -> Result<(Vec<ProductView>, u64), ServiceError> {
        let t = self.lock()?;
        let mut rows: Vec<_> = t
            .products
            .iter()
            .filter(|p| match &query.search {
                Some(term) => matches_any(term, [Some(p.name.as_str()), p.description.as_deref()]),
                None => true,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| newest_first((&a.created_at, a.id), (&b.created_at, b.id)));
        let (rows, total) = window(rows, query);
        let items = rows
            .into_iter()
            .map(|p| {
                let category = t.category(p.category_id).cloned();
                ProductView { product: p, category }
            })
            .collect();
        Ok((items, total))
    }

    async fn save(&self, id: Uuid, changes: UpdateProduct) -> Result<Option<ProductView>, ServiceError> {
        let mut t = self.lock()?;
        if let Some(category_id) = changes.category_id {
            if t.category(category_id).is_none() {
                return Err(ServiceError::not_found(Categories::LABEL, category_id));
            }
        }
        let now = t.tick();
        let Some(row) = t.products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        changes.apply(row, now);
        let product = row.clone();
        let category = t.category(product.category_id).cloned();
        Ok(Some(ProductView { product, category }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        let mut t = self.lock()?;
        let before = t.products.len();
        t.products.retain(|p| p.id != id);
        Ok(t.products.len() != before)
    }

    async fn parent_exists(&self, parent: Uuid) -> Result<bool, ServiceError> {
        Ok(self.lock()?.category(parent).is_some())
    }
}

#[async_trait]
impl Repository<Subscribers> for MemoryStore {
    async fn insert(&self, input: CreateSubscriber) -> Result<SubscriberView, ServiceError> {
        let mut t = self.lock()?;
        if t.email_in_use(&input.email, None) {
            return Err(email_taken(&input.email));
        }
        let now = t.tick();
        t.last_subscriber_id += 1;
        let model = input.into_model(t.last_subscriber_id, now);
        t.subscribers.push(model.clone());
        Ok(SubscriberView { subscriber: model, subscriptions: Some(Vec::new()) })
    }

    async fn find_by_id(&self, id: i32, eager: bool) -> Result<Option<SubscriberView>, ServiceError> {
        let t = self.lock()?;
        Ok(t.subscriber(id).map(|s| SubscriberView {
            subscriber: s.clone(),
            subscriptions: eager.then(|| t.subscriptions_of(s.id)),
        }))
    }

    async fn find_page(&self, query: &PageQuery) -> Result<(Vec<SubscriberView>, u64), ServiceError> {
        let t = self.lock()?;
        let mut rows: Vec<_> = t
            .subscribers
            .iter()
            .filter(|s| match &query.search {
                Some(term) => matches_any(term, [Some(s.name.as_str()), Some(s.email.as_str())]),
                None => true,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| newest_first((&a.created_at, a.id), (&b.created_at, b.id)));
        let (rows, total) = window(rows, query);
        let items = rows
            .into_iter()
            .map(|s| {
                let subscriptions = Some(t.subscriptions_of(s.id));
                SubscriberView { subscriber: s, subscriptions }
            })
            .collect();
        Ok((items, total))
    }

    async fn save(&self, id: i32, changes: UpdateSubscriber) -> Result<Option<SubscriberView>, ServiceError> {
        let mut t = self.lock()?;
        if let Some(email) = &changes.email {
            if t.email_in_use(email, Some(id)) {
                return Err(email_taken(email));
            }
        }
        let now = t.tick();
        let Some(row) = t.subscribers.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        changes.apply(row, now);
        let subscriber = row.clone();
        let subscriptions = Some(t.subscriptions_of(id));
        Ok(Some(SubscriberView { subscriber, subscriptions }))
    }

    async fn delete(&self, id: i32) -> Result<bool, ServiceError> {
        let mut t = self.lock()?;
        let before = t.subscribers.len();
        t.subscribers.retain(|s| s.id != id);
        if t.subscribers.len() == before {
            return Ok(false);
        }
        t.subscriptions.retain(|s| s.subscriber_id != id);
        Ok(true)
    }

    async fn parent_exists(&self, parent: Infallible) -> Result<bool, ServiceError> {
        match parent {}
    }
}

#[async_trait]
impl Repository<Subscriptions> for MemoryStore {
    async fn insert(&self, input: CreateSubscription) -> Result<SubscriptionView, ServiceError> {
        let mut t = self.lock()?;
        let Some(subscriber) = t.subscriber(input.subscriber_id).cloned() else {
            return Err(ServiceError::not_found(Subscribers::LABEL, input.subscriber_id));
        };
        let now = t.tick();
        t.last_subscription_id += 1;
        let model = input.into_model(t.last_subscription_id, now);
        t.subscriptions.push(model.clone());
        Ok(SubscriptionView { subscription: model, subscriber: Some(subscriber) })
    }

    async fn find_by_id(&self, id: i32, eager: bool) -> Result<Option<SubscriptionView>, ServiceError> {
        let t = self.lock()?;
        Ok(t.subscriptions.iter().find(|s| s.id == id).map(|s| SubscriptionView {
            subscription: s.clone(),
            subscriber: if eager { t.subscriber(s.subscriber_id).cloned() } else { None },
        }))
    }

    async fn find_page(&self, query: &PageQuery) -> Result<(Vec<SubscriptionView>, u64), ServiceError> {
        let t = self.lock()?;
        let mut rows: Vec<_> = t
            .subscriptions
            .iter()
            .filter(|s| match &query.search {
                Some(term) => matches_any(term, [Some(s.service.as_str()), Some(s.topic.as_str())]),
                None => true,
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| newest_first((&a.created_at, a.id), (&b.created_at, b.id)));
        let (rows, total) = window(rows, query);
        let items = rows
            .into_iter()
            .map(|s| {
                let subscriber = t.subscriber(s.subscriber_id).cloned();
                SubscriptionView { subscription: s, subscriber }
            })
            .collect();
        Ok((items, total))
    }

    async fn save(&self, id: i32, changes: UpdateSubscription) -> Result<Option<SubscriptionView>, ServiceError> {
        let mut t = self.lock()?;
        if let Some(subscriber_id) = changes.subscriber_id {
            if t.subscriber(subscriber_id).is_none() {
                return Err(ServiceError::not_found(Subscribers::LABEL, subscriber_id));
            }
        }
        let now = t.tick();
        let Some(row) = t.subscriptions.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        changes.apply(row, now);
        let subscription = row.clone();
        let subscriber = t.subscriber(subscription.subscriber_id).cloned();
        Ok(Some(SubscriptionView { subscription, subscriber }))
    }

    async fn delete(&self, id: i32) -> Result<bool, ServiceError> {
        let mut t = self.lock()?;
        let before = t.subscriptions.len();
        t.subscriptions.retain(|s| s.id != id);
        Ok(t.subscriptions.len() != before)
    }

    async fn parent_exists(&self, parent: i32) -> Result<bool, ServiceError> {
        Ok(self.lock()?.subscriber(parent).is_some())
    }
}
