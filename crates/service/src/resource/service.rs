use std::sync::Arc;

use tracing::{debug, instrument};

use crate::errors::ServiceError;
use crate::pagination::{ListQuery, Page};
use crate::resource::{Repository, Resource, Validate};

/// Create / list / get / update / remove for one collection.
///
/// Stateless apart from the repository handle; clone freely.
pub struct ResourceService<R: Resource> {
    repo: Arc<dyn Repository<R>>,
}

impl<R: Resource> Clone for ResourceService<R> {
    fn clone(&self) -> Self { Self { repo: Arc::clone(&self.repo) } }
}

impl<R: Resource> ResourceService<R> {
    pub fn new(repo: Arc<dyn Repository<R>>) -> Self { Self { repo } }

    #[instrument(skip_all, fields(collection = R::COLLECTION))]
    pub async fn create(&self, input: R::Create) -> Result<R::View, ServiceError> {
        input.validate()?;
        if let Some(parent) = R::parent_on_create(&input) {
            self.ensure_parent(parent).await?;
        }
        self.repo.insert(input).await
    }

    #[instrument(skip_all, fields(collection = R::COLLECTION))]
    pub async fn list(&self, query: ListQuery) -> Result<Page<R::View>, ServiceError> {
        let query = query.into_page_query()?;
        let (items, total) = self.repo.find_page(&query).await?;
        debug!(total, returned = items.len(), "listed");
        Ok(Page::new(items, total, query.window))
    }

    #[instrument(skip(self), fields(collection = R::COLLECTION))]
    pub async fn get(&self, id: R::Id) -> Result<R::View, ServiceError> {
        self.repo
            .find_by_id(id, true)
            .await?
            .ok_or_else(|| ServiceError::not_found(R::LABEL, id))
    }

    #[instrument(skip(self, changes), fields(collection = R::COLLECTION))]
    pub async fn update(&self, id: R::Id, changes: R::Update) -> Result<R::View, ServiceError> {
        changes.validate()?;
        if self.repo.find_by_id(id, false).await?.is_none() {
            return Err(ServiceError::not_found(R::LABEL, id));
        }
        if let Some(parent) = R::parent_on_update(&changes) {
            self.ensure_parent(parent).await?;
        }
        self.repo
            .save(id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found(R::LABEL, id))
    }

    #[instrument(skip(self), fields(collection = R::COLLECTION))]
    pub async fn remove(&self, id: R::Id) -> Result<(), ServiceError> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found(R::LABEL, id))
        }
    }

    async fn ensure_parent(&self, parent: R::ParentId) -> Result<(), ServiceError> {
        if self.repo.parent_exists(parent).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found(R::PARENT_LABEL.unwrap_or("Parent"), parent))
        }
    }
}
