use async_trait::async_trait;

use crate::errors::ServiceError;
use crate::pagination::PageQuery;
use crate::resource::Resource;

/// Persistence contract for one collection.
///
/// Implementations translate every store failure into a [`ServiceError`] and
/// return views with relations resolved whenever `eager` is set.
#[async_trait]
pub trait Repository<R: Resource>: Send + Sync {
    /// Assign id and timestamps, persist, return the eager view.
    async fn insert(&self, input: R::Create) -> Result<R::View, ServiceError>;

    async fn find_by_id(&self, id: R::Id, eager: bool) -> Result<Option<R::View>, ServiceError>;

    /// One window of the match set, ordered `created_at DESC, id ASC`, plus the
    /// total number of matches.
    async fn find_page(&self, query: &PageQuery) -> Result<(Vec<R::View>, u64), ServiceError>;

    /// Merge the present fields of `changes` and refresh `updated_at`.
    /// `None` when the row no longer exists.
    async fn save(&self, id: R::Id, changes: R::Update) -> Result<Option<R::View>, ServiceError>;

    /// Hard delete, cascading to children. `false` when nothing matched.
    async fn delete(&self, id: R::Id) -> Result<bool, ServiceError>;

    async fn parent_exists(&self, parent: R::ParentId) -> Result<bool, ServiceError>;
}
