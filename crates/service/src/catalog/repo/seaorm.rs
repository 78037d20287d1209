use std::convert::Infallible;

use async_trait::async_trait;
use chrono::Utc;
use models::{category, product};
use sea_orm::{
    ActiveModelTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, LoaderTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::catalog::{Categories, CategoryView, CreateCategory, CreateProduct, ProductView, Products, UpdateCategory, UpdateProduct};
use crate::errors::{parent_gone, ServiceError};
use crate::pagination::PageQuery;
use crate::resource::{Repository, Resource};
use crate::search;

/// SeaORM-backed category repository.
pub struct SeaOrmCategoryRepository {
    pub db: DatabaseConnection,
}

/// SeaORM-backed product repository.
pub struct SeaOrmProductRepository {
    pub db: DatabaseConnection,
}

fn category_active(m: category::Model) -> category::ActiveModel {
    category::ActiveModel {
        id: Set(m.id),
        name: Set(m.name),
        description: Set(m.description),
        image: Set(m.image),
        created_at: Set(m.created_at),
        updated_at: Set(m.updated_at),
    }
}

fn product_active(m: product::Model) -> product::ActiveModel {
    product::ActiveModel {
        id: Set(m.id),
        name: Set(m.name),
        description: Set(m.description),
        price: Set(m.price),
        image: Set(m.image),
        category_id: Set(m.category_id),
        created_at: Set(m.created_at),
        updated_at: Set(m.updated_at),
    }
}

async fn products_of<C: ConnectionTrait>(db: &C, c: &category::Model) -> Result<Vec<product::Model>, ServiceError> {
    let products = c
        .find_related(product::Entity)
        .order_by_desc(product::Column::CreatedAt)
        .order_by_asc(product::Column::Id)
        .all(db)
        .await?;
    Ok(products)
}

#[async_trait]
impl Repository<Categories> for SeaOrmCategoryRepository {
    async fn insert(&self, input: CreateCategory) -> Result<CategoryView, ServiceError> {
        let model = input.into_model(Uuid::new_v4(), Utc::now().into());
        let saved = category_active(model).insert(&self.db).await?;
        Ok(CategoryView { category: saved, products: Some(Vec::new()) })
    }

    async fn find_by_id(&self, id: Uuid, eager: bool) -> Result<Option<CategoryView>, ServiceError> {
        let Some(found) = category::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        let products = if eager { Some(products_of(&self.db, &found).await?) } else { None };
        Ok(Some(CategoryView { category: found, products }))
    }

    async fn find_page(&self, query: &PageQuery) -> Result<(Vec<CategoryView>, u64), ServiceError> {
        let mut select = category::Entity::find();
        if let Some(term) = &query.search {
            select = select.filter(search::any_column_contains(
                term,
                [category::Column::Name, category::Column::Description],
            ));
        }
        let total = select.clone().count(&self.db).await?;

        let mut select = select
            .order_by_desc(category::Column::CreatedAt)
            .order_by_asc(category::Column::Id);
        if let Some(w) = query.window {
            select = select.offset(w.offset()).limit(w.limit);
        }
        let rows = select.all(&self.db).await?;
        let children = rows.load_many(product::Entity, &self.db).await?;

        let items = rows
            .into_iter()
            .zip(children)
            .map(|(category, mut products)| {
                products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
                CategoryView { category, products: Some(products) }
            })
            .collect();
        Ok((items, total))
    }

    async fn save(&self, id: Uuid, changes: UpdateCategory) -> Result<Option<CategoryView>, ServiceError> {
        let txn = self.db.begin().await?;
        let Some(mut model) = category::Entity::find_by_id(id).lock_exclusive().one(&txn).await? else {
            return Ok(None);
        };
        changes.apply(&mut model, Utc::now().into());
        let saved = category_active(model).update(&txn).await?;
        let products = products_of(&txn, &saved).await?;
        txn.commit().await?;
        Ok(Some(CategoryView { category: saved, products: Some(products) }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        let res = category::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }

    async fn parent_exists(&self, parent: Infallible) -> Result<bool, ServiceError> {
        match parent {}
    }
}

#[async_trait]
impl Repository<Products> for SeaOrmProductRepository {
    async fn insert(&self, input: CreateProduct) -> Result<ProductView, ServiceError> {
        let category_id = input.category_id;
        let model = input.into_model(Uuid::new_v4(), Utc::now().into());
        let saved = product_active(model)
            .insert(&self.db)
            .await
            .map_err(|e| parent_gone(e, Categories::LABEL, category_id))?;
        let category = category::Entity::find_by_id(saved.category_id).one(&self.db).await?;
        Ok(ProductView { product: saved, category })
    }

    async fn find_by_id(&self, id: Uuid, eager: bool) -> Result<Option<ProductView>, ServiceError> {
        if !eager {
            let found = product::Entity::find_by_id(id).one(&self.db).await?;
            return Ok(found.map(|product| ProductView { product, category: None }));
        }
        let found = product::Entity::find_by_id(id)
            .find_also_related(category::Entity)
            .one(&self.db)
            .await?;
        Ok(found.map(|(product, category)| ProductView { product, category }))
    }

    async fn find_page(&self, query: &PageQuery) -> Result<(Vec<ProductView>, u64), ServiceError> {
        let mut cond = Condition::all();
        if let Some(term) = &query.search {
            cond = cond.add(search::any_column_contains(
                term,
                [product::Column::Name, product::Column::Description],
            ));
        }
        let total = product::Entity::find().filter(cond.clone()).count(&self.db).await?;

        let mut select = product::Entity::find()
            .filter(cond)
            .find_also_related(category::Entity)
            .order_by_desc(product::Column::CreatedAt)
            .order_by_asc(product::Column::Id);
        if let Some(w) = query.window {
            select = select.offset(w.offset()).limit(w.limit);
        }
        let items = select
            .all(&self.db)
            .await?
            .into_iter()
            .map(|(product, category)| ProductView { product, category })
            .collect();
        Ok((items, total))
    }

    async fn save(&self, id: Uuid, changes: UpdateProduct) -> Result<Option<ProductView>, ServiceError> {
        let txn = self.db.begin().await?;
        let Some(mut model) = product::Entity::find_by_id(id).lock_exclusive().one(&txn).await? else {
            return Ok(None);
        };
        changes.apply(&mut model, Utc::now().into());
        let category_id = model.category_id;
        let saved = product_active(model)
            .update(&txn)
            .await
            .map_err(|e| parent_gone(e, Categories::LABEL, category_id))?;
        let category = category::Entity::find_by_id(saved.category_id).one(&txn).await?;
        txn.commit().await?;
        Ok(Some(ProductView { product: saved, category }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        let res = product::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }

    async fn parent_exists(&self, parent: Uuid) -> Result<bool, ServiceError> {
        let found = category::Entity::find_by_id(parent).one(&self.db).await?;
        Ok(found.is_some())
    }
}
