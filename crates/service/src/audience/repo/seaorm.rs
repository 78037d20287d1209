use std::convert::Infallible;

use async_trait::async_trait;
use chrono::Utc;
use models::{subscriber, subscription};
use sea_orm::{
    ActiveModelTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, LoaderTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};

use crate::audience::domain::email_taken;
use crate::audience::{
    CreateSubscriber, CreateSubscription, SubscriberView, Subscribers, SubscriptionView, Subscriptions, UpdateSubscriber,
    UpdateSubscription,
};
use crate::errors::{parent_gone, ServiceError};
use crate::pagination::PageQuery;
use crate::resource::{Repository, Resource};
use crate::search;

pub struct SeaOrmSubscriberRepository {
    pub db: DatabaseConnection,
}

pub struct SeaOrmSubscriptionRepository {
    pub db: DatabaseConnection,
}

fn unique_email(e: DbErr, email: &str) -> ServiceError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => email_taken(email),
        _ => e.into(),
    }
}

fn subscriber_active(m: subscriber::Model) -> subscriber::ActiveModel {
    subscriber::ActiveModel {
        id: Set(m.id),
        email: Set(m.email),
        name: Set(m.name),
        created_at: Set(m.created_at),
        updated_at: Set(m.updated_at),
    }
}

fn subscription_active(m: subscription::Model) -> subscription::ActiveModel {
    subscription::ActiveModel {
        id: Set(m.id),
        subscriber_id: Set(m.subscriber_id),
        service: Set(m.service),
        topic: Set(m.topic),
        payload: Set(m.payload),
        expired_at: Set(m.expired_at),
        created_at: Set(m.created_at),
        updated_at: Set(m.updated_at),
    }
}

async fn subscriptions_of<C: ConnectionTrait>(
    db: &C,
    s: &subscriber::Model,
) -> Result<Vec<subscription::Model>, ServiceError> {
    let rows = s
        .find_related(subscription::Entity)
        .order_by_desc(subscription::Column::CreatedAt)
        .order_by_asc(subscription::Column::Id)
        .all(db)
        .await?;
    Ok(rows)
}

#[async_trait]
impl Repository<Subscribers> for SeaOrmSubscriberRepository {
    async fn insert(&self, input: CreateSubscriber) -> Result<SubscriberView, ServiceError> {
        let now = Utc::now().into();
        let email = input.email.clone();
        let am = subscriber::ActiveModel {
            email: Set(input.email),
            name: Set(input.name),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let saved = am.insert(&self.db).await.map_err(|e| unique_email(e, &email))?;
        Ok(SubscriberView { subscriber: saved, subscriptions: Some(Vec::new()) })
    }

    async fn find_by_id(&self, id: i32, eager: bool) -> Result<Option<SubscriberView>, ServiceError> {
        let Some(found) = subscriber::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        let subscriptions = if eager { Some(subscriptions_of(&self.db, &found).await?) } else { None };
        Ok(Some(SubscriberView { subscriber: found, subscriptions }))
    }

    async fn find_page(&self, query: &PageQuery) -> Result<(Vec<SubscriberView>, u64), ServiceError> {
        let mut select = subscriber::Entity::find();
        if let Some(term) = &query.search {
            select = select.filter(search::any_column_contains(
                term,
                [subscriber::Column::Name, subscriber::Column::Email],
            ));
        }
        let total = select.clone().count(&self.db).await?;

        let mut select = select
            .order_by_desc(subscriber::Column::CreatedAt)
            .order_by_asc(subscriber::Column::Id);
        if let Some(w) = query.window {
            select = select.offset(w.offset()).limit(w.limit);
        }
        let rows = select.all(&self.db).await?;
        let children = rows.load_many(subscription::Entity, &self.db).await?;

        let items = rows
            .into_iter()
            .zip(children)
            .map(|(subscriber, mut subscriptions)| {
                subscriptions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
                SubscriberView { subscriber, subscriptions: Some(subscriptions) }
            })
            .collect();
        Ok((items, total))
    }

    async fn save(&self, id: i32, changes: UpdateSubscriber) -> Result<Option<SubscriberView>, ServiceError> {
        let txn = self.db.begin().await?;
        let Some(mut model) = subscriber::Entity::find_by_id(id).lock_exclusive().one(&txn).await? else {
            return Ok(None);
        };
        changes.apply(&mut model, Utc::now().into());
        let email = model.email.clone();
        let saved = subscriber_active(model)
            .update(&txn)
            .await
            .map_err(|e| unique_email(e, &email))?;
        let subscriptions = subscriptions_of(&txn, &saved).await?;
        txn.commit().await?;
        Ok(Some(SubscriberView { subscriber: saved, subscriptions: Some(subscriptions) }))
    }

    async fn delete(&self, id: i32) -> Result<bool, ServiceError> {
        let res = subscriber::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }

    async fn parent_exists(&self, parent: Infallible) -> Result<bool, ServiceError> {
        match parent {}
    }
}

#[async_trait]
impl Repository<Subscriptions> for SeaOrmSubscriptionRepository {
    async fn insert(&self, input: CreateSubscription) -> Result<SubscriptionView, ServiceError> {
        let now = Utc::now().into();
        let subscriber_id = input.subscriber_id;
        let am = subscription::ActiveModel {
            subscriber_id: Set(input.subscriber_id),
            service: Set(input.service),
            topic: Set(input.topic),
            payload: Set(input.payload),
            expired_at: Set(input.expired_at),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let saved = am
            .insert(&self.db)
            .await
            .map_err(|e| parent_gone(e, Subscribers::LABEL, subscriber_id))?;
        let subscriber = subscriber::Entity::find_by_id(saved.subscriber_id).one(&self.db).await?;
        Ok(SubscriptionView { subscription: saved, subscriber })
    }

    async fn find_by_id(&self, id: i32, eager: bool) -> Result<Option<SubscriptionView>, ServiceError> {
        if !eager {
            let found = subscription::Entity::find_by_id(id).one(&self.db).await?;
            return Ok(found.map(|subscription| SubscriptionView { subscription, subscriber: None }));
        }
        let found = subscription::Entity::find_by_id(id)
            .find_also_related(subscriber::Entity)
            .one(&self.db)
            .await?;
        Ok(found.map(|(subscription, subscriber)| SubscriptionView { subscription, subscriber }))
    }

    async fn find_page(&self, query: &PageQuery) -> Result<(Vec<SubscriptionView>, u64), ServiceError> {
        let mut cond = Condition::all();
        if let Some(term) = &query.search {
            cond = cond.add(search::any_column_contains(
                term,
                [subscription::Column::Service, subscription::Column::Topic],
            ));
        }
        let total = subscription::Entity::find().filter(cond.clone()).count(&self.db).await?;

        let mut select = subscription::Entity::find()
            .filter(cond)
            .find_also_related(subscriber::Entity)
            .order_by_desc(subscription::Column::CreatedAt)
            .order_by_asc(subscription::Column::Id);
        if let Some(w) = query.window {
            select = select.offset(w.offset()).limit(w.limit);
        }
        let items = select
            .all(&self.db)
            .await?
            .into_iter()
            .map(|(subscription, subscriber)| SubscriptionView { subscription, subscriber })
            .collect();
        Ok((items, total))
    }

    async fn save(&self, id: i32, changes: UpdateSubscription) -> Result<Option<SubscriptionView>, ServiceError> {
        let txn = self.db.begin().await?;
        let Some(mut model) = subscription::Entity::find_by_id(id).lock_exclusive().one(&txn).await? else {
            return Ok(None);
        };
        changes.apply(&mut model, Utc::now().into());
        let subscriber_id = model.subscriber_id;
        let saved = subscription_active(model)
            .update(&txn)
            .await
            .map_err(|e| parent_gone(e, Subscribers::LABEL, subscriber_id))?;
        let subscriber = subscriber::Entity::find_by_id(saved.subscriber_id).one(&txn).await?;
        txn.commit().await?;
        Ok(Some(SubscriptionView { subscription: saved, subscriber }))
    }

    async fn delete(&self, id: i32) -> Result<bool, ServiceError> {
        let res = subscription::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }

    async fn parent_exists(&self, parent: i32) -> Result<bool, ServiceError> {
        let found = subscriber::Entity::find_by_id(parent).one(&self.db).await?;
        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::pagination::ListQuery;
    use crate::resource::ResourceService;
    use crate::test_support;

    #[tokio::test]
    async fn audience_round_trip_against_postgres() -> Result<(), anyhow::Error> {
        if !test_support::db_tests_enabled() {
            return Ok(());
        }
        let db = test_support::get_db().await?;
        let subscribers = ResourceService::<Subscribers>::new(Arc::new(SeaOrmSubscriberRepository { db: db.clone() }));
        let subscriptions = ResourceService::<Subscriptions>::new(Arc::new(SeaOrmSubscriptionRepository { db }));

        let email = format!("{}@example.com", Uuid::new_v4().simple());
        let ada = subscribers.create(CreateSubscriber { email: email.clone(), name: "Ada".into() }).await?;
        let dup = subscribers.create(CreateSubscriber { email: email.clone(), name: "Ada again".into() }).await;
        assert!(matches!(dup, Err(ServiceError::Conflict(_))));

        let sub = subscriptions
            .create(CreateSubscription {
                subscriber_id: ada.subscriber.id,
                service: "mail".into(),
                topic: "weekly".into(),
                payload: Some(json!({"lang": "en"})),
                expired_at: None,
            })
            .await?;
        assert_eq!(sub.subscriber.as_ref().map(|s| s.id), Some(ada.subscriber.id));

        let page = subscribers
            .list(ListQuery { search: Some(email.to_uppercase()), ..Default::default() })
            .await?;
        assert_eq!(page.meta.total_items, 1);
        assert_eq!(page.items[0].subscriptions.as_ref().map(Vec::len), Some(1));

        subscribers.remove(ada.subscriber.id).await?;
        assert!(matches!(subscriptions.get(sub.subscription.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn subscription_for_vanished_subscriber_is_not_found() -> Result<(), anyhow::Error> {
        if !test_support::db_tests_enabled() {
            return Ok(());
        }
        let db = test_support::get_db().await?;
        let subscriptions = SeaOrmSubscriptionRepository { db };
        let err = subscriptions
            .insert(CreateSubscription {
                subscriber_id: i32::MAX,
                service: "mail".into(),
                topic: "weekly".into(),
                payload: None,
                expired_at: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::NotFound(format!("Subscriber with ID {} not found", i32::MAX)));
        Ok(())
    }
}
