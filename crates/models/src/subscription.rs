use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{errors::ModelError, subscriber, validation};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscription")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub subscriber_id: i32,
    pub service: String,
    pub topic: String,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub payload: Option<Json>,
    pub expired_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Subscriber }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Subscriber => Entity::belongs_to(subscriber::Entity)
                .from(Column::SubscriberId)
                .to(subscriber::Column::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .into(),
        }
    }
}

impl Related<subscriber::Entity> for Entity {
    fn to() -> RelationDef { Relation::Subscriber.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_service(service: &str) -> Result<(), ModelError> {
    validation::required_text("service", service, validation::MAX_NAME_LEN)
}

pub fn validate_topic(topic: &str) -> Result<(), ModelError> {
    validation::required_text("topic", topic, validation::MAX_NAME_LEN)
}

pub fn validate_payload(payload: &Json) -> Result<(), ModelError> {
    validation::json_document("payload", payload)
}
