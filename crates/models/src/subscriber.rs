use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{errors::ModelError, subscription, validation};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriber")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Subscription }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Subscription => Entity::has_many(subscription::Entity).into(),
        }
    }
}

impl Related<subscription::Entity> for Entity {
    fn to() -> RelationDef { Relation::Subscription.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    validation::email("email", email)
}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    validation::required_text("name", name, validation::MAX_NAME_LEN)
}
