//! Subscriber and subscription DTOs and views.

use models::{subscriber, subscription};
use sea_orm::prelude::{DateTimeWithTimeZone, Json};
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;
use crate::resource::Validate;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscriber {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSubscriber {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscription {
    pub subscriber_id: i32,
    pub service: String,
    pub topic: String,
    #[serde(default)]
    pub payload: Option<Json>,
    /// RFC 3339 timestamp.
    #[serde(default)]
    pub expired_at: Option<DateTimeWithTimeZone>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSubscription {
    #[serde(default)]
    pub subscriber_id: Option<i32>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub payload: Option<Option<Json>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub expired_at: Option<Option<DateTimeWithTimeZone>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriberView {
    #[serde(flatten)]
    pub subscriber: subscriber::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscriptions: Option<Vec<subscription::Model>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub subscription: subscription::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscriber: Option<subscriber::Model>,
}

/// Raised when a second subscriber claims an email already on file.
pub fn email_taken(email: &str) -> ServiceError {
    ServiceError::Conflict(format!("Subscriber with email {email} already exists"))
}

impl Validate for CreateSubscriber {
    fn validate(&self) -> Result<(), ServiceError> {
        subscriber::validate_email(&self.email)?;
        subscriber::validate_name(&self.name)?;
        Ok(())
    }
}

impl Validate for UpdateSubscriber {
    fn validate(&self) -> Result<(), ServiceError> {
        if let Some(email) = &self.email {
            subscriber::validate_email(email)?;
        }
        if let Some(name) = &self.name {
            subscriber::validate_name(name)?;
        }
        Ok(())
    }
}

impl Validate for CreateSubscription {
    fn validate(&self) -> Result<(), ServiceError> {
        subscription::validate_service(&self.service)?;
        subscription::validate_topic(&self.topic)?;
        if let Some(payload) = &self.payload {
            subscription::validate_payload(payload)?;
        }
        Ok(())
    }
}

impl Validate for UpdateSubscription {
    fn validate(&self) -> Result<(), ServiceError> {
        if let Some(service) = &self.service {
            subscription::validate_service(service)?;
        }
        if let Some(topic) = &self.topic {
            subscription::validate_topic(topic)?;
        }
        if let Some(Some(payload)) = &self.payload {
            subscription::validate_payload(payload)?;
        }
        Ok(())
    }
}

impl CreateSubscriber {
    pub fn into_model(self, id: i32, now: DateTimeWithTimeZone) -> subscriber::Model {
        subscriber::Model { id, email: self.email, name: self.name, created_at: now, updated_at: now }
    }
}

impl UpdateSubscriber {
    pub fn apply(self, m: &mut subscriber::Model, now: DateTimeWithTimeZone) {
        if let Some(email) = self.email {
            m.email = email;
        }
        if let Some(name) = self.name {
            m.name = name;
        }
        m.updated_at = now;
    }
}

impl CreateSubscription {
    pub fn into_model(self, id: i32, now: DateTimeWithTimeZone) -> subscription::Model {
        subscription::Model {
            id,
            subscriber_id: self.subscriber_id,
            service: self.service,
            topic: self.topic,
            payload: self.payload,
            expired_at: self.expired_at,
            created_at: now,
            updated_at: now,
        }
    }
}

impl UpdateSubscription {
    pub fn apply(self, m: &mut subscription::Model, now: DateTimeWithTimeZone) {
        if let Some(subscriber_id) = self.subscriber_id {
            m.subscriber_id = subscriber_id;
        }
        if let Some(service) = self.service {
            m.service = service;
        }
        if let Some(topic) = self.topic {
            m.topic = topic;
        }
        if let Some(payload) = self.payload {
            m.payload = payload;
        }
        if let Some(expired_at) = self.expired_at {
            m.expired_at = expired_at;
        }
        m.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn subscription_accepts_rfc3339_and_json_payload() {
        let c: CreateSubscription = serde_json::from_value(json!({
            "subscriber_id": 7,
            "service": "mail",
            "topic": "weekly",
            "payload": {"lang": "en"},
            "expired_at": "2030-01-01T00:00:00+02:00"
        }))
        .unwrap();
        assert!(c.validate().is_ok());
        assert_eq!(c.expired_at.unwrap().to_rfc3339(), "2030-01-01T00:00:00+02:00");
    }

    #[test]
    fn scalar_payload_is_rejected() {
        let c: CreateSubscription =
            serde_json::from_value(json!({"subscriber_id": 1, "service": "s", "topic": "t", "payload": 5})).unwrap();
        assert!(matches!(c.validate(), Err(ServiceError::Validation(m)) if m.starts_with("payload")));
    }

    #[test]
    fn null_clears_expiry_absent_keeps_it() {
        let now = Utc::now().into();
        let mut m = CreateSubscription {
            subscriber_id: 1,
            service: "mail".into(),
            topic: "news".into(),
            payload: Some(json!({"a": 1})),
            expired_at: Some(now),
        }
        .into_model(1, now);

        let keep: UpdateSubscription = serde_json::from_value(json!({"topic": "digest"})).unwrap();
        keep.apply(&mut m, now);
        assert_eq!(m.expired_at, Some(now));
        assert_eq!(m.topic, "digest");

        let clear: UpdateSubscription = serde_json::from_value(json!({"expired_at": null, "payload": null})).unwrap();
        clear.apply(&mut m, now);
        assert_eq!(m.expired_at, None);
        assert_eq!(m.payload, None);
    }

    #[test]
    fn subscriber_email_must_be_shaped() {
        let bad = CreateSubscriber { email: "nobody".into(), name: "N".into() };
        assert!(matches!(bad.validate(), Err(ServiceError::Validation(m)) if m.starts_with("email")));
        let patch = UpdateSubscriber { name: Some(" ".into()), ..Default::default() };
        assert!(patch.validate().is_err());
    }
}
