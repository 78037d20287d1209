//! Subscribers and their subscriptions.

use std::convert::Infallible;

use crate::resource::Resource;

pub mod domain;
pub mod repo;

pub use domain::{
    CreateSubscriber, CreateSubscription, SubscriberView, SubscriptionView, UpdateSubscriber, UpdateSubscription,
};

pub struct Subscribers;

impl Resource for Subscribers {
    type Id = i32;
    type ParentId = Infallible;
    type Create = CreateSubscriber;
    type Update = UpdateSubscriber;
    type View = SubscriberView;

    const LABEL: &'static str = "Subscriber";
    const COLLECTION: &'static str = "subscribers";

    fn id_of(view: &SubscriberView) -> i32 { view.subscriber.id }
}

pub struct Subscriptions;

impl Resource for Subscriptions {
    type Id = i32;
    type ParentId = i32;
    type Create = CreateSubscription;
    type Update = UpdateSubscription;
    type View = SubscriptionView;

    const LABEL: &'static str = "Subscription";
    const COLLECTION: &'static str = "subscriptions";
    const PARENT_LABEL: Option<&'static str> = Some(Subscribers::LABEL);

    fn parent_on_create(input: &CreateSubscription) -> Option<i32> { Some(input.subscriber_id) }

    fn parent_on_update(input: &UpdateSubscription) -> Option<i32> { input.subscriber_id }

    fn id_of(view: &SubscriptionView) -> i32 { view.subscription.id }
}
