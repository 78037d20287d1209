pub mod seaorm;

pub use seaorm::{SeaOrmSubscriberRepository, SeaOrmSubscriptionRepository};
