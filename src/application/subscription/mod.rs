mod errors;
mod inventory_gateway;
mod subscription_service;

pub use errors::{Result, SubscriptionApplicationError};
pub use inventory_gateway::{CopiesReading, CopiesUpdate};
pub use subscription_service::{
    ServiceDependencies, create_subscription, get_subscription, list_subscriptions,
    return_subscription,
};
