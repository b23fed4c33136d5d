//! Store contracts the services are written against.
//!
//! `PgStore` is the production implementation, `MemoryStore` keeps
//! everything in process and backs the test suites.

use async_trait::async_trait;
use common::error::Res;
use uuid::Uuid;

use crate::{
    dtos::{
        subscription::SubscriptionCreateRequest,
        user::{UserCreateRequest, UserUpdateRequest},
    },
    models::{
        subscription::Subscription,
        user::{AuthCredentials, User},
    },
};

/// Credential store: user identity plus the salted password hash.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn exists_by_email(&self, email: &str) -> Res<bool>;

    async fn find_by_id(&self, user_id: Uuid) -> Res<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Res<Option<User>>;

    async fn find_with_credentials(&self, email: &str) -> Res<Option<(User, AuthCredentials)>>;

    /// Inserts the user and its credentials atomically.
    /// Fails with `AppError::Conflict` when the email is taken.
    async fn insert(&self, data: UserCreateRequest) -> Res<User>;

    /// Fails with `AppError::NotFound` for unknown ids and
    /// `AppError::Conflict` when the new email is taken.
    async fn update(&self, user_id: Uuid, data: UserUpdateRequest) -> Res<User>;
}

/// Subscription store. Rows are never deleted.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Most recently created subscription of the user, whatever its status.
    async fn find_by_user(&self, user_id: Uuid) -> Res<Option<Subscription>>;

    /// The user's `active` or `trialing` subscription, if any.
    async fn find_live_by_user(&self, user_id: Uuid) -> Res<Option<Subscription>>;

    /// Fails with `AppError::Conflict` if the row would give the user
    /// a second live subscription.
    async fn insert(&self, data: SubscriptionCreateRequest) -> Res<Subscription>;

    /// Persists the mutable fields of an existing row.
    async fn update(&self, subscription: &Subscription) -> Res<Subscription>;
}
