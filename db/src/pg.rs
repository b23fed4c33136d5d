use std::sync::Arc;

use async_trait::async_trait;
use common::error::Res;
use sqlx::PgPool;
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
    store::{SubscriptionStore, UserStore},
    subscription, user,
};

/// PostgreSQL backed implementation of both stores.
#[derive(Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn exists_by_email(&self, email: &str) -> Res<bool> {
        user::exists_user_by_email(&*self.pool, email).await
    }

    async fn find_by_id(&self, user_id: Uuid) -> Res<Option<User>> {
        user::get_user_by_id(&*self.pool, user_id).await
    }

    async fn find_by_email(&self, email: &str) -> Res<Option<User>> {
        user::get_user_by_email(&*self.pool, email).await
    }

    async fn find_with_credentials(&self, email: &str) -> Res<Option<(User, AuthCredentials)>> {
        user::get_user_with_password_hash(&*self.pool, email).await
    }

    async fn insert(&self, data: UserCreateRequest) -> Res<User> {
        let mut tx = self.pool.begin().await?;

        let created = user::insert_user(&mut *tx, &data).await?;
        user::insert_user_credentials(
            &mut *tx,
            AuthCredentials {
                user_id: created.id,
                password_hash: data.password_hash,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn update(&self, user_id: Uuid, data: UserUpdateRequest) -> Res<User> {
        user::update_user(&*self.pool, user_id, data).await
    }
}

#[async_trait]
impl SubscriptionStore for PgStore {
    async fn find_by_user(&self, user_id: Uuid) -> Res<Option<Subscription>> {
        subscription::get_latest_by_user(&*self.pool, user_id).await
    }

    async fn find_live_by_user(&self, user_id: Uuid) -> Res<Option<Subscription>> {
        subscription::get_live_by_user(&*self.pool, user_id).await
    }

    async fn insert(&self, data: SubscriptionCreateRequest) -> Res<Subscription> {
        subscription::insert_subscription(&*self.pool, data).await
    }

    async fn update(&self, sub: &Subscription) -> Res<Subscription> {
        subscription::update_subscription(&*self.pool, sub).await
    }
}
