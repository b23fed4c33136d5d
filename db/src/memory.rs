use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::error::{AppError, Res};
use dashmap::{DashMap, mapref::entry::Entry};
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
};

/// In-process store with the same uniqueness guarantees as the database schema:
/// unique email, one live subscription per user.
#[derive(Default, Clone)]
pub struct MemoryStore {
    users: Arc<DashMap<Uuid, User>>,
    credentials: Arc<DashMap<Uuid, String>>,
    by_email: Arc<DashMap<String, Uuid>>,
    subscriptions: Arc<DashMap<Uuid, Subscription>>,
    live_by_user: Arc<DashMap<Uuid, Uuid>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim_live_slot(&self, user_id: Uuid, subscription_id: Uuid) -> Res<()> {
        match self.live_by_user.entry(user_id) {
            Entry::Occupied(entry) if *entry.get() != subscription_id => Err(AppError::Conflict(
                "User already has an active subscription".to_string(),
            )),
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(entry) => {
                entry.insert(subscription_id);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn exists_by_email(&self, email: &str) -> Res<bool> {
        Ok(self.by_email.contains_key(email))
    }

    async fn find_by_id(&self, user_id: Uuid) -> Res<Option<User>> {
        Ok(self.users.get(&user_id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Res<Option<User>> {
        let user_id = match self.by_email.get(email) {
            Some(id) => *id.value(),
            None => return Ok(None),
        };
        self.find_by_id(user_id).await
    }

    async fn find_with_credentials(&self, email: &str) -> Res<Option<(User, AuthCredentials)>> {
        let Some(user) = self.find_by_email(email).await? else {
            return Ok(None);
        };
        Ok(self.credentials.get(&user.id).map(|hash| {
            let credentials = AuthCredentials {
                user_id: user.id,
                password_hash: hash.value().clone(),
            };
            (user, credentials)
        }))
    }

    async fn insert(&self, data: UserCreateRequest) -> Res<User> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            first_name: data.first_name,
            last_name: data.last_name,
            is_active: true,
            email_verified: false,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };

        match self.by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => return Err(AppError::Conflict("User already exists".to_string())),
            Entry::Vacant(entry) => {
                entry.insert(user.id);
            }
        }
        self.credentials.insert(user.id, data.password_hash);
        self.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user_id: Uuid, data: UserUpdateRequest) -> Res<User> {
        let mut user = self
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if let Some(email) = data.email.filter(|email| *email != user.email) {
            match self.by_email.entry(email.clone()) {
                Entry::Occupied(_) => {
                    return Err(AppError::Conflict("Email already in use".to_string()));
                }
                Entry::Vacant(entry) => {
                    entry.insert(user_id);
                }
            }
            self.by_email.remove(&user.email);
            user.email = email;
        }
        if let Some(first_name) = data.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = data.last_name {
            user.last_name = last_name;
        }
        if let Some(is_active) = data.is_active {
            user.is_active = is_active;
        }
        if let Some(last_login_at) = data.last_login_at {
            user.last_login_at = Some(last_login_at);
        }
        user.updated_at = Utc::now();

        self.users.insert(user_id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn find_by_user(&self, user_id: Uuid) -> Res<Option<Subscription>> {
        Ok(self
            .subscriptions
            .iter()
            .filter(|r| r.user_id == user_id)
            .max_by_key(|r| r.created_at)
            .map(|r| r.value().clone()))
    }

    async fn find_live_by_user(&self, user_id: Uuid) -> Res<Option<Subscription>> {
        let subscription_id = match self.live_by_user.get(&user_id) {
            Some(id) => *id.value(),
            None => return Ok(None),
        };
        Ok(self
            .subscriptions
            .get(&subscription_id)
            .map(|r| r.value().clone()))
    }

    async fn insert(&self, data: SubscriptionCreateRequest) -> Res<Subscription> {
        let now = Utc::now();
        let subscription = Subscription {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            plan_id: data.plan_id,
            plan_name: data.plan_name,
            status: data.status,
            current_period_start: data.current_period_start,
            current_period_end: data.current_period_end,
            cancel_at_period_end: false,
            canceled_at: None,
            trial_start: data.trial_start,
            trial_end: data.trial_end,
            created_at: now,
            updated_at: now,
        };

        if subscription.status.is_live() {
            self.claim_live_slot(subscription.user_id, subscription.id)?;
        }
        self.subscriptions
            .insert(subscription.id, subscription.clone());
        Ok(subscription)
    }

    async fn update(&self, subscription: &Subscription) -> Res<Subscription> {
        if !self.subscriptions.contains_key(&subscription.id) {
            return Err(AppError::NotFound("No subscription found".to_string()));
        }

        if subscription.status.is_live() {
            self.claim_live_slot(subscription.user_id, subscription.id)?;
        } else {
            self.live_by_user
                .remove_if(&subscription.user_id, |_, id| *id == subscription.id);
        }

        let mut updated = subscription.clone();
        updated.updated_at = Utc::now();
        self.subscriptions.insert(updated.id, updated.clone());
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::models::subscription::SubscriptionStatus;

    fn new_user(email: &str) -> UserCreateRequest {
        UserCreateRequest {
            email: email.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn trial(user_id: Uuid) -> SubscriptionCreateRequest {
        let now = Utc::now();
        SubscriptionCreateRequest {
            user_id,
            plan_id: "basic".to_string(),
            plan_name: "Basic Plan".to_string(),
            status: SubscriptionStatus::Trialing,
            current_period_start: now,
            current_period_end: now + Duration::days(14),
            trial_start: Some(now),
            trial_end: Some(now + Duration::days(14)),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        UserStore::insert(&store, new_user("ada@example.com"))
            .await
            .unwrap();

        let err = UserStore::insert(&store, new_user("ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn email_change_moves_the_lookup_key() {
        let store = MemoryStore::new();
        let user = UserStore::insert(&store, new_user("ada@example.com"))
            .await
            .unwrap();

        let update = UserUpdateRequest {
            email: Some("countess@example.com".to_string()),
            ..Default::default()
        };
        UserStore::update(&store, user.id, update).await.unwrap();

        assert!(!store.exists_by_email("ada@example.com").await.unwrap());
        let found = store.find_by_email("countess@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn credentials_are_returned_with_the_user() {
        let store = MemoryStore::new();
        let user = UserStore::insert(&store, new_user("ada@example.com"))
            .await
            .unwrap();

        let (found, credentials) = store
            .find_with_credentials("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(credentials.password_hash, "hash");
    }

    #[tokio::test]
    async fn second_live_subscription_is_rejected() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        SubscriptionStore::insert(&store, trial(user_id))
            .await
            .unwrap();

        let err = SubscriptionStore::insert(&store, trial(user_id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn leaving_live_status_frees_the_slot() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        let mut sub = SubscriptionStore::insert(&store, trial(user_id))
            .await
            .unwrap();

        sub.status = SubscriptionStatus::Canceled;
        SubscriptionStore::update(&store, &sub).await.unwrap();
        assert!(store.find_live_by_user(user_id).await.unwrap().is_none());

        let next = SubscriptionStore::insert(&store, trial(user_id))
            .await
            .unwrap();
        let latest = store.find_by_user(user_id).await.unwrap().unwrap();
        assert_eq!(latest.id, next.id);
    }
}
