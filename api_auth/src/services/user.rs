use std::sync::Arc;

use common::{
    error::{AppError, Res},
    validation,
};
use db::{SubscriptionStore, UserStore, dtos::user::UserUpdateRequest, models::user::User};

use crate::dtos::user::{UpdateProfileRequest, UserProfile};

use super::auth::normalize_email;

/// Profile reads and edits for the signed-in user.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    subscriptions: Arc<dyn SubscriptionStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, subscriptions: Arc<dyn SubscriptionStore>) -> Self {
        UserService {
            users,
            subscriptions,
        }
    }

    pub async fn profile(&self, user: User) -> Res<UserProfile> {
        let subscription = self.subscriptions.find_by_user(user.id).await?;
        Ok(UserProfile { user, subscription })
    }

    /// Applies the supplied fields, leaving the rest untouched.
    pub async fn update_profile(&self, user: &User, req: UpdateProfileRequest) -> Res<UserProfile> {
        let req = UpdateProfileRequest {
            first_name: req.first_name.map(|name| name.trim().to_string()),
            last_name: req.last_name.map(|name| name.trim().to_string()),
            email: req.email.map(|email| normalize_email(&email)),
        };
        validation::validate(&req)?;

        if let Some(email) = req.email.as_deref().filter(|email| *email != user.email) {
            if self.users.exists_by_email(email).await? {
                return Err(AppError::Conflict("Email already in use".to_string()));
            }
        }

        let updated = self
            .users
            .update(
                user.id,
                UserUpdateRequest {
                    email: req.email,
                    first_name: req.first_name,
                    last_name: req.last_name,
                    ..Default::default()
                },
            )
            .await?;
        self.profile(updated).await
    }

    /// Soft delete: the account stays in place but can no longer sign in.
    pub async fn deactivate(&self, user: &User) -> Res<()> {
        self.users
            .update(
                user.id,
                UserUpdateRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await?;
        log::info!("Deactivated user {}", user.id);
        Ok(())
    }
}
