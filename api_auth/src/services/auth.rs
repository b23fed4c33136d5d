use std::sync::{Arc, LazyLock};

use chrono::Utc;
use common::{
    env_config::JwtConfig,
    error::{AppError, Res},
    jwt, validation,
};
use db::{
    UserStore,
    dtos::user::{UserCreateRequest, UserUpdateRequest},
    models::user::User,
};

use crate::dtos::auth::{LoginRequest, RegisterRequest};

use super::password;

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const ACCOUNT_DISABLED: &str = "Account is disabled";
pub const INVALID_TOKEN: &str = "Invalid or expired token";
pub const USER_GONE: &str = "User no longer exists";
pub const LOGGED_OUT: &str = "Logged out successfully";

/// Checked against on logins for unknown emails so they take as long as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| password::hash_password("dummy-password-for-unknown-emails").ok());

/// Emails are stored trimmed and lowercased, lookups normalize the same way.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registration, login and bearer token checks.
///
/// Tokens are stateless: nothing is stored server side, so logout only
/// tells the client to drop its copy and a token stays usable until it
/// expires.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_config: JwtConfig,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt_config: JwtConfig) -> Self {
        AuthService { users, jwt_config }
    }

    /// Creates the account and signs the user in.
    pub async fn register(&self, req: RegisterRequest) -> Res<(String, User)> {
        let req = RegisterRequest {
            email: normalize_email(&req.email),
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            password: req.password,
        };
        validation::validate(&req)?;

        if self.users.exists_by_email(&req.email).await? {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let password_hash = password::hash_password(&req.password)?;
        let user = self
            .users
            .insert(UserCreateRequest {
                email: req.email,
                first_name: req.first_name,
                last_name: req.last_name,
                password_hash,
            })
            .await?;
        log::info!("Registered user {}", user.id);

        let token = jwt::generate_jwt(user.id, &self.jwt_config)?;
        Ok((token, user))
    }

    /// Checks the credentials and issues a fresh token.
    /// Unknown email and wrong password are reported identically.
    pub async fn login(&self, req: LoginRequest) -> Res<(String, User)> {
        let req = LoginRequest {
            email: normalize_email(&req.email),
            password: req.password,
        };
        validation::validate(&req)?;

        let Some((user, credentials)) = self.users.find_with_credentials(&req.email).await? else {
            if let Some(hash) = DUMMY_HASH.as_deref() {
                let _ = password::verify_password(&req.password, hash);
            }
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };
        if !password::verify_password(&req.password, &credentials.password_hash)? {
            log::debug!("Failed login attempt for user {}", user.id);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
        if !user.is_active {
            return Err(AppError::Unauthorized(ACCOUNT_DISABLED.to_string()));
        }

        let user = self
            .users
            .update(
                user.id,
                UserUpdateRequest {
                    last_login_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;

        let token = jwt::generate_jwt(user.id, &self.jwt_config)?;
        Ok((token, user))
    }

    /// Resolves a bearer token to the user it was issued to.
    pub async fn authenticate(&self, token: &str) -> Res<User> {
        let claims = jwt::validate_jwt(token, &self.jwt_config.secret).map_err(|e| {
            log::debug!("Rejected token: {}", e);
            AppError::Unauthorized(INVALID_TOKEN.to_string())
        })?;

        let user = self
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized(USER_GONE.to_string()))?;

        if !user.is_active {
            return Err(AppError::Unauthorized(ACCOUNT_DISABLED.to_string()));
        }
        Ok(user)
    }

    pub fn logout(&self, user: &User) -> &'static str {
        log::info!("User {} logged out", user.id);
        LOGGED_OUT
    }
}

#[cfg(test)]
mod tests {
    use common::env_config::JwtConfig;
    use db::MemoryStore;

    use super::*;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryStore::default()),
            JwtConfig::new("test-secret"),
        )
    }

    fn ada() -> RegisterRequest {
        RegisterRequest {
            email: "ada@example.com".to_string(),
            password: "secret123".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn register_returns_token_for_new_user() {
        let auth = service();
        let (token, user) = auth.register(ada()).await.unwrap();

        assert_eq!(user.email, "ada@example.com");
        assert!(user.is_active);
        assert!(!user.email_verified);
        assert_eq!(auth.authenticate(&token).await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn register_normalizes_email_and_names() {
        let auth = service();
        let (_, user) = auth
            .register(RegisterRequest {
                email: "  Ada@Example.COM ".to_string(),
                first_name: " Ada ".to_string(),
                ..ada()
            })
            .await
            .unwrap();

        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.first_name, "Ada");
    }

    #[tokio::test]
    async fn register_rejects_taken_email_in_any_case() {
        let auth = service();
        auth.register(ada()).await.unwrap();

        let err = auth
            .register(RegisterRequest {
                email: "ADA@example.com".to_string(),
                ..ada()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == "User already exists"));
    }

    #[tokio::test]
    async fn register_reports_every_invalid_field() {
        let err = service()
            .register(RegisterRequest {
                email: "not-an-email".to_string(),
                password: "123".to_string(),
                first_name: "   ".to_string(),
                last_name: "Lovelace".to_string(),
            })
            .await
            .unwrap_err();

        match err {
            AppError::Validation(details) => assert_eq!(details.len(), 3),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn dummy_hash_rejects_any_password() {
        let hash = DUMMY_HASH.as_deref().expect("dummy hash is computed");
        assert!(!password::verify_password("secret123", hash).unwrap());
        assert!(!password::verify_password("", hash).unwrap());
    }

    #[tokio::test]
    async fn login_sets_last_login() {
        let auth = service();
        auth.register(ada()).await.unwrap();

        let (token, user) = auth.login(login_req("ADA@example.com", "secret123")).await.unwrap();
        assert!(user.last_login_at.is_some());
        assert_eq!(auth.authenticate(&token).await.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn login_failures_look_the_same() {
        let auth = service();
        auth.register(ada()).await.unwrap();

        let wrong_password = auth
            .login(login_req("ada@example.com", "secret124"))
            .await
            .unwrap_err();
        let unknown_email = auth
            .login(login_req("bob@example.com", "secret123"))
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), INVALID_CREDENTIALS);
        assert_eq!(unknown_email.to_string(), INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn deactivated_user_cannot_login_or_authenticate() {
        let store = Arc::new(MemoryStore::default());
        let auth = AuthService::new(store.clone(), JwtConfig::new("test-secret"));
        let (token, user) = auth.register(ada()).await.unwrap();

        UserStore::update(
            store.as_ref(),
            user.id,
            UserUpdateRequest {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let err = auth
            .login(login_req("ada@example.com", "secret123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == ACCOUNT_DISABLED));

        let err = auth.authenticate(&token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == ACCOUNT_DISABLED));
    }

    #[tokio::test]
    async fn authenticate_rejects_foreign_and_expired_tokens() {
        let auth = service();
        let (_, user) = auth.register(ada()).await.unwrap();

        let foreign = jwt::generate_jwt(user.id, &JwtConfig::new("other-secret")).unwrap();
        let expired = jwt::generate_jwt(
            user.id,
            &JwtConfig {
                secret: "test-secret".to_string(),
                expiration_hours: -1,
            },
        )
        .unwrap();

        for token in [foreign.as_str(), expired.as_str(), "garbage"] {
            let err = auth.authenticate(token).await.unwrap_err();
            assert!(matches!(err, AppError::Unauthorized(msg) if msg == INVALID_TOKEN));
        }
    }

    #[tokio::test]
    async fn authenticate_rejects_token_of_unknown_user() {
        let auth = service();
        let token = jwt::generate_jwt(uuid::Uuid::new_v4(), &JwtConfig::new("test-secret")).unwrap();

        let err = auth.authenticate(&token).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(msg) if msg == USER_GONE));
    }
}
