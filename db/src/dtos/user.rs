use chrono::{DateTime, Utc};

/// Everything needed to persist a new account.
/// `password_hash` must come from the password hasher, never from raw input.
pub struct UserCreateRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

/// Partial profile update; `None` keeps the stored value.
#[derive(Debug, Default, Clone)]
pub struct UserUpdateRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: Option<bool>,
    pub last_login_at: Option<DateTime<Utc>>,
}
