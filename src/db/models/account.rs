//! Account, role and login models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Closed set of account roles. There is no hierarchy: an admin is not
/// implicitly a buyer or a farmer, every route lists the roles it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Farmer,
    Cooperative,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Buyer, Role::Farmer, Role::Cooperative, Role::Admin];

    /// Admin accounts are only created by the seeder
    pub fn self_registrable(&self) -> bool {
        !matches!(self, Role::Admin)
    }

    /// Table holding the role-specific profile row, if the role has one
    pub fn profile_table(&self) -> Option<&'static str> {
        match self {
            Role::Farmer => Some("farmers"),
            Role::Buyer => Some("buyers"),
            Role::Cooperative => Some("cooperatives"),
            Role::Admin => None,
        }
    }

    /// Client page a user of this role lands on
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Buyer => "/buyer-dashboard",
            Role::Farmer => "/dashboard",
            Role::Cooperative => "/cooperative-dashboard",
            Role::Admin => "/admin-dashboard",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Farmer => "farmer",
            Role::Cooperative => "cooperative",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buyer" => Ok(Role::Buyer),
            "farmer" => Ok(Role::Farmer),
            "cooperative" => Ok(Role::Cooperative),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// One row of `users`
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub user_id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: Role,
    pub photo: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Public projection returned by login; never carries the password hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountResponse {
    pub user_id: i64,
    pub role: Role,
    pub full_name: String,
    pub email: String,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            user_id: account.user_id,
            role: account.role,
            full_name: account.full_name.clone(),
            email: account.email.clone(),
        }
    }
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            user_id: account.user_id,
            role: account.role,
            full_name: account.full_name,
            email: account.email,
        }
    }
}

/// Extended projection for `/auth/me` and the admin listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountDetail {
    pub user_id: i64,
    pub role: Role,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub photo: Option<String>,
    pub created_at: String,
}

impl From<Account> for AccountDetail {
    fn from(account: Account) -> Self {
        Self {
            user_id: account.user_id,
            role: account.role,
            full_name: account.full_name,
            email: account.email,
            phone: account.phone,
            photo: account.photo,
            created_at: account.created_at,
        }
    }
}

/// Everything needed to insert an account and its profile in one go
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: Role,
    pub profile: ProfileFields,
}

/// Optional profile columns supplied at creation time
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileFields {
    pub location: Option<String>,
    pub farm_name: Option<String>,
    pub farm_type: Option<String>,
    pub bio: Option<String>,
    pub cooperative_name: Option<String>,
    pub description: Option<String>,
}

impl ProfileFields {
    /// Trim every value; blank values count as "not supplied"
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            location: clean(self.location),
            farm_name: clean(self.farm_name),
            farm_type: clean(self.farm_type),
            bio: clean(self.bio),
            cooperative_name: clean(self.cooperative_name),
            description: clean(self.description),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.location.is_none()
            && self.farm_name.is_none()
            && self.farm_type.is_none()
            && self.bio.is_none()
            && self.cooperative_name.is_none()
            && self.description.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AccountResponse,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordResponse {
    pub message: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Admin-initiated account creation; the password is generated server-side
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub role: String,
    #[serde(flatten)]
    pub profile: ProfileFields,
}

#[derive(Debug, Serialize)]
pub struct CreateAccountResponse {
    pub message: String,
    pub user: AccountResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// `photo: null` (or blank) clears the stored URL
#[derive(Debug, Deserialize)]
pub struct UpdatePhotoRequest {
    #[serde(default)]
    pub photo: Option<String>,
}

/// Plain `{message}` body used by most auth endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
