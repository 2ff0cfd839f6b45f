use std::sync::LazyLock;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use password_hash::SaltString;
use rand_core::OsRng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use uuid::Uuid;

use crate::entity::user::{self, UserType};

/// Why a credential check or account write failed.
#[derive(Debug)]
pub enum AuthError {
    NotFound,
    InvalidPassword,
    Inactive,
    Db(sea_orm::DbErr),
    Hash(String),
}

impl AuthError {
    /// True for failures the caller must report as "bad credentials" without
    /// saying which part was wrong.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::NotFound | AuthError::InvalidPassword | AuthError::Inactive
        )
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::NotFound => write!(f, "User not found"),
            AuthError::InvalidPassword => write!(f, "Invalid password"),
            AuthError::Inactive => write!(f, "User is inactive"),
            AuthError::Db(e) => write!(f, "Database error: {e}"),
            AuthError::Hash(e) => write!(f, "Hash error: {e}"),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthError::Db(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(e: sea_orm::DbErr) -> Self {
        AuthError::Db(e)
    }
}

/// Fields for a new account. The password is plaintext here and hashed on
/// insert.
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
    pub college_id: Option<Uuid>,
}

impl NewAccount {
    pub fn new(username: impl Into<String>, password: impl Into<String>, user_type: UserType) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            user_type,
            ..Default::default()
        }
    }

    pub fn in_college(mut self, college_id: Uuid) -> Self {
        self.college_id = Some(college_id);
        self
    }
}

/// Verified against when the username is unknown, so a miss costs the same
/// Argon2 work as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| Auth::hash_password("dashboard-unknown-user").ok());

pub struct Auth {
    db: DatabaseConnection,
}

impl Auth {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Verify a username/password pair and stamp `last_login` on success.
    ///
    /// Every attempt runs one Argon2 verification, whether or not the user
    /// exists or is active.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<user::Model, AuthError> {
        let found = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?;

        let stored = match &found {
            Some(u) => u.password_hash.as_str(),
            None => Self::dummy_hash()?,
        };
        let matches = Self::verify_password(password, stored)?;

        let found = found.ok_or(AuthError::NotFound)?;
        if !matches {
            return Err(AuthError::InvalidPassword);
        }
        if !found.is_active {
            return Err(AuthError::Inactive);
        }

        let mut active: user::ActiveModel = found.into();
        active.last_login = Set(Some(Utc::now().naive_utc()));
        Ok(active.update(&self.db).await?)
    }

    /// Insert a new account with an Argon2-hashed password.
    pub async fn create_user(&self, account: NewAccount) -> Result<user::Model, AuthError> {
        let password_hash = Self::hash_password(&account.password)?;
        let model = user::ActiveModel {
            id: Set(Uuid::now_v7()),
            username: Set(account.username),
            password_hash: Set(password_hash),
            email: Set(account.email),
            first_name: Set(account.first_name),
            last_name: Set(account.last_name),
            user_type: Set(account.user_type),
            college_id: Set(account.college_id),
            is_active: Set(true),
            last_login: Set(None),
            date_joined: Set(Utc::now().naive_utc()),
        }
        .insert(&self.db)
        .await?;
        Ok(model)
    }

    pub async fn set_password(
        &self,
        user_id: Uuid,
        password: &str,
    ) -> Result<user::Model, AuthError> {
        let found = user::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(AuthError::NotFound)?;

        let mut active: user::ActiveModel = found.into();
        active.password_hash = Set(Self::hash_password(password)?);
        Ok(active.update(&self.db).await?)
    }

    pub async fn count_users(&self) -> Result<u64, AuthError> {
        Ok(user::Entity::find().count(&self.db).await?)
    }

    /// Create the first super admin when the store has no users yet.
    /// Returns `None` when accounts already exist.
    pub async fn seed_super_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<user::Model>, AuthError> {
        if self.count_users().await? > 0 {
            return Ok(None);
        }
        let model = self
            .create_user(NewAccount::new(username, password, UserType::SuperAdmin))
            .await?;
        Ok(Some(model))
    }

    fn verify_password(password: &str, stored: &str) -> Result<bool, AuthError> {
        let hash = PasswordHash::new(stored).map_err(|e| AuthError::Hash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    }

    fn dummy_hash() -> Result<&'static str, AuthError> {
        DUMMY_HASH
            .as_deref()
            .ok_or_else(|| AuthError::Hash("dummy hash unavailable".to_string()))
    }

    /// Hash a plaintext password with Argon2id + a random salt.
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hash(e.to_string()))?
            .to_string();
        Ok(hash)
    }
}
