//! Authentication - password hashing, JWT issue/verification, registration and login.
//!
//! Tokens are HS256 JWTs carrying the user id and role. Every authenticated
//! request reloads the user so that blocking an account takes effect immediately,
//! even for tokens issued before the block.

use crate::{
    entities::{User, user},
    errors::{Error, Result},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use sea_orm::{Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// How long an issued token stays valid.
pub const TOKEN_TTL_DAYS: i64 = 30;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

#[cfg(not(test))]
const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const BCRYPT_COST: u32 = 4;

/// JWT payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    pub role: user::Role,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys derived from `JWT_SECRET`.
#[derive(Clone)]
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl std::fmt::Debug for AuthKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthKeys").finish_non_exhaustive()
    }
}

impl AuthKeys {
    /// HMAC keys derived from the JWT secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Signs a token for `user` valid for [`TOKEN_TTL_DAYS`].
    pub fn issue_token(&self, user: &user::Model) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(Into::into)
    }

    /// Verifies signature and expiry, returning the claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                warn!("Rejected token: {e}");
                Error::unauthorized("Not authorized, token failed")
            })
    }
}

/// Returned by register and login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: user::Role,
    pub token: String,
}

impl AuthResponse {
    fn new(user: &user::Model, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            token,
        }
    }

    /// True for an admin session.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == user::Role::Admin
    }
}

/// Registration payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Login payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Hashes a plaintext password with bcrypt.
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, BCRYPT_COST).map_err(Into::into)
}

/// Checks a plaintext password against a stored bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash).map_err(Into::into)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

pub(crate) fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if valid {
        Ok(())
    } else {
        Err(Error::validation("Please provide a valid email"))
    }
}

/// Fails with `Forbidden` unless `user` is an admin.
pub fn require_admin(user: &user::Model) -> Result<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(Error::forbidden("Not authorized as an admin"))
    }
}

async fn insert_user(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
    phone: Option<String>,
    role: user::Role,
) -> Result<user::Model> {
    let now = Utc::now();
    let user = user::ActiveModel {
        name: Set(name.trim().to_string()),
        email: Set(email.to_string()),
        password_hash: Set(hash_password(password)?),
        phone: Set(phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty())),
        role: Set(role),
        loyalty_points: Set(0),
        is_blocked: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    user.insert(db).await.map_err(Into::into)
}

/// Creates a customer account and returns it with a fresh token.
///
/// # Errors
/// Returns `Validation` if a field is missing, the email is malformed or already
/// registered, or the password is too short.
pub async fn register(
    db: &DatabaseConnection,
    keys: &AuthKeys,
    input: RegisterInput,
) -> Result<AuthResponse> {
    if input.name.trim().is_empty() {
        return Err(Error::validation("Name is required"));
    }
    let email = normalize_email(&input.email);
    validate_email(&email)?;
    validate_password(&input.password)?;

    let existing = User::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::validation("User already exists"));
    }

    let user = insert_user(
        db,
        &input.name,
        &email,
        &input.password,
        input.phone,
        user::Role::User,
    )
    .await?;
    info!(user_id = user.id, "Registered new user");

    let token = keys.issue_token(&user)?;
    Ok(AuthResponse::new(&user, token))
}

/// Verifies credentials and returns the user with a fresh token.
///
/// # Errors
/// Returns `Unauthorized` for unknown email or wrong password, `Forbidden` for a
/// blocked account.
pub async fn login(
    db: &DatabaseConnection,
    keys: &AuthKeys,
    input: LoginInput,
) -> Result<AuthResponse> {
    let email = normalize_email(&input.email);
    let user = User::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(db)
        .await?
        .ok_or_else(|| Error::unauthorized("Invalid email or password"))?;

    if !verify_password(&input.password, &user.password_hash)? {
        warn!(user_id = user.id, "Failed login attempt");
        return Err(Error::unauthorized("Invalid email or password"));
    }
    if user.is_blocked {
        return Err(Error::forbidden("Your account has been blocked"));
    }

    let token = keys.issue_token(&user)?;
    Ok(AuthResponse::new(&user, token))
}

/// Resolves a bearer token to its (current, unblocked) user.
///
/// # Errors
/// Returns `Unauthorized` for invalid tokens or deleted users and `Forbidden` for
/// blocked users.
pub async fn authenticate(
    db: &DatabaseConnection,
    keys: &AuthKeys,
    token: &str,
) -> Result<user::Model> {
    let claims = keys.verify_token(token)?;
    let user = User::find_by_id(claims.sub)
        .one(db)
        .await?
        .ok_or_else(|| Error::unauthorized("Not authorized, user not found"))?;
    if user.is_blocked {
        return Err(Error::forbidden("Your account has been blocked"));
    }
    Ok(user)
}

/// Creates the bootstrap admin account if no user with `email` exists yet.
///
/// Returns the created admin, or `None` when the email is already taken.
pub async fn ensure_admin(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
) -> Result<Option<user::Model>> {
    let email = normalize_email(email);
    validate_email(&email)?;
    validate_password(password)?;

    let existing = User::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(None);
    }

    let admin = insert_user(db, name, &email, password, None, user::Role::Admin).await?;
    info!(user_id = admin.id, "Created bootstrap admin account");
    Ok(Some(admin))
}
