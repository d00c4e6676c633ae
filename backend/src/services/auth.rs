//! Authentication service for registration, login, and token issuance
//!
//! Token revocation and refresh flows are deliberately not implemented; the
//! workflow only needs an authenticated identity and role per request.

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::Claims;
use shared::{validate_email, validate_name, validate_password, User, UserRole, UserStatus};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
}

/// Input for registering a new supplier account
#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub contact_number: Option<String>,
    pub address: Option<String>,
}

/// Input for logging in
#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Response after successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// User row fetched for authentication
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub contact_number: Option<String>,
    pub address: Option<String>,
    pub password_hash: String,
    pub role: String,
    pub status: String,
    pub blocked_at: Option<DateTime<Utc>>,
    pub blocked_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Convert to the API-facing model. The password hash never leaves the
    /// service layer.
    pub fn into_user(self) -> AppResult<User> {
        let role = UserRole::parse(&self.role)
            .ok_or_else(|| AppError::Internal(format!("Unknown role '{}' in database", self.role)))?;
        let status = UserStatus::parse(&self.status).ok_or_else(|| {
            AppError::Internal(format!("Unknown status '{}' in database", self.status))
        })?;

        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            contact_number: self.contact_number,
            address: self.address,
            role,
            status,
            blocked_at: self.blocked_at,
            blocked_by: self.blocked_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub(crate) const USER_COLUMNS: &str = "id, name, email, contact_number, address, password_hash, \
     role, status, blocked_at, blocked_by, created_at, updated_at";

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
        }
    }

    /// Register a new account. Self-registration always yields a supplier;
    /// admin accounts are provisioned out of band.
    pub async fn register(&self, input: RegisterInput) -> AppResult<User> {
        validate_name(&input.name).map_err(|e| AppError::validation_field("name", e))?;
        validate_email(&input.email).map_err(|e| AppError::validation_field("email", e))?;
        validate_password(&input.password)
            .map_err(|e| AppError::validation_field("password", e))?;

        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(&input.email)
                .fetch_one(&self.db)
                .await?;

        if exists {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let password_hash = hash(&input.password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, contact_number, address, role, status)
            VALUES ($1, $2, $3, $4, $5, 'supplier', 'active')
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&input.name)
        .bind(&input.email)
        .bind(&password_hash)
        .bind(&input.contact_number)
        .bind(&input.address)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(user_id = %row.id, email = %row.email, "supplier account registered");
        row.into_user()
    }

    /// Authenticate and issue an access token.
    pub async fn login(&self, input: LoginInput) -> AppResult<LoginResponse> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(&input.email)
        .fetch_optional(&self.db)
        .await?;

        let Some(row) = row else {
            tracing::warn!(email = %input.email, "login attempt for unknown email");
            return Err(AppError::InvalidCredentials);
        };

        let password_ok = verify(&input.password, &row.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !password_ok {
            tracing::warn!(user_id = %row.id, "failed login attempt");
            return Err(AppError::InvalidCredentials);
        }

        let user = row.into_user()?;
        if user.status == UserStatus::Blocked {
            tracing::warn!(user_id = %user.id, "blocked account attempted login");
            return Err(AppError::Forbidden("Account is blocked".to_string()));
        }

        let access_token = self.generate_token(user.id, user.role)?;
        tracing::info!(user_id = %user.id, role = %user.role, "successful login");

        Ok(LoginResponse {
            user,
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    /// Load the profile for an authenticated user id.
    pub async fn current_user(&self, user_id: Uuid) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        row.into_user()
    }

    /// Sign an HS256 access token carrying the user id and role.
    fn generate_token(&self, user_id: Uuid, role: UserRole) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.access_token_expiry)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }
}
