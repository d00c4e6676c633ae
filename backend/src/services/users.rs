//! Admin user management service
//!
//! Admins need the supplier directory to target quotations, and can block
//! misbehaving accounts. Blocking an admin is rejected outright.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::auth::{UserRow, USER_COLUMNS};
use shared::{User, UserRole};

/// User management service
#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

impl UserService {
    /// Create a new UserService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List all supplier accounts. Admin only.
    pub async fn list_suppliers(&self, actor_role: UserRole) -> AppResult<Vec<User>> {
        require_admin(actor_role)?;

        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = 'supplier' ORDER BY name"
        ))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    /// Block a supplier account. Admin only; admins cannot be blocked.
    pub async fn block_user(
        &self,
        actor_role: UserRole,
        actor_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<User> {
        require_admin(actor_role)?;

        let target_role = sqlx::query_scalar::<_, String>("SELECT role FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        if target_role == UserRole::Admin.as_str() {
            return Err(AppError::validation("Cannot block admin users"));
        }

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET status = 'blocked', blocked_at = now(), blocked_by = $2, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(actor_id)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(%user_id, blocked_by = %actor_id, "user blocked");
        row.into_user()
    }

    /// Lift a block. Admin only.
    pub async fn unblock_user(&self, actor_role: UserRole, user_id: Uuid) -> AppResult<User> {
        require_admin(actor_role)?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET status = 'active', blocked_at = NULL, blocked_by = NULL, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        tracing::info!(%user_id, "user unblocked");
        row.into_user()
    }
}

fn require_admin(role: UserRole) -> AppResult<()> {
    if role != UserRole::Admin {
        return Err(AppError::Forbidden(
            "Only admins may manage user accounts".to_string(),
        ));
    }
    Ok(())
}
