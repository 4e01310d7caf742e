use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;
use uuid::Uuid;

use crate::users::repo_types::{NewUser, User, UserChanges};
use crate::users::rules::UniqueField;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate value for {}", .0.column())]
    Duplicate(UniqueField),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                if let Some(field) = db.constraint().and_then(UniqueField::from_constraint) {
                    return StoreError::Duplicate(field);
                }
            }
        }
        StoreError::Backend(err.into())
    }
}

/// Keyed storage for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Whether another record already holds `value` in `field`.
    async fn exists_with(
        &self,
        field: UniqueField,
        value: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, StoreError>;

    async fn insert(&self, user: &NewUser) -> Result<(), StoreError>;

    /// Returns `false` when no row matched `id`.
    async fn update(&self, id: Uuid, changes: &UserChanges) -> Result<bool, StoreError>;

    /// Returns `false` when no row matched `id`.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

const USER_COLUMNS: &str = "id, fullname, email, phone, gender, password_hash, image, \
                            has_membership, qr_code, created_at, updated_at";

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn exists_with(
        &self,
        field: UniqueField,
        value: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, StoreError> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM users WHERE {} = $1 AND ($2::uuid IS NULL OR id <> $2))",
            field.column()
        );
        let (exists,): (bool,) = sqlx::query_as(&sql)
            .bind(value)
            .bind(exclude)
            .fetch_one(&self.db)
            .await?;
        Ok(exists)
    }

    async fn insert(&self, user: &NewUser) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, fullname, email, phone, gender, password_hash,
                               image, has_membership, qr_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id)
        .bind(&user.fullname)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.gender)
        .bind(&user.password_hash)
        .bind(&user.image)
        .bind(user.has_membership)
        .bind(&user.qr_code)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn update(&self, id: Uuid, changes: &UserChanges) -> Result<bool, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET ");
        let mut set = qb.separated(", ");
        if let Some(v) = &changes.fullname {
            set.push("fullname = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &changes.email {
            set.push("email = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &changes.phone {
            set.push("phone = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &changes.gender {
            set.push("gender = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &changes.password_hash {
            set.push("password_hash = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &changes.image {
            set.push("image = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = changes.has_membership {
            set.push("has_membership = ").push_bind_unseparated(v);
        }
        if let Some(v) = &changes.qr_code {
            set.push("qr_code = ").push_bind_unseparated(v.clone());
        }
        set.push("updated_at = now()");
        qb.push(" WHERE id = ").push_bind(id);

        let res = qb.build().execute(&self.db).await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_become_backend_errors() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn duplicate_error_names_the_column() {
        assert_eq!(
            StoreError::Duplicate(UniqueField::Phone).to_string(),
            "duplicate value for phone"
        );
    }
}
