use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::utils::password::{hash_password, verify_password};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, Set,
};
use std::collections::HashMap;

pub struct UserService;

impl UserService {
    pub async fn register(
        db: &DatabaseConnection,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<users::Model, AppError> {
        let existing = Users::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.eq(username))
                    .add(users::Column::Email.eq(email)),
            )
            .one(db)
            .await?;

        if existing.is_some() {
            return Err(AppError::Conflict(
                "Username or email already registered".to_string(),
            ));
        }

        let user = users::ActiveModel {
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(hash_password(password)?),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        Ok(user.insert(db).await?)
    }

    /// Check credentials; unknown email and wrong password look the same.
    pub async fn authenticate(
        db: &DatabaseConnection,
        email: &str,
        password: &str,
    ) -> Result<users::Model, AppError> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        Ok(user)
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: i32) -> Result<users::Model, AppError> {
        Users::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn find_by_email<C: ConnectionTrait>(
        conn: &C,
        email: &str,
    ) -> Result<users::Model, AppError> {
        Users::find()
            .filter(users::Column::Email.eq(email.trim()))
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Batch lookup for decorating lists with usernames.
    pub async fn by_ids<C: ConnectionTrait>(
        conn: &C,
        ids: impl IntoIterator<Item = i32>,
    ) -> Result<HashMap<i32, users::Model>, AppError> {
        let mut ids: Vec<i32> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = Users::find()
            .filter(users::Column::Id.is_in(ids))
            .all(conn)
            .await?;

        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }
}
