use crate::auth::repo_types::{NewUser, User};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, email, phone, name, username, password_hash, profile_photo_key, created_at";

impl User {
    /// Find a user by username.
    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Names the first unique field already taken by another account.
    pub async fn find_conflict(
        db: &PgPool,
        username: &str,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> anyhow::Result<Option<&'static str>> {
        let row = sqlx::query_as::<_, (bool, bool, bool)>(
            r#"
            SELECT
                EXISTS (SELECT 1 FROM users WHERE username = $1),
                EXISTS (SELECT 1 FROM users WHERE $2::text IS NOT NULL AND email = $2),
                EXISTS (SELECT 1 FROM users WHERE $3::text IS NOT NULL AND phone = $3)
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(phone)
        .fetch_one(db)
        .await?;

        Ok(match row {
            (true, _, _) => Some("Username"),
            (_, true, _) => Some("Email"),
            (_, _, true) => Some("Phone"),
            _ => None,
        })
    }

    /// Create a new user with hashed password.
    pub async fn create(db: &PgPool, new: &NewUser) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, phone, name, username, password_hash, profile_photo_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(new.id)
        .bind(new.email.as_deref())
        .bind(new.phone.as_deref())
        .bind(&new.name)
        .bind(&new.username)
        .bind(&new.password_hash)
        .bind(new.profile_photo_key.as_deref())
        .fetch_one(db)
        .await
    }
}

/// Inserts a throwaway account for database tests.
#[cfg(test)]
pub async fn seed_user(db: &PgPool, username: &str) -> Uuid {
    let new = NewUser {
        id: Uuid::new_v4(),
        email: Some(format!("{username}@example.com")),
        phone: None,
        name: username.to_string(),
        username: username.to_string(),
        password_hash: "not-a-real-hash".into(),
        profile_photo_key: None,
    };
    User::create(db, &new).await.unwrap().id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "./migrations")]
    async fn conflicts_name_the_taken_field(pool: PgPool) {
        let id = seed_user(&pool, "ada").await;
        assert_eq!(User::find_by_id(&pool, id).await.unwrap().unwrap().username, "ada");

        let field = User::find_conflict(&pool, "ada", None, None).await.unwrap();
        assert_eq!(field, Some("Username"));
        let field = User::find_conflict(&pool, "grace", Some("ada@example.com"), None)
            .await
            .unwrap();
        assert_eq!(field, Some("Email"));
        let field = User::find_conflict(&pool, "grace", None, Some("5551234567"))
            .await
            .unwrap();
        assert_eq!(field, None);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn duplicate_username_is_a_unique_violation(pool: PgPool) {
        seed_user(&pool, "ada").await;
        let dup = NewUser {
            id: Uuid::new_v4(),
            email: None,
            phone: Some("5551234567".into()),
            name: "Other Ada".into(),
            username: "ada".into(),
            password_hash: "x".into(),
            profile_photo_key: None,
        };
        let err = User::create(&pool, &dup).await.unwrap_err();
        assert!(err
            .as_database_error()
            .map(|d| d.is_unique_violation())
            .unwrap_or(false));
    }
}
