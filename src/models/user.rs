use serde::{Deserialize, Serialize};
use sqlx::{MySql, Pool};

#[derive(sqlx::FromRow, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub hash: String,
}

pub async fn find_user_by_email(
    db: &Pool<MySql>,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, email, hash FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(db)
        .await
}

pub async fn create_user(
    db: &Pool<MySql>,
    email: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    let id = cuid::cuid2();

    sqlx::query("INSERT INTO users (id, email, hash) VALUES (?, ?, ?)")
        .bind(&id)
        .bind(email)
        .bind(password_hash)
        .execute(db)
        .await?;

    Ok(User {
        id,
        email: email.to_string(),
        hash: password_hash.to_string(),
    })
}
