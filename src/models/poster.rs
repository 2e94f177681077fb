use serde::Serialize;
use sqlx::{MySql, Pool};

/// Pointer row for an uploaded poster. The file on disk is the authoritative
/// cache; this row just records where it lives.
#[derive(sqlx::FromRow, Serialize)]
pub struct PosterRecord {
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
}

pub async fn upsert_poster(
    db: &Pool<MySql>,
    imdb_id: &str,
    file_path: &str,
) -> Result<PosterRecord, sqlx::Error> {
    sqlx::query(
        "INSERT INTO posters (imdbID, filePath) VALUES (?, ?)
         ON DUPLICATE KEY UPDATE filePath = VALUES(filePath)",
    )
    .bind(imdb_id)
    .bind(file_path)
    .execute(db)
    .await?;

    Ok(PosterRecord {
        imdb_id: imdb_id.to_string(),
        file_path: file_path.to_string(),
    })
}
