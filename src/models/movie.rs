//! Movie search and composite detail queries against the IMDb-shaped tables
//! (`basics`, `crew`, `names`, `ratings`).

use serde::Serialize;
use sqlx::{MySql, Pool, QueryBuilder};

/// One row of a search result. Field names mirror the public API.
#[derive(sqlx::FromRow, Serialize)]
pub struct MovieSummary {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year")]
    pub year: Option<i32>,
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    #[serde(rename = "Type")]
    pub kind: String,
}

#[derive(sqlx::FromRow)]
struct DetailRow {
    imdb_id: String,
    title: String,
    year: Option<i32>,
    runtime: Option<i32>,
    genres: Option<String>,
}

#[derive(sqlx::FromRow)]
struct RatingRow {
    rating: Option<f64>,
    votes: Option<i32>,
}

/// A movie's core fields merged with derived directors/writers/rating.
#[derive(Serialize)]
pub struct MovieDetail {
    #[serde(rename = "imdbID")]
    pub imdb_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year")]
    pub year: Option<i32>,
    #[serde(rename = "Runtime")]
    pub runtime: Option<i32>,
    #[serde(rename = "Genres")]
    pub genres: Option<String>,
    #[serde(rename = "Directors")]
    pub directors: Vec<String>,
    #[serde(rename = "Writers")]
    pub writers: Vec<String>,
    #[serde(rename = "Rating")]
    pub rating: Option<f64>,
    #[serde(rename = "Votes")]
    pub votes: Option<i32>,
}

/// Pagination envelope returned alongside search results.
#[derive(Serialize, Debug, PartialEq)]
pub struct Pagination {
    pub total: i64,
    #[serde(rename = "lastPage")]
    pub last_page: i64,
    #[serde(rename = "perPage")]
    pub per_page: i64,
    #[serde(rename = "currentPage")]
    pub current_page: i64,
    pub from: i64,
    pub to: i64,
}

impl Pagination {
    /// `returned` is the number of rows actually on this page.
    pub fn new(total: i64, page: i64, per_page: i64, returned: i64) -> Self {
        let offset = (page - 1) * per_page;
        Pagination {
            total,
            last_page: (total + per_page - 1) / per_page,
            per_page,
            current_page: page,
            from: offset,
            to: offset + returned,
        }
    }

    /// Offset into the result set for the given page.
    pub fn offset(page: i64, per_page: i64) -> i64 {
        (page - 1) * per_page
    }
}

/// Case-insensitive substring search over titles, paginated at the database
/// with LIMIT/OFFSET. MySQL's default collation makes LIKE case-insensitive.
pub async fn search_movies(
    db: &Pool<MySql>,
    title: &str,
    page: i64,
    per_page: i64,
) -> Result<(Vec<MovieSummary>, i64), sqlx::Error> {
    let pattern = format!("%{}%", title);

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM basics WHERE primaryTitle LIKE ?")
        .bind(&pattern)
        .fetch_one(db)
        .await?;

    let rows = sqlx::query_as::<_, MovieSummary>(
        "SELECT primaryTitle AS title, startYear AS year, tconst AS imdb_id, titleType AS kind
         FROM basics WHERE primaryTitle LIKE ?
         ORDER BY tconst LIMIT ? OFFSET ?",
    )
    .bind(&pattern)
    .bind(per_page)
    .bind(Pagination::offset(page, per_page))
    .fetch_all(db)
    .await?;

    Ok((rows, total))
}

pub async fn movie_exists(db: &Pool<MySql>, imdb_id: &str) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM basics WHERE tconst = ?")
        .bind(imdb_id)
        .fetch_one(db)
        .await?;
    Ok(count > 0)
}

/// Assemble the composite detail record. Returns `None` when the base row is
/// missing; absent crew or rating data degrades to empty lists / nulls.
pub async fn movie_detail(
    db: &Pool<MySql>,
    imdb_id: &str,
) -> Result<Option<MovieDetail>, sqlx::Error> {
    let base = sqlx::query_as::<_, DetailRow>(
        "SELECT tconst AS imdb_id, primaryTitle AS title, startYear AS year,
                runtimeMinutes AS runtime, genres
         FROM basics WHERE tconst = ?",
    )
    .bind(imdb_id)
    .fetch_optional(db)
    .await?;

    let Some(base) = base else {
        return Ok(None);
    };

    let directors: Vec<Option<String>> = sqlx::query_scalar(
        "SELECT names.primaryName FROM crew
         LEFT JOIN names ON crew.directors = names.nconst
         WHERE crew.tconst = ?",
    )
    .bind(imdb_id)
    .fetch_all(db)
    .await?;
    let directors = directors.into_iter().flatten().collect();

    // crew.writers holds a comma-delimited nconst list.
    let writer_ids: Option<Option<String>> =
        sqlx::query_scalar("SELECT writers FROM crew WHERE tconst = ?")
            .bind(imdb_id)
            .fetch_optional(db)
            .await?;

    let writers = match writer_ids.flatten() {
        Some(ids) if !ids.is_empty() => resolve_names(db, &ids).await?,
        _ => vec![],
    };

    let rating = sqlx::query_as::<_, RatingRow>(
        "SELECT averageRating AS rating, numVotes AS votes FROM ratings WHERE tconst = ?",
    )
    .bind(imdb_id)
    .fetch_optional(db)
    .await?;
    let (rating, votes) = match rating {
        Some(row) => (row.rating, row.votes),
        None => (None, None),
    };

    Ok(Some(MovieDetail {
        imdb_id: base.imdb_id,
        title: base.title,
        year: base.year,
        runtime: base.runtime,
        genres: base.genres,
        directors,
        writers,
        rating,
        votes,
    }))
}

async fn resolve_names(db: &Pool<MySql>, id_list: &str) -> Result<Vec<String>, sqlx::Error> {
    let mut query_builder: QueryBuilder<MySql> =
        QueryBuilder::new("SELECT primaryName FROM names WHERE nconst IN (");

    let mut separated = query_builder.separated(", ");
    for id in id_list.split(',') {
        separated.push_bind(id);
    }
    separated.push_unseparated(")");

    query_builder
        .build_query_scalar::<String>()
        .fetch_all(db)
        .await
}
