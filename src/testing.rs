//! Fixtures shared by the unit tests.

use sea_orm::{ActiveModelTrait, ConnectionTrait, NotSet, Set};

use crate::{entities::movie, ingest::resolve::ensure_imdb_entry};

pub(crate) async fn insert_movie<C: ConnectionTrait>(
    db: &C,
    tmdb_id: i32,
    title: &str,
    imdb_id: &str,
    vote_average: f64,
    revenue: i64,
    budget: i64,
) -> movie::Model {
    ensure_imdb_entry(db, imdb_id).await.unwrap();
    movie::ActiveModel {
        id: NotSet,
        tmdb_id: Set(tmdb_id),
        title: Set(title.to_string()),
        imdb_id: Set(imdb_id.to_string()),
        vote_average: Set(vote_average),
        vote_count: Set(100),
        release_date: Set("2019-05-30".to_string()),
        runtime: Set(120),
        adult: Set(false),
        revenue: Set(revenue),
        budget: Set(budget),
        overview: Set(format!("{title} overview")),
    }
    .insert(db)
    .await
    .unwrap()
}
