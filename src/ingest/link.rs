use indicatif::ProgressBar;
use sea_orm::{ConnectionTrait, EntityTrait, Set, sea_query::OnConflict};
use tracing::{debug, warn};

use super::{
    batch::insert_chunked,
    resolve::{ActorResolver, GenreResolver, ImdbResolver, MovieIndex},
    source::{CastLinkRow, GenreLinkRow},
};
use crate::{
    entities::{director_known_for, movie_actor, movie_genre},
    error::AppResult,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub links: u64,
    pub skipped_rows: usize,
}

pub async fn link_casts<C, I>(
    db: &C,
    rows: I,
    movies: &MovieIndex,
    actors: &ActorResolver,
    progress: &ProgressBar,
) -> AppResult<LinkStats>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = CastLinkRow>,
{
    let mut stats = LinkStats::default();
    for row in rows {
        progress.inc(1);
        let Some(movie_id) = movies.get(row.tmdb_id) else {
            warn!(tmdb_id = row.tmdb_id, "movie not found, skipping cast row");
            stats.skipped_rows += 1;
            continue;
        };

        let mut actor_ids: Vec<i32> =
            row.actor_names.iter().filter_map(|name| actors.get(name)).collect();
        actor_ids.sort_unstable();
        actor_ids.dedup();

        let edges = actor_ids
            .into_iter()
            .map(|actor_id| movie_actor::ActiveModel {
                movie_id: Set(movie_id),
                actor_id: Set(actor_id),
            })
            .collect();
        let on_conflict =
            OnConflict::columns([movie_actor::Column::MovieId, movie_actor::Column::ActorId])
                .do_nothing()
                .to_owned();
        stats.links += insert_chunked(db, edges, usize::MAX, Some(on_conflict)).await?;
    }
    debug!(links = stats.links, skipped = stats.skipped_rows, "linked casts");
    Ok(stats)
}

pub async fn link_genres<C, I>(
    db: &C,
    rows: I,
    movies: &MovieIndex,
    genres: &GenreResolver,
    progress: &ProgressBar,
) -> AppResult<LinkStats>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = GenreLinkRow>,
{
    let mut stats = LinkStats::default();
    for row in rows {
        progress.inc(1);
        let Some(movie_id) = movies.get(row.tmdb_id) else {
            debug!(tmdb_id = row.tmdb_id, "movie not found, skipping genre row");
            stats.skipped_rows += 1;
            continue;
        };

        let mut genre_ids: Vec<i32> =
            row.genre_ids.into_iter().filter(|&id| genres.contains(id)).collect();
        genre_ids.sort_unstable();
        genre_ids.dedup();

        let edges = genre_ids
            .into_iter()
            .map(|genre_id| movie_genre::ActiveModel {
                movie_id: Set(movie_id),
                genre_id: Set(genre_id),
            })
            .collect();
        let on_conflict =
            OnConflict::columns([movie_genre::Column::MovieId, movie_genre::Column::GenreId])
                .do_nothing()
                .to_owned();
        stats.links += insert_chunked(db, edges, usize::MAX, Some(on_conflict)).await?;
    }
    debug!(links = stats.links, skipped = stats.skipped_rows, "linked genres");
    Ok(stats)
}

pub async fn link_known_for<C: ConnectionTrait>(
    db: &C,
    director_id: &str,
    titles: &[String],
    imdb: &mut ImdbResolver,
) -> AppResult<u64> {
    if titles.is_empty() {
        return Ok(0);
    }
    let mut edges = Vec::with_capacity(titles.len());
    for imdb_id in titles {
        imdb.resolve(db, imdb_id).await?;
        edges.push(director_known_for::ActiveModel {
            director_id: Set(director_id.to_string()),
            imdb_id: Set(imdb_id.clone()),
        });
    }
    let on_conflict = OnConflict::columns([
        director_known_for::Column::DirectorId,
        director_known_for::Column::ImdbId,
    ])
    .do_nothing()
    .to_owned();
    insert_chunked(db, edges, usize::MAX, Some(on_conflict)).await
}

#[cfg(test)]
mod tests {
    use sea_orm::{ColumnTrait, PaginatorTrait, QueryFilter};

    use super::*;
    use crate::{
        db,
        entities::{director, imdb_entry},
        ingest::{
            resolve::DirectorResolver,
            source::{DirectorRow, GenreRow},
        },
        testing,
    };

    async fn insert_parasite(db: &sea_orm::DatabaseConnection) {
        testing::insert_movie(db, 496243, "Parasite", "tt6751668", 8.5, 257_591_776, 11_363_000)
            .await;
    }

    #[tokio::test]
    async fn cast_links_skip_unknown_movies_and_ignore_repeats() {
        let db = db::memory().await;
        insert_parasite(&db).await;
        let movies = MovieIndex::load(&db).await.unwrap();

        let mut actors = ActorResolver::load(&db).await.unwrap();
        for name in ["Song Kang-ho", "Lee Sun-kyun"] {
            actors.discover(name);
        }
        actors.commit(&db, 100).await.unwrap();

        let rows = vec![
            CastLinkRow {
                tmdb_id: 496243,
                actor_names: vec![
                    "Song Kang-ho".into(),
                    "Lee Sun-kyun".into(),
                    "Song Kang-ho".into(),
                ],
            },
            CastLinkRow { tmdb_id: 1, actor_names: vec!["Song Kang-ho".into()] },
        ];
        let stats =
            link_casts(&db, rows.clone(), &movies, &actors, &ProgressBar::hidden()).await.unwrap();
        assert_eq!(stats, LinkStats { links: 2, skipped_rows: 1 });

        let again = link_casts(&db, rows, &movies, &actors, &ProgressBar::hidden()).await.unwrap();
        assert_eq!(again.links, 0);
        assert_eq!(movie_actor::Entity::find().count(&db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn genre_links_only_attach_known_genres() {
        let db = db::memory().await;
        insert_parasite(&db).await;
        let movies = MovieIndex::load(&db).await.unwrap();

        let mut genres = GenreResolver::load(&db).await.unwrap();
        for (genre_id, name) in [(18, "Drama"), (53, "Thriller")] {
            genres.resolve_or_create(&db, &GenreRow { genre_id, name: name.into() }).await.unwrap();
        }

        let rows = vec![GenreLinkRow { tmdb_id: 496243, genre_ids: vec![35, 18, 53, 18] }];
        let stats = link_genres(&db, rows, &movies, &genres, &ProgressBar::hidden()).await.unwrap();
        assert_eq!(stats.links, 2);
        assert_eq!(stats.skipped_rows, 0);
    }

    #[tokio::test]
    async fn known_for_titles_create_missing_entries() {
        let db = db::memory().await;
        let mut imdb = ImdbResolver::load(&db).await.unwrap();
        let mut directors = DirectorResolver::load(&db).await.unwrap();
        let row = DirectorRow {
            director_id: "nm0094435".into(),
            name: "Bong Joon Ho".into(),
            birth_year: Some(1969),
            death_year: None,
            primary_profession: "director,writer,producer".into(),
            known_for_titles: vec!["tt6751668".into(), "tt1706620".into()],
        };
        directors.resolve_or_create(&db, &row).await.unwrap();

        let linked = link_known_for(&db, &row.director_id, &row.known_for_titles, &mut imdb)
            .await
            .unwrap();
        assert_eq!(linked, 2);
        assert_eq!(imdb_entry::Entity::find().count(&db).await.unwrap(), 2);

        let director = director::Entity::find_by_id("nm0094435").one(&db).await.unwrap().unwrap();
        let known = director_known_for::Entity::find()
            .filter(director_known_for::Column::DirectorId.eq(director.director_id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(known, 2);
    }
}
