//! Offline CSV ingestion.
//!
//! Passes run strictly in order, each reading its source start to finish:
//! movies, actors, actor links, directors, genres, genre links. Later passes
//! resolve keys through lookup tables populated by the earlier ones.

pub mod batch;
pub mod link;
pub mod resolve;
pub mod source;

use std::{
    collections::HashSet,
    path::Path,
    time::{Duration, Instant},
};

use sea_orm::{DatabaseConnection, NotSet, Set, TransactionTrait};
use tracing::{debug, info, warn};

use self::{
    batch::{Progress, insert_chunked},
    resolve::{ActorResolver, DirectorResolver, GenreResolver, ImdbResolver, MovieIndex},
    source::{CastLinkRow, CsvSource, DirectorRow, GenreLinkRow, GenreRow, MovieRow},
};
use crate::{config::Config, entities::movie, error::AppResult};

pub const MOVIES_FILE: &str = "tmdb_9999_popular_movies_database.csv";
pub const DIRECTORS_FILE: &str = "directors_to_imdb_id.csv";
pub const GENRES_FILE: &str = "genres_id.csv";
pub const CASTS_FILE: &str = "tmdb_id_to_casts.csv";
pub const GENRE_LINKS_FILE: &str = "tmdb_id_to_genres.csv";

#[derive(Clone, Debug)]
pub struct CsvSources {
    pub movies: CsvSource<MovieRow>,
    pub directors: CsvSource<DirectorRow>,
    pub genres: CsvSource<GenreRow>,
    pub casts: CsvSource<CastLinkRow>,
    pub genre_links: CsvSource<GenreLinkRow>,
}

impl CsvSources {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            movies: CsvSource::new(dir.join(MOVIES_FILE)),
            directors: CsvSource::new(dir.join(DIRECTORS_FILE)),
            genres: CsvSource::new(dir.join(GENRES_FILE)),
            casts: CsvSource::new(dir.join(CASTS_FILE)),
            genre_links: CsvSource::new(dir.join(GENRE_LINKS_FILE)),
        }
    }

    /// Reads every header row, so a missing or unreadable file aborts before
    /// anything is written.
    pub fn check(&self) -> AppResult<()> {
        self.movies.check()?;
        self.directors.check()?;
        self.genres.check()?;
        self.casts.check()?;
        self.genre_links.check()?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct LoadOptions {
    pub batch_size: usize,
    pub show_progress: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { batch_size: 500, show_progress: false }
    }
}

impl From<&Config> for LoadOptions {
    fn from(config: &Config) -> Self {
        Self { batch_size: config.batch_size, show_progress: config.show_progress }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
    pub movies_created: u64,
    pub actors_created: usize,
    pub cast_links: u64,
    pub directors_created: usize,
    pub known_for_links: u64,
    pub genres_created: usize,
    pub genre_links: u64,
    /// Rows dropped by a reader or a pass, across all sources.
    pub rows_skipped: usize,
    pub elapsed: Duration,
}

pub async fn run(
    db: &DatabaseConnection,
    sources: &CsvSources,
    options: LoadOptions,
) -> AppResult<LoadReport> {
    sources.check()?;

    let started = Instant::now();
    let progress = Progress::new(options.show_progress);
    let mut report = LoadReport::default();
    let mut imdb = ImdbResolver::load(db).await?;

    load_movies(db, &sources.movies, &mut imdb, options, &progress, &mut report).await?;
    let movies = MovieIndex::load(db).await?;
    debug!(movies = movies.len(), "movie index ready");

    let mut actors = ActorResolver::load(db).await?;
    load_actors(db, &sources.casts, &mut actors, options, &progress, &mut report).await?;

    let bar = progress.stage("Linking movies and actors");
    let mut rows = sources.casts.rows()?;
    let txn = db.begin().await?;
    let stats = link::link_casts(&txn, rows.by_ref(), &movies, &actors, &bar).await?;
    rows.finish()?;
    txn.commit().await?;
    bar.finish();
    report.cast_links = stats.links;
    report.rows_skipped += stats.skipped_rows;

    load_directors(db, &sources.directors, &mut imdb, &progress, &mut report).await?;

    let mut genres = GenreResolver::load(db).await?;
    load_genres(db, &sources.genres, &mut genres, &progress, &mut report).await?;

    let bar = progress.stage("Linking movies and genres");
    let mut rows = sources.genre_links.rows()?;
    let txn = db.begin().await?;
    let stats = link::link_genres(&txn, rows.by_ref(), &movies, &genres, &bar).await?;
    report.rows_skipped += stats.skipped_rows + rows.finish()?;
    txn.commit().await?;
    bar.finish();
    report.genre_links = stats.links;

    report.elapsed = started.elapsed();
    info!(
        movies = report.movies_created,
        actors = report.actors_created,
        directors = report.directors_created,
        genres = report.genres_created,
        cast_links = report.cast_links,
        genre_links = report.genre_links,
        known_for_links = report.known_for_links,
        skipped = report.rows_skipped,
        elapsed_secs = report.elapsed.as_secs_f64(),
        "ingestion finished"
    );
    Ok(report)
}

async fn load_movies(
    db: &DatabaseConnection,
    source: &CsvSource<MovieRow>,
    imdb: &mut ImdbResolver,
    options: LoadOptions,
    progress: &Progress,
    report: &mut LoadReport,
) -> AppResult<()> {
    let existing = MovieIndex::load(db).await?;
    let bar = progress.stage("Loading movies");
    let mut rows = source.rows()?;
    let mut seen = HashSet::new();
    let mut models = Vec::new();

    for row in rows.by_ref() {
        bar.inc(1);
        if existing.contains(row.tmdb_id) {
            debug!(tmdb_id = row.tmdb_id, "movie already stored, skipping row");
            report.rows_skipped += 1;
            continue;
        }
        if !seen.insert(row.tmdb_id) {
            warn!(tmdb_id = row.tmdb_id, "duplicate tmdb_id, skipping row");
            report.rows_skipped += 1;
            continue;
        }
        imdb.stage(&row.imdb_id);
        models.push(movie_model(row));
    }
    report.rows_skipped += rows.finish()?;
    bar.finish();

    let txn = db.begin().await?;
    imdb.flush(&txn, options.batch_size).await?;
    report.movies_created = insert_chunked(&txn, models, options.batch_size, None).await?;
    txn.commit().await?;
    Ok(())
}

async fn load_actors(
    db: &DatabaseConnection,
    source: &CsvSource<CastLinkRow>,
    actors: &mut ActorResolver,
    options: LoadOptions,
    progress: &Progress,
    report: &mut LoadReport,
) -> AppResult<()> {
    let bar = progress.stage("Processing actors");
    let mut rows = source.rows()?;
    for row in rows.by_ref() {
        bar.inc(1);
        for name in &row.actor_names {
            actors.discover(name);
        }
    }
    report.rows_skipped += rows.finish()?;
    bar.finish();

    let txn = db.begin().await?;
    report.actors_created = actors.commit(&txn, options.batch_size).await?;
    txn.commit().await?;
    Ok(())
}

async fn load_directors(
    db: &DatabaseConnection,
    source: &CsvSource<DirectorRow>,
    imdb: &mut ImdbResolver,
    progress: &Progress,
    report: &mut LoadReport,
) -> AppResult<()> {
    let mut directors = DirectorResolver::load(db).await?;
    let bar = progress.stage("Processing directors");
    let mut rows = source.rows()?;

    let txn = db.begin().await?;
    for row in rows.by_ref() {
        bar.inc(1);
        if directors.resolve_or_create(&txn, &row).await? {
            report.directors_created += 1;
        }
        report.known_for_links +=
            link::link_known_for(&txn, &row.director_id, &row.known_for_titles, imdb).await?;
    }
    report.rows_skipped += rows.finish()?;
    txn.commit().await?;
    bar.finish();
    Ok(())
}

async fn load_genres(
    db: &DatabaseConnection,
    source: &CsvSource<GenreRow>,
    genres: &mut GenreResolver,
    progress: &Progress,
    report: &mut LoadReport,
) -> AppResult<()> {
    let bar = progress.stage("Processing genres");
    let mut rows = source.rows()?;

    let txn = db.begin().await?;
    for row in rows.by_ref() {
        bar.inc(1);
        if genres.resolve_or_create(&txn, &row).await? {
            report.genres_created += 1;
        }
    }
    report.rows_skipped += rows.finish()?;
    txn.commit().await?;
    bar.finish();
    Ok(())
}

fn movie_model(row: MovieRow) -> movie::ActiveModel {
    movie::ActiveModel {
        id: NotSet,
        tmdb_id: Set(row.tmdb_id),
        title: Set(row.title),
        imdb_id: Set(row.imdb_id),
        vote_average: Set(row.vote_average),
        vote_count: Set(row.vote_count),
        release_date: Set(row.release_date.to_string()),
        runtime: Set(row.runtime),
        adult: Set(row.adult),
        revenue: Set(row.revenue),
        budget: Set(row.budget),
        overview: Set(row.overview),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

    use super::*;
    use crate::{
        db,
        entities::{
            actor, director, director_known_for, genre, imdb_entry, movie_actor, movie_genre,
        },
        error::AppError,
    };

    const MOVIES: &str = include_str!("testdata/movies.csv");
    const CASTS: &str = include_str!("testdata/casts.csv");
    const DIRECTORS: &str = include_str!("testdata/directors.csv");
    const GENRES: &str = include_str!("testdata/genres.csv");
    const GENRE_LINKS: &str = include_str!("testdata/genre_links.csv");

    fn write_sources(dir: &Path) -> CsvSources {
        fs::write(dir.join(MOVIES_FILE), MOVIES).unwrap();
        fs::write(dir.join(CASTS_FILE), CASTS).unwrap();
        fs::write(dir.join(DIRECTORS_FILE), DIRECTORS).unwrap();
        fs::write(dir.join(GENRES_FILE), GENRES).unwrap();
        fs::write(dir.join(GENRE_LINKS_FILE), GENRE_LINKS).unwrap();
        CsvSources::in_dir(dir)
    }

    #[tokio::test]
    async fn loads_every_source_into_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_sources(dir.path());
        let db = db::memory().await;

        let report = run(&db, &sources, LoadOptions { batch_size: 2, ..Default::default() })
            .await
            .unwrap();

        assert_eq!(report.movies_created, 3);
        assert_eq!(report.actors_created, 10);
        assert_eq!(report.cast_links, 9);
        assert_eq!(report.directors_created, 3);
        assert_eq!(report.known_for_links, 5);
        assert_eq!(report.genres_created, 4);
        assert_eq!(report.genre_links, 5);
        // 3 movie rows, 1 cast row, 1 director row, 1 genre row, 1 genre link row.
        assert_eq!(report.rows_skipped, 7);

        let parasite = movie::Entity::find()
            .filter(movie::Column::TmdbId.eq(496243))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(parasite.title, "Parasite");
        assert_eq!(parasite.imdb_id, "tt6751668");
        assert_eq!(parasite.release_date, "2019-05-30");
        assert_eq!(parasite.revenue, 257_591_776);

        let fight_club = movie::Entity::find()
            .filter(movie::Column::TmdbId.eq(550))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fight_club.release_date, "1900-01-01");

        let no_imdb = movie::Entity::find().filter(movie::Column::TmdbId.eq(999)).one(&db).await;
        assert!(no_imdb.unwrap().is_none());

        assert_eq!(imdb_entry::Entity::find().count(&db).await.unwrap(), 5);
        assert_eq!(director_known_for::Entity::find().count(&db).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn reloading_creates_nothing_new() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_sources(dir.path());
        let db = db::memory().await;

        run(&db, &sources, LoadOptions::default()).await.unwrap();
        let second = run(&db, &sources, LoadOptions::default()).await.unwrap();

        assert_eq!(second.movies_created, 0);
        assert_eq!(second.actors_created, 0);
        assert_eq!(second.directors_created, 0);
        assert_eq!(second.genres_created, 0);
        assert_eq!(second.cast_links, 0);
        assert_eq!(second.genre_links, 0);
        assert_eq!(second.known_for_links, 0);

        assert_eq!(movie::Entity::find().count(&db).await.unwrap(), 3);
        assert_eq!(actor::Entity::find().count(&db).await.unwrap(), 10);
        assert_eq!(director::Entity::find().count(&db).await.unwrap(), 3);
        assert_eq!(genre::Entity::find().count(&db).await.unwrap(), 4);
        assert_eq!(movie_actor::Entity::find().count(&db).await.unwrap(), 9);
        assert_eq!(movie_genre::Entity::find().count(&db).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn missing_source_aborts_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_sources(dir.path());
        fs::remove_file(dir.path().join(GENRE_LINKS_FILE)).unwrap();
        let db = db::memory().await;

        let err = run(&db, &sources, LoadOptions::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Source { .. }));
        assert_eq!(movie::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unreadable_source_aborts_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let sources = write_sources(dir.path());
        let genre_links = dir.path().join(GENRE_LINKS_FILE);
        fs::remove_file(&genre_links).unwrap();
        fs::create_dir(&genre_links).unwrap();
        let db = db::memory().await;

        let err = run(&db, &sources, LoadOptions::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Source { ref path, .. } if *path == genre_links));
        assert_eq!(movie::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(movie_genre::Entity::find().count(&db).await.unwrap(), 0);
    }
}
