
use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType,
    NotSet, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
    Set, TransactionTrait,
    sea_query::{Alias, Expr, OnConflict},
};
use tracing::{debug, info};

use crate::{
    entities::{
        actor, director, director_known_for, genre, movie, movie_actor, movie_director,
        movie_genre,
    },
    error::{AppError, AppResult, ValidationError},
    ingest::{
        batch::insert_chunked,
        resolve::{actor_by_name, director_by_name, ensure_imdb_entry, genre_by_name, lower_eq},
    },
    models::{DirectorDetail, MovieDetail, NewDirector, NewMovie, Page},
};

const LOOKUP_CHUNK: usize = 500;

/// Turns a path segment like `bong_joon_ho` into `Bong Joon Ho`.
///
/// Letters after any non-letter are capitalized and the rest lowercased.
pub fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut word_start = true;
    for c in raw.trim().chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(c);
            word_start = true;
        }
    }
    out
}

#[derive(Clone, Debug)]
pub struct Catalog {
    db: DatabaseConnection,
    page_size: u64,
}

impl Catalog {
    pub fn new(db: DatabaseConnection, page_size: u64) -> Self {
        Self { db, page_size: page_size.max(1) }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Looks `id` up as a TMDB id first, then as an IMDb id.
    pub async fn movie_by_external_id(&self, id: &str) -> AppResult<MovieDetail> {
        let id = id.trim();
        let mut found = None;
        if let Ok(tmdb_id) = id.parse::<i32>() {
            found = movie::Entity::find()
                .filter(movie::Column::TmdbId.eq(tmdb_id))
                .one(&self.db)
                .await?;
        }
        if found.is_none() {
            found = movie::Entity::find()
                .filter(movie::Column::ImdbId.eq(id))
                .order_by_asc(movie::Column::Id)
                .one(&self.db)
                .await?;
        }
        let movie = found.ok_or(AppError::NotFound)?;
        let mut details = hydrate(&self.db, vec![movie]).await?;
        details.pop().ok_or(AppError::NotFound)
    }

    /// Inserts a movie and resolves-or-creates every genre, cast and director name.
    pub async fn create_movie(&self, new: NewMovie) -> AppResult<MovieDetail> {
        new.validate()?;

        let txn = self.db.begin().await?;
        let existing = movie::Entity::find()
            .filter(movie::Column::TmdbId.eq(new.tmdb_id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(ValidationError::DuplicateTmdbId(new.tmdb_id).into());
        }

        ensure_imdb_entry(&txn, &new.imdb_id).await?;
        let movie = movie::ActiveModel {
            id: NotSet,
            tmdb_id: Set(new.tmdb_id),
            title: Set(new.title.trim().to_string()),
            imdb_id: Set(new.imdb_id.clone()),
            vote_average: Set(new.vote_average),
            vote_count: Set(new.vote_count),
            release_date: Set(new.release_date.to_string()),
            runtime: Set(new.runtime),
            adult: Set(new.adult),
            revenue: Set(new.revenue),
            budget: Set(new.budget),
            overview: Set(new.overview.clone()),
        }
        .insert(&txn)
        .await?;

        let mut genres = Vec::with_capacity(new.genres.len());
        for name in &new.genres {
            let genre_id = genre_by_name(&txn, name.trim()).await?;
            genres.push(movie_genre::ActiveModel {
                movie_id: Set(movie.id),
                genre_id: Set(genre_id),
            });
        }
        let mut casts = Vec::with_capacity(new.casts.len());
        for name in &new.casts {
            let actor_id = actor_by_name(&txn, name.trim()).await?;
            casts.push(movie_actor::ActiveModel {
                movie_id: Set(movie.id),
                actor_id: Set(actor_id),
            });
        }
        let mut directors = Vec::with_capacity(new.directors.len());
        for name in &new.directors {
            let director_id = director_by_name(&txn, name.trim()).await?;
            directors.push(movie_director::ActiveModel {
                movie_id: Set(movie.id),
                director_id: Set(director_id),
            });
        }

        let on_conflict =
            OnConflict::columns([movie_genre::Column::MovieId, movie_genre::Column::GenreId])
                .do_nothing()
                .to_owned();
        insert_chunked(&txn, genres, LOOKUP_CHUNK, Some(on_conflict)).await?;

        let on_conflict =
            OnConflict::columns([movie_actor::Column::MovieId, movie_actor::Column::ActorId])
                .do_nothing()
                .to_owned();
        insert_chunked(&txn, casts, LOOKUP_CHUNK, Some(on_conflict)).await?;

        let on_conflict = OnConflict::columns([
            movie_director::Column::MovieId,
            movie_director::Column::DirectorId,
        ])
        .do_nothing()
        .to_owned();
        insert_chunked(&txn, directors, LOOKUP_CHUNK, Some(on_conflict)).await?;
        txn.commit().await?;

        info!(tmdb_id = movie.tmdb_id, title = %movie.title, "created movie");
        let mut details = hydrate(&self.db, vec![movie]).await?;
        details.pop().ok_or(AppError::NotFound)
    }

    pub async fn create_director(&self, new: NewDirector) -> AppResult<DirectorDetail> {
        new.validate()?;
        let director_id = new.director_id.trim().to_string();

        let txn = self.db.begin().await?;
        if director::Entity::find_by_id(director_id.clone()).one(&txn).await?.is_some() {
            return Err(ValidationError::DuplicateDirectorId(director_id).into());
        }
        let director = director::ActiveModel {
            director_id: Set(director_id.clone()),
            name: Set(new.name.trim().to_string()),
            birth_year: Set(new.birth_year),
            death_year: Set(new.death_year),
            primary_profession: Set(new.primary_profession.trim().to_string()),
        }
        .insert(&txn)
        .await?;

        let mut titles = new.known_for_titles;
        let mut seen = HashSet::new();
        titles.retain(|imdb_id| seen.insert(imdb_id.clone()));
        let mut edges = Vec::with_capacity(titles.len());
        for imdb_id in &titles {
            ensure_imdb_entry(&txn, imdb_id).await?;
            edges.push(director_known_for::ActiveModel {
                director_id: Set(director_id.clone()),
                imdb_id: Set(imdb_id.clone()),
            });
        }
        let on_conflict = OnConflict::columns([
            director_known_for::Column::DirectorId,
            director_known_for::Column::ImdbId,
        ])
        .do_nothing()
        .to_owned();
        insert_chunked(&txn, edges, LOOKUP_CHUNK, Some(on_conflict)).await?;
        txn.commit().await?;

        info!(director_id = %director.director_id, name = %director.name, "created director");
        Ok(DirectorDetail::new(director, titles))
    }

    pub async fn movies_by_actor(&self, name: &str) -> AppResult<Vec<MovieDetail>> {
        let name = normalize_name(name);
        let movies = ranked(movie::Entity::find().inner_join(actor::Entity))
            .filter(lower_eq((actor::Entity, actor::Column::Name), &name))
            .distinct()
            .all(&self.db)
            .await?;
        debug!(actor = %name, movies = movies.len(), "movies by actor");
        Ok(indexed(hydrate(&self.db, movies).await?, 1))
    }

    pub async fn movies_by_genre(&self, name: &str, page: u64) -> AppResult<Page<MovieDetail>> {
        let name = normalize_name(name);
        let query = ranked(movie::Entity::find().inner_join(genre::Entity))
            .filter(lower_eq((genre::Entity, genre::Column::Name), &name))
            .distinct();

        let paginator = query.paginate(&self.db, self.page_size);
        let counts = paginator.num_items_and_pages().await?;
        let last_page = counts.number_of_pages.max(1);
        if page == 0 || page > last_page {
            return Err(AppError::NotFound);
        }

        let movies = paginator.fetch_page(page - 1).await?;
        let start = 1 + (page - 1) * self.page_size;
        Ok(Page {
            count: counts.number_of_items,
            next: (page < last_page).then_some(page + 1),
            previous: (page > 1).then(|| page - 1),
            results: indexed(hydrate(&self.db, movies).await?, start),
        })
    }

    pub async fn movies_by_director(&self, name: &str) -> AppResult<Vec<MovieDetail>> {
        let name = normalize_name(name);
        let movies = ranked(movie::Entity::find().inner_join(director::Entity))
            .filter(lower_eq((director::Entity, director::Column::Name), &name))
            .distinct()
            .all(&self.db)
            .await?;
        hydrate(&self.db, movies).await
    }

    /// At most `n` movies by vote average; ties keep insertion order.
    pub async fn top_rated(&self, n: u64) -> AppResult<Vec<MovieDetail>> {
        let movies = ranked(movie::Entity::find()).limit(n).all(&self.db).await?;
        Ok(indexed(hydrate(&self.db, movies).await?, 1))
    }

    /// At most `n` movies by revenue over budget. Movies with no budget are left out.
    pub async fn best_roi(&self, n: u64) -> AppResult<Vec<MovieDetail>> {
        let roi = Expr::col((movie::Entity, movie::Column::Revenue))
            .cast_as(Alias::new("REAL"))
            .div(Expr::col((movie::Entity, movie::Column::Budget)));
        let movies = movie::Entity::find()
            .filter(movie::Column::Budget.gt(0))
            .order_by(roi, Order::Desc)
            .order_by_asc(movie::Column::Id)
            .limit(n)
            .all(&self.db)
            .await?;
        let rois: Vec<Option<f64>> = movies.iter().map(movie::Model::roi).collect();
        let details = indexed(hydrate(&self.db, movies).await?, 1);
        Ok(details.into_iter().zip(rois).map(|(detail, roi)| detail.with_roi(roi)).collect())
    }
}

fn ranked(select: Select<movie::Entity>) -> Select<movie::Entity> {
    select.order_by_desc(movie::Column::VoteAverage).order_by_asc(movie::Column::Id)
}

fn indexed(details: Vec<MovieDetail>, start: u64) -> Vec<MovieDetail> {
    details.into_iter().zip(start..).map(|(detail, index)| detail.with_index(index)).collect()
}

async fn hydrate<C: ConnectionTrait>(
    db: &C,
    movies: Vec<movie::Model>,
) -> AppResult<Vec<MovieDetail>> {
    let ids: Vec<i32> = movies.iter().map(|movie| movie.id).collect();
    let mut genres: HashMap<i32, Vec<String>> = HashMap::new();
    let mut casts: HashMap<i32, Vec<String>> = HashMap::new();
    let mut directors: HashMap<i32, Vec<String>> = HashMap::new();

    for chunk in ids.chunks(LOOKUP_CHUNK) {
        let rows = movie_genre::Entity::find()
            .select_only()
            .column(movie_genre::Column::MovieId)
            .column(genre::Column::Name)
            .join(JoinType::InnerJoin, movie_genre::Relation::Genre.def())
            .filter(movie_genre::Column::MovieId.is_in(chunk.iter().copied()))
            .order_by_asc(genre::Column::GenreId)
            .into_tuple::<(i32, String)>()
            .all(db)
            .await?;
        group(rows, &mut genres);

        let rows = movie_actor::Entity::find()
            .select_only()
            .column(movie_actor::Column::MovieId)
            .column(actor::Column::Name)
            .join(JoinType::InnerJoin, movie_actor::Relation::Actor.def())
            .filter(movie_actor::Column::MovieId.is_in(chunk.iter().copied()))
            .order_by_asc(actor::Column::Id)
            .into_tuple::<(i32, String)>()
            .all(db)
            .await?;
        group(rows, &mut casts);

        let rows = movie_director::Entity::find()
            .select_only()
            .column(movie_director::Column::MovieId)
            .column(director::Column::Name)
            .join(JoinType::InnerJoin, movie_director::Relation::Director.def())
            .filter(movie_director::Column::MovieId.is_in(chunk.iter().copied()))
            .order_by_asc(director::Column::Name)
            .into_tuple::<(i32, String)>()
            .all(db)
            .await?;
        group(rows, &mut directors);
    }

    Ok(movies
        .into_iter()
        .map(|movie| {
            let id = movie.id;
            MovieDetail::new(
                movie,
                genres.remove(&id).unwrap_or_default(),
                casts.remove(&id).unwrap_or_default(),
                directors.remove(&id).unwrap_or_default(),
            )
        })
        .collect())
}

fn group(rows: Vec<(i32, String)>, into: &mut HashMap<i32, Vec<String>>) {
    for (movie_id, name) in rows {
        into.entry(movie_id).or_default().push(name);
    }
}
