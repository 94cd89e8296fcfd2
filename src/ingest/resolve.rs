//! Natural-key resolution for one ingestion run.
//!
//! Every resolver owns a single mapping, built once from the store when the
//! pass starts and extended in memory as new keys are created, so the hot
//! loops never query the database to answer "have we seen this key".

use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, QueryOrder,
    QuerySelect, Set,
    sea_query::{Expr, Func, IntoColumnRef, OnConflict, SimpleExpr},
};
use tracing::{debug, warn};

use super::{
    batch::insert_chunked,
    source::{DirectorRow, GenreRow},
};
use crate::{
    entities::{actor, director, genre, imdb_entry, movie},
    error::AppResult,
};

/// Prefix for directors created by name only, without an IMDb person id.
pub const LOCAL_DIRECTOR_PREFIX: &str = "local:";

const LOOKUP_CHUNK: usize = 500;

/// `LOWER(col) = lower(value)`, ASCII-only like SQLite's `LOWER`.
pub(crate) fn lower_eq(col: impl IntoColumnRef, value: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(col))).eq(value.to_ascii_lowercase())
}

fn imdb_on_conflict() -> OnConflict {
    OnConflict::column(imdb_entry::Column::ImdbId).do_nothing().to_owned()
}

/// Known IMDb ids. Staged ids count as known from the moment they are staged.
pub struct ImdbResolver {
    known: HashSet<String>,
    staged: Vec<String>,
}

impl ImdbResolver {
    pub async fn load<C: ConnectionTrait>(db: &C) -> AppResult<Self> {
        let known: HashSet<String> = imdb_entry::Entity::find()
            .select_only()
            .column(imdb_entry::Column::ImdbId)
            .into_tuple::<String>()
            .all(db)
            .await?
            .into_iter()
            .collect();
        debug!(known = known.len(), "loaded imdb entries");
        Ok(Self { known, staged: Vec::new() })
    }

    pub fn contains(&self, imdb_id: &str) -> bool {
        self.known.contains(imdb_id)
    }

    pub fn stage(&mut self, imdb_id: &str) -> bool {
        if !self.known.insert(imdb_id.to_string()) {
            return false;
        }
        self.staged.push(imdb_id.to_string());
        true
    }

    pub async fn flush<C: ConnectionTrait>(
        &mut self,
        db: &C,
        chunk_size: usize,
    ) -> AppResult<usize> {
        let staged = std::mem::take(&mut self.staged);
        let count = staged.len();
        let models = staged
            .into_iter()
            .map(|imdb_id| imdb_entry::ActiveModel { imdb_id: Set(imdb_id) })
            .collect();
        insert_chunked(db, models, chunk_size, Some(imdb_on_conflict())).await?;
        Ok(count)
    }

    /// Get-or-create, written immediately. Returns `true` if the entry was created.
    pub async fn resolve<C: ConnectionTrait>(&mut self, db: &C, imdb_id: &str) -> AppResult<bool> {
        if self.known.contains(imdb_id) {
            return Ok(false);
        }
        ensure_imdb_entry(db, imdb_id).await?;
        self.known.insert(imdb_id.to_string());
        Ok(true)
    }
}

/// Actor name to actor id. Names are matched exactly after trimming, so two
/// different people sharing a name resolve to whichever row was created first.
pub struct ActorResolver {
    by_name: HashMap<String, i32>,
    staged: Vec<String>,
    staged_names: HashSet<String>,
}

impl ActorResolver {
    pub async fn load<C: ConnectionTrait>(db: &C) -> AppResult<Self> {
        let mut by_name = HashMap::new();
        let rows = actor::Entity::find()
            .select_only()
            .column(actor::Column::Id)
            .column(actor::Column::Name)
            .order_by_asc(actor::Column::Id)
            .into_tuple::<(i32, String)>()
            .all(db)
            .await?;
        for (id, name) in rows {
            by_name.entry(name).or_insert(id);
        }
        debug!(known = by_name.len(), "loaded actors");
        Ok(Self { by_name, staged: Vec::new(), staged_names: HashSet::new() })
    }

    pub fn discover(&mut self, name: &str) -> bool {
        if self.by_name.contains_key(name) || !self.staged_names.insert(name.to_string()) {
            return false;
        }
        self.staged.push(name.to_string());
        true
    }

    pub fn pending(&self) -> usize {
        self.staged.len()
    }

    pub async fn commit<C: ConnectionTrait>(
        &mut self,
        db: &C,
        chunk_size: usize,
    ) -> AppResult<usize> {
        let staged = std::mem::take(&mut self.staged);
        self.staged_names.clear();

        let models = staged
            .iter()
            .map(|name| actor::ActiveModel { id: NotSet, name: Set(name.clone()) })
            .collect();
        insert_chunked(db, models, chunk_size, None).await?;

        for names in staged.chunks(LOOKUP_CHUNK) {
            let rows = actor::Entity::find()
                .select_only()
                .column(actor::Column::Id)
                .column(actor::Column::Name)
                .filter(actor::Column::Name.is_in(names.iter().cloned()))
                .order_by_asc(actor::Column::Id)
                .into_tuple::<(i32, String)>()
                .all(db)
                .await?;
            for (id, name) in rows {
                self.by_name.entry(name).or_insert(id);
            }
        }
        Ok(staged.len())
    }

    pub fn get(&self, name: &str) -> Option<i32> {
        self.by_name.get(name).copied()
    }
}

pub struct DirectorResolver {
    known: HashSet<String>,
}

impl DirectorResolver {
    pub async fn load<C: ConnectionTrait>(db: &C) -> AppResult<Self> {
        let known: HashSet<String> = director::Entity::find()
            .select_only()
            .column(director::Column::DirectorId)
            .into_tuple::<String>()
            .all(db)
            .await?
            .into_iter()
            .collect();
        debug!(known = known.len(), "loaded directors");
        Ok(Self { known })
    }

    /// Inserts the director right away if its id is unknown. Returns `true` if it was created.
    pub async fn resolve_or_create<C: ConnectionTrait>(
        &mut self,
        db: &C,
        row: &DirectorRow,
    ) -> AppResult<bool> {
        if self.known.contains(&row.director_id) {
            return Ok(false);
        }
        let model = director::ActiveModel {
            director_id: Set(row.director_id.clone()),
            name: Set(row.name.clone()),
            birth_year: Set(row.birth_year),
            death_year: Set(row.death_year),
            primary_profession: Set(row.primary_profession.clone()),
        };
        director::Entity::insert(model)
            .on_conflict(OnConflict::column(director::Column::DirectorId).do_nothing().to_owned())
            .exec_without_returning(db)
            .await?;
        self.known.insert(row.director_id.clone());
        Ok(true)
    }
}

pub struct GenreResolver {
    by_id: HashMap<i32, String>,
}

impl GenreResolver {
    pub async fn load<C: ConnectionTrait>(db: &C) -> AppResult<Self> {
        let by_id: HashMap<i32, String> = genre::Entity::find()
            .select_only()
            .column(genre::Column::GenreId)
            .column(genre::Column::Name)
            .into_tuple::<(i32, String)>()
            .all(db)
            .await?
            .into_iter()
            .collect();
        debug!(known = by_id.len(), "loaded genres");
        Ok(Self { by_id })
    }

    pub fn contains(&self, genre_id: i32) -> bool {
        self.by_id.contains_key(&genre_id)
    }

    /// Get-or-create by `(genre_id, name)`. An existing id keeps its stored name.
    pub async fn resolve_or_create<C: ConnectionTrait>(
        &mut self,
        db: &C,
        row: &GenreRow,
    ) -> AppResult<bool> {
        if let Some(existing) = self.by_id.get(&row.genre_id) {
            if !existing.eq_ignore_ascii_case(&row.name) {
                warn!(
                    genre_id = row.genre_id,
                    stored = %existing,
                    source = %row.name,
                    "genre id already stored under another name, keeping stored name"
                );
            }
            return Ok(false);
        }
        genre::ActiveModel { genre_id: Set(row.genre_id), name: Set(row.name.clone()) }
            .insert(db)
            .await?;
        self.by_id.insert(row.genre_id, row.name.clone());
        Ok(true)
    }
}

pub struct MovieIndex {
    by_tmdb: HashMap<i32, i32>,
}

impl MovieIndex {
    pub async fn load<C: ConnectionTrait>(db: &C) -> AppResult<Self> {
        let by_tmdb = movie::Entity::find()
            .select_only()
            .column(movie::Column::TmdbId)
            .column(movie::Column::Id)
            .into_tuple::<(i32, i32)>()
            .all(db)
            .await?
            .into_iter()
            .collect();
        Ok(Self { by_tmdb })
    }

    pub fn get(&self, tmdb_id: i32) -> Option<i32> {
        self.by_tmdb.get(&tmdb_id).copied()
    }

    pub fn contains(&self, tmdb_id: i32) -> bool {
        self.by_tmdb.contains_key(&tmdb_id)
    }

    pub fn len(&self) -> usize {
        self.by_tmdb.len()
    }
}

pub async fn ensure_imdb_entry<C: ConnectionTrait>(db: &C, imdb_id: &str) -> AppResult<()> {
    imdb_entry::Entity::insert(imdb_entry::ActiveModel { imdb_id: Set(imdb_id.to_string()) })
        .on_conflict(imdb_on_conflict())
        .exec_without_returning(db)
        .await?;
    Ok(())
}

pub async fn actor_by_name<C: ConnectionTrait>(db: &C, name: &str) -> AppResult<i32> {
    let existing = actor::Entity::find()
        .filter(actor::Column::Name.eq(name))
        .order_by_asc(actor::Column::Id)
        .one(db)
        .await?;
    if let Some(actor) = existing {
        return Ok(actor.id);
    }
    let created = actor::ActiveModel { id: NotSet, name: Set(name.to_string()) }.insert(db).await?;
    Ok(created.id)
}

pub async fn genre_by_name<C: ConnectionTrait>(db: &C, name: &str) -> AppResult<i32> {
    let existing = genre::Entity::find()
        .filter(lower_eq(genre::Column::Name, name))
        .order_by_asc(genre::Column::GenreId)
        .one(db)
        .await?;
    if let Some(genre) = existing {
        return Ok(genre.genre_id);
    }
    let created =
        genre::ActiveModel { genre_id: NotSet, name: Set(name.to_string()) }.insert(db).await?;
    Ok(created.genre_id)
}

/// Director with exactly this name, created under a local id if there is none.
pub async fn director_by_name<C: ConnectionTrait>(db: &C, name: &str) -> AppResult<String> {
    let existing = director::Entity::find()
        .filter(director::Column::Name.eq(name))
        .order_by_asc(director::Column::DirectorId)
        .one(db)
        .await?;
    if let Some(director) = existing {
        return Ok(director.director_id);
    }
    let director_id = format!("{LOCAL_DIRECTOR_PREFIX}{name}");
    let model = director::ActiveModel {
        director_id: Set(director_id.clone()),
        name: Set(name.to_string()),
        birth_year: Set(None),
        death_year: Set(None),
        primary_profession: Set(String::new()),
    };
    director::Entity::insert(model)
        .on_conflict(OnConflict::column(director::Column::DirectorId).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;
    Ok(director_id)
}
