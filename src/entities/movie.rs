use sea_orm::entity::prelude::*;

/// `id` is a surrogate that records insertion order; `tmdb_id` is the external key.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movie")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub tmdb_id: i32,
    pub title: String,
    pub imdb_id: String,
    pub vote_average: f64,
    pub vote_count: i32,
    /// ISO `YYYY-MM-DD`.
    pub release_date: String,
    pub runtime: i32,
    pub adult: bool,
    pub revenue: i64,
    pub budget: i64,
    #[sea_orm(column_type = "Text")]
    pub overview: String,
}

impl Model {
    /// `None` when the budget is zero.
    pub fn roi(&self) -> Option<f64> {
        (self.budget > 0).then(|| self.revenue as f64 / self.budget as f64)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::imdb_entry::Entity",
        from = "Column::ImdbId",
        to = "super::imdb_entry::Column::ImdbId"
    )]
    ImdbEntry,
}

impl Related<super::imdb_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ImdbEntry.def()
    }
}

impl Related<super::actor::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_actor::Relation::Actor.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_actor::Relation::Movie.def().rev())
    }
}

impl Related<super::genre::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_genre::Relation::Genre.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_genre::Relation::Movie.def().rev())
    }
}

impl Related<super::director::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_director::Relation::Director.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_director::Relation::Movie.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
