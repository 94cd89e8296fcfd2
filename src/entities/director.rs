use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "director")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub director_id: String,
    pub name: String,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    /// Comma separated, as exported by IMDb.
    pub primary_profession: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl Related<super::imdb_entry::Entity> for Entity {
    fn to() -> RelationDef {
        super::director_known_for::Relation::ImdbEntry.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::director_known_for::Relation::Director.def().rev())
    }
}

impl Related<super::movie::Entity> for Entity {
    fn to() -> RelationDef {
        super::movie_director::Relation::Movie.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::movie_director::Relation::Director.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
