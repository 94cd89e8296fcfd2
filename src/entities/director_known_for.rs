use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "director_known_for")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub director_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub imdb_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::director::Entity",
        from = "Column::DirectorId",
        to = "super::director::Column::DirectorId"
    )]
    Director,
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

impl ActiveModelBehavior for ActiveModel {}
