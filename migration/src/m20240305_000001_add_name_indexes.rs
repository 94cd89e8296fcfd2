use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_actor_name")
                    .table(Actor::Table)
                    .col(Actor::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_director_name")
                    .table(Director::Table)
                    .col(Director::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_vote_average")
                    .table(Movie::Table)
                    .col(Movie::VoteAverage)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_movie_vote_average").table(Movie::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_director_name").table(Director::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_actor_name").table(Actor::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Actor {
    Table,
    Name,
}

#[derive(DeriveIden)]
enum Director {
    Table,
    Name,
}

#[derive(DeriveIden)]
enum Movie {
    Table,
    VoteAverage,
}
