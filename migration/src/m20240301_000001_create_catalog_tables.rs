use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ImdbEntry::Table)
                    .if_not_exists()
                    .col(string(ImdbEntry::ImdbId).primary_key())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Director::Table)
                    .if_not_exists()
                    .col(string(Director::DirectorId).primary_key())
                    .col(string(Director::Name))
                    .col(integer_null(Director::BirthYear))
                    .col(integer_null(Director::DeathYear))
                    .col(string(Director::PrimaryProfession))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DirectorKnownFor::Table)
                    .if_not_exists()
                    .col(string(DirectorKnownFor::DirectorId))
                    .col(string(DirectorKnownFor::ImdbId))
                    .primary_key(
                        Index::create()
                            .col(DirectorKnownFor::DirectorId)
                            .col(DirectorKnownFor::ImdbId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_director_known_for_director")
                            .from(DirectorKnownFor::Table, DirectorKnownFor::DirectorId)
                            .to(Director::Table, Director::DirectorId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_director_known_for_imdb_entry")
                            .from(DirectorKnownFor::Table, DirectorKnownFor::ImdbId)
                            .to(ImdbEntry::Table, ImdbEntry::ImdbId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Actor::Table)
                    .if_not_exists()
                    .col(pk_auto(Actor::Id))
                    .col(string(Actor::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Genre::Table)
                    .if_not_exists()
                    .col(pk_auto(Genre::GenreId))
                    .col(string(Genre::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Movie::Table)
                    .if_not_exists()
                    .col(pk_auto(Movie::Id))
                    .col(integer(Movie::TmdbId).unique_key())
                    .col(string(Movie::Title))
                    .col(string(Movie::ImdbId))
                    .col(double(Movie::VoteAverage))
                    .col(integer(Movie::VoteCount))
                    .col(string(Movie::ReleaseDate))
                    .col(integer(Movie::Runtime))
                    .col(boolean(Movie::Adult))
                    .col(big_integer(Movie::Revenue))
                    .col(big_integer(Movie::Budget))
                    .col(text(Movie::Overview))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_imdb_entry")
                            .from(Movie::Table, Movie::ImdbId)
                            .to(ImdbEntry::Table, ImdbEntry::ImdbId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_imdb_id")
                    .table(Movie::Table)
                    .col(Movie::ImdbId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieActor::Table)
                    .if_not_exists()
                    .col(integer(MovieActor::MovieId))
                    .col(integer(MovieActor::ActorId))
                    .primary_key(Index::create().col(MovieActor::MovieId).col(MovieActor::ActorId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_actor_movie")
                            .from(MovieActor::Table, MovieActor::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_actor_actor")
                            .from(MovieActor::Table, MovieActor::ActorId)
                            .to(Actor::Table, Actor::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieGenre::Table)
                    .if_not_exists()
                    .col(integer(MovieGenre::MovieId))
                    .col(integer(MovieGenre::GenreId))
                    .primary_key(Index::create().col(MovieGenre::MovieId).col(MovieGenre::GenreId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_genre_movie")
                            .from(MovieGenre::Table, MovieGenre::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_genre_genre")
                            .from(MovieGenre::Table, MovieGenre::GenreId)
                            .to(Genre::Table, Genre::GenreId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieDirector::Table)
                    .if_not_exists()
                    .col(integer(MovieDirector::MovieId))
                    .col(string(MovieDirector::DirectorId))
                    .primary_key(
                        Index::create().col(MovieDirector::MovieId).col(MovieDirector::DirectorId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_director_movie")
                            .from(MovieDirector::Table, MovieDirector::MovieId)
                            .to(Movie::Table, Movie::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_director_director")
                            .from(MovieDirector::Table, MovieDirector::DirectorId)
                            .to(Director::Table, Director::DirectorId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MovieDirector::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieGenre::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(MovieActor::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movie::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Genre::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Actor::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(DirectorKnownFor::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Director::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(ImdbEntry::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum ImdbEntry {
    Table,
    ImdbId,
}

#[derive(DeriveIden)]
enum Director {
    Table,
    DirectorId,
    Name,
    BirthYear,
    DeathYear,
    PrimaryProfession,
}

#[derive(DeriveIden)]
enum DirectorKnownFor {
    Table,
    DirectorId,
    ImdbId,
}

#[derive(DeriveIden)]
enum Actor {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Genre {
    Table,
    GenreId,
    Name,
}

#[derive(DeriveIden)]
enum Movie {
    Table,
    Id,
    TmdbId,
    Title,
    ImdbId,
    VoteAverage,
    VoteCount,
    ReleaseDate,
    Runtime,
    Adult,
    Revenue,
    Budget,
    Overview,
}

#[derive(DeriveIden)]
enum MovieActor {
    Table,
    MovieId,
    ActorId,
}

#[derive(DeriveIden)]
enum MovieGenre {
    Table,
    MovieId,
    GenreId,
}

#[derive(DeriveIden)]
enum MovieDirector {
    Table,
    MovieId,
    DirectorId,
}
