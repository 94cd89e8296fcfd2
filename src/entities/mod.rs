pub mod actor;
pub mod director;
pub mod director_known_for;
pub mod genre;
pub mod imdb_entry;
pub mod movie;
pub mod movie_actor;
pub mod movie_director;
pub mod movie_genre;
