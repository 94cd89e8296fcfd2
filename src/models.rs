use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::{
    entities::{director, movie},
    error::ValidationError,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieDetail {
    /// 1-based rank within a ranked listing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    pub tmdb_id: i32,
    pub title: String,
    pub imdb_id: String,
    pub vote_average: f64,
    pub vote_count: i32,
    pub release_date: String,
    pub runtime: i32,
    pub adult: bool,
    pub revenue: i64,
    pub budget: i64,
    pub overview: String,
    pub genres: Vec<String>,
    pub casts: Vec<String>,
    pub directors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi: Option<f64>,
}

impl MovieDetail {
    pub fn new(
        movie: movie::Model,
        genres: Vec<String>,
        casts: Vec<String>,
        directors: Vec<String>,
    ) -> Self {
        Self {
            index: None,
            tmdb_id: movie.tmdb_id,
            title: movie.title,
            imdb_id: movie.imdb_id,
            vote_average: movie.vote_average,
            vote_count: movie.vote_count,
            release_date: movie.release_date,
            runtime: movie.runtime,
            adult: movie.adult,
            revenue: movie.revenue,
            budget: movie.budget,
            overview: movie.overview,
            genres,
            casts,
            directors,
            roi: None,
        }
    }

    pub fn with_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_roi(mut self, roi: Option<f64>) -> Self {
        self.roi = roi;
        self
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewMovie {
    pub tmdb_id: i32,
    pub title: String,
    pub imdb_id: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: i32,
    pub release_date: Date,
    pub runtime: i32,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub revenue: i64,
    #[serde(default)]
    pub budget: i64,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub casts: Vec<String>,
    #[serde(default)]
    pub directors: Vec<String>,
}

impl NewMovie {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.tmdb_id <= 0 {
            return Err(ValidationError::InvalidTmdbId(self.tmdb_id));
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::Blank { field: "title" });
        }
        validate_imdb_id(&self.imdb_id)?;
        if !(0.0..=10.0).contains(&self.vote_average) {
            return Err(ValidationError::OutOfRange {
                field: "vote_average",
                min: 0.0,
                max: 10.0,
                value: self.vote_average,
            });
        }
        non_negative("vote_count", self.vote_count.into())?;
        non_negative("runtime", self.runtime.into())?;
        non_negative("revenue", self.revenue)?;
        non_negative("budget", self.budget)?;

        for (field, names) in
            [("genres", &self.genres), ("casts", &self.casts), ("directors", &self.directors)]
        {
            if names.iter().any(|name| name.trim().is_empty()) {
                return Err(ValidationError::Blank { field });
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewDirector {
    pub director_id: String,
    pub name: String,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub death_year: Option<i32>,
    #[serde(default)]
    pub primary_profession: String,
    #[serde(default)]
    pub known_for_titles: Vec<String>,
}

impl NewDirector {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.director_id.trim().is_empty() {
            return Err(ValidationError::Blank { field: "director_id" });
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::Blank { field: "name" });
        }
        if let (Some(birth), Some(death)) = (self.birth_year, self.death_year) {
            if death < birth {
                return Err(ValidationError::DeathBeforeBirth { birth, death });
            }
        }
        self.known_for_titles.iter().try_for_each(|id| validate_imdb_id(id))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DirectorDetail {
    pub director_id: String,
    pub name: String,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    pub primary_profession: String,
    pub known_for_titles: Vec<String>,
}

impl DirectorDetail {
    pub fn new(director: director::Model, known_for_titles: Vec<String>) -> Self {
        Self {
            director_id: director.director_id,
            name: director.name,
            birth_year: director.birth_year,
            death_year: director.death_year,
            primary_profession: director.primary_profession,
            known_for_titles,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<u64>,
    pub previous: Option<u64>,
    pub results: Vec<T>,
}

pub fn page_number(raw: Option<&str>) -> u64 {
    raw.and_then(|raw| raw.trim().parse().ok()).unwrap_or(1)
}

/// `tt` followed by one or more ASCII digits.
pub fn validate_imdb_id(imdb_id: &str) -> Result<(), ValidationError> {
    let digits = imdb_id.strip_prefix("tt").unwrap_or_default();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidImdbId(imdb_id.to_string()));
    }
    Ok(())
}

fn non_negative(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parasite() -> NewMovie {
        serde_json::from_value(serde_json::json!({
            "tmdb_id": 496243,
            "title": "Parasite",
            "imdb_id": "tt6751668",
            "vote_average": 8.5,
            "vote_count": 16000,
            "release_date": "2019-05-30",
            "runtime": 133,
            "revenue": 257591776,
            "budget": 11363000,
            "genres": ["Drama", "Thriller"],
            "casts": ["Song Kang-ho"],
            "directors": ["Bong Joon Ho"]
        }))
        .unwrap()
    }

    #[test]
    fn accepts_a_complete_movie() {
        let movie = parasite();
        assert_eq!(movie.release_date, jiff::civil::date(2019, 5, 30));
        assert!(!movie.adult);
        assert_eq!(movie.overview, "");
        assert_eq!(movie.validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_movie_fields() {
        let mut movie = parasite();
        movie.vote_average = 10.5;
        assert!(matches!(
            movie.validate(),
            Err(ValidationError::OutOfRange { field: "vote_average", .. })
        ));

        let mut movie = parasite();
        movie.title = "   ".into();
        assert_eq!(movie.validate(), Err(ValidationError::Blank { field: "title" }));

        let mut movie = parasite();
        movie.budget = -1;
        assert_eq!(movie.validate(), Err(ValidationError::Negative { field: "budget", value: -1 }));

        let mut movie = parasite();
        movie.imdb_id = "6751668".into();
        assert_eq!(movie.validate(), Err(ValidationError::InvalidImdbId("6751668".into())));

        let mut movie = parasite();
        movie.casts.push(String::new());
        assert_eq!(movie.validate(), Err(ValidationError::Blank { field: "casts" }));

        let mut movie = parasite();
        movie.tmdb_id = 0;
        assert_eq!(movie.validate(), Err(ValidationError::InvalidTmdbId(0)));
    }

    #[test]
    fn director_years_must_be_ordered() {
        let mut director = NewDirector {
            director_id: "nm0094435".into(),
            name: "Bong Joon Ho".into(),
            birth_year: Some(1969),
            death_year: Some(1960),
            primary_profession: String::new(),
            known_for_titles: vec!["tt6751668".into()],
        };
        assert_eq!(
            director.validate(),
            Err(ValidationError::DeathBeforeBirth { birth: 1969, death: 1960 })
        );

        director.death_year = None;
        assert_eq!(director.validate(), Ok(()));

        director.known_for_titles.push("nm123".into());
        assert_eq!(director.validate(), Err(ValidationError::InvalidImdbId("nm123".into())));
    }

    #[test]
    fn imdb_ids_need_digits_after_prefix() {
        assert!(validate_imdb_id("tt0137523").is_ok());
        assert!(validate_imdb_id("tt").is_err());
        assert!(validate_imdb_id("tt12a").is_err());
        assert!(validate_imdb_id("").is_err());
    }

    #[test]
    fn page_number_falls_back_to_first_page() {
        assert_eq!(page_number(None), 1);
        assert_eq!(page_number(Some("abc")), 1);
        assert_eq!(page_number(Some("3")), 3);
        assert_eq!(page_number(Some("0")), 0);
    }
}
