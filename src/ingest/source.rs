//! Typed readers for the five CSV exports.
//!
//! Each source is validated once here; downstream passes only ever see the
//! typed row structs. Malformed rows are logged and skipped and an unparseable
//! release date falls back to [`SENTINEL_RELEASE_DATE`]. I/O failures are fatal.

use std::{
    fs::File,
    io::Read,
    marker::PhantomData,
    path::{Path, PathBuf},
    str::FromStr,
};

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use jiff::civil::Date;
use tracing::{debug, error, warn};

use crate::error::{AppError, AppResult};

pub const SENTINEL_RELEASE_DATE: Date = jiff::civil::date(1900, 1, 1);

const NULL_MARKER: &str = "\\N";
const PRINCIPAL_CAST: usize = 3;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RowError {
    #[error("missing {0}")]
    Missing(&'static str),

    #[error("invalid {field}: {value:?}")]
    Invalid { field: &'static str, value: String },

    #[error("death_year {death} is earlier than birth_year {birth}")]
    DeathBeforeBirth { birth: i32, death: i32 },
}

pub trait CsvRow: Sized {
    const SOURCE: &'static str;

    fn parse(record: &StringRecord) -> Result<Self, RowError>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct MovieRow {
    pub tmdb_id: i32,
    pub title: String,
    pub imdb_id: String,
    pub vote_average: f64,
    pub vote_count: i32,
    pub release_date: Date,
    pub runtime: i32,
    pub adult: bool,
    pub revenue: i64,
    pub budget: i64,
    pub overview: String,
}

impl CsvRow for MovieRow {
    const SOURCE: &'static str = "movies";

    fn parse(record: &StringRecord) -> Result<Self, RowError> {
        const TMDB_ID: usize = 0;
        const TITLE: usize = 1;
        const IMDB_ID: usize = 2;
        const VOTE_AVERAGE: usize = 3;
        const VOTE_COUNT: usize = 4;
        const RELEASE_DATE: usize = 6;
        const RUNTIME: usize = 7;
        const ADULT: usize = 8;
        const REVENUE: usize = 9;
        const BUDGET: usize = 10;
        const OVERVIEW: usize = 14;

        let imdb_id = field(record, IMDB_ID);
        if imdb_id.is_empty() {
            return Err(RowError::Missing("imdb_id"));
        }
        let tmdb_id: i32 = parse_required("tmdb_id", field(record, TMDB_ID))?;
        if tmdb_id <= 0 {
            return Err(invalid("tmdb_id", field(record, TMDB_ID)));
        }

        let vote_average: f64 = parse_or_default("vote_average", field(record, VOTE_AVERAGE))?;
        if !vote_average.is_finite() {
            return Err(invalid("vote_average", field(record, VOTE_AVERAGE)));
        }

        Ok(Self {
            tmdb_id,
            title: field(record, TITLE).to_string(),
            imdb_id: imdb_id.to_string(),
            vote_average,
            vote_count: non_negative("vote_count", field(record, VOTE_COUNT))?,
            release_date: parse_release_date(field(record, RELEASE_DATE)),
            runtime: non_negative("runtime", field(record, RUNTIME))?,
            adult: field(record, ADULT).eq_ignore_ascii_case("true"),
            revenue: non_negative("revenue", field(record, REVENUE))?,
            budget: non_negative("budget", field(record, BUDGET))?,
            overview: record.get(OVERVIEW).unwrap_or_default().to_string(),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DirectorRow {
    pub director_id: String,
    pub name: String,
    pub birth_year: Option<i32>,
    pub death_year: Option<i32>,
    pub primary_profession: String,
    pub known_for_titles: Vec<String>,
}

impl CsvRow for DirectorRow {
    const SOURCE: &'static str = "directors";

    fn parse(record: &StringRecord) -> Result<Self, RowError> {
        let director_id = field(record, 0);
        if director_id.is_empty() {
            return Err(RowError::Missing("director_id"));
        }

        let birth_year = parse_year("birth_year", field(record, 2))?;
        let death_year = parse_year("death_year", field(record, 3))?;
        if let (Some(birth), Some(death)) = (birth_year, death_year) {
            if death < birth {
                return Err(RowError::DeathBeforeBirth { birth, death });
            }
        }

        Ok(Self {
            director_id: director_id.to_string(),
            name: field(record, 1).to_string(),
            birth_year,
            death_year,
            primary_profession: field(record, 4).to_string(),
            known_for_titles: split_list(field(record, 5)).map(str::to_string).collect(),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenreRow {
    pub genre_id: i32,
    pub name: String,
}

impl CsvRow for GenreRow {
    const SOURCE: &'static str = "genres";

    fn parse(record: &StringRecord) -> Result<Self, RowError> {
        Ok(Self {
            genre_id: parse_required("genre_id", field(record, 0))?,
            name: field(record, 1).to_string(),
        })
    }
}

/// Principal cast of one movie, at most three names.
#[derive(Clone, Debug, PartialEq)]
pub struct CastLinkRow {
    pub tmdb_id: i32,
    pub actor_names: Vec<String>,
}

impl CsvRow for CastLinkRow {
    const SOURCE: &'static str = "cast links";

    fn parse(record: &StringRecord) -> Result<Self, RowError> {
        let tmdb_id = parse_required("tmdb_id", field(record, 0))?;
        let actor_names = field(record, 1)
            .split(',')
            .take(PRINCIPAL_CAST)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Self { tmdb_id, actor_names })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenreLinkRow {
    pub tmdb_id: i32,
    pub genre_ids: Vec<i32>,
}

impl CsvRow for GenreLinkRow {
    const SOURCE: &'static str = "genre links";

    fn parse(record: &StringRecord) -> Result<Self, RowError> {
        let tmdb_id = parse_required("tmdb_id", field(record, 0))?;
        let genre_ids = split_list(field(record, 1))
            .filter_map(|raw| match raw.parse() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(tmdb_id, genre_id = %raw, "ignoring malformed genre id");
                    None
                },
            })
            .collect();
        Ok(Self { tmdb_id, genre_ids })
    }
}

/// A restartable source: every call to [`CsvSource::rows`] reopens the file.
#[derive(Clone, Debug)]
pub struct CsvSource<T> {
    path: PathBuf,
    _row: PhantomData<fn() -> T>,
}

impl<T: CsvRow> CsvSource<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), _row: PhantomData }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> AppResult<Rows<File, T>> {
        let reader = reader_builder()
            .from_path(&self.path)
            .map_err(|source| AppError::Source { path: self.path.clone(), source })?;
        let mut rows = Rows::new(reader);
        rows.path = Some(self.path.clone());
        Ok(rows)
    }

    pub fn check(&self) -> AppResult<()> {
        let mut reader = reader_builder()
            .from_path(&self.path)
            .map_err(|source| AppError::Source { path: self.path.clone(), source })?;
        reader
            .headers()
            .map_err(|source| AppError::Source { path: self.path.clone(), source })?;
        Ok(())
    }
}

/// Lazy iterator over the parseable rows of one source.
///
/// Bad records are skipped. An I/O error ends iteration and is returned by
/// [`Rows::finish`].
pub struct Rows<R, T> {
    records: StringRecordsIntoIter<R>,
    path: Option<PathBuf>,
    skipped: usize,
    fatal: Option<csv::Error>,
    _row: PhantomData<fn() -> T>,
}

impl<R: Read, T: CsvRow> Rows<R, T> {
    pub fn from_reader(reader: R) -> Self {
        Self::new(reader_builder().from_reader(reader))
    }

    fn new(reader: csv::Reader<R>) -> Self {
        Self {
            records: reader.into_records(),
            path: None,
            skipped: 0,
            fatal: None,
            _row: PhantomData,
        }
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn finish(self) -> AppResult<usize> {
        match (self.fatal, self.path) {
            (None, _) => Ok(self.skipped),
            (Some(source), Some(path)) => Err(AppError::Source { path, source }),
            (Some(err), None) => Err(AppError::Csv(err)),
        }
    }
}

impl<R: Read, T: CsvRow> Iterator for Rows<R, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.fatal.is_some() {
            return None;
        }
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(err) if err.is_io_error() => {
                    error!(source = T::SOURCE, error = %err, "source became unreadable");
                    self.fatal = Some(err);
                    return None;
                },
                Err(err) => {
                    warn!(source = T::SOURCE, error = %err, "unreadable row, skipping");
                    self.skipped += 1;
                    continue;
                },
            };
            match T::parse(&record) {
                Ok(row) => return Some(row),
                Err(err) => {
                    let line = record.position().map(|p| p.line());
                    warn!(source = T::SOURCE, line = ?line, error = %err, "skipping row");
                    self.skipped += 1;
                },
            }
        }
    }
}

fn reader_builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.has_headers(true).flexible(true);
    builder
}

fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).map(str::trim).unwrap_or_default()
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn invalid(field: &'static str, value: &str) -> RowError {
    RowError::Invalid { field, value: value.to_string() }
}

fn parse_required<T: FromStr>(field: &'static str, raw: &str) -> Result<T, RowError> {
    if raw.is_empty() {
        return Err(RowError::Missing(field));
    }
    raw.parse().map_err(|_| invalid(field, raw))
}

fn parse_or_default<T: FromStr + Default>(field: &'static str, raw: &str) -> Result<T, RowError> {
    if raw.is_empty() { Ok(T::default()) } else { raw.parse().map_err(|_| invalid(field, raw)) }
}

fn non_negative<T>(field: &'static str, raw: &str) -> Result<T, RowError>
where
    T: FromStr + Default + PartialOrd,
{
    let value: T = parse_or_default(field, raw)?;
    if value < T::default() {
        return Err(invalid(field, raw));
    }
    Ok(value)
}

fn parse_year(field: &'static str, raw: &str) -> Result<Option<i32>, RowError> {
    if raw.is_empty() || raw == NULL_MARKER {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|_| invalid(field, raw))
}

/// Source dates are `YYYY/MM/DD`; anything else becomes the sentinel date.
pub fn parse_release_date(raw: &str) -> Date {
    match Date::strptime("%Y/%m/%d", raw) {
        Ok(date) => date,
        Err(err) => {
            if !raw.is_empty() {
                debug!(raw = %raw, error = %err, "unparseable release date, using sentinel");
            }
            SENTINEL_RELEASE_DATE
        },
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const MOVIE_HEADER: &str = concat!(
        "id,title,imdb_id,vote_average,vote_count,status,release_date,runtime,",
        "adult,revenue,budget,lang,popularity,tagline,overview\n",
    );

    fn record(fields: &[&str]) -> StringRecord {
        StringRecord::from(fields.to_vec())
    }

    fn movie_fields() -> Vec<&'static str> {
        vec![
            "496243",
            "Parasite",
            "tt6751668",
            "8.5",
            "16000",
            "Released",
            "2019/05/30",
            "133",
            "False",
            "257591776",
            "11363000",
            "ko",
            "80.1",
            "Act like you own the place.",
            "All unemployed, Ki-taek's family takes peculiar interest in the wealthy Parks.",
        ]
    }

    #[test]
    fn parses_a_full_movie_row() {
        let row = MovieRow::parse(&record(&movie_fields())).unwrap();
        assert_eq!(row.tmdb_id, 496243);
        assert_eq!(row.imdb_id, "tt6751668");
        assert_eq!(row.vote_count, 16000);
        assert_eq!(row.release_date, jiff::civil::date(2019, 5, 30));
        assert_eq!(row.runtime, 133);
        assert!(!row.adult);
        assert_eq!(row.budget, 11_363_000);
        assert!(row.overview.starts_with("All unemployed"));
    }

    #[test]
    fn movie_without_imdb_id_is_rejected() {
        let mut fields = movie_fields();
        fields[2] = "";
        assert_eq!(MovieRow::parse(&record(&fields)), Err(RowError::Missing("imdb_id")));
    }

    #[test]
    fn movie_with_bad_tmdb_id_is_rejected() {
        let mut fields = movie_fields();
        fields[0] = "abc";
        assert!(matches!(
            MovieRow::parse(&record(&fields)),
            Err(RowError::Invalid { field: "tmdb_id", .. })
        ));
    }

    #[test]
    fn movie_with_non_positive_tmdb_id_is_rejected() {
        for raw in ["0", "-27205"] {
            let mut fields = movie_fields();
            fields[0] = raw;
            assert!(matches!(
                MovieRow::parse(&record(&fields)),
                Err(RowError::Invalid { field: "tmdb_id", .. })
            ));
        }
    }

    #[test]
    fn negative_budget_is_rejected() {
        let mut fields = movie_fields();
        fields[10] = "-5";
        assert!(matches!(
            MovieRow::parse(&record(&fields)),
            Err(RowError::Invalid { field: "budget", .. })
        ));
    }

    #[test]
    fn empty_numbers_default_and_bad_dates_fall_back() {
        let mut fields = movie_fields();
        fields[3] = "";
        fields[4] = "";
        fields[6] = "30-05-2019";
        fields[8] = "TRUE";
        fields[9] = "";
        let row = MovieRow::parse(&record(&fields)).unwrap();
        assert_eq!(row.vote_average, 0.0);
        assert_eq!(row.vote_count, 0);
        assert_eq!(row.revenue, 0);
        assert_eq!(row.release_date, SENTINEL_RELEASE_DATE);
        assert!(row.adult);
    }

    #[test]
    fn short_movie_record_has_empty_overview() {
        let fields = &movie_fields()[..11];
        let row = MovieRow::parse(&record(fields)).unwrap();
        assert_eq!(row.overview, "");
    }

    #[test]
    fn director_null_years_and_known_titles() {
        let row = DirectorRow::parse(&record(&[
            "nm0000229",
            "Steven Spielberg",
            "1946",
            "\\N",
            "producer,director,writer",
            "tt0082971, tt0120815,,tt0108052",
        ]))
        .unwrap();
        assert_eq!(row.birth_year, Some(1946));
        assert_eq!(row.death_year, None);
        assert_eq!(row.known_for_titles, vec!["tt0082971", "tt0120815", "tt0108052"]);
    }

    #[test]
    fn director_dying_before_birth_is_rejected() {
        let err = DirectorRow::parse(&record(&["nm1", "X", "1950", "1940", "director", ""]));
        assert_eq!(err, Err(RowError::DeathBeforeBirth { birth: 1950, death: 1940 }));
    }

    #[test]
    fn cast_link_keeps_principal_cast_only() {
        let names = "Leonardo DiCaprio, Joseph Gordon-Levitt ,Ken Watanabe,Tom Hardy";
        let row = CastLinkRow::parse(&record(&["27205", names])).unwrap();
        assert_eq!(
            row.actor_names,
            vec!["Leonardo DiCaprio", "Joseph Gordon-Levitt", "Ken Watanabe"]
        );
    }

    #[test]
    fn genre_link_drops_malformed_ids() {
        let row = GenreLinkRow::parse(&record(&["27205", "28, x,878,"])).unwrap();
        assert_eq!(row.genre_ids, vec![28, 878]);
    }

    #[test]
    fn genre_row_trims_and_requires_id() {
        let row = GenreRow::parse(&record(&[" 28 ", " Action "])).unwrap();
        assert_eq!(row, GenreRow { genre_id: 28, name: "Action".into() });
        assert_eq!(GenreRow::parse(&record(&["", "Action"])), Err(RowError::Missing("genre_id")));
    }

    #[test]
    fn rows_skip_header_and_count_bad_rows() {
        let data = "genre_id,name\n28,Action\n,Blank\nabc,Broken\n12,Adventure\n";
        let mut rows = Rows::<_, GenreRow>::from_reader(data.as_bytes());
        let parsed: Vec<_> = rows.by_ref().collect();
        assert_eq!(parsed.iter().map(|g| g.genre_id).collect::<Vec<_>>(), vec![28, 12]);
        assert_eq!(rows.skipped(), 2);
    }

    #[test]
    fn sources_are_restartable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{MOVIE_HEADER}").unwrap();
        writeln!(file, "{}", movie_fields().join(",")).unwrap();
        let source = CsvSource::<MovieRow>::new(file.path());
        let first: Vec<_> = source.rows().unwrap().collect();
        let second: Vec<_> = source.rows().unwrap().collect();
        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn missing_source_is_fatal() {
        let source = CsvSource::<GenreRow>::new("/definitely/not/here.csv");
        assert!(matches!(source.rows(), Err(AppError::Source { .. })));
    }

    /// Hands out `data` once, then fails every read.
    struct BrokenDisk {
        data: &'static [u8],
    }

    impl Read for BrokenDisk {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.data.is_empty() {
                return Err(std::io::Error::other("input/output error"));
            }
            let n = buf.len().min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn io_error_stops_rows_and_is_returned() {
        let disk = BrokenDisk { data: b"genre_id,name\n28,Action\n12,Adventure\n" };
        let mut rows = Rows::<_, GenreRow>::from_reader(disk);
        let parsed: Vec<_> = rows.by_ref().collect();
        assert_eq!(parsed.len(), 2);
        assert_eq!(rows.next(), None);
        assert!(matches!(rows.finish(), Err(AppError::Csv(err)) if err.is_io_error()));
    }

    #[test]
    fn clean_read_finishes_with_skip_count() {
        let data = "genre_id,name\n28,Action\n,Blank\n";
        let mut rows = Rows::<_, GenreRow>::from_reader(data.as_bytes());
        assert_eq!(rows.by_ref().count(), 1);
        assert_eq!(rows.finish().unwrap(), 1);
    }

    #[test]
    fn directory_in_place_of_source_fails_check() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvSource::<GenreRow>::new(dir.path());
        assert!(matches!(source.check(), Err(AppError::Source { .. })));
    }
}
