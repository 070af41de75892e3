//! Canonical and placeholder media records.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use serde_json::json;

const EXTERNAL_ID_PREFIX: &str = "tt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Movie,
    Series,
}

/// A numeric record id. Digit strings too long for `u64` are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum MediaId {
    Number(u64),
    Digits(String),
}

impl MediaId {
    /// `digits` must be non-empty ASCII digits.
    pub fn from_digits(digits: &str) -> Self {
        match digits.parse() {
            Ok(id) => Self::Number(id),
            Err(_) => Self::Digits(digits.to_string()),
        }
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::Digits(digits) => f.write_str(digits),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub kind: MediaKind,
    pub id: MediaId,
    pub title: String,
    pub release_date: String,
    pub poster_path: String,
    pub backdrop_path: String,
    pub vote_average: f64,
    pub genre_ids: Vec<u32>,
    pub overview: String,
    pub external_id: String,
}

struct CanonicalRecord {
    match_key: &'static str,
    kind: MediaKind,
    id: u64,
    external_id: &'static str,
    title: &'static str,
    release_date: &'static str,
    poster_path: &'static str,
    backdrop_path: &'static str,
    vote_average: f64,
    genre_ids: &'static [u32],
    overview: &'static str,
}

const CANONICAL: &[CanonicalRecord] = &[
    CanonicalRecord {
        match_key: "matrix",
        kind: MediaKind::Movie,
        id: 603,
        external_id: "tt0133093",
        title: "The Matrix",
        release_date: "1999-03-30",
        poster_path: "/f89U3ADr1oiB1s9GkdPOEpXUk5H.jpg",
        backdrop_path: "/fNG7i7RqMErkcqhohV2a6cV1Ehy.jpg",
        vote_average: 8.2,
        genre_ids: &[28, 878],
        overview: "A hacker learns that the world he lives in is a simulation.",
    },
    CanonicalRecord {
        match_key: "inception",
        kind: MediaKind::Movie,
        id: 27205,
        external_id: "tt1375666",
        title: "Inception",
        release_date: "2010-07-15",
        poster_path: "/oYuLEt3zVCKq57qu2F8dT7NIa6f.jpg",
        backdrop_path: "/8ZTVqvKDQ8emSGUEMjsS4yHAwrp.jpg",
        vote_average: 8.4,
        genre_ids: &[28, 878, 12],
        overview: "A thief who steals secrets through dream-sharing takes one last job.",
    },
    CanonicalRecord {
        match_key: "breaking bad",
        kind: MediaKind::Series,
        id: 1396,
        external_id: "tt0903747",
        title: "Breaking Bad",
        release_date: "2008-01-20",
        poster_path: "/ggFHVNu6YYI5L9pCfOacjizRGt.jpg",
        backdrop_path: "/tsRy63Mu5cu8etL1X7ZLyf7UP1M.jpg",
        vote_average: 8.9,
        genre_ids: &[18, 80],
        overview: "A chemistry teacher turns to manufacturing methamphetamine.",
    },
];

const PLACEHOLDER_MOVIE_IDS: [u64; 2] = [100001, 100002];
const PLACEHOLDER_SERIES_IDS: [u64; 2] = [200001, 200002];

/// `tt` followed by `id` zero-padded to seven digits.
pub fn synthesize_external_id(id: &MediaId) -> String {
    let digits = id.to_string();
    format!("{EXTERNAL_ID_PREFIX}{digits:0>7}")
}

impl Entity {
    fn from_record(record: &CanonicalRecord) -> Self {
        Self {
            kind: record.kind,
            id: MediaId::Number(record.id),
            title: record.title.to_string(),
            release_date: record.release_date.to_string(),
            poster_path: record.poster_path.to_string(),
            backdrop_path: record.backdrop_path.to_string(),
            vote_average: record.vote_average,
            genre_ids: record.genre_ids.to_vec(),
            overview: record.overview.to_string(),
            external_id: record.external_id.to_string(),
        }
    }

    fn placeholder(kind: MediaKind, id: MediaId) -> Self {
        let (title, release_date, genre_ids) = match kind {
            MediaKind::Movie => (format!("Mock Movie {id}"), "2020-01-01", vec![18]),
            MediaKind::Series => (format!("Mock Series {id}"), "2019-01-01", vec![18]),
        };
        Self {
            kind,
            title,
            release_date: release_date.to_string(),
            poster_path: format!("/mock-poster-{id}.jpg"),
            backdrop_path: format!("/mock-backdrop-{id}.jpg"),
            vote_average: 6.5,
            genre_ids,
            overview: "Placeholder record served by the fixture server.".to_string(),
            external_id: synthesize_external_id(&id),
            id,
        }
    }

    /// The canonical entity of `kind` registered under `match_key`.
    pub fn canonical(kind: MediaKind, match_key: &str) -> Option<Self> {
        CANONICAL
            .iter()
            .find(|record| record.kind == kind && record.match_key == match_key)
            .map(Self::from_record)
    }

    /// Search results for `query`: one canonical hit, or both placeholders.
    pub fn search(kind: MediaKind, query: &str) -> Vec<Self> {
        let query = query.to_lowercase();
        let hit = CANONICAL
            .iter()
            .find(|record| record.kind == kind && query.contains(record.match_key));
        match hit {
            Some(record) => vec![Self::from_record(record)],
            None => Self::placeholders(kind),
        }
    }

    pub fn placeholders(kind: MediaKind) -> Vec<Self> {
        let ids = match kind {
            MediaKind::Movie => PLACEHOLDER_MOVIE_IDS,
            MediaKind::Series => PLACEHOLDER_SERIES_IDS,
        };
        ids.into_iter()
            .map(|id| Self::placeholder(kind, MediaId::Number(id)))
            .collect()
    }

    /// Detail record for `id`. Only 603 (movie) and 1396 (series) are canonical.
    pub fn details(kind: MediaKind, id: MediaId) -> Self {
        let canonical_key = match (kind, &id) {
            (MediaKind::Movie, MediaId::Number(603)) => Some("matrix"),
            (MediaKind::Series, MediaId::Number(1396)) => Some("breaking bad"),
            _ => None,
        };
        canonical_key
            .and_then(|key| Self::canonical(kind, key))
            .unwrap_or_else(|| Self::placeholder(kind, id))
    }

    pub fn with_external_id(mut self, external_id: &str) -> Self {
        self.external_id = external_id.to_string();
        self
    }

    /// The list-item shape used by search and find results.
    pub fn summary_json(&self) -> Value {
        let mut value = json!({
            "id": self.id,
            "imdb_id": self.external_id,
            "poster_path": self.poster_path,
            "backdrop_path": self.backdrop_path,
            "vote_average": self.vote_average,
            "genre_ids": self.genre_ids,
            "overview": self.overview,
            "original_language": "en",
            "popularity": 50.0,
        });
        self.insert_titles(&mut value);
        value
    }

    /// The detail shape, embedding the external id at top level and under `external_ids`.
    pub fn details_json(&self) -> Value {
        let genres: Vec<Value> = self
            .genre_ids
            .iter()
            .map(|id| json!({ "id": id, "name": genre_name(*id) }))
            .collect();
        let mut value = json!({
            "id": self.id,
            "imdb_id": self.external_id,
            "external_ids": { "imdb_id": self.external_id },
            "poster_path": self.poster_path,
            "backdrop_path": self.backdrop_path,
            "vote_average": self.vote_average,
            "genres": genres,
            "overview": self.overview,
            "original_language": "en",
            "status": "Released",
        });
        self.insert_titles(&mut value);
        if let Value::Object(map) = &mut value {
            match self.kind {
                MediaKind::Movie => {
                    map.insert("runtime".to_string(), json!(136));
                }
                MediaKind::Series => {
                    map.insert("number_of_seasons".to_string(), json!(1));
                    map.insert(
                        "seasons".to_string(),
                        json!([{ "season_number": 1, "episode_count": 7, "name": "Season 1" }]),
                    );
                }
            }
        }
        value
    }

    fn insert_titles(&self, value: &mut Value) {
        let Value::Object(map) = value else {
            return;
        };
        let (title_key, original_key, date_key) = match self.kind {
            MediaKind::Movie => ("title", "original_title", "release_date"),
            MediaKind::Series => ("name", "original_name", "first_air_date"),
        };
        map.insert(title_key.to_string(), json!(self.title));
        map.insert(original_key.to_string(), json!(self.title));
        map.insert(date_key.to_string(), json!(self.release_date));
    }
}

fn genre_name(id: u32) -> &'static str {
    match id {
        12 => "Adventure",
        18 => "Drama",
        28 => "Action",
        80 => "Crime",
        878 => "Science Fiction",
        _ => "Unknown",
    }
}
