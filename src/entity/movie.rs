// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

use serde::{Deserialize, Serialize};

use crate::validate::Validate;

pub type MovieId = u64;

/// One catalog entry as it appears in list responses.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub adult: bool,
    pub backdrop_path: Option<String>,
    pub genre_ids: Vec<u32>,
    pub id: MovieId,
    pub original_language: String,
    pub original_title: String,
    pub overview: String,
    pub popularity: f64,
    pub poster_path: Option<String>,
    pub release_date: String,
    pub title: String,
    pub video: bool,
    pub vote_average: f64,
    pub vote_count: u64,
}

impl Validate for Movie {
    fn validate(&self) -> Result<(), String> {
        if !(0.0..=10.0).contains(&self.vote_average) {
            return Err(format!(
                "movie {}: vote_average {} outside 0..=10",
                self.id, self.vote_average
            ));
        }
        Ok(())
    }
}

/// A page of catalog results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GetMoviesResponse {
    pub page: u32,
    pub results: Vec<Movie>,
    pub total_pages: u32,
    pub total_results: u64,
}

impl Validate for GetMoviesResponse {
    fn validate(&self) -> Result<(), String> {
        if self.page == 0 {
            return Err("page: must be at least 1".to_string());
        }
        self.results
            .validate()
            .map_err(|e| format!("results{e}"))
    }
}

/// A movie saved to a user's favorites. `added_at` (epoch millis) only orders the list;
/// identity is the movie id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FavoriteMovie {
    #[serde(flatten)]
    pub movie: Movie,
    #[serde(rename = "addedAt")]
    pub added_at: i64,
}

impl Validate for FavoriteMovie {
    fn validate(&self) -> Result<(), String> {
        self.movie.validate()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u32,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub key: String,
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub official: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoList {
    pub results: Vec<Video>,
}

/// Full detail record, fetched with `append_to_response=videos`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    pub id: MovieId,
    pub title: String,
    pub original_title: String,
    pub overview: String,
    #[serde(default)]
    pub tagline: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: String,
    #[serde(default)]
    pub runtime: Option<u32>,
    pub vote_average: f64,
    pub vote_count: u64,
    pub genres: Vec<Genre>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub budget: u64,
    #[serde(default)]
    pub revenue: u64,
    #[serde(default)]
    pub videos: VideoList,
}

impl MovieDetail {
    /// First YouTube trailer, preferring official uploads.
    pub fn trailer(&self) -> Option<&Video> {
        let trailers = || {
            self.videos
                .results
                .iter()
                .filter(|v| v.site == "YouTube" && v.kind == "Trailer")
        };
        trailers().find(|v| v.official).or_else(|| trailers().next())
    }
}

impl Validate for MovieDetail {
    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err(format!("movie {}: title must not be empty", self.id));
        }
        if !(0.0..=10.0).contains(&self.vote_average) {
            return Err(format!(
                "movie {}: vote_average {} outside 0..=10",
                self.id, self.vote_average
            ));
        }
        Ok(())
    }
}

/// Sort orders accepted by the discover endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortBy {
    #[serde(rename = "original_title.asc")]
    OriginalTitleAsc,
    #[serde(rename = "original_title.desc")]
    OriginalTitleDesc,
    #[serde(rename = "popularity.asc")]
    PopularityAsc,
    #[default]
    #[serde(rename = "popularity.desc")]
    PopularityDesc,
    #[serde(rename = "revenue.asc")]
    RevenueAsc,
    #[serde(rename = "revenue.desc")]
    RevenueDesc,
    #[serde(rename = "primary_release_date.asc")]
    PrimaryReleaseDateAsc,
    #[serde(rename = "primary_release_date.desc")]
    PrimaryReleaseDateDesc,
    #[serde(rename = "title.asc")]
    TitleAsc,
    #[serde(rename = "title.desc")]
    TitleDesc,
    #[serde(rename = "vote_average.asc")]
    VoteAverageAsc,
    #[serde(rename = "vote_average.desc")]
    VoteAverageDesc,
    #[serde(rename = "vote_count.asc")]
    VoteCountAsc,
    #[serde(rename = "vote_count.desc")]
    VoteCountDesc,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::OriginalTitleAsc => "original_title.asc",
            SortBy::OriginalTitleDesc => "original_title.desc",
            SortBy::PopularityAsc => "popularity.asc",
            SortBy::PopularityDesc => "popularity.desc",
            SortBy::RevenueAsc => "revenue.asc",
            SortBy::RevenueDesc => "revenue.desc",
            SortBy::PrimaryReleaseDateAsc => "primary_release_date.asc",
            SortBy::PrimaryReleaseDateDesc => "primary_release_date.desc",
            SortBy::TitleAsc => "title.asc",
            SortBy::TitleDesc => "title.desc",
            SortBy::VoteAverageAsc => "vote_average.asc",
            SortBy::VoteAverageDesc => "vote_average.desc",
            SortBy::VoteCountAsc => "vote_count.asc",
            SortBy::VoteCountDesc => "vote_count.desc",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::decode;

    const MOVIE_JSON: &str = r#"{
        "adult": false,
        "backdrop_path": "/bd.jpg",
        "genre_ids": [28, 12],
        "id": 603,
        "original_language": "en",
        "original_title": "The Matrix",
        "overview": "A hacker learns the truth.",
        "popularity": 88.1,
        "poster_path": null,
        "release_date": "1999-03-31",
        "title": "The Matrix",
        "video": false,
        "vote_average": 8.2,
        "vote_count": 25000
    }"#;

    #[test]
    fn favorite_round_trips_with_added_at_beside_movie_fields() {
        let movie: Movie = serde_json::from_str(MOVIE_JSON).unwrap();
        let favorite = FavoriteMovie {
            movie: movie.clone(),
            added_at: 1_700_000_000_000,
        };
        let value = serde_json::to_value(&favorite).unwrap();
        assert_eq!(value["addedAt"], 1_700_000_000_000i64);
        assert_eq!(value["id"], 603);

        let back: FavoriteMovie = serde_json::from_value(value).unwrap();
        assert_eq!(back.movie, movie);
    }

    #[test]
    fn page_zero_is_rejected() {
        let body = format!(
            r#"{{"page": 0, "results": [{MOVIE_JSON}], "total_pages": 1, "total_results": 1}}"#
        );
        assert!(decode::<GetMoviesResponse>(body.as_bytes()).is_err());
    }

    #[test]
    fn trailer_prefers_official_youtube_trailers() {
        let detail: MovieDetail = serde_json::from_value(serde_json::json!({
            "id": 603,
            "title": "The Matrix",
            "original_title": "The Matrix",
            "overview": "",
            "poster_path": null,
            "backdrop_path": null,
            "release_date": "1999-03-31",
            "vote_average": 8.2,
            "vote_count": 1,
            "genres": [{"id": 28, "name": "Action"}],
            "videos": {"results": [
                {"id": "a", "key": "k1", "name": "Teaser", "site": "YouTube", "type": "Teaser", "official": true},
                {"id": "b", "key": "k2", "name": "Fan cut", "site": "YouTube", "type": "Trailer", "official": false},
                {"id": "c", "key": "k3", "name": "Official", "site": "YouTube", "type": "Trailer", "official": true}
            ]}
        }))
        .unwrap();
        assert_eq!(detail.trailer().map(|v| v.key.as_str()), Some("k3"));
    }

    #[test]
    fn sort_by_serializes_to_query_value() {
        assert_eq!(SortBy::default().as_str(), "popularity.desc");
        assert_eq!(
            serde_json::to_value(SortBy::VoteCountAsc).unwrap(),
            serde_json::json!("vote_count.asc")
        );
    }
}
