// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Movie catalog API client.

use async_trait::async_trait;
use tracing::debug;

use crate::api_error::ApiError;
use crate::clients::http::fetch_json;
use crate::config::Config;
use crate::entity::{GetMoviesResponse, MovieDetail, MovieId, SortBy};

/// The catalog operations the machines need.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    async fn discover(&self, page: u32, sort_by: SortBy) -> Result<GetMoviesResponse, ApiError>;

    async fn now_playing(&self, page: u32) -> Result<GetMoviesResponse, ApiError>;

    async fn top_rated(&self, page: u32) -> Result<GetMoviesResponse, ApiError>;

    async fn search(&self, query: &str, page: u32) -> Result<GetMoviesResponse, ApiError>;

    /// Detail record including its videos.
    async fn movie_detail(&self, movie_id: MovieId) -> Result<MovieDetail, ApiError>;
}

/// TMDB v3 client. Every request carries the bearer token.
#[derive(Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl TmdbClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }

    pub fn from_config(config: &Config, http: reqwest::Client) -> Self {
        Self::new(http, &config.tmdb_base_url, &config.tmdb_access_token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get(&self, path: &str, query: &[(&str, String)]) -> reqwest::RequestBuilder {
        let url = self.url(path);
        debug!(%url, ?query, "catalog request");
        self.http
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(query)
    }

    fn discover_request(&self, page: u32, sort_by: SortBy) -> reqwest::RequestBuilder {
        self.get(
            "discover/movie",
            &[
                ("page", page.to_string()),
                ("sort_by", sort_by.as_str().to_string()),
            ],
        )
    }

    fn search_request(&self, query: &str, page: u32) -> reqwest::RequestBuilder {
        self.get(
            "search/movie",
            &[("query", query.to_string()), ("page", page.to_string())],
        )
    }

    fn detail_request(&self, movie_id: MovieId) -> reqwest::RequestBuilder {
        self.get(
            &format!("movie/{movie_id}"),
            &[("append_to_response", "videos".to_string())],
        )
    }
}

#[async_trait]
impl MovieCatalog for TmdbClient {
    async fn discover(&self, page: u32, sort_by: SortBy) -> Result<GetMoviesResponse, ApiError> {
        fetch_json(self.discover_request(page, sort_by)).await
    }

    async fn now_playing(&self, page: u32) -> Result<GetMoviesResponse, ApiError> {
        fetch_json(self.get("movie/now_playing", &[("page", page.to_string())])).await
    }

    async fn top_rated(&self, page: u32) -> Result<GetMoviesResponse, ApiError> {
        fetch_json(self.get("movie/top_rated", &[("page", page.to_string())])).await
    }

    async fn search(&self, query: &str, page: u32) -> Result<GetMoviesResponse, ApiError> {
        fetch_json(self.search_request(query, page)).await
    }

    async fn movie_detail(&self, movie_id: MovieId) -> Result<MovieDetail, ApiError> {
        fetch_json(self.detail_request(movie_id)).await
    }
}
