// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Per-user favorites kept at `users/{uid}/favorites/{movieId}`.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::api_error::ApiError;
use crate::clients::store::{RemoteStore, StoreError, PERMISSION_DENIED};
use crate::entity::{FavoriteMovie, Movie, MovieId};
use crate::validate::decode_value;

#[derive(Clone)]
pub struct FavoritesRepository {
    store: Arc<dyn RemoteStore>,
}

impl FavoritesRepository {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    fn collection(uid: &str) -> String {
        format!("users/{uid}/favorites")
    }

    fn entry(uid: &str, movie_id: MovieId) -> String {
        format!("users/{uid}/favorites/{movie_id}")
    }

    /// Store `movie`, stamped with the current time. Re-adding overwrites the stamp.
    pub async fn add(&self, uid: &str, movie: &Movie) -> Result<FavoriteMovie, ApiError> {
        let favorite = FavoriteMovie {
            movie: movie.clone(),
            added_at: chrono::Utc::now().timestamp_millis(),
        };
        let value = serde_json::to_value(&favorite)
            .map_err(|e| ApiError::unknown_with_cause("Failed to add favorite", e))?;
        self.store
            .set(&Self::entry(uid, movie.id), value)
            .await
            .map_err(|e| store_error(e, "Failed to add favorite"))?;
        debug!(uid, movie_id = movie.id, "favorite added");
        Ok(favorite)
    }

    /// Removing a movie that is not a favorite succeeds.
    pub async fn remove(&self, uid: &str, movie_id: MovieId) -> Result<(), ApiError> {
        self.store
            .remove(&Self::entry(uid, movie_id))
            .await
            .map_err(|e| store_error(e, "Failed to remove favorite"))?;
        debug!(uid, movie_id, "favorite removed");
        Ok(())
    }

    /// Every favorite, most recently added first.
    pub async fn list(&self, uid: &str) -> Result<Vec<FavoriteMovie>, ApiError> {
        let stored = self
            .store
            .get(&Self::collection(uid))
            .await
            .map_err(|e| store_error(e, "Failed to get favorites"))?;

        // Small dense integer keys come back as an array with null holes.
        let entries: Vec<Value> = match stored {
            None => return Ok(Vec::new()),
            Some(Value::Object(map)) => map.into_iter().map(|(_, value)| value).collect(),
            Some(Value::Array(items)) => items.into_iter().filter(|v| !v.is_null()).collect(),
            Some(other) => {
                return Err(ApiError::decode(
                    "Stored record failed schema validation",
                    format!("favorites: expected an object, found {other}"),
                ))
            }
        };

        let mut favorites = entries
            .into_iter()
            .map(decode_value::<FavoriteMovie>)
            .collect::<Result<Vec<_>, _>>()?;
        favorites.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        Ok(favorites)
    }

    pub async fn is_favorite(&self, uid: &str, movie_id: MovieId) -> Result<bool, ApiError> {
        self.store
            .get(&Self::entry(uid, movie_id))
            .await
            .map(|value| value.is_some())
            .map_err(|e| store_error(e, "Failed to check favorite status"))
    }
}

fn store_error(err: StoreError, fallback: &str) -> ApiError {
    let message = if err.code.as_deref() == Some(PERMISSION_DENIED) {
        "Permission denied. Please check Firebase Database rules.".to_string()
    } else if err.message.trim().is_empty() {
        fallback.to_string()
    } else {
        err.message.clone()
    };
    warn!(code = ?err.code, error = %err, "store operation failed");
    ApiError::unknown_with_cause(message, err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_error::ErrorKind;
    use crate::clients::store::MemoryStore;
    use serde_json::json;

    fn movie(id: MovieId) -> Movie {
        Movie {
            adult: false,
            backdrop_path: None,
            genre_ids: vec![18],
            id,
            original_language: "en".into(),
            original_title: format!("Movie {id}"),
            overview: String::new(),
            popularity: 1.0,
            poster_path: None,
            release_date: "2024-01-01".into(),
            title: format!("Movie {id}"),
            video: false,
            vote_average: 7.0,
            vote_count: 10,
        }
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = Arc::new(MemoryStore::new());
        let older = FavoriteMovie { movie: movie(1), added_at: 100 };
        let newer = FavoriteMovie { movie: movie(2), added_at: 200 };
        store
            .set("users/u1/favorites/1", serde_json::to_value(&older).unwrap())
            .await
            .unwrap();
        store
            .set("users/u1/favorites/2", serde_json::to_value(&newer).unwrap())
            .await
            .unwrap();

        let repo = FavoritesRepository::new(store);
        let ids: Vec<_> = repo.list("u1").await.unwrap().iter().map(|f| f.movie.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(repo.list("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn array_shaped_collection_skips_holes() {
        let store = Arc::new(MemoryStore::new());
        let two = FavoriteMovie { movie: movie(2), added_at: 100 };
        let three = FavoriteMovie { movie: movie(3), added_at: 300 };
        store
            .set(
                "users/u1/favorites",
                json!([null, null, serde_json::to_value(&two).unwrap(), serde_json::to_value(&three).unwrap()]),
            )
            .await
            .unwrap();

        let repo = FavoritesRepository::new(store.clone());
        let ids: Vec<_> = repo.list("u1").await.unwrap().iter().map(|f| f.movie.id).collect();
        assert_eq!(ids, vec![3, 2]);

        store.set("users/u1/favorites", json!([null, { "id": "x" }])).await.unwrap();
        let err = repo.list("u1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);

        store.set("users/u1/favorites", json!("oops")).await.unwrap();
        assert_eq!(repo.list("u1").await.unwrap_err().kind(), ErrorKind::Decode);
    }

    #[tokio::test]
    async fn add_remove_and_membership() {
        let repo = FavoritesRepository::new(Arc::new(MemoryStore::new()));
        let saved = repo.add("u1", &movie(42)).await.unwrap();
        assert!(saved.added_at > 0);
        assert!(repo.is_favorite("u1", 42).await.unwrap());

        repo.remove("u1", 42).await.unwrap();
        repo.remove("u1", 42).await.unwrap();
        assert!(!repo.is_favorite("u1", 42).await.unwrap());
    }

    #[tokio::test]
    async fn malformed_record_is_a_decode_error() {
        let store = Arc::new(MemoryStore::new());
        store
            .set("users/u1/favorites/9", json!({ "id": 9, "title": "broken" }))
            .await
            .unwrap();
        let err = FavoritesRepository::new(store).list("u1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[tokio::test]
    async fn permission_denied_gets_a_readable_message() {
        let store = Arc::new(MemoryStore::new());
        store
            .fail_with(Some(StoreError::new(Some(PERMISSION_DENIED), "Permission denied")))
            .await;
        let err = FavoritesRepository::new(store.clone())
            .add("u1", &movie(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(
            err.message(),
            "Permission denied. Please check Firebase Database rules."
        );

        store.fail_with(Some(StoreError::new(None, ""))).await;
        let err = FavoritesRepository::new(store).remove("u1", 1).await.unwrap_err();
        assert_eq!(err.message(), "Failed to remove favorite");
    }
}
