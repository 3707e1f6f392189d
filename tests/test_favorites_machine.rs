// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Favorites set: loading, skipping, and one mutation at a time.
//!
//! What it tests:
//! - Loading marks the set initialized whether it succeeds or fails
//! - Add and remove update the set only after the store confirms
//! - Removing an id that is not in the set is harmless
//! - Requests arriving mid-mutation are ignored
//! - Binding to the in-memory store and provider, signed in and signed out

use std::collections::BTreeSet;
use std::sync::Arc;

use marquee_fsm::clients::{
    AuthProvider, FavoritesRepository, MemoryAuthProvider, MemoryStore, RemoteStore, StoreError,
};
use marquee_fsm::entity::Movie;
use marquee_fsm::machines::favorites::{
    self, FavoritesActors, FavoritesEvent, FavoritesState,
};
use marquee_fsm::{ApiError, ErrorKind};

fn movie(id: u64) -> Movie {
    Movie {
        id,
        title: format!("Movie {id}"),
        vote_average: 6.5,
        ..Movie::default()
    }
}

fn add(id: u64) -> FavoritesEvent {
    FavoritesEvent::AddFavorite {
        movie: Box::new(movie(id)),
    }
}

/// Store fake that accepts every mutation.
fn accepting(initial: &[u64]) -> FavoritesActors {
    let initial: BTreeSet<u64> = initial.iter().copied().collect();
    FavoritesActors::default()
        .with_load_favorites(move |()| {
            let ids = initial.clone();
            async move { Ok(ids) }
        })
        .with_add_favorite(|movie: Movie| async move { Ok(movie.id) })
        .with_remove_favorite(|movie_id| async move { Ok(movie_id) })
}

#[tokio::test]
async fn test_load_favorites() {
    let mut service = favorites::service(accepting(&[3, 7])).unwrap();
    assert!(!service.context().is_initialized);

    service.send(FavoritesEvent::LoadFavorites).unwrap();
    assert_eq!(service.state(), &FavoritesState::LoadingFavorites);
    assert!(service.has_tag("loading"));
    service.settle().await.unwrap();

    let ctx = service.context();
    assert!(ctx.is_initialized);
    assert!(ctx.is_favorite(3));
    assert!(ctx.is_favorite(7));
    assert!(!ctx.is_favorite(8));
}

#[tokio::test]
async fn test_skip_marks_initialized() {
    let mut service = favorites::service(FavoritesActors::default()).unwrap();

    service.send(FavoritesEvent::SkipFavorites).unwrap();

    assert_eq!(service.state(), &FavoritesState::Idle);
    assert!(service.context().is_initialized);
    assert!(service.context().favorite_ids.is_empty());
    assert_eq!(service.pending_invocations(), 0);
}

#[tokio::test]
async fn test_load_failure_still_initializes() {
    let actors = FavoritesActors::default()
        .with_load_favorites(|()| async move { Err(ApiError::unknown("Failed to get favorites")) });
    let mut service = favorites::service(actors).unwrap();

    service.send(FavoritesEvent::LoadFavorites).unwrap();
    service.settle().await.unwrap();

    let ctx = service.context();
    assert_eq!(service.state(), &FavoritesState::Idle);
    assert!(ctx.is_initialized);
    assert!(ctx.favorite_ids.is_empty());
    assert_eq!(ctx.error.as_ref().map(|e| e.kind()), Some(ErrorKind::Unknown));
}

#[tokio::test]
async fn test_add_and_remove() {
    let mut service = favorites::service(accepting(&[])).unwrap();

    service.send(add(42)).unwrap();
    assert!(service.has_tag("mutating"));
    // Nothing changes until the store confirms.
    assert!(!service.context().is_favorite(42));
    service.settle().await.unwrap();
    assert!(service.context().is_favorite(42));

    service
        .send(FavoritesEvent::RemoveFavorite { movie_id: 42 })
        .unwrap();
    assert_eq!(
        service.state(),
        &FavoritesState::RemovingFavorite { movie_id: 42 }
    );
    service.settle().await.unwrap();
    assert!(!service.context().is_favorite(42));
    assert_eq!(service.state(), &FavoritesState::Idle);
}

#[tokio::test]
async fn test_remove_of_absent_id_is_harmless() {
    let mut service = favorites::service(accepting(&[1])).unwrap();
    service.send(FavoritesEvent::LoadFavorites).unwrap();
    service.settle().await.unwrap();

    service
        .send(FavoritesEvent::RemoveFavorite { movie_id: 99 })
        .unwrap();
    service.settle().await.unwrap();

    let ctx = service.context();
    assert_eq!(ctx.favorite_ids, BTreeSet::from([1]));
    assert!(ctx.error.is_none());
}

#[tokio::test]
async fn test_requests_during_mutation_are_ignored() {
    let mut service = favorites::service(accepting(&[])).unwrap();

    service.send(add(1)).unwrap();
    service.send(add(2)).unwrap();
    service
        .send(FavoritesEvent::RemoveFavorite { movie_id: 1 })
        .unwrap();
    assert_eq!(service.pending_invocations(), 1);
    service.settle().await.unwrap();

    assert_eq!(service.context().favorite_ids, BTreeSet::from([1]));
}

#[tokio::test]
async fn test_mutation_failure_leaves_set_untouched() {
    let actors = accepting(&[5]).with_add_favorite(|_movie: Movie| async move {
        Err(ApiError::unknown(
            "Permission denied. Please check Firebase Database rules.",
        ))
    });
    let mut service = favorites::service(actors).unwrap();
    service.send(FavoritesEvent::LoadFavorites).unwrap();
    service.settle().await.unwrap();

    service.send(add(6)).unwrap();
    service.settle().await.unwrap();

    let ctx = service.context();
    assert_eq!(ctx.favorite_ids, BTreeSet::from([5]));
    assert_eq!(
        ctx.error.as_ref().map(|e| e.message()),
        Some("Permission denied. Please check Firebase Database rules.")
    );
}

#[tokio::test]
async fn test_bound_to_memory_backends() {
    let store = Arc::new(MemoryStore::new());
    let repository = Arc::new(FavoritesRepository::new(store.clone()));
    let provider = Arc::new(MemoryAuthProvider::new());
    let user = provider
        .sign_up("Ada", "ada@example.com", "secret1")
        .await
        .unwrap();

    let mut service =
        favorites::service(FavoritesActors::bind(repository.clone(), provider.clone())).unwrap();

    service.send(add(11)).unwrap();
    service.settle().await.unwrap();
    assert!(service.context().is_favorite(11));
    assert!(repository.is_favorite(&user.uid, 11).await.unwrap());

    service.send(FavoritesEvent::LoadFavorites).unwrap();
    service.settle().await.unwrap();
    assert_eq!(service.context().favorite_ids, BTreeSet::from([11]));

    // A corrupt record fails the whole load as a decode error.
    store
        .set(
            &format!("users/{}/favorites/12", user.uid),
            serde_json::json!({ "id": "twelve" }),
        )
        .await
        .unwrap();
    service.send(FavoritesEvent::LoadFavorites).unwrap();
    service.settle().await.unwrap();
    assert_eq!(
        service.context().error.as_ref().map(|e| e.kind()),
        Some(ErrorKind::Decode)
    );

    store
        .fail_with(Some(StoreError::new(Some("PERMISSION_DENIED"), "denied")))
        .await;
    service
        .send(FavoritesEvent::RemoveFavorite { movie_id: 11 })
        .unwrap();
    service.settle().await.unwrap();
    assert!(service.context().is_favorite(11));
    assert_eq!(
        service.context().error.as_ref().map(|e| e.message()),
        Some("Permission denied. Please check Firebase Database rules.")
    );
}

#[tokio::test]
async fn test_signed_out_user_cannot_mutate() {
    let repository = Arc::new(FavoritesRepository::new(Arc::new(MemoryStore::new())));
    let provider = Arc::new(MemoryAuthProvider::new());
    let mut service = favorites::service(FavoritesActors::bind(repository, provider)).unwrap();

    service.send(FavoritesEvent::LoadFavorites).unwrap();
    service.settle().await.unwrap();
    assert!(service.context().is_initialized);
    assert!(service.context().favorite_ids.is_empty());
    assert!(service.context().error.is_none());

    service.send(add(1)).unwrap();
    service.settle().await.unwrap();
    assert!(!service.context().is_favorite(1));
    assert_eq!(
        service.context().error.as_ref().map(|e| e.message()),
        Some("User not authenticated")
    );
}
