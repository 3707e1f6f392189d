// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Movie detail fetches, including a fetch replaced by a newer one.

use std::sync::Arc;

use marquee_fsm::entity::{MovieDetail, MovieId, Video, VideoList};
use marquee_fsm::machines::movie_detail::{
    self, MovieDetailActors, MovieDetailEvent, MovieDetailState,
};
use marquee_fsm::{ApiError, ErrorKind};
use tokio::sync::{oneshot, Mutex};

fn detail(id: MovieId) -> MovieDetail {
    MovieDetail {
        id,
        title: format!("Movie {id}"),
        original_title: format!("Movie {id}"),
        overview: String::new(),
        tagline: None,
        poster_path: None,
        backdrop_path: None,
        release_date: "2024-05-01".to_string(),
        runtime: Some(118),
        vote_average: 7.4,
        vote_count: 1200,
        genres: Vec::new(),
        homepage: None,
        status: Some("Released".to_string()),
        budget: 0,
        revenue: 0,
        videos: VideoList {
            results: vec![Video {
                id: "v1".to_string(),
                key: "abc123".to_string(),
                name: "Official Trailer".to_string(),
                site: "YouTube".to_string(),
                kind: "Trailer".to_string(),
                official: true,
            }],
        },
    }
}

#[tokio::test]
async fn test_fetch_detail() {
    let actors = MovieDetailActors::default().with_fetch_movie_detail(|id| async move { Ok(detail(id)) });
    let mut service = movie_detail::service(actors).unwrap();

    service
        .send(MovieDetailEvent::FetchMovieDetail { movie_id: 550 })
        .unwrap();
    assert_eq!(
        service.state(),
        &MovieDetailState::FetchingDetail { movie_id: 550 }
    );
    assert!(service.has_tag("loading"));

    service.settle().await.unwrap();

    assert_eq!(service.state(), &MovieDetailState::Idle);
    let shown = service.context().movie_detail.as_ref().unwrap();
    assert_eq!(shown.id, 550);
    assert_eq!(shown.trailer().map(|v| v.key.as_str()), Some("abc123"));
    assert!(service.context().error.is_none());
}

#[tokio::test]
async fn test_failure_keeps_previous_detail() {
    let actors = MovieDetailActors::default().with_fetch_movie_detail(|id| async move {
        if id == 404 {
            Err(ApiError::fetch("Not Found", Some(404)))
        } else {
            Ok(detail(id))
        }
    });
    let mut service = movie_detail::service(actors).unwrap();

    service
        .send(MovieDetailEvent::FetchMovieDetail { movie_id: 550 })
        .unwrap();
    service.settle().await.unwrap();

    service
        .send(MovieDetailEvent::FetchMovieDetail { movie_id: 404 })
        .unwrap();
    service.settle().await.unwrap();

    let ctx = service.context();
    assert_eq!(ctx.movie_detail.as_ref().map(|d| d.id), Some(550));
    assert_eq!(ctx.error.as_ref().map(|e| e.kind()), Some(ErrorKind::Fetch));
    assert_eq!(ctx.error.as_ref().and_then(|e| e.status()), Some(404));
}

#[tokio::test]
async fn test_newer_fetch_replaces_pending_one() {
    let (release, gate) = oneshot::channel::<()>();
    let gate = Arc::new(Mutex::new(Some(gate)));
    let actors = MovieDetailActors::default().with_fetch_movie_detail(move |id| {
        let gate = Arc::clone(&gate);
        async move {
            if id == 1 {
                let waiting = gate.lock().await.take();
                if let Some(waiting) = waiting {
                    let _ = waiting.await;
                }
            }
            Ok(detail(id))
        }
    });
    let mut service = movie_detail::service(actors).unwrap();

    service
        .send(MovieDetailEvent::FetchMovieDetail { movie_id: 1 })
        .unwrap();
    service
        .send(MovieDetailEvent::FetchMovieDetail { movie_id: 2 })
        .unwrap();
    service.settle().await.unwrap();
    assert_eq!(service.context().movie_detail.as_ref().map(|d| d.id), Some(2));

    let _ = release.send(());
    tokio::task::yield_now().await;
    service.settle().await.unwrap();
    assert_eq!(service.context().movie_detail.as_ref().map(|d| d.id), Some(2));
}

#[tokio::test]
async fn test_unbound_fetch_reports_unknown_error() {
    let mut service = movie_detail::service(MovieDetailActors::default()).unwrap();

    service
        .send(MovieDetailEvent::FetchMovieDetail { movie_id: 550 })
        .unwrap();
    service.settle().await.unwrap();

    assert_eq!(service.state(), &MovieDetailState::Idle);
    assert!(service.context().movie_detail.is_none());
    assert_eq!(
        service.context().error.as_ref().map(|e| e.kind().to_string()),
        Some("UNKNOWN_ERROR".to_string())
    );
}

#[tokio::test]
async fn test_snapshots_follow_every_event() {
    let actors = MovieDetailActors::default().with_fetch_movie_detail(|id| async move { Ok(detail(id)) });
    let mut service = movie_detail::service(actors).unwrap();
    let mut snapshots = service.subscribe();

    service
        .send(MovieDetailEvent::FetchMovieDetail { movie_id: 7 })
        .unwrap();
    assert!(snapshots.has_changed().unwrap());
    assert!(snapshots.borrow_and_update().has_tag("loading"));

    service.settle().await.unwrap();
    let latest = snapshots.borrow_and_update().clone();
    assert!(latest.matches("Idle"));
    assert_eq!(latest.context.movie_detail.as_ref().map(|d| d.id), Some(7));
    assert_eq!(latest, service.snapshot());
}
