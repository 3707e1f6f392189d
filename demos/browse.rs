// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Drive the four machines against the hosted services.
//!
//! Needs `TMDB_ACCESS_TOKEN`, `FIREBASE_API_KEY` and `FIREBASE_DATABASE_URL`. Set
//! `MARQUEE_EMAIL` and `MARQUEE_PASSWORD` to sign in and touch favorites as well.
//!
//! ```text
//! RUST_LOG=marquee_fsm=debug cargo run --example browse
//! ```

use std::sync::Arc;

use anyhow::Context as _;
use marquee_fsm::clients::{
    AuthProvider, FavoritesRepository, IdentityToolkit, MovieCatalog, RealtimeDatabase, TmdbClient,
};
use marquee_fsm::machines::auth::{self, AuthActors, AuthEvent};
use marquee_fsm::machines::favorites::{self, FavoritesActors, FavoritesEvent};
use marquee_fsm::machines::movie_detail::{self, MovieDetailActors, MovieDetailEvent};
use marquee_fsm::machines::movie_list::{self, MovieListActors, MovieListEvent};
use marquee_fsm::telemetry::init_tracing;
use marquee_fsm::Config;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env().context("loading configuration")?;
    let http = config.http_client()?;

    let catalog: Arc<dyn MovieCatalog> = Arc::new(TmdbClient::from_config(&config, http.clone()));
    let identity = Arc::new(IdentityToolkit::from_config(&config, http.clone()));
    let provider: Arc<dyn AuthProvider> = identity.clone();
    let store = Arc::new(RealtimeDatabase::from_config(
        &config,
        http,
        provider.on_auth_state_changed(),
    ));
    let repository = Arc::new(FavoritesRepository::new(store));

    let mut auth = auth::service(AuthActors::bind(Arc::clone(&provider)))?;
    let mut list = movie_list::service(MovieListActors::bind(
        Arc::clone(&catalog),
        Arc::clone(&repository),
        Arc::clone(&provider),
    ))?;
    let mut detail = movie_detail::service(MovieDetailActors::bind(Arc::clone(&catalog)))?;
    let mut favorite_ids = favorites::service(FavoritesActors::bind(
        Arc::clone(&repository),
        Arc::clone(&provider),
    ))?;

    auth.send(AuthEvent::CheckAuthentication {
        session: provider.current_user().map(|u| u.to_user("")),
    })?;

    if let (Ok(email), Ok(password)) = (
        std::env::var("MARQUEE_EMAIL"),
        std::env::var("MARQUEE_PASSWORD"),
    ) {
        auth.send(AuthEvent::Login { email, password })?;
        auth.settle().await?;
    }

    match &auth.context().user {
        Some(user) => {
            info!(name = %user.name, "signed in");
            favorite_ids.send(FavoritesEvent::LoadFavorites)?;
        }
        None => {
            if let Some(error) = &auth.context().error {
                warn!(kind = %error.kind(), %error, "sign-in failed, browsing anonymously");
            }
            favorite_ids.send(FavoritesEvent::SkipFavorites)?;
        }
    }
    favorite_ids.settle().await?;

    list.send(MovieListEvent::FetchMovies { page: 1 })?;
    list.settle().await?;
    report(&list);

    if list.context().can_change_page(2) {
        list.send(MovieListEvent::ChangePage { page: 2 })?;
        list.settle().await?;
        report(&list);
    }

    list.send(MovieListEvent::SearchMovies {
        query: "blade runner".to_string(),
        page: 1,
    })?;
    list.settle().await?;
    report(&list);

    let Some(first) = list.context().movies.first().cloned() else {
        return Ok(());
    };

    detail.send(MovieDetailEvent::FetchMovieDetail { movie_id: first.id })?;
    detail.settle().await?;
    if let Some(shown) = &detail.context().movie_detail {
        info!(
            title = %shown.title,
            runtime = ?shown.runtime,
            trailer = ?shown.trailer().map(|v| v.key.as_str()),
            "detail"
        );
    }

    if auth.context().is_authenticated() {
        let movie_id = first.id;
        let event = if favorite_ids.context().is_favorite(movie_id) {
            FavoritesEvent::RemoveFavorite { movie_id }
        } else {
            FavoritesEvent::AddFavorite {
                movie: Box::new(first),
            }
        };
        favorite_ids.send(event)?;
        favorite_ids.settle().await?;
        info!(
            movie_id,
            favorite = favorite_ids.context().is_favorite(movie_id),
            "favorite toggled"
        );

        list.send(MovieListEvent::FetchFavorites)?;
        list.settle().await?;
        report(&list);

        auth.send(AuthEvent::Logout)?;
    }

    Ok(())
}

fn report(list: &movie_list::MovieListService) {
    let ctx = list.context();
    if let Some(error) = &ctx.error {
        warn!(kind = %error.kind(), %error, "list fetch failed");
        return;
    }
    info!(
        mode = ?ctx.mode,
        page = ctx.current_page,
        pages = ctx.total_page,
        "{}",
        ctx.movies
            .iter()
            .take(5)
            .map(|m| m.title.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
}
