// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::actor::Actor;
use crate::api_error::ApiError;
use crate::builder::transitions::goto;
use crate::builder::FsmBuilder;
use crate::clients::catalog::MovieCatalog;
use crate::entity::{MovieDetail, MovieId};
use crate::machine::StateMachine;
use crate::service::Service;
use crate::types::{FsmAction, FsmContext, FsmResult, Invocation};
use crate::{EventVariant, StateVariant};

pub const FETCH_MOVIE_DETAIL: &str = "fetchMovieDetail";

#[derive(Clone, Debug, PartialEq, StateVariant)]
pub enum MovieDetailState {
    Idle,
    #[fsm(tag = "loading")]
    FetchingDetail { movie_id: MovieId },
}

#[derive(Clone, Debug, EventVariant)]
pub enum MovieDetailEvent {
    FetchMovieDetail {
        movie_id: MovieId,
    },
    DetailLoaded {
        invocation: Invocation,
        output: MovieDetail,
    },
    DetailFailed {
        invocation: Invocation,
        error: ApiError,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MovieDetailContext {
    pub movie_detail: Option<MovieDetail>,
    pub error: Option<ApiError>,
}

impl FsmContext for MovieDetailContext {
    fn describe(&self) -> String {
        format!(
            "movie_detail(id={:?})",
            self.movie_detail.as_ref().map(|d| d.id)
        )
    }
}

#[derive(Clone, Debug)]
pub enum MovieDetailAction {
    FetchMovieDetail {
        invocation: Invocation,
        movie_id: MovieId,
    },
}

#[async_trait::async_trait]
impl FsmAction for MovieDetailAction {
    type Event = MovieDetailEvent;
    type Actors = MovieDetailActors;

    fn invocation(&self) -> Option<&Invocation> {
        match self {
            MovieDetailAction::FetchMovieDetail { invocation, .. } => Some(invocation),
        }
    }

    async fn execute(&self, actors: &MovieDetailActors) -> Option<MovieDetailEvent> {
        match self {
            MovieDetailAction::FetchMovieDetail {
                invocation,
                movie_id,
            } => {
                let invocation = *invocation;
                Some(match actors.fetch_movie_detail.call(*movie_id).await {
                    Ok(output) => MovieDetailEvent::DetailLoaded { invocation, output },
                    Err(error) => MovieDetailEvent::DetailFailed { invocation, error },
                })
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct MovieDetailActors {
    pub fetch_movie_detail: Actor<MovieId, MovieDetail>,
}

impl Default for MovieDetailActors {
    fn default() -> Self {
        Self {
            fetch_movie_detail: Actor::unbound(FETCH_MOVIE_DETAIL),
        }
    }
}

impl MovieDetailActors {
    pub fn with_fetch_movie_detail<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(MovieId) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<MovieDetail, ApiError>> + Send + 'static,
    {
        self.fetch_movie_detail = Actor::from_fn(FETCH_MOVIE_DETAIL, f);
        self
    }

    pub fn bind(catalog: Arc<dyn MovieCatalog>) -> Self {
        Self::default().with_fetch_movie_detail(move |movie_id| {
            let catalog = Arc::clone(&catalog);
            async move { catalog.movie_detail(movie_id).await }
        })
    }
}

pub type MovieDetailMachine =
    StateMachine<MovieDetailState, MovieDetailEvent, MovieDetailContext, MovieDetailAction>;
pub type MovieDetailService =
    Service<MovieDetailState, MovieDetailEvent, MovieDetailContext, MovieDetailAction>;

pub fn machine() -> FsmResult<MovieDetailMachine> {
    let builder: FsmBuilder<MovieDetailState, MovieDetailEvent, MovieDetailContext, MovieDetailAction> =
        FsmBuilder::new(MovieDetailState::Idle);
    builder
        .from_any()
        .on("FetchMovieDetail", |_state, event, _ctx: &mut MovieDetailContext| {
            let movie_id = match event {
                MovieDetailEvent::FetchMovieDetail { movie_id } => *movie_id,
                _ => 0,
            };
            goto(MovieDetailState::FetchingDetail { movie_id })
        })
        .done()
        .when("FetchingDetail")
        .invoke(FETCH_MOVIE_DETAIL, |state, _ctx, invocation| {
            let movie_id = match state {
                MovieDetailState::FetchingDetail { movie_id } => *movie_id,
                MovieDetailState::Idle => 0,
            };
            MovieDetailAction::FetchMovieDetail {
                invocation,
                movie_id,
            }
        })
        .on("DetailLoaded", |_state, event, ctx| {
            if let MovieDetailEvent::DetailLoaded { output, .. } = event {
                ctx.movie_detail = Some(output.clone());
                ctx.error = None;
            }
            goto(MovieDetailState::Idle)
        })
        // The previous detail stays on screen.
        .on("DetailFailed", |_state, event, ctx| {
            if let MovieDetailEvent::DetailFailed { error, .. } = event {
                ctx.error = Some(error.clone());
            }
            goto(MovieDetailState::Idle)
        })
        .done()
        .when_unhandled(|state, event| {
            debug!(state = %state.state_path(), event = event.variant_name(), "movie detail event ignored");
        })
        .build()
}

pub fn service(actors: MovieDetailActors) -> FsmResult<MovieDetailService> {
    Ok(Service::new(machine()?, MovieDetailContext::default(), actors))
}
