// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! The signed-in user's favorite movie ids.
//!
//! Mutations are only accepted from `Idle`, so a second add or remove that arrives while one
//! is in flight is dropped rather than queued.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::actor::Actor;
use crate::api_error::ApiError;
use crate::builder::transitions::{goto, stay};
use crate::builder::FsmBuilder;
use crate::clients::favorites::FavoritesRepository;
use crate::clients::identity::AuthProvider;
use crate::entity::{Movie, MovieId};
use crate::machine::StateMachine;
use crate::service::Service;
use crate::types::{FsmAction, FsmContext, FsmResult, Invocation, Transition};
use crate::{EventVariant, StateVariant};

pub const LOAD_FAVORITES: &str = "loadFavorites";
pub const ADD_FAVORITE: &str = "addFavorite";
pub const REMOVE_FAVORITE: &str = "removeFavorite";

const NOT_AUTHENTICATED: &str = "User not authenticated";

#[derive(Clone, Debug, PartialEq, StateVariant)]
pub enum FavoritesState {
    Idle,
    #[fsm(tag = "loading")]
    LoadingFavorites,
    #[fsm(tag = "mutating")]
    AddingFavorite { movie: Box<Movie> },
    #[fsm(tag = "mutating")]
    RemovingFavorite { movie_id: MovieId },
}

#[derive(Clone, Debug, EventVariant)]
pub enum FavoritesEvent {
    LoadFavorites,
    /// Nobody is signed in; mark the set as ready without loading.
    SkipFavorites,
    AddFavorite {
        movie: Box<Movie>,
    },
    RemoveFavorite {
        movie_id: MovieId,
    },
    FavoritesLoaded {
        invocation: Invocation,
        ids: BTreeSet<MovieId>,
    },
    LoadFailed {
        invocation: Invocation,
        error: ApiError,
    },
    FavoriteAdded {
        invocation: Invocation,
        movie_id: MovieId,
    },
    FavoriteRemoved {
        invocation: Invocation,
        movie_id: MovieId,
    },
    MutationFailed {
        invocation: Invocation,
        error: ApiError,
    },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FavoritesContext {
    pub favorite_ids: BTreeSet<MovieId>,
    pub is_initialized: bool,
    pub error: Option<ApiError>,
}

impl FavoritesContext {
    pub fn is_favorite(&self, movie_id: MovieId) -> bool {
        self.favorite_ids.contains(&movie_id)
    }
}

impl FsmContext for FavoritesContext {
    fn describe(&self) -> String {
        format!(
            "favorites(count={}, initialized={})",
            self.favorite_ids.len(),
            self.is_initialized
        )
    }
}

#[derive(Clone, Debug)]
pub enum FavoritesAction {
    Load {
        invocation: Invocation,
    },
    Add {
        invocation: Invocation,
        movie: Box<Movie>,
    },
    Remove {
        invocation: Invocation,
        movie_id: MovieId,
    },
}

#[async_trait::async_trait]
impl FsmAction for FavoritesAction {
    type Event = FavoritesEvent;
    type Actors = FavoritesActors;

    fn invocation(&self) -> Option<&Invocation> {
        match self {
            FavoritesAction::Load { invocation }
            | FavoritesAction::Add { invocation, .. }
            | FavoritesAction::Remove { invocation, .. } => Some(invocation),
        }
    }

    async fn execute(&self, actors: &FavoritesActors) -> Option<FavoritesEvent> {
        Some(match self {
            FavoritesAction::Load { invocation } => {
                let invocation = *invocation;
                match actors.load_favorites.call(()).await {
                    Ok(ids) => FavoritesEvent::FavoritesLoaded { invocation, ids },
                    Err(error) => FavoritesEvent::LoadFailed { invocation, error },
                }
            }
            FavoritesAction::Add { invocation, movie } => {
                let invocation = *invocation;
                match actors.add_favorite.call((**movie).clone()).await {
                    Ok(movie_id) => FavoritesEvent::FavoriteAdded {
                        invocation,
                        movie_id,
                    },
                    Err(error) => FavoritesEvent::MutationFailed { invocation, error },
                }
            }
            FavoritesAction::Remove {
                invocation,
                movie_id,
            } => {
                let invocation = *invocation;
                match actors.remove_favorite.call(*movie_id).await {
                    Ok(movie_id) => FavoritesEvent::FavoriteRemoved {
                        invocation,
                        movie_id,
                    },
                    Err(error) => FavoritesEvent::MutationFailed { invocation, error },
                }
            }
        })
    }
}

#[derive(Clone, Debug)]
pub struct FavoritesActors {
    pub load_favorites: Actor<(), BTreeSet<MovieId>>,
    /// Resolves to the id that was added.
    pub add_favorite: Actor<Movie, MovieId>,
    /// Resolves to the id that was removed.
    pub remove_favorite: Actor<MovieId, MovieId>,
}

impl Default for FavoritesActors {
    fn default() -> Self {
        Self {
            load_favorites: Actor::unbound(LOAD_FAVORITES),
            add_favorite: Actor::unbound(ADD_FAVORITE),
            remove_favorite: Actor::unbound(REMOVE_FAVORITE),
        }
    }
}

impl FavoritesActors {
    pub fn with_load_favorites<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(()) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<BTreeSet<MovieId>, ApiError>> + Send + 'static,
    {
        self.load_favorites = Actor::from_fn(LOAD_FAVORITES, f);
        self
    }

    pub fn with_add_favorite<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Movie) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<MovieId, ApiError>> + Send + 'static,
    {
        self.add_favorite = Actor::from_fn(ADD_FAVORITE, f);
        self
    }

    pub fn with_remove_favorite<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(MovieId) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<MovieId, ApiError>> + Send + 'static,
    {
        self.remove_favorite = Actor::from_fn(REMOVE_FAVORITE, f);
        self
    }

    /// Wire the slots to `repository`, scoped to whoever `provider` has signed in.
    pub fn bind(repository: Arc<FavoritesRepository>, provider: Arc<dyn AuthProvider>) -> Self {
        let load = (Arc::clone(&repository), Arc::clone(&provider));
        let add = (Arc::clone(&repository), Arc::clone(&provider));
        let remove = (repository, provider);

        Self::default()
            .with_load_favorites(move |()| {
                let repository = Arc::clone(&load.0);
                let user = load.1.current_user();
                async move {
                    let Some(user) = user else {
                        debug!("no signed-in user, favorites set is empty");
                        return Ok(BTreeSet::new());
                    };
                    let favorites = repository.list(&user.uid).await?;
                    Ok(favorites.into_iter().map(|f| f.movie.id).collect())
                }
            })
            .with_add_favorite(move |movie: Movie| {
                let repository = Arc::clone(&add.0);
                let user = add.1.current_user();
                async move {
                    let user = user.ok_or_else(|| ApiError::unknown(NOT_AUTHENTICATED))?;
                    repository.add(&user.uid, &movie).await?;
                    Ok(movie.id)
                }
            })
            .with_remove_favorite(move |movie_id| {
                let repository = Arc::clone(&remove.0);
                let user = remove.1.current_user();
                async move {
                    let user = user.ok_or_else(|| ApiError::unknown(NOT_AUTHENTICATED))?;
                    repository.remove(&user.uid, movie_id).await?;
                    Ok(movie_id)
                }
            })
    }
}

pub type FavoritesMachine =
    StateMachine<FavoritesState, FavoritesEvent, FavoritesContext, FavoritesAction>;
pub type FavoritesService = Service<FavoritesState, FavoritesEvent, FavoritesContext, FavoritesAction>;

pub fn machine() -> FsmResult<FavoritesMachine> {
    let builder: FsmBuilder<FavoritesState, FavoritesEvent, FavoritesContext, FavoritesAction> =
        FsmBuilder::new(FavoritesState::Idle);
    builder
        .when("Idle")
        .on("LoadFavorites", |_state, _event, _ctx: &mut FavoritesContext| {
            goto(FavoritesState::LoadingFavorites)
        })
        .on("SkipFavorites", |state, _event, ctx| {
            ctx.is_initialized = true;
            stay(state)
        })
        .on("AddFavorite", |state, event, _ctx| match event {
            FavoritesEvent::AddFavorite { movie } => goto(FavoritesState::AddingFavorite {
                movie: movie.clone(),
            }),
            _ => stay(state),
        })
        .on("RemoveFavorite", |state, event, _ctx| match event {
            FavoritesEvent::RemoveFavorite { movie_id } => {
                goto(FavoritesState::RemovingFavorite {
                    movie_id: *movie_id,
                })
            }
            _ => stay(state),
        })
        .done()
        .when("LoadingFavorites")
        .invoke(LOAD_FAVORITES, |_state, _ctx, invocation| {
            FavoritesAction::Load { invocation }
        })
        .on("FavoritesLoaded", |_state, event, ctx| {
            if let FavoritesEvent::FavoritesLoaded { ids, .. } = event {
                ctx.favorite_ids = ids.clone();
                ctx.is_initialized = true;
                ctx.error = None;
            }
            goto(FavoritesState::Idle)
        })
        // Initialized even on failure so hosts stop showing a spinner.
        .on("LoadFailed", |_state, event, ctx| {
            if let FavoritesEvent::LoadFailed { error, .. } = event {
                ctx.error = Some(error.clone());
            }
            ctx.is_initialized = true;
            goto(FavoritesState::Idle)
        })
        .done()
        .when("AddingFavorite")
        .invoke(ADD_FAVORITE, |state, _ctx, invocation| {
            let movie = match state {
                FavoritesState::AddingFavorite { movie } => movie.clone(),
                _ => Box::default(),
            };
            FavoritesAction::Add { invocation, movie }
        })
        .on("FavoriteAdded", |_state, event, ctx| {
            if let FavoritesEvent::FavoriteAdded { movie_id, .. } = event {
                ctx.favorite_ids.insert(*movie_id);
                ctx.error = None;
            }
            goto(FavoritesState::Idle)
        })
        .on("MutationFailed", mutation_failed)
        .done()
        .when("RemovingFavorite")
        .invoke(REMOVE_FAVORITE, |state, _ctx, invocation| {
            let movie_id = match state {
                FavoritesState::RemovingFavorite { movie_id } => *movie_id,
                _ => 0,
            };
            FavoritesAction::Remove {
                invocation,
                movie_id,
            }
        })
        .on("FavoriteRemoved", |_state, event, ctx| {
            if let FavoritesEvent::FavoriteRemoved { movie_id, .. } = event {
                ctx.favorite_ids.remove(movie_id);
                ctx.error = None;
            }
            goto(FavoritesState::Idle)
        })
        .on("MutationFailed", mutation_failed)
        .done()
        .when_unhandled(|state, event| {
            debug!(state = %state.state_path(), event = event.variant_name(), "favorites event ignored");
        })
        .build()
}

fn mutation_failed(
    _state: &FavoritesState,
    event: &FavoritesEvent,
    ctx: &mut FavoritesContext,
) -> Transition<FavoritesState, FavoritesAction> {
    if let FavoritesEvent::MutationFailed { error, .. } = event {
        ctx.error = Some(error.clone());
    }
    goto(FavoritesState::Idle)
}

pub fn service(actors: FavoritesActors) -> FsmResult<FavoritesService> {
    Ok(Service::new(machine()?, FavoritesContext::default(), actors))
}
