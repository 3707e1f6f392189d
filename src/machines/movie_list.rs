// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Paged movie list: catalog categories, search, and the user's favorites.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::actor::Actor;
use crate::api_error::ApiError;
use crate::builder::transitions::goto;
use crate::builder::FsmBuilder;
use crate::clients::catalog::MovieCatalog;
use crate::clients::favorites::FavoritesRepository;
use crate::clients::identity::AuthProvider;
use crate::entity::{FavoriteMovie, GetMoviesResponse, Movie, SortBy};
use crate::machine::StateMachine;
use crate::service::Service;
use crate::types::{FsmAction, FsmContext, FsmResult, Invocation, Transition};
use crate::{EventVariant, StateVariant};

pub const FETCH_MOVIES: &str = "fetchMovies";
pub const FETCH_NOW_PLAYING: &str = "fetchNowPlaying";
pub const FETCH_TOP_RATED: &str = "fetchTopRated";
pub const SEARCH_MOVIES: &str = "searchMovies";
pub const FETCH_FAVORITES: &str = "fetchFavorites";

const CATALOG_STATES: [&str; 4] = [
    "FetchingPopular",
    "FetchingNowPlaying",
    "FetchingTopRated",
    "Searching",
];

#[derive(Clone, Debug, PartialEq, StateVariant)]
pub enum MovieListState {
    Idle,
    #[fsm(tag = "loading")]
    FetchingPopular { page: u32 },
    #[fsm(tag = "loading")]
    FetchingNowPlaying { page: u32 },
    #[fsm(tag = "loading")]
    FetchingTopRated { page: u32 },
    #[fsm(tag = "loading")]
    FetchingFavorites,
    #[fsm(tag = "loading")]
    Searching { query: String, page: u32 },
}

impl MovieListState {
    /// The page being fetched, for paged states.
    pub fn page(&self) -> Option<u32> {
        match self {
            MovieListState::FetchingPopular { page }
            | MovieListState::FetchingNowPlaying { page }
            | MovieListState::FetchingTopRated { page }
            | MovieListState::Searching { page, .. } => Some(*page),
            MovieListState::Idle | MovieListState::FetchingFavorites => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Category {
    #[default]
    Popular,
    NowPlaying,
    TopRated,
}

impl Category {
    pub fn fetching(self, page: u32) -> MovieListState {
        match self {
            Category::Popular => MovieListState::FetchingPopular { page },
            Category::NowPlaying => MovieListState::FetchingNowPlaying { page },
            Category::TopRated => MovieListState::FetchingTopRated { page },
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListMode {
    #[default]
    Catalog,
    Favorites,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MovieListContext {
    pub current_page: u32,
    pub total_page: u32,
    pub movies: Vec<Movie>,
    pub error: Option<ApiError>,
    pub mode: ListMode,
    pub category: Category,
    /// Set while browsing search results; category browsing resumes when cleared.
    pub search_query: Option<String>,
}

impl Default for MovieListContext {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_page: 0,
            movies: Vec::new(),
            error: None,
            mode: ListMode::Catalog,
            category: Category::Popular,
            search_query: None,
        }
    }
}

impl MovieListContext {
    /// The fetching state for the current selection at `page`.
    pub fn selection(&self, page: u32) -> MovieListState {
        match &self.search_query {
            Some(query) => MovieListState::Searching {
                query: query.clone(),
                page,
            },
            None => self.category.fetching(page),
        }
    }

    /// Whether a host may request `page`. The machine itself trusts its input.
    pub fn can_change_page(&self, page: u32) -> bool {
        self.mode == ListMode::Catalog && page >= 1 && page <= self.total_page
    }

    pub fn shows_pagination(&self) -> bool {
        self.mode == ListMode::Catalog && self.total_page > 1
    }
}

impl FsmContext for MovieListContext {
    fn describe(&self) -> String {
        format!(
            "movie_list(page={}/{}, movies={}, mode={:?})",
            self.current_page,
            self.total_page,
            self.movies.len(),
            self.mode
        )
    }
}

#[derive(Clone, Debug, EventVariant)]
pub enum MovieListEvent {
    FetchMovies { page: u32 },
    FetchNowPlaying { page: u32 },
    FetchTopRated { page: u32 },
    SearchMovies { query: String, page: u32 },
    ClearSearch,
    /// Refetch the current selection at another page.
    ChangePage { page: u32 },
    FetchFavorites,
    CatalogPageLoaded {
        invocation: Invocation,
        output: GetMoviesResponse,
    },
    CatalogFailed {
        invocation: Invocation,
        error: ApiError,
    },
    FavoritesLoaded {
        invocation: Invocation,
        output: Vec<FavoriteMovie>,
    },
    FavoritesFailed {
        invocation: Invocation,
        error: ApiError,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    pub page: u32,
}

#[derive(Clone, Debug)]
pub enum MovieListAction {
    FetchMovies { invocation: Invocation, page: u32 },
    FetchNowPlaying { invocation: Invocation, page: u32 },
    FetchTopRated { invocation: Invocation, page: u32 },
    SearchMovies { invocation: Invocation, search: SearchQuery },
    FetchFavorites { invocation: Invocation },
}

#[async_trait::async_trait]
impl FsmAction for MovieListAction {
    type Event = MovieListEvent;
    type Actors = MovieListActors;

    fn invocation(&self) -> Option<&Invocation> {
        match self {
            MovieListAction::FetchMovies { invocation, .. }
            | MovieListAction::FetchNowPlaying { invocation, .. }
            | MovieListAction::FetchTopRated { invocation, .. }
            | MovieListAction::SearchMovies { invocation, .. }
            | MovieListAction::FetchFavorites { invocation } => Some(invocation),
        }
    }

    async fn execute(&self, actors: &MovieListActors) -> Option<MovieListEvent> {
        let (invocation, result) = match self {
            MovieListAction::FetchMovies { invocation, page } => {
                (*invocation, actors.fetch_movies.call(*page).await)
            }
            MovieListAction::FetchNowPlaying { invocation, page } => {
                (*invocation, actors.fetch_now_playing.call(*page).await)
            }
            MovieListAction::FetchTopRated { invocation, page } => {
                (*invocation, actors.fetch_top_rated.call(*page).await)
            }
            MovieListAction::SearchMovies { invocation, search } => {
                (*invocation, actors.search_movies.call(search.clone()).await)
            }
            MovieListAction::FetchFavorites { invocation } => {
                let invocation = *invocation;
                return Some(match actors.fetch_favorites.call(()).await {
                    Ok(output) => MovieListEvent::FavoritesLoaded { invocation, output },
                    Err(error) => MovieListEvent::FavoritesFailed { invocation, error },
                });
            }
        };

        Some(match result {
            Ok(output) => MovieListEvent::CatalogPageLoaded { invocation, output },
            Err(error) => MovieListEvent::CatalogFailed { invocation, error },
        })
    }
}

#[derive(Clone, Debug)]
pub struct MovieListActors {
    pub fetch_movies: Actor<u32, GetMoviesResponse>,
    pub fetch_now_playing: Actor<u32, GetMoviesResponse>,
    pub fetch_top_rated: Actor<u32, GetMoviesResponse>,
    pub search_movies: Actor<SearchQuery, GetMoviesResponse>,
    pub fetch_favorites: Actor<(), Vec<FavoriteMovie>>,
}

impl Default for MovieListActors {
    fn default() -> Self {
        Self {
            fetch_movies: Actor::unbound(FETCH_MOVIES),
            fetch_now_playing: Actor::unbound(FETCH_NOW_PLAYING),
            fetch_top_rated: Actor::unbound(FETCH_TOP_RATED),
            search_movies: Actor::unbound(SEARCH_MOVIES),
            fetch_favorites: Actor::unbound(FETCH_FAVORITES),
        }
    }
}

impl MovieListActors {
    pub fn with_fetch_movies<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(u32) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<GetMoviesResponse, ApiError>> + Send + 'static,
    {
        self.fetch_movies = Actor::from_fn(FETCH_MOVIES, f);
        self
    }

    pub fn with_fetch_now_playing<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(u32) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<GetMoviesResponse, ApiError>> + Send + 'static,
    {
        self.fetch_now_playing = Actor::from_fn(FETCH_NOW_PLAYING, f);
        self
    }

    pub fn with_fetch_top_rated<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(u32) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<GetMoviesResponse, ApiError>> + Send + 'static,
    {
        self.fetch_top_rated = Actor::from_fn(FETCH_TOP_RATED, f);
        self
    }

    pub fn with_search_movies<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(SearchQuery) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<GetMoviesResponse, ApiError>> + Send + 'static,
    {
        self.search_movies = Actor::from_fn(SEARCH_MOVIES, f);
        self
    }

    pub fn with_fetch_favorites<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(()) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<FavoriteMovie>, ApiError>> + Send + 'static,
    {
        self.fetch_favorites = Actor::from_fn(FETCH_FAVORITES, f);
        self
    }

    /// Wire the catalog slots to `catalog` and the favorites slot to the signed-in user's
    /// favorites. Nobody signed in means no favorites.
    pub fn bind(
        catalog: Arc<dyn MovieCatalog>,
        favorites: Arc<FavoritesRepository>,
        provider: Arc<dyn AuthProvider>,
    ) -> Self {
        let popular = Arc::clone(&catalog);
        let now_playing = Arc::clone(&catalog);
        let top_rated = Arc::clone(&catalog);
        let search = catalog;

        Self::default()
            .with_fetch_movies(move |page| {
                let catalog = Arc::clone(&popular);
                async move { catalog.discover(page, SortBy::PopularityDesc).await }
            })
            .with_fetch_now_playing(move |page| {
                let catalog = Arc::clone(&now_playing);
                async move { catalog.now_playing(page).await }
            })
            .with_fetch_top_rated(move |page| {
                let catalog = Arc::clone(&top_rated);
                async move { catalog.top_rated(page).await }
            })
            .with_search_movies(move |search_query: SearchQuery| {
                let catalog = Arc::clone(&search);
                async move { catalog.search(&search_query.query, search_query.page).await }
            })
            .with_fetch_favorites(move |()| {
                let favorites = Arc::clone(&favorites);
                let user = provider.current_user();
                async move {
                    match user {
                        Some(user) => favorites.list(&user.uid).await,
                        None => {
                            debug!("no signed-in user, favorites list is empty");
                            Ok(Vec::new())
                        }
                    }
                }
            })
    }
}

pub type MovieListMachine =
    StateMachine<MovieListState, MovieListEvent, MovieListContext, MovieListAction>;
pub type MovieListService = Service<MovieListState, MovieListEvent, MovieListContext, MovieListAction>;

type ListTransition = Transition<MovieListState, MovieListAction>;

fn browse_category(category: Category, page: u32, ctx: &mut MovieListContext) -> ListTransition {
    ctx.category = category;
    ctx.search_query = None;
    goto(category.fetching(page))
}

fn catalog_loaded(
    _state: &MovieListState,
    event: &MovieListEvent,
    ctx: &mut MovieListContext,
) -> ListTransition {
    if let MovieListEvent::CatalogPageLoaded { output, .. } = event {
        ctx.movies = output.results.clone();
        ctx.total_page = output.total_pages;
        ctx.current_page = output.page;
        ctx.mode = ListMode::Catalog;
        ctx.error = None;
    }
    goto(MovieListState::Idle)
}

fn catalog_failed(
    _state: &MovieListState,
    event: &MovieListEvent,
    ctx: &mut MovieListContext,
) -> ListTransition {
    if let MovieListEvent::CatalogFailed { error, .. } = event {
        ctx.error = Some(error.clone());
    }
    goto(MovieListState::Idle)
}

pub fn machine() -> FsmResult<MovieListMachine> {
    let builder: FsmBuilder<MovieListState, MovieListEvent, MovieListContext, MovieListAction> =
        FsmBuilder::new(MovieListState::Idle);
    let mut builder = builder
        .from_any()
        .on("FetchMovies", |_state, event, ctx: &mut MovieListContext| {
            let page = match event {
                MovieListEvent::FetchMovies { page } => *page,
                _ => 1,
            };
            browse_category(Category::Popular, page, ctx)
        })
        .on("FetchNowPlaying", |_state, event, ctx| {
            let page = match event {
                MovieListEvent::FetchNowPlaying { page } => *page,
                _ => 1,
            };
            browse_category(Category::NowPlaying, page, ctx)
        })
        .on("FetchTopRated", |_state, event, ctx| {
            let page = match event {
                MovieListEvent::FetchTopRated { page } => *page,
                _ => 1,
            };
            browse_category(Category::TopRated, page, ctx)
        })
        .on("SearchMovies", |_state, event, ctx| {
            if let MovieListEvent::SearchMovies { query, .. } = event {
                ctx.search_query = Some(query.clone());
            }
            let page = match event {
                MovieListEvent::SearchMovies { page, .. } => *page,
                _ => 1,
            };
            goto(ctx.selection(page))
        })
        .on("ClearSearch", |_state, _event, ctx| {
            ctx.search_query = None;
            goto(ctx.category.fetching(1))
        })
        .on("ChangePage", |_state, event, ctx| {
            let page = match event {
                MovieListEvent::ChangePage { page } => *page,
                _ => ctx.current_page,
            };
            goto(ctx.selection(page))
        })
        .on("FetchFavorites", |_state, _event, _ctx| {
            goto(MovieListState::FetchingFavorites)
        })
        .done()
        .when("FetchingPopular")
        .invoke(FETCH_MOVIES, |state, ctx: &MovieListContext, invocation| {
            MovieListAction::FetchMovies {
                invocation,
                page: state.page().unwrap_or(ctx.current_page),
            }
        })
        .done()
        .when("FetchingNowPlaying")
        .invoke(FETCH_NOW_PLAYING, |state, ctx: &MovieListContext, invocation| {
            MovieListAction::FetchNowPlaying {
                invocation,
                page: state.page().unwrap_or(ctx.current_page),
            }
        })
        .done()
        .when("FetchingTopRated")
        .invoke(FETCH_TOP_RATED, |state, ctx: &MovieListContext, invocation| {
            MovieListAction::FetchTopRated {
                invocation,
                page: state.page().unwrap_or(ctx.current_page),
            }
        })
        .done()
        .when("Searching")
        .invoke(SEARCH_MOVIES, |state, ctx: &MovieListContext, invocation| {
            let search = match state {
                MovieListState::Searching { query, page } => SearchQuery {
                    query: query.clone(),
                    page: *page,
                },
                _ => SearchQuery {
                    query: ctx.search_query.clone().unwrap_or_default(),
                    page: ctx.current_page,
                },
            };
            MovieListAction::SearchMovies { invocation, search }
        })
        .done()
        .when("FetchingFavorites")
        .invoke(FETCH_FAVORITES, |_state, _ctx, invocation| {
            MovieListAction::FetchFavorites { invocation }
        })
        .on("FavoritesLoaded", |_state, event, ctx| {
            if let MovieListEvent::FavoritesLoaded { output, .. } = event {
                ctx.movies = output.iter().map(|favorite| favorite.movie.clone()).collect();
                ctx.total_page = 1;
                ctx.current_page = 1;
                ctx.mode = ListMode::Favorites;
                ctx.error = None;
            }
            goto(MovieListState::Idle)
        })
        .on("FavoritesFailed", |_state, event, ctx| {
            if let MovieListEvent::FavoritesFailed { error, .. } = event {
                ctx.error = Some(error.clone());
            }
            goto(MovieListState::Idle)
        })
        .done();

    for path in CATALOG_STATES {
        builder = builder
            .when(path)
            .on("CatalogPageLoaded", catalog_loaded)
            .on("CatalogFailed", catalog_failed)
            .done();
    }

    builder
        .when_unhandled(|state, event| {
            debug!(state = %state.state_path(), event = event.variant_name(), "movie list event ignored");
        })
        .build()
}

pub fn service(actors: MovieListActors) -> FsmResult<MovieListService> {
    Ok(Service::new(machine()?, MovieListContext::default(), actors))
}
