// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Records decoded from the catalog, the identity provider and the favorites store.

pub mod movie;
pub mod user;

pub use movie::{
    FavoriteMovie, Genre, GetMoviesResponse, Movie, MovieDetail, MovieId, SortBy, Video, VideoList,
};
pub use user::{LoginRequest, LoginResponse, RegisterRequest, User};
