// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Remote collaborators the actor bindings call into.

pub mod catalog;
pub mod favorites;
pub mod http;
pub mod identity;
pub mod store;

pub use catalog::{MovieCatalog, TmdbClient};
pub use favorites::FavoritesRepository;
pub use identity::{AuthProvider, AuthUser, IdentityToolkit, MemoryAuthProvider, ProviderError};
pub use store::{MemoryStore, RealtimeDatabase, RemoteStore, StoreError};
