// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! The four application machines.
//!
//! Each module exposes its state, event, context and action types, an `*Actors` struct of
//! injectable slots, `machine()` and `service(actors)`. Events a state does not accept are
//! ignored.

pub mod auth;
pub mod favorites;
pub mod movie_detail;
pub mod movie_list;
