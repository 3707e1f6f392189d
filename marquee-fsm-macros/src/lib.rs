// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Proc-macro helpers for `marquee-fsm`.
//!
//! This crate is an implementation detail of `marquee-fsm`. End users should depend on
//! `marquee-fsm` and use the re-exported derives from that crate:
//! - `#[derive(marquee_fsm::StateVariant)]`
//! - `#[derive(marquee_fsm::EventVariant)]`

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod attrs;
mod codegen;

/// Derive `::marquee_fsm::StateVariant` for an enum.
///
/// Variant attributes:
/// - `#[fsm(tag = "loading")]` attaches a tag to the variant (repeatable).
/// - `#[fsm(nested)]` marks a single-field tuple variant whose payload is itself a
///   `StateVariant`. Its path becomes `Outer.Inner` and tag queries descend into it.
///
/// ```rust,ignore
/// #[derive(Clone, Debug, PartialEq, marquee_fsm::StateVariant)]
/// enum LoginForm {
///     Idle,
///     #[fsm(tag = "loading")]
///     LoggingIn,
/// }
///
/// #[derive(Clone, Debug, PartialEq, marquee_fsm::StateVariant)]
/// enum AuthState {
///     AwaitingCheck,
///     #[fsm(nested)]
///     ShowingLogin(LoginForm),
/// }
/// ```
#[proc_macro_derive(StateVariant, attributes(fsm))]
pub fn derive_state_variant(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match codegen::expand_state_variant(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derive `::marquee_fsm::EventVariant` for an enum.
///
/// The generated `variant_name()` returns the variant identifier, ignoring any payload.
/// Variants with a named `invocation` field are treated as actor lifecycle events and
/// report it from `invocation()`.
#[proc_macro_derive(EventVariant)]
pub fn derive_event_variant(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match codegen::expand_event_variant(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
