// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! Injectable asynchronous units of work.
//!
//! Machine definitions only name their actor slots. Hosts fill the slots when they build
//! a service, either with real clients or with fakes that resolve deterministically.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::error;

use crate::api_error::ApiError;
use crate::types::BoxFuture;

type ActorFn<I, O> = Arc<dyn Fn(I) -> BoxFuture<'static, Result<O, ApiError>> + Send + Sync>;

/// One actor slot: an async function from `I` to `O` that fails with [`ApiError`].
pub struct Actor<I, O> {
    slot: &'static str,
    run: Option<ActorFn<I, O>>,
}

impl<I, O> Actor<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// A placeholder that fails with `UNKNOWN_ERROR` if it is ever invoked.
    pub fn unbound(slot: &'static str) -> Self {
        Self { slot, run: None }
    }

    pub fn from_fn<F, Fut>(slot: &'static str, f: F) -> Self
    where
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, ApiError>> + Send + 'static,
    {
        Self {
            slot,
            run: Some(Arc::new(move |input| Box::pin(f(input)))),
        }
    }

    pub fn slot(&self) -> &'static str {
        self.slot
    }

    pub fn is_bound(&self) -> bool {
        self.run.is_some()
    }

    pub async fn call(&self, input: I) -> Result<O, ApiError> {
        match &self.run {
            Some(run) => run(input).await,
            None => {
                error!(slot = self.slot, "actor invoked without an implementation");
                Err(ApiError::unknown(format!(
                    "actor `{}` has no implementation bound",
                    self.slot
                )))
            }
        }
    }
}

impl<I, O> Clone for Actor<I, O> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot,
            run: self.run.clone(),
        }
    }
}

impl<I, O> fmt::Debug for Actor<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("slot", &self.slot)
            .field("bound", &self.run.is_some())
            .finish()
    }
}
