// SPDX-License-Identifier: MIT OR Apache-2.0
// SPDX-FileCopyrightText: 2025-2026 Marquee Contributors

//! JSON-over-HTTP plumbing shared by the REST clients.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api_error::ApiError;
use crate::validate::{decode, Validate};

/// Send `request` and decode a validated `T` from a 2xx response.
///
/// Non-2xx responses become `FETCH_ERROR` carrying the status and the body text;
/// transport failures become `FETCH_ERROR` without a status.
pub async fn fetch_json<T>(request: reqwest::RequestBuilder) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let response = request.send().await?;
    let status = response.status().as_u16();
    let body = response.bytes().await?;
    debug!(status, bytes = body.len(), "received response");
    decode_response(status, &body)
}

/// Status and body handling behind [`fetch_json`].
pub fn decode_response<T>(status: u16, body: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    if !(200..300).contains(&status) {
        return Err(ApiError::fetch(
            String::from_utf8_lossy(body).into_owned(),
            Some(status),
        ));
    }
    decode(body)
}
