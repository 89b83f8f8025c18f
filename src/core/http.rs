//! Response helpers shared by publishing and streaming.

use bytes::BytesMut;
use reqwest::Response;

use crate::core::error::{ClientError, Result};

/// Upper bound on how much of a non-streaming response body is read.
pub const MAX_RESPONSE_BYTES: usize = 4096;

/// Reads at most `limit` bytes of the body; the rest is left unread.
pub async fn read_capped(mut response: Response, limit: usize) -> Result<BytesMut> {
    let mut body = BytesMut::new();
    while body.len() < limit {
        match response.chunk().await? {
            Some(chunk) => {
                let take = chunk.len().min(limit - body.len());
                body.extend_from_slice(&chunk[..take]);
            }
            None => break,
        }
    }
    Ok(body)
}

/// Error for a non-success response, carrying its trimmed (capped) body.
pub async fn status_error(response: Response) -> ClientError {
    let status = response.status().as_u16();
    match read_capped(response, MAX_RESPONSE_BYTES).await {
        Ok(body) => ClientError::Server {
            status,
            message: String::from_utf8_lossy(&body).trim().to_owned(),
        },
        Err(err) => err,
    }
}
