//! # Stok Bridge
//!
//! The request/response bridge binary: a thin orchestration layer that
//! exposes the store over JSON lines on stdio.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Stok Bridge                              │
//! │                                                                 │
//! │  stdin (one JSON request per line)                              │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  serve() ── parse line → Request (closed enum)                  │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  dispatch() ── exhaustive match over operations                 │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  stok-db: Store / repositories / backup / export                │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  stdout (one {"ok", "data"|"error"} envelope per line)          │
//! │                                                                 │
//! │  Logging goes to stderr: stdout is the protocol channel.        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`request`] - The operation enum and response envelope
//! - [`dispatch`] - One handler per operation
//! - [`dto`] - Response shapes with computed prices
//! - [`error`] - ApiError / error codes for the wire
//! - [`rates`] - Best-effort USD exchange-rate refresh

pub mod dispatch;
pub mod dto;
pub mod error;
pub mod rates;
pub mod request;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::warn;

use crate::error::ApiError;
use crate::request::{Envelope, Request};
use stok_db::Store;

/// Fallback envelope for the (unreachable in practice) case where the
/// response itself fails to serialize.
const SERIALIZE_FAILURE: &str =
    r#"{"ok":false,"error":{"code":"INTERNAL","message":"response serialization failed"}}"#;

/// Runs the request loop until the input ends.
///
/// Reads one JSON request per line, writes exactly one envelope per
/// line. A malformed line produces a `BAD_REQUEST` envelope instead of
/// tearing the loop down; only an I/O failure on the pipes ends it
/// early.
pub async fn serve<R, W>(store: &Store, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let envelope = match serde_json::from_str::<Request>(line) {
            Ok(request) => match dispatch::dispatch(store, request).await {
                Ok(data) => Envelope::success(data),
                Err(err) => Envelope::failure(err),
            },
            Err(err) => {
                warn!(%err, "unparseable request line");
                Envelope::failure(ApiError::bad_request(err.to_string()))
            }
        };

        let json = serde_json::to_string(&envelope)
            .unwrap_or_else(|_| SERIALIZE_FAILURE.to_string());
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stok_db::StoreOptions;

    async fn run_lines(input: &str) -> Vec<serde_json::Value> {
        let store = Store::open(StoreOptions::in_memory()).await.unwrap();
        let reader = tokio::io::BufReader::new(input.as_bytes());
        let mut output = Vec::new();
        serve(&store, reader, &mut output).await.unwrap();

        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_one_envelope_per_line() {
        let input = concat!(
            r#"{"op":"add_brand","name":"Acme"}"#,
            "\n",
            r#"{"op":"list_brands"}"#,
            "\n",
        );
        let responses = run_lines(input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["ok"], true);
        assert_eq!(responses[1]["data"][0]["name"], "Acme");
    }

    #[tokio::test]
    async fn test_malformed_line_does_not_end_the_loop() {
        let input = concat!(
            "this is not json\n",
            "\n", // blank lines are skipped
            r#"{"op":"list_brands"}"#,
            "\n",
        );
        let responses = run_lines(input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["ok"], false);
        assert_eq!(responses[0]["error"]["code"], "BAD_REQUEST");
        assert_eq!(responses[1]["ok"], true);
    }

    #[tokio::test]
    async fn test_domain_error_envelope() {
        let input = concat!(r#"{"op":"get_article","code":"ghost"}"#, "\n");
        let responses = run_lines(input).await;

        assert_eq!(responses[0]["ok"], false);
        assert_eq!(responses[0]["error"]["code"], "NOT_FOUND");
    }
}
