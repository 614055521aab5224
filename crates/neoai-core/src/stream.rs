// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-Sent Events normalization shared by every backend adapter.
//!
//! Upstreams emit event streams whose `data:` payloads are shaped differently.
//! [`normalize_sse`] buffers partial lines, splits the byte stream into
//! complete records via `eventsource-stream`, and hands each record's data to
//! a backend-specific extractor that returns only the incremental text delta.
//! Records the extractor cannot make sense of are skipped, so one corrupt
//! chunk never aborts an otherwise good generation.

use bytes::Bytes;
use eventsource_stream::{EventStreamError, Eventsource};
use futures::stream::{Stream, StreamExt};
use tracing::debug;

use crate::backend::TokenStream;
use crate::error::NeoaiError;

/// Convert a raw upstream byte stream into a [`TokenStream`].
///
/// `extract` receives each record's `data` field and returns the text delta,
/// or `None` for records to skip (keep-alives, `[DONE]`, malformed JSON).
/// Empty deltas are dropped. A transport error is forwarded as a
/// `BackendError` item attributed to `backend`.
pub fn normalize_sse<S, B, E, F>(source: S, backend: &'static str, extract: F) -> TokenStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
    F: Fn(&str) -> Option<String> + Send + Sync + 'static,
{
    let mapped = source.eventsource().filter_map(move |result| {
        let item = match result {
            Ok(event) => extract(&event.data)
                .filter(|delta| !delta.is_empty())
                .map(|delta| Ok(Bytes::from(delta))),
            Err(EventStreamError::Transport(e)) => Some(Err(NeoaiError::backend_error(
                backend,
                format!("stream interrupted: {e}"),
            ))),
            Err(e) => {
                debug!(backend, error = %e, "skipping unparseable event record");
                None
            }
        };
        futures::future::ready(item)
    });

    Box::pin(mapped)
}

/// Parse `data` as JSON and apply `pick`, returning `None` for anything malformed.
pub fn json_delta<T, P>(data: &str, pick: P) -> Option<String>
where
    T: serde::de::DeserializeOwned,
    P: FnOnce(T) -> Option<String>,
{
    serde_json::from_str::<T>(data).ok().and_then(pick)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use serde_json::Value;

    fn chunks(parts: &[&str]) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
        let owned: Vec<Result<Bytes, std::io::Error>> = parts
            .iter()
            .map(|p| Ok(Bytes::from(p.to_string())))
            .collect();
        stream::iter(owned)
    }

    fn text_field(data: &str) -> Option<String> {
        json_delta::<Value, _>(data, |v| v["text"].as_str().map(str::to_string))
    }

    async fn collect(stream: TokenStream) -> Vec<Result<String, String>> {
        stream
            .map(|item| {
                item.map(|b| String::from_utf8_lossy(&b).into_owned())
                    .map_err(|e| e.to_string())
            })
            .collect()
            .await
    }

    #[tokio::test]
    async fn extracts_deltas_in_order() {
        let source = chunks(&[
            "data: {\"text\":\"Hel\"}\n\n",
            "data: {\"text\":\"lo\"}\n\n",
        ]);
        let out = collect(normalize_sse(source, "Test", text_field)).await;
        assert_eq!(out, vec![Ok("Hel".to_string()), Ok("lo".to_string())]);
    }

    #[tokio::test]
    async fn buffers_records_split_across_chunks() {
        let source = chunks(&["data: {\"te", "xt\":\"a\"}\n", "\ndata: {\"text\":\"b\"}\n\n"]);
        let out = collect(normalize_sse(source, "Test", text_field)).await;
        assert_eq!(out, vec![Ok("a".to_string()), Ok("b".to_string())]);
    }

    #[tokio::test]
    async fn malformed_record_is_skipped_without_ending_stream() {
        let source = chunks(&[
            "data: {\"text\":\"one \"}\n\n",
            "data: {not json at all\n\n",
            "data: [DONE-ish]\n\n",
            "data: {\"text\":\"two\"}\n\n",
        ]);
        let out = collect(normalize_sse(source, "Test", text_field)).await;
        let joined: String = out.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(joined, "one two");
    }

    #[tokio::test]
    async fn empty_deltas_are_dropped() {
        let source = chunks(&["data: {\"text\":\"\"}\n\n", "data: {\"text\":\"x\"}\n\n"]);
        let out = collect(normalize_sse(source, "Test", text_field)).await;
        assert_eq!(out, vec![Ok("x".to_string())]);
    }

    #[tokio::test]
    async fn data_without_space_after_colon_is_parsed() {
        let source = chunks(&["data:{\"text\":\"tight\"}\n\n"]);
        let out = collect(normalize_sse(source, "Test", text_field)).await;
        assert_eq!(out, vec![Ok("tight".to_string())]);
    }

    #[tokio::test]
    async fn transport_error_surfaces_as_backend_error() {
        let items: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"data: {\"text\":\"ok\"}\n\n")),
            Err(std::io::Error::other("connection reset")),
        ];
        let mut stream = normalize_sse(stream::iter(items), "Groq", text_field);
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(&first[..], b"ok");
        let err = stream.next().await.unwrap().unwrap_err();
        assert_eq!(err.code(), "AI_PROVIDER_ERROR");
        assert!(err.to_string().contains("connection reset"));
    }
}
