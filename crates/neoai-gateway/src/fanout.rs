// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stream tee between the client response body and the reply accumulator.
//!
//! One background pump drains the upstream. Each chunk is appended to the
//! accumulator buffer and pushed to the client over an unbounded channel, so
//! a client that stops reading never holds back the upstream read. When the
//! client goes away the pump keeps draining, so the upstream is never
//! cancelled by a disconnect. The client channel is closed before the
//! completion hook runs, so persistence never holds back the response.

use std::convert::Infallible;
use std::future::Future;

use axum::body::Bytes;
use futures::{Stream, StreamExt};
use neoai_core::{BackgroundTasks, NeoaiError, TokenStream};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// What the accumulator saw by the time the upstream finished.
#[derive(Debug)]
pub struct Completed {
    pub text: String,
    /// Set when the upstream ended with an error instead of cleanly.
    pub error: Option<NeoaiError>,
    /// False if the client stopped reading before the end.
    pub client_connected: bool,
}

/// Fork `upstream` into a client body stream and a tracked accumulator task.
///
/// `on_complete` receives the full text after the upstream ends.
pub fn tee<F, Fut>(
    upstream: TokenStream,
    tasks: &BackgroundTasks,
    on_complete: F,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static
where
    F: FnOnce(Completed) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), NeoaiError>> + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    tasks.spawn("stream_accumulator", async move {
        let completed = pump(upstream, tx).await;
        on_complete(completed).await
    });
    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (Ok(chunk), rx))
    })
}

async fn pump(mut upstream: TokenStream, tx: mpsc::UnboundedSender<Bytes>) -> Completed {
    let mut client = Some(tx);
    let mut buffer = Vec::new();
    let mut error = None;

    while let Some(item) = upstream.next().await {
        match item {
            Ok(chunk) => {
                buffer.extend_from_slice(&chunk);
                if let Some(tx) = &client
                    && tx.send(chunk).is_err()
                {
                    debug!("client disconnected, draining upstream for persistence");
                    client = None;
                }
            }
            Err(e) => {
                warn!(error_id = e.error_id(), code = e.code(), "upstream stream ended with an error");
                error = Some(e);
                break;
            }
        }
    }

    Completed {
        text: String::from_utf8_lossy(&buffer).into_owned(),
        error,
        client_connected: client.is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use neoai_core::{BackendAdapter, BackendChatRequest, BackendId, ChatMessage, Role};
    use neoai_test_utils::MockBackend;
    use tokio::sync::oneshot;

    async fn upstream(backend: MockBackend) -> TokenStream {
        backend
            .chat(BackendChatRequest {
                model: "m1".into(),
                messages: vec![ChatMessage::new(Role::User, "hi")],
                temperature: 0.7,
                max_tokens: 16,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn client_and_accumulator_see_the_same_bytes() {
        let tasks = BackgroundTasks::new();
        let (done_tx, done_rx) = oneshot::channel();
        let body = tee(
            upstream(MockBackend::new(BackendId::Groq).with_chunks(["Hel", "lo", " wörld"])).await,
            &tasks,
            move |completed| async move {
                let _ = done_tx.send(completed);
                Ok(())
            },
        );

        let client: Vec<u8> = body
            .map(|chunk| chunk.unwrap().to_vec())
            .concat()
            .await;
        let completed = done_rx.await.unwrap();
        assert_eq!(client, completed.text.as_bytes());
        assert_eq!(completed.text, "Hello wörld");
        assert!(completed.client_connected);
        assert!(completed.error.is_none());
    }

    #[tokio::test]
    async fn mid_stream_error_ends_client_stream_and_keeps_partial_text() {
        let tasks = BackgroundTasks::new();
        let (done_tx, done_rx) = oneshot::channel();
        let body = tee(
            upstream(
                MockBackend::new(BackendId::Groq)
                    .with_chunks(["partial"])
                    .failing_mid_stream("connection reset"),
            )
            .await,
            &tasks,
            move |completed| async move {
                let _ = done_tx.send(completed);
                Ok(())
            },
        );

        let chunks: Vec<_> = body.collect().await;
        assert_eq!(chunks.len(), 1);
        let completed = done_rx.await.unwrap();
        assert_eq!(completed.text, "partial");
        assert!(completed.error.is_some());
    }

    #[tokio::test]
    async fn dropped_client_does_not_stop_the_accumulator() {
        let tasks = BackgroundTasks::new();
        let (done_tx, done_rx) = oneshot::channel();
        let chunks: Vec<String> = (0..40).map(|i| format!("{i},")).collect();
        let expected: String = chunks.concat();
        let mut body = Box::pin(tee(
            upstream(
                MockBackend::new(BackendId::Groq)
                    .with_chunks(chunks)
                    .with_chunk_delay(Duration::from_millis(1)),
            )
            .await,
            &tasks,
            move |completed| async move {
                let _ = done_tx.send(completed);
                Ok(())
            },
        ));

        let first = body.next().await.unwrap().unwrap();
        assert_eq!(first.as_ref(), b"0,");
        drop(body);

        let completed = done_rx.await.unwrap();
        assert_eq!(completed.text, expected);
        assert!(!completed.client_connected);
        tasks.drain().await;
    }

    #[tokio::test]
    async fn stalled_client_does_not_hold_back_the_accumulator() {
        let tasks = BackgroundTasks::new();
        let (done_tx, done_rx) = oneshot::channel();
        let chunks: Vec<String> = (0..40).map(|i| format!("{i},")).collect();
        let expected: String = chunks.concat();
        let mut body = Box::pin(tee(
            upstream(MockBackend::new(BackendId::Groq).with_chunks(chunks)).await,
            &tasks,
            move |completed| async move {
                let _ = done_tx.send(completed);
                Ok(())
            },
        ));

        let first = body.next().await.unwrap().unwrap();
        assert_eq!(first.as_ref(), b"0,");

        // Body stays alive but is never polled again.
        let completed = tokio::time::timeout(Duration::from_secs(2), done_rx)
            .await
            .expect("accumulator finished while the client was idle")
            .unwrap();
        assert_eq!(completed.text, expected);
        assert!(completed.client_connected);

        let rest: Vec<u8> = body.map(|c| c.unwrap().to_vec()).concat().await;
        assert_eq!([first.to_vec(), rest].concat(), expected.as_bytes());
        tasks.drain().await;
    }

    #[tokio::test]
    async fn completion_failure_does_not_affect_client() {
        let tasks = BackgroundTasks::new();
        let body = tee(
            upstream(MockBackend::new(BackendId::Groq).with_chunks(["ok"])).await,
            &tasks,
            |_| async { Err(NeoaiError::internal("disk full")) },
        );
        let client: Vec<u8> = body.map(|c| c.unwrap().to_vec()).concat().await;
        assert_eq!(client, b"ok");
        tasks.drain().await;
    }
}
