// SPDX-FileCopyrightText: 2026 Neoai Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! POST /api/chat, the streaming chat pipeline.
//!
//! Stages run in order and the first failure ends the request:
//! validation, quota, sensitive-content screening, model resolution,
//! conversation resolution, then the backend call. The resulting token
//! stream is teed to the response body and to the reply accumulator.

use axum::{
    Extension,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderValue, header},
    response::Response,
};
use neoai_core::{
    BackendChatRequest, CallerIdentity, ChatEnvelope, ChatMessage, NeoaiError, Role,
};
use neoai_storage::StoredMessage;
use neoai_storage::queries::{messages, sessions};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::fanout::tee;
use crate::handlers::parse_body;
use crate::persistence::{ReplyTarget, persist_reply};
use crate::request_log::RequestId;
use crate::server::{GatewayState, SESSION_ID_HEADER};

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 4_096;

/// A chat envelope that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidChat {
    pub message: String,
    pub model: String,
    pub session_id: Option<String>,
}

/// `32000` -> `32,000`.
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn validate(envelope: ChatEnvelope, max_chars: usize) -> Result<ValidChat, NeoaiError> {
    let message = envelope
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| NeoaiError::invalid_request("Message is required"))?;
    let model = envelope
        .model
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| NeoaiError::invalid_request("Model selection is required"))?;
    if message.chars().count() > max_chars {
        return Err(NeoaiError::invalid_request(format!(
            "Message too long (max {} characters)",
            group_thousands(max_chars)
        )));
    }
    Ok(ValidChat {
        message,
        model,
        session_id: envelope.session_id.filter(|s| !s.trim().is_empty()),
    })
}

/// System prompt, then stored history, then the new user turn.
pub fn assemble_prompt(
    system_prompt: &str,
    history: &[StoredMessage],
    message: &str,
) -> Vec<ChatMessage> {
    let mut prompt = Vec::with_capacity(history.len() + 2);
    prompt.push(ChatMessage::new(Role::System, system_prompt));
    for stored in history {
        match stored.role.parse::<Role>() {
            Ok(role) => prompt.push(ChatMessage::new(role, stored.content.as_str())),
            Err(_) => warn!(message_id = %stored.id, role = %stored.role, "skipping stored message with unknown role"),
        }
    }
    prompt.push(ChatMessage::new(Role::User, message));
    prompt
}

/// The caller's existing session, or a new one titled from the message.
async fn resolve_session(
    state: &GatewayState,
    caller: &CallerIdentity,
    chat: &ValidChat,
) -> Result<String, NeoaiError> {
    match &chat.session_id {
        Some(id) => {
            let session = sessions::get_session(&state.db, id, &caller.id)
                .await?
                .ok_or_else(|| NeoaiError::not_found("Session"))?;
            Ok(session.id)
        }
        None => {
            let title = sessions::generate_title(&chat.message);
            let session =
                sessions::create_session(&state.db, &caller.id, &chat.model, Some(&title)).await?;
            debug!(session_id = %session.id, "created session");
            Ok(session.id)
        }
    }
}

/// POST /api/chat
pub async fn post_chat(
    State(state): State<GatewayState>,
    Extension(caller): Extension<CallerIdentity>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let envelope: ChatEnvelope = parse_body(&body)?;
    let chat = validate(envelope, state.config.server.max_message_chars)?;

    state.quota.check_and_increment(&caller.id).await?;

    let scan = neoai_security::scan(&chat.message);
    if scan.has_detections {
        let kinds: Vec<String> = scan.detections.iter().map(|d| d.kind.to_string()).collect();
        warn!(request_id = %request_id, caller = %caller.id, ?kinds, "blocked message with sensitive content");
        return Err(NeoaiError::sensitive_content(scan.hints()).into());
    }

    let max_tokens = state
        .registry
        .resolve(&chat.model)?
        .max_output_tokens
        .min(DEFAULT_MAX_TOKENS);

    let session_id = resolve_session(&state, &caller, &chat).await?;
    let history =
        messages::get_messages(&state.db, &session_id, state.config.server.history_limit).await?;

    {
        let db = state.db.clone();
        let session_id = session_id.clone();
        let content = chat.message.clone();
        state.tasks.spawn("save_user_message", async move {
            messages::add_message(&db, &session_id, Role::User, &content, None, None)
                .await
                .map(|_| ())
        });
    }

    info!(
        request_id = %request_id,
        model = %chat.model,
        session_id = %session_id,
        message_chars = chat.message.chars().count(),
        history = history.len(),
        "chat request"
    );

    let upstream = state
        .registry
        .chat(BackendChatRequest {
            model: chat.model.clone(),
            messages: assemble_prompt(&state.config.server.system_prompt, &history, &chat.message),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens,
        })
        .await?;

    let target = ReplyTarget {
        db: state.db.clone(),
        session_id: session_id.clone(),
        caller_id: caller.id.clone(),
        model: chat.model,
    };
    let stream = tee(upstream, &state.tasks, move |completed| {
        persist_reply(target, completed)
    });

    let session_header = HeaderValue::from_str(&session_id)
        .map_err(|e| NeoaiError::internal(format!("invalid session id header: {e}")))?;
    let mut response = Response::new(Body::from_stream(stream));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(SESSION_ID_HEADER, session_header);
    Ok(response)
}
