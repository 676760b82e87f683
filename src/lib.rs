//! nlq - a streaming client for a natural-language-to-SQL query service
//!
//! The service answers questions by generating and executing SQL, streaming
//! its progress as server-sent events. This crate decodes that stream
//! incrementally ([`sse`]), accumulates a monotonically-improving view of
//! the query ([`session`]), and wraps the HTTP surface ([`client`]). The
//! binary in `main.rs` is a thin console frontend over the same API.

pub mod client;
pub mod error;
pub mod history;
pub mod models;
pub mod rows;
pub mod session;
pub mod sse;
pub mod stage;

pub use client::{EventStream, QueryClient, DEFAULT_BASE_URL};
pub use error::{ClientError, CoercionError, ParseFailure, SessionError};
pub use session::{
    cancel_channel, drive, CancelHandle, CancelToken, SessionOutcome, SessionState, StreamHandler,
    StreamSession,
};
pub use sse::{classify, classify_response, FrameDecoder, QueryEvent, ResultPayload};
