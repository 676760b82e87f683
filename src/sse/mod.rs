//! Query stream decoding and classification.
//!
//! The service streams query progress as server-sent-event style
//! `data: <json>` lines, terminated by a `data: [DONE]` sentinel or by
//! connection close.
//!
//! # Module structure
//! - `decoder` - byte-level framing ([`FrameDecoder`])
//! - `events` - event definitions ([`QueryEvent`], [`ResultPayload`])
//! - `classify` - frame-to-events rules ([`classify`], [`classify_response`])
//! - `payloads` - internal payload deserialization structs

mod classify;
mod decoder;
mod events;
mod payloads;

pub use classify::{classify, classify_response, strip_thinking_tags};
pub use decoder::FrameDecoder;
pub use events::{QueryEvent, ResultPayload};
