//! Wire-level pieces shared by the providers: SSE framing and the tool
//! declaration dialects.

pub mod cohere;
pub mod json;
pub mod sse;
pub mod tools;

pub use sse::{DONE_SENTINEL, EventPatch, SseFrameBuffer, SseReframer, reframe_frame};
pub use tools::{DeclarationsTool, FunctionDeclaration, FunctionTool};
