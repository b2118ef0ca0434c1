//! Built-in vendor adapters.
//!
//! This crate does not perform network IO. Each provider turns a
//! `DownstreamRequest` into an `UpstreamPlan` (vendor URL, headers, body and
//! relay mode); the core crate performs the call.

mod auth_extractor;
mod common;
mod providers;
mod registry;

pub use providers::{CodestralProvider, CohereProvider, GeminiProvider, GroqProvider};
pub use registry::register_builtin_providers;
