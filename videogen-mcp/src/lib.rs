//! Video generation MCP server library
//!
//! Exposes Replicate-backed video generation, FFmpeg-backed editing tools and
//! Gemini-backed frame checks as MCP tools.

pub mod catalog;
pub mod generation;
pub mod handler;
pub mod media;
pub mod resources;
pub mod server;
pub mod vision;

pub use generation::{AggregateResult, AggregateStatus, GenerationRequest, PollSettings};
pub use handler::{VideoGenHandler, VideoGenerateParams};
pub use server::VideoGenServer;
