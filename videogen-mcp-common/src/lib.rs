//! Video generation MCP common library
//!
//! Shared configuration, error taxonomy, the video model registry, object
//! storage uploads, transport selection and tracing for the video generation
//! MCP server.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod storage;
pub mod tracing;
pub mod transport;


pub use config::Config;
pub use error::{ConfigError, Error, Result, StorageError};
pub use models::{DefaultParam, ModelMode, ModelRegistry, VIDEO_MODELS, VideoModel};
pub use server::{McpServerBuilder, ServerError, shutdown_channel};
pub use storage::{SupabaseStorage, is_local_path};
pub use transport::{Transport, TransportArgs, TransportMode};
