//! Replicate video generation pipeline.
//!
//! A request flows through [`adapter`] (generic request to provider input),
//! [`client`] (prediction submission), [`poller`] (bounded status polling and
//! artifact download) and [`fanout`] (one job per prompt, aggregated).

pub mod adapter;
pub mod client;
pub mod fanout;
pub mod naming;
pub mod poller;
pub mod summary;

pub use adapter::{AdaptedInput, GenerationRequest, adapt};
pub use client::{Prediction, PredictionStatus, ReplicateClient};
pub use fanout::{AggregateResult, AggregateStatus, PromptOutcome, run_all};
pub use poller::{PollSettings, SavedArtifact, await_completion};
