//! Application layer - Use cases and orchestration.
//!
//! Services depend on domain ports (traits) rather than concrete
//! infrastructure, so the remote embedding and chat APIs can be swapped
//! for local fakes in tests.

pub mod services;

pub use services::{DocumentService, IngestReport, PromptTemplate, QaService, RagService};
