//! RAG (Retrieval-Augmented Generation) question answering.
//!
//! Embeds the query, retrieves similar passages, and conditions generation on them.

pub mod context;
mod response;

pub use context::{assemble_context, ContextBuilder};
pub use response::{QueryAnswer, QueryPipeline};
