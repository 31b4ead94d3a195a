// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod formatted_entry;
pub mod retrieval_result;

pub use formatted_entry::{
    ENTRY_SEPARATOR, FormattedEntry, NO_RESULTS_MESSAGE, RetrievalReport, SourceDescriptor,
};
pub use retrieval_result::{ResultLocation, RetrievalResult};
