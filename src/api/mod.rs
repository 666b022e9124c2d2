mod client;
mod error;
mod types;

pub use client::{parse_base_url, ProcessorClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::ApiError;
pub use types::{Ack, LatestBatch, SavedFile};
