mod client;

pub use client::{CoverApiClient, CoverError, CoverLookup, CoverOutcome, DEFAULT_COVER_PATH};
