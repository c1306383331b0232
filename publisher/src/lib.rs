//! Publishes assembled datasets as JSON artifacts to object storage
//! (Cloudflare R2, S3, a local directory, or memory).

pub mod publish;
pub mod store;

pub use publish::{PublishReport, PublishedArtifact, Publisher, FULL_DATA_KEY, SMALL_DATA_KEY};
pub use store::build_store;
