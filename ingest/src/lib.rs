//! Turns the HN thread index into a categorized [`trends_core::Dataset`].
//!
//! Flow: [`classifier`] picks thread ids per category, [`batch`] drains them
//! through the [`fetcher`] (backed by the on-disk [`cache`]), and
//! [`assembler`] runs all four categories side by side.

pub mod assembler;
pub mod batch;
pub mod cache;
pub mod classifier;
pub mod fetcher;
pub mod normalize;

pub use assembler::DatasetAssembler;
pub use batch::BatchRunner;
pub use cache::PostCache;
pub use classifier::{classify, ClassificationRule};
pub use fetcher::{FetchMode, PostFetcher};
