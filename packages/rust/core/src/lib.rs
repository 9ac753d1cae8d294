//! Pipeline orchestration for docbind.
//!
//! Ties fetching, scraping and rendering together into the `generate` and
//! `regenerate` workflows, and owns how artifacts land on disk.

pub mod assembler;
pub mod pipeline;

pub use pipeline::{
    GenerateConfig, GenerateResult, InputSource, ProgressReporter, RegenerateConfig,
    SilentProgress, generate, load_snapshot, regenerate, scrape_html,
};
