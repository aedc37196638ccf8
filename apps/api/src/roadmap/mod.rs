// Roadmaps: extraction from assistant output and the saved-roadmap store.

pub mod extractor;
pub mod handlers;
pub mod models;
pub mod storage;
