// Career chat: streamed replies from the AI gateway, aggregated per request and
// run through the roadmap extractor when the user asked for a roadmap.

pub mod aggregator;
pub mod handlers;
pub mod intent;
pub mod models;
pub mod prompts;
