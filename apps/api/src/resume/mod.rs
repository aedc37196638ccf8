// Resume analysis: PDF text extraction plus structured LLM feedback.

pub mod analysis;
pub mod handlers;
pub mod prompts;
