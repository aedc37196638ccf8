// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Instruction appended to every prompt whose output is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    CRITICAL: You MUST respond with ONLY a valid JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include any text before or after the JSON object.";
