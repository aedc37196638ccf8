//! Request intent: decides whether a chat message asks for a roadmap and what the goal is.

use once_cell::sync::Lazy;
use regex::Regex;

static ROADMAP_REQUEST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)roadmap|learning path|career path|how to become|guide.*to.*become")
        .expect("roadmap request pattern is valid")
});

static BECOME_GOAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bbecome\s+(?:an?\s+)?(.+?)(?:\.|$)").expect("become pattern is valid")
});

static FOR_TO_GOAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:for|to)\s+(?:a\s+)?(.+?)(?:\.|$)").expect("goal pattern is valid")
});

pub fn is_roadmap_request(message: &str) -> bool {
    ROADMAP_REQUEST.is_match(message)
}

/// Extracts the career goal from a request, falling back to the whole message.
pub fn extract_goal(message: &str) -> String {
    [&*BECOME_GOAL, &*FOR_TO_GOAL]
        .iter()
        .find_map(|re| re.captures(message))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|goal| !goal.is_empty())
        .unwrap_or_else(|| message.trim())
        .to_string()
}
