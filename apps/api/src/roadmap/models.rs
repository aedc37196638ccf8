use serde::{Deserialize, Serialize};

/// Subtitle used whenever the model does not supply one.
pub const DEFAULT_SUBTITLE: &str = "Your personalized career roadmap is ready.";

/// One ordered stage of a roadmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub topics: Vec<String>,
}

/// A structured career roadmap recovered from assistant output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapData {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub skills: Vec<String>,
    pub tools: Vec<String>,
    pub phases: Vec<Phase>,
}

impl Phase {
    pub fn new(name: impl Into<String>, topics: Vec<String>) -> Self {
        Self {
            name: name.into(),
            duration: None,
            topics,
        }
    }
}
