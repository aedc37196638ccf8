//! Roadmap Extractor: recovers a structured `RoadmapData` from free-form assistant output.
//!
//! Tiers, each attempted only when the previous one fails:
//! 1. Strict JSON: first `{` to last `}`, parsed and required to carry non-empty
//!    skills, tools and phases.
//! 2. Markdown: a single pass over the lines classifying each as bullet, phase header or
//!    plain text, collecting skills, tools and phases from their sections.
//! 3. Defaults: any dimension the markdown pass left empty gets a fixed default list,
//!    provided at least one dimension was found.
//! 4. Otherwise `Extraction::NotFound`: the text is not a roadmap.
//!
//! Pure and synchronous; no tier ever returns an error.

use serde::Deserialize;
use tracing::debug;

use crate::llm_client::greedy_json_span;
use crate::roadmap::models::{Phase, RoadmapData, DEFAULT_SUBTITLE};

/// Skill and tool entries must be shorter than this many characters.
const MAX_ENTRY_CHARS: usize = 100;
/// Phase topics must be shorter than this many characters.
const MAX_TOPIC_CHARS: usize = 200;

const SKILL_HEADINGS: &[&str] = &["required skills", "skills to learn", "key skills"];
const TOOL_HEADINGS: &[&str] = &["tools", "technologies"];
const SKILL_SECTION_END: &[&str] = &["tools", "technologies", "phase"];
const TOOL_SECTION_END: &[&str] = &["phase", "roadmap"];

const BULLET_MARKERS: &[char] = &['-', '*', '•'];

const DEFAULT_SKILLS: &[&str] = &["Programming Fundamentals", "Problem Solving", "Communication"];
const DEFAULT_TOOLS: &[&str] = &["VS Code", "Git", "GitHub"];
const DEFAULT_PHASE_NAME: &str = "Phase 1: Foundation";
const DEFAULT_PHASE_TOPICS: &[&str] = &["Learn the basics", "Practice regularly"];

/// Outcome of an extraction attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Found(RoadmapData),
    /// Not a roadmap response. Callers render the text as a plain chat message.
    NotFound,
}

impl Extraction {
    pub fn into_option(self) -> Option<RoadmapData> {
        match self {
            Extraction::Found(roadmap) => Some(roadmap),
            Extraction::NotFound => None,
        }
    }
}

/// Extracts a roadmap from `text`, using `fallback_goal` as the title when none is given.
pub fn extract_roadmap(text: &str, fallback_goal: &str) -> Extraction {
    if let Some(roadmap) = from_json(text, fallback_goal) {
        debug!("Roadmap extracted from JSON ({} phases)", roadmap.phases.len());
        return Extraction::Found(roadmap);
    }

    let sections = scan_markdown(text);
    if sections.is_empty() {
        debug!("No roadmap structure found in {} chars of text", text.len());
        return Extraction::NotFound;
    }

    debug!(
        "Roadmap extracted from markdown: {} skills, {} tools, {} phases",
        sections.skills.len(),
        sections.tools.len(),
        sections.phases.len()
    );
    Extraction::Found(sections.into_roadmap(fallback_goal))
}

// ────────────────────────────────────────────────────────────────────────────
// Tier 1: strict JSON
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct JsonRoadmap {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default)]
    tools: Vec<String>,
    #[serde(default)]
    phases: Vec<Phase>,
}

fn from_json(text: &str, fallback_goal: &str) -> Option<RoadmapData> {
    let span = greedy_json_span(text)?;
    let parsed: JsonRoadmap = serde_json::from_str(span).ok()?;

    let phases: Vec<Phase> = parsed
        .phases
        .into_iter()
        .filter(|p| !p.topics.is_empty())
        .collect();

    if parsed.skills.is_empty() || parsed.tools.is_empty() || phases.is_empty() {
        return None;
    }

    Some(RoadmapData {
        title: non_empty(parsed.title).unwrap_or_else(|| fallback_goal.to_string()),
        subtitle: Some(non_empty(parsed.subtitle).unwrap_or_else(|| DEFAULT_SUBTITLE.to_string())),
        skills: parsed.skills,
        tools: parsed.tools,
        phases,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Tier 2: markdown line scan
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    NotStarted,
    Open,
    Closed,
}

#[derive(Debug, PartialEq, Eq)]
enum LineKind<'a> {
    Bullet(&'a str),
    /// `inline` is set when the phase mention follows other text on the line.
    PhaseHeader {
        number: &'a str,
        name: &'a str,
        inline: bool,
    },
    Text,
}

#[derive(Debug)]
struct Line<'a> {
    kind: LineKind<'a>,
    /// ASCII-lowercased text with bullet marker and leading `#`/emphasis removed.
    lower: String,
    is_markdown_heading: bool,
}

impl Line<'_> {
    /// A section opens on any text line mentioning one of `headings`, prose included.
    fn opens(&self, headings: &[&str]) -> bool {
        self.kind == LineKind::Text && headings.iter().any(|h| self.lower.contains(h))
    }

    /// Sections end at line-leading boundaries only; a phase mentioned mid-sentence
    /// does not close them.
    fn closes(&self, prefixes: &[&str]) -> bool {
        match self.kind {
            LineKind::PhaseHeader { inline: false, .. } => true,
            LineKind::Bullet(_) => false,
            LineKind::PhaseHeader { inline: true, .. } | LineKind::Text => {
                self.is_markdown_heading || prefixes.iter().any(|p| self.lower.starts_with(p))
            }
        }
    }
}

#[derive(Debug, Default)]
struct Sections {
    skills: Vec<String>,
    tools: Vec<String>,
    phases: Vec<Phase>,
}

impl Sections {
    fn is_empty(&self) -> bool {
        self.skills.is_empty() && self.tools.is_empty() && self.phases.is_empty()
    }

    fn into_roadmap(self, fallback_goal: &str) -> RoadmapData {
        RoadmapData {
            title: fallback_goal.to_string(),
            subtitle: Some(DEFAULT_SUBTITLE.to_string()),
            skills: or_default(self.skills, DEFAULT_SKILLS),
            tools: or_default(self.tools, DEFAULT_TOOLS),
            phases: if self.phases.is_empty() {
                vec![Phase::new(DEFAULT_PHASE_NAME, owned(DEFAULT_PHASE_TOPICS))]
            } else {
                self.phases
            },
        }
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn or_default(found: Vec<String>, defaults: &[&str]) -> Vec<String> {
    if found.is_empty() {
        owned(defaults)
    } else {
        found
    }
}

fn scan_markdown(text: &str) -> Sections {
    let mut sections = Sections::default();
    let mut skills_state = Section::NotStarted;
    let mut tools_state = Section::NotStarted;
    let mut current_phase: Option<Phase> = None;

    for raw in text.lines() {
        let line = classify(raw);

        skills_state = advance(
            skills_state,
            &line,
            SKILL_HEADINGS,
            SKILL_SECTION_END,
            &mut sections.skills,
            MAX_ENTRY_CHARS,
        );
        tools_state = advance(
            tools_state,
            &line,
            TOOL_HEADINGS,
            TOOL_SECTION_END,
            &mut sections.tools,
            MAX_ENTRY_CHARS,
        );

        match line.kind {
            LineKind::PhaseHeader { number, name, .. } => {
                sections.phases.extend(current_phase.take());
                let name = if name.is_empty() {
                    format!("Phase {number}")
                } else {
                    name.to_string()
                };
                current_phase = Some(Phase::new(name, Vec::new()));
            }
            LineKind::Bullet(body) => {
                if let Some(phase) = current_phase.as_mut() {
                    push_bounded(&mut phase.topics, body, MAX_TOPIC_CHARS);
                }
            }
            LineKind::Text => {}
        }
    }

    sections.phases.extend(current_phase);
    sections.phases.retain(|p| !p.topics.is_empty());
    sections
}

fn advance(
    state: Section,
    line: &Line<'_>,
    headings: &[&str],
    section_end: &[&str],
    entries: &mut Vec<String>,
    max_chars: usize,
) -> Section {
    match state {
        Section::NotStarted if line.opens(headings) => Section::Open,
        Section::Open if line.closes(section_end) => Section::Closed,
        Section::Open => {
            if let LineKind::Bullet(body) = line.kind {
                push_bounded(entries, body, max_chars);
            }
            Section::Open
        }
        other => other,
    }
}

fn push_bounded(entries: &mut Vec<String>, body: &str, max_chars: usize) {
    if !body.is_empty() && body.chars().count() < max_chars {
        entries.push(body.to_string());
    }
}

fn classify(raw: &str) -> Line<'_> {
    let trimmed = raw.trim();
    let bullet = bullet_body(trimmed);
    let heading = bullet
        .unwrap_or(trimmed)
        .trim_start_matches(|c: char| c == '#' || c == '*' || c == '_' || c.is_whitespace());
    let lower = heading.to_ascii_lowercase();

    let kind = if let Some((number, name)) = phase_header(heading) {
        LineKind::PhaseHeader {
            number,
            name,
            inline: false,
        }
    } else if let Some(body) = bullet {
        LineKind::Bullet(body)
    } else if let Some((number, name)) = inline_phase_header(heading, &lower) {
        LineKind::PhaseHeader {
            number,
            name,
            inline: true,
        }
    } else {
        LineKind::Text
    };

    Line {
        kind,
        lower,
        is_markdown_heading: trimmed.starts_with('#'),
    }
}

/// Finds the first `phase <digits>` inside a text line; the rest of the line is the name.
fn inline_phase_header<'a>(heading: &'a str, lower: &str) -> Option<(&'a str, &'a str)> {
    // `lower` is an ASCII lowercasing of `heading`, so byte offsets line up.
    lower
        .match_indices("phase")
        .find_map(|(at, _)| phase_header(&heading[at..]))
}

/// Returns the text after a bullet marker. `**bold**` and `---` are not bullets.
fn bullet_body(line: &str) -> Option<&str> {
    let mut chars = line.chars();
    let marker = chars.next()?;
    if !BULLET_MARKERS.contains(&marker) {
        return None;
    }
    let rest = chars.as_str();
    if marker != '•' && rest.starts_with(|c: char| c == '-' || c == '*') {
        return None;
    }
    Some(rest.trim())
}

/// Parses `phase <digits><name>` at the start of `heading`.
fn phase_header(heading: &str) -> Option<(&str, &str)> {
    let prefix = heading.get(..5)?;
    if !prefix.eq_ignore_ascii_case("phase") {
        return None;
    }
    let rest = heading[5..].trim_start();
    let digits = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits == 0 {
        return None;
    }

    let name = rest[digits..]
        .trim_start_matches(|c: char| {
            c.is_whitespace() || matches!(c, ':' | '*' | '_' | '-' | '–' | '—' | '.' | ')')
        })
        .trim_end_matches(|c: char| c.is_whitespace() || c == '*' || c == '_');

    Some((&rest[..digits], name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOAL: &str = "Data Scientist";

    fn found(text: &str) -> RoadmapData {
        match extract_roadmap(text, GOAL) {
            Extraction::Found(roadmap) => roadmap,
            Extraction::NotFound => panic!("expected a roadmap from: {text}"),
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        owned(items)
    }

    #[test]
    fn test_markdown_fixture_end_to_end() {
        let text = "Required Skills:\n- A\n- B\nTools:\n- X\nPhase 1: Intro\n- T1\n- T2";
        let roadmap = found(text);
        assert_eq!(roadmap.title, GOAL);
        assert_eq!(roadmap.subtitle.as_deref(), Some(DEFAULT_SUBTITLE));
        assert_eq!(roadmap.skills, strings(&["A", "B"]));
        assert_eq!(roadmap.tools, strings(&["X"]));
        assert_eq!(roadmap.phases, vec![Phase::new("Intro", strings(&["T1", "T2"]))]);
    }

    #[test]
    fn test_plain_chat_is_not_a_roadmap() {
        assert_eq!(extract_roadmap("Hello, how can I help?", GOAL), Extraction::NotFound);
        assert_eq!(extract_roadmap("", GOAL), Extraction::NotFound);
    }

    #[test]
    fn test_json_fields_returned_verbatim() {
        let text = r#"Here you go:
        {
          "title": "ML Engineer",
          "subtitle": "Custom subtitle",
          "skills": ["Python", "Statistics"],
          "tools": ["Data: pandas, numpy"],
          "phases": [
            {"name": "Phase 1: Foundation", "duration": "4-6 weeks", "topics": ["Linear algebra"]},
            {"name": "Phase 2: Core", "topics": ["Regression", "Trees"]}
          ]
        }"#;
        let roadmap = found(text);
        assert_eq!(roadmap.title, "ML Engineer");
        assert_eq!(roadmap.subtitle.as_deref(), Some("Custom subtitle"));
        assert_eq!(roadmap.skills, strings(&["Python", "Statistics"]));
        assert_eq!(roadmap.tools, strings(&["Data: pandas, numpy"]));
        assert_eq!(roadmap.phases.len(), 2);
        assert_eq!(roadmap.phases[0].duration.as_deref(), Some("4-6 weeks"));
        assert_eq!(roadmap.phases[1].topics, strings(&["Regression", "Trees"]));
    }

    #[test]
    fn test_json_missing_title_and_subtitle_use_defaults() {
        let text = r#"{"skills": ["SQL"], "tools": ["dbt"], "phases": [{"name": "P1", "topics": ["Joins"]}]}"#;
        let roadmap = found(text);
        assert_eq!(roadmap.title, GOAL);
        assert_eq!(roadmap.subtitle.as_deref(), Some(DEFAULT_SUBTITLE));
    }

    #[test]
    fn test_json_takes_precedence_over_markdown() {
        let text = "```json\n{\"skills\": [\"Rust\"], \"tools\": [\"cargo\"], \"phases\": [{\"name\": \"Start\", \"topics\": [\"Ownership\"]}]}\n```\nKey Skills:\n- Ignored";
        let roadmap = found(text);
        assert_eq!(roadmap.skills, strings(&["Rust"]));
        assert_eq!(roadmap.phases[0].name, "Start");
    }

    #[test]
    fn test_json_with_empty_arrays_is_not_accepted() {
        let text = r#"{"skills": [], "tools": ["Git"], "phases": [{"name": "P1", "topics": ["x"]}]}"#;
        assert_eq!(extract_roadmap(text, GOAL), Extraction::NotFound);
    }

    #[test]
    fn test_greedy_brace_capture_overreaches_into_prose() {
        // The trailing "{curly}" extends the span past the object, so JSON parsing fails
        // and the markdown tier runs instead.
        let text = "{\"skills\": [\"Rust\"], \"tools\": [\"cargo\"], \"phases\": [{\"name\": \"P\", \"topics\": [\"t\"]}]}\nKey Skills:\n- Go\nnote: {curly}";
        let roadmap = found(text);
        assert_eq!(roadmap.skills, strings(&["Go"]));
        assert_eq!(
            roadmap.phases,
            vec![Phase::new(DEFAULT_PHASE_NAME, strings(DEFAULT_PHASE_TOPICS))]
        );
    }

    #[test]
    fn test_skill_length_boundary() {
        let short = "s".repeat(99);
        let exact = "e".repeat(100);
        let long = "l".repeat(101);
        let text = format!("Key skills:\n- {short}\n- {exact}\n- {long}\n");
        let roadmap = found(&text);
        assert_eq!(roadmap.skills, vec![short]);
    }

    #[test]
    fn test_tool_length_boundary() {
        let ok = "t".repeat(99);
        let text = format!("Technologies\n- {ok}\n- {}\n", "x".repeat(101));
        assert_eq!(found(&text).tools, vec![ok]);
    }

    #[test]
    fn test_topic_length_boundary() {
        let ok = "a".repeat(199);
        let text = format!("Phase 1: Basics\n- {ok}\n- {}\n", "b".repeat(200));
        assert_eq!(found(&text).phases[0].topics, vec![ok]);
    }

    #[test]
    fn test_phase_without_bullets_is_dropped() {
        let text = "Phase 1: Empty\nJust prose here.\nPhase 2: Real\n- Topic";
        let roadmap = found(text);
        assert_eq!(roadmap.phases, vec![Phase::new("Real", strings(&["Topic"]))]);
    }

    #[test]
    fn test_blank_phase_name_defaults_to_number() {
        let text = "## Phase 3\n- Deploy";
        assert_eq!(found(text).phases[0].name, "Phase 3");
    }

    #[test]
    fn test_missing_dimensions_filled_with_defaults() {
        let text = "Phase 1: Setup\n- Install tooling";
        let roadmap = found(text);
        assert_eq!(roadmap.skills, strings(DEFAULT_SKILLS));
        assert_eq!(roadmap.tools, strings(DEFAULT_TOOLS));
        assert_eq!(roadmap.phases[0].name, "Setup");
    }

    #[test]
    fn test_only_skills_yields_default_phase() {
        let roadmap = found("Skills to learn:\n• Python\n* SQL");
        assert_eq!(roadmap.skills, strings(&["Python", "SQL"]));
        assert_eq!(
            roadmap.phases,
            vec![Phase::new(DEFAULT_PHASE_NAME, strings(DEFAULT_PHASE_TOPICS))]
        );
    }

    #[test]
    fn test_bold_markdown_layout() {
        let text = "\
## 🎯 Key Skills
- Statistics
- Machine Learning

## 🛠️ Tools & Technologies
- Jupyter
- scikit-learn

## Learning Roadmap

**Phase 1: Foundation (4 weeks)**
- Python basics
- Probability

**Phase 2: Core Skills (8 weeks)**
- Regression models
";
        let roadmap = found(text);
        assert_eq!(roadmap.skills, strings(&["Statistics", "Machine Learning"]));
        assert_eq!(roadmap.tools, strings(&["Jupyter", "scikit-learn"]));
        assert_eq!(
            roadmap.phases,
            vec![
                Phase::new("Foundation (4 weeks)", strings(&["Python basics", "Probability"])),
                Phase::new("Core Skills (8 weeks)", strings(&["Regression models"])),
            ]
        );
    }

    #[test]
    fn test_bulleted_phase_headers_with_nested_topics() {
        let text = "- **Phase 1: Basics**\n  - HTML\n  - CSS\n- **Phase 2: Frameworks**\n  - React";
        let roadmap = found(text);
        assert_eq!(roadmap.phases.len(), 2);
        assert_eq!(roadmap.phases[0].name, "Basics");
        assert_eq!(roadmap.phases[0].topics, strings(&["HTML", "CSS"]));
        assert_eq!(roadmap.phases[1].topics, strings(&["React"]));
    }

    #[test]
    fn test_skills_section_stops_at_markdown_heading() {
        let text = "Required skills\n- Go\n### Something else\n- Not a skill";
        assert_eq!(found(text).skills, strings(&["Go"]));
    }

    #[test]
    fn test_tools_section_stops_at_roadmap_line() {
        let text = "Tools:\n- Docker\nRoadmap overview\n- stray";
        assert_eq!(found(text).tools, strings(&["Docker"]));
    }

    #[test]
    fn test_emphasis_and_rules_are_not_bullets() {
        assert_eq!(bullet_body("**Bold**"), None);
        assert_eq!(bullet_body("---"), None);
        assert_eq!(bullet_body("- item"), Some("item"));
        assert_eq!(bullet_body("•item"), Some("item"));
    }

    #[test]
    fn test_phase_header_parsing() {
        assert_eq!(phase_header("Phase 1: Intro"), Some(("1", "Intro")));
        assert_eq!(phase_header("phase12 - Advanced"), Some(("12", "Advanced")));
        assert_eq!(phase_header("Phases overview"), None);
        assert_eq!(phase_header("Phase"), None);
    }

    #[test]
    fn test_skill_keyword_inside_prose_opens_section() {
        let roadmap =
            found("Here are the key skills you need to become a data scientist\n- Python\n- SQL");
        assert_eq!(roadmap.skills, strings(&["Python", "SQL"]));
        assert_eq!(roadmap.tools, strings(DEFAULT_TOOLS));

        let roadmap = found("To succeed you need these required skills\n- Python");
        assert_eq!(roadmap.skills, strings(&["Python"]));
    }

    #[test]
    fn test_phase_mentioned_mid_line_starts_phase() {
        let roadmap = found("Step 1. In phase 2 you will learn\n- x");
        assert_eq!(roadmap.phases, vec![Phase::new("you will learn", strings(&["x"]))]);
        assert_eq!(roadmap.skills, strings(DEFAULT_SKILLS));
    }

    #[test]
    fn test_inline_phase_does_not_close_skills() {
        let text = "Key skills:\n- Python\nThese carry into phase 1 of your plan\n- Pandas";
        let roadmap = found(text);
        assert_eq!(roadmap.skills, strings(&["Python", "Pandas"]));
        assert_eq!(roadmap.phases[0].name, "of your plan");
        assert_eq!(roadmap.phases[0].topics, strings(&["Pandas"]));
    }

    #[test]
    fn test_plural_phases_is_not_a_header() {
        assert_eq!(
            extract_roadmap("There are several phases 2 consider", GOAL),
            Extraction::NotFound
        );
    }

    #[test]
    fn test_into_option() {
        assert!(extract_roadmap("nothing", GOAL).into_option().is_none());
        assert!(extract_roadmap("Key skills:\n- A", GOAL).into_option().is_some());
    }
}
