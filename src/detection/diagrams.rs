//! Diagram classification and Mermaid markup synthesis.
//!
//! Classification is a keyword match of the recognized text against a fixed
//! [`PatternTable`]. For every matching kind a [`DiagramSynthesizer`] builds a
//! node/edge skeleton from entity names picked out of the same text by an
//! [`EntityExtractor`].
//!
//! Only flowcharts, sequence diagrams and class diagrams have a synthesizer.
//! State, entity-relationship, Gantt and pie-chart keywords are recognized
//! but never yield an artifact.

use regex::Regex;
use std::sync::{Arc, LazyLock};
use uuid::Uuid;

use crate::models::{DiagramArtifact, DiagramKind};

/// Immutable mapping from diagram kind to its keyword matcher.
#[derive(Debug, Clone)]
pub struct PatternTable {
    entries: Vec<(DiagramKind, Regex)>,
}

const STANDARD_KEYWORDS: [(DiagramKind, &str); 7] = [
    (DiagramKind::Flowchart, r"(?i)(flowchart|flow\s+chart|flow\s+diagram)"),
    (DiagramKind::Sequence, r"(?i)(sequence\s+diagram|seq\s+diagram)"),
    (DiagramKind::ClassDiagram, r"(?i)(class\s+diagram)"),
    (DiagramKind::StateDiagram, r"(?i)(state\s+diagram|state\s+machine)"),
    (DiagramKind::EntityRelationship, r"(?i)(entity\s+relationship|er\s+diagram)"),
    (DiagramKind::Gantt, r"(?i)(gantt\s+chart|timeline)"),
    (DiagramKind::PieChart, r"(?i)(pie\s+chart)"),
];

static STANDARD_PATTERNS: LazyLock<Arc<PatternTable>> = LazyLock::new(|| {
    let entries = STANDARD_KEYWORDS
        .iter()
        .filter_map(|&(kind, pattern)| match Regex::new(pattern) {
            Ok(re) => Some((kind, re)),
            Err(e) => {
                tracing::error!(kind = %kind, error = %e, "Invalid built-in diagram pattern");
                None
            }
        })
        .collect();
    Arc::new(PatternTable { entries })
});

impl PatternTable {
    pub fn new<'a, I>(entries: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (DiagramKind, &'a str)>,
    {
        let entries = entries
            .into_iter()
            .map(|(kind, pattern)| Ok((kind, Regex::new(pattern)?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { entries })
    }

    /// The built-in keyword table, one entry per [`DiagramKind`].
    pub fn standard() -> Arc<PatternTable> {
        Arc::clone(&STANDARD_PATTERNS)
    }

    /// Kinds whose keywords occur in `text`, in table order.
    pub fn matches(&self, text: &str) -> Vec<DiagramKind> {
        self.entries
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(kind, _)| *kind)
            .collect()
    }
}

/// What to pull out of the text for one diagram kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityQuery {
    /// Names must be strictly longer than this many characters
    pub longer_than: usize,
    /// Keep at most this many names
    pub limit: usize,
}

/// Picks candidate entity names out of free text.
pub trait EntityExtractor: Send + Sync {
    /// Distinct names in first-seen order, at most `query.limit` of them.
    fn extract(&self, text: &str, query: EntityQuery) -> Vec<String>;
}

/// Treats every capitalized word as an entity name.
///
/// Text is split on whitespace and then on any character that is not a letter,
/// digit or underscore, so `Login->Dashboard` yields two words. A word qualifies
/// when it starts with an ASCII uppercase letter and is longer than the query asks.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapitalizedWordExtractor;

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl EntityExtractor for CapitalizedWordExtractor {
    fn extract(&self, text: &str, query: EntityQuery) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();

        let words = text
            .split_whitespace()
            .flat_map(|raw| raw.split(|c: char| !is_word_char(c)))
            .filter(|word| !word.is_empty());

        for word in words {
            if names.len() >= query.limit {
                break;
            }
            let qualifies = word.chars().next().is_some_and(|c| c.is_ascii_uppercase())
                && word.chars().count() > query.longer_than;

            if qualifies && !names.iter().any(|n| n == word) {
                names.push(word.to_string());
            }
        }

        names
    }
}

/// Builds diagram markup for a matched kind.
pub trait DiagramSynthesizer: Send + Sync {
    /// `None` when the kind has no synthesizer or too few entities were found.
    fn synthesize(&self, kind: DiagramKind, text: &str) -> Option<String>;
}

const FLOWCHART_NODES: EntityQuery = EntityQuery { longer_than: 3, limit: 5 };
const SEQUENCE_ACTORS: EntityQuery = EntityQuery { longer_than: 3, limit: 3 };
const CLASS_NAMES: EntityQuery = EntityQuery { longer_than: 2, limit: 3 };
const MIN_ENTITIES: usize = 2;

/// Mermaid markup synthesizer.
pub struct MermaidSynthesizer {
    extractor: Box<dyn EntityExtractor>,
}

impl MermaidSynthesizer {
    pub fn new(extractor: Box<dyn EntityExtractor>) -> Self {
        Self { extractor }
    }

    fn entities(&self, text: &str, query: EntityQuery) -> Option<Vec<String>> {
        let names = self.extractor.extract(text, query);
        (names.len() >= MIN_ENTITIES).then_some(names)
    }
}

impl Default for MermaidSynthesizer {
    fn default() -> Self {
        Self::new(Box::new(CapitalizedWordExtractor))
    }
}

impl DiagramSynthesizer for MermaidSynthesizer {
    fn synthesize(&self, kind: DiagramKind, text: &str) -> Option<String> {
        match kind {
            DiagramKind::Flowchart => self.entities(text, FLOWCHART_NODES).map(|n| flowchart(&n)),
            DiagramKind::Sequence => self.entities(text, SEQUENCE_ACTORS).map(|a| sequence(&a)),
            DiagramKind::ClassDiagram => self.entities(text, CLASS_NAMES).map(|c| class_diagram(&c)),
            DiagramKind::StateDiagram
            | DiagramKind::EntityRelationship
            | DiagramKind::Gantt
            | DiagramKind::PieChart => None,
        }
    }
}

/// Top-down flowchart with the nodes chained in order.
pub fn flowchart(nodes: &[String]) -> String {
    let mut markup = String::from("flowchart TD\n");
    for (i, node) in nodes.iter().enumerate() {
        markup.push_str(&format!("    A{}[{}]\n", i, node));
    }
    for i in 1..nodes.len() {
        markup.push_str(&format!("    A{} --> A{}\n", i - 1, i));
    }
    markup
}

/// One request/response exchange between each consecutive pair of actors.
pub fn sequence(actors: &[String]) -> String {
    let mut markup = String::from("sequenceDiagram\n");
    for actor in actors {
        markup.push_str(&format!("    participant {}\n", actor));
    }
    for pair in actors.windows(2) {
        markup.push_str(&format!("    {}->>+{}: Request\n", pair[0], pair[1]));
        markup.push_str(&format!("    {}-->>-{}: Response\n", pair[1], pair[0]));
    }
    markup
}

/// Class declarations plus one inheritance edge from the first class to the second.
pub fn class_diagram(classes: &[String]) -> String {
    let mut markup = String::from("classDiagram\n");
    for class in classes {
        markup.push_str(&format!("    class {}\n", class));
    }
    if let [first, second, ..] = classes {
        markup.push_str(&format!("    {} <|-- {}\n", first, second));
    }
    markup
}

/// Keyword classifier paired with a synthesizer.
pub struct DiagramDetector {
    patterns: Arc<PatternTable>,
    synthesizer: Box<dyn DiagramSynthesizer>,
}

impl DiagramDetector {
    pub fn new(patterns: Arc<PatternTable>, synthesizer: Box<dyn DiagramSynthesizer>) -> Self {
        Self {
            patterns,
            synthesizer,
        }
    }

    pub fn classify(&self, text: &str) -> Vec<DiagramKind> {
        self.patterns.matches(text)
    }

    /// One artifact per matching kind that yields markup.
    pub fn detect(&self, text: &str) -> Vec<DiagramArtifact> {
        let kinds = self.classify(text);
        tracing::debug!(?kinds, "diagram keywords matched");

        kinds
            .into_iter()
            .filter_map(|kind| match self.synthesizer.synthesize(kind, text) {
                Some(markup) => Some(DiagramArtifact {
                    id: Uuid::new_v4(),
                    kind,
                    markup,
                }),
                None => {
                    tracing::debug!(%kind, "no diagram synthesized");
                    None
                }
            })
            .collect()
    }
}

impl Default for DiagramDetector {
    fn default() -> Self {
        Self::new(PatternTable::standard(), Box::new(MermaidSynthesizer::default()))
    }
}
