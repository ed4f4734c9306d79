use super::keywords::{KeywordCoverageError, KeywordTable};
use super::{Gate, IntentTag};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Outcome of classifying one query. Both sets iterate in declared order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub gates: BTreeSet<Gate>,
    pub tags: BTreeSet<IntentTag>,
}

impl Classification {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn contains(&self, tag: IntentTag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn gate_fired(&self, gate: Gate) -> bool {
        self.gates.contains(&gate)
    }
}

#[derive(Clone)]
pub struct IntentClassifier {
    table: Arc<KeywordTable>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self {
            table: Arc::new(KeywordTable::builtin().clone()),
        }
    }
}

impl IntentClassifier {
    /// Build a classifier over `table` after checking gate coverage.
    pub fn new(table: KeywordTable) -> Result<Self, KeywordCoverageError> {
        table.validate()?;
        Ok(Self {
            table: Arc::new(table),
        })
    }

    /// Build without the coverage check. Uncovered tags become unreachable.
    pub fn unchecked(table: KeywordTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    pub fn table(&self) -> &KeywordTable {
        &self.table
    }

    pub fn classify(&self, query: &str) -> Classification {
        let text = query.to_lowercase();
        let mut classification = Classification::default();

        for gate in Gate::ALL {
            if !matches_any(&text, self.table.gate_phrases(gate)) {
                continue;
            }
            classification.gates.insert(gate);
            for tag in gate.tags() {
                if matches_any(&text, self.table.tag_phrases(tag)) {
                    classification.tags.insert(tag);
                }
            }
        }

        tracing::debug!(
            "[Classifier] gates={:?} tags={:?} for query '{}'",
            classification.gates,
            classification.tags,
            query
        );
        classification
    }
}

fn matches_any(text: &str, phrases: &[String]) -> bool {
    phrases.iter().any(|phrase| text.contains(phrase.as_str()))
}
