//! Intent classification
//!
//! Information Hiding:
//! - Keyword lists live in a data table, not in code branches
//! - Gate coverage of fine-tag keywords checked by `KeywordTable::validate`
//! - Callers see `IntentClassifier::classify(query) -> Classification`

pub mod classifier;
pub mod keywords;

pub use classifier::{Classification, IntentClassifier};
pub use keywords::{KeywordCoverageError, KeywordTable, MissingKeyword};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fine-grained intent. Declaration order is the order in which context
/// fragments are assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentTag {
    Pending,
    Payment,
    Delivery,
    NextDelivery,
    Summary,
    Completed,
    Recent,
    Latest,
    HighestValue,
    LowestValue,
    AverageValue,
    Balance,
}

impl IntentTag {
    pub const ALL: [IntentTag; 12] = [
        IntentTag::Pending,
        IntentTag::Payment,
        IntentTag::Delivery,
        IntentTag::NextDelivery,
        IntentTag::Summary,
        IntentTag::Completed,
        IntentTag::Recent,
        IntentTag::Latest,
        IntentTag::HighestValue,
        IntentTag::LowestValue,
        IntentTag::AverageValue,
        IntentTag::Balance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntentTag::Pending => "pending",
            IntentTag::Payment => "payment",
            IntentTag::Delivery => "delivery",
            IntentTag::NextDelivery => "next_delivery",
            IntentTag::Summary => "summary",
            IntentTag::Completed => "completed",
            IntentTag::Recent => "recent",
            IntentTag::Latest => "latest",
            IntentTag::HighestValue => "highest_value",
            IntentTag::LowestValue => "lowest_value",
            IntentTag::AverageValue => "average_value",
            IntentTag::Balance => "balance",
        }
    }

    /// The coarse gate that must fire before this tag is evaluated.
    pub fn gate(&self) -> Gate {
        match self {
            IntentTag::Balance => Gate::BalanceRelated,
            _ => Gate::OrderRelated,
        }
    }
}

impl fmt::Display for IntentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IntentTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| format!("unknown intent tag: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    OrderRelated,
    BalanceRelated,
}

impl Gate {
    pub const ALL: [Gate; 2] = [Gate::OrderRelated, Gate::BalanceRelated];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gate::OrderRelated => "order_related",
            Gate::BalanceRelated => "balance_related",
        }
    }

    pub fn tags(&self) -> impl Iterator<Item = IntentTag> + '_ {
        IntentTag::ALL.into_iter().filter(move |tag| tag.gate() == *self)
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_order_is_sort_order() {
        let mut shuffled = vec![IntentTag::Balance, IntentTag::Latest, IntentTag::Pending];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![IntentTag::Pending, IntentTag::Latest, IntentTag::Balance]
        );
    }

    #[test]
    fn test_tag_names_round_trip() {
        for tag in IntentTag::ALL {
            assert_eq!(tag.as_str().parse::<IntentTag>().unwrap(), tag);
        }
        assert!("shipping".parse::<IntentTag>().is_err());
    }

    #[test]
    fn test_gates_partition_tags() {
        assert_eq!(Gate::BalanceRelated.tags().collect::<Vec<_>>(), vec![IntentTag::Balance]);
        assert_eq!(Gate::OrderRelated.tags().count(), 11);
    }
}
