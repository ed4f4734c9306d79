//! Keyword table: tag -> trigger phrases, gate -> trigger phrases.
//!
//! Phrases are lower-case and matched as plain substrings of the lower-cased
//! query. A gate list must contain every phrase of every tag behind it,
//! otherwise that tag can never fire; `validate` reports each gap.

use super::{Gate, IntentTag};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

const PENDING: &[&str] = &["chờ giao", "đang chờ", "chưa giao", "pending", "waiting"];
const PAYMENT: &[&str] = &["thanh toán", "phải trả", "tiền", "payment", "unpaid", "pay"];
const DELIVERY: &[&str] = &[
    "giao hàng",
    "vận chuyển",
    "dự kiến",
    "khi nào đến",
    "delivery",
    "deliver",
    "ship",
];
const NEXT_DELIVERY: &[&str] = &["sắp giao", "giao tiếp theo", "next delivery", "arriving next"];
const SUMMARY: &[&str] = &["tổng quan", "thống kê", "summary", "overview", "statistics"];
const COMPLETED: &[&str] = &["đã giao", "hoàn thành", "completed", "delivered"];
const RECENT: &[&str] = &["gần đây", "recent", "lately"];
const LATEST: &[&str] = &["mới nhất", "latest", "newest", "last order"];
const HIGHEST_VALUE: &[&str] = &["cao nhất", "đắt nhất", "highest", "most expensive"];
const LOWEST_VALUE: &[&str] = &["thấp nhất", "rẻ nhất", "lowest", "cheapest"];
const AVERAGE_VALUE: &[&str] = &["trung bình", "average"];
const BALANCE: &[&str] = &["số dư", "điểm", "balance", "point", "credit"];

const ORDER_GATE: &[&str] = &[
    "đơn hàng",
    "order",
    "trạng thái",
    "status",
    "purchase",
    // pending
    "chờ giao",
    "đang chờ",
    "chưa giao",
    "pending",
    "waiting",
    // payment
    "thanh toán",
    "phải trả",
    "tiền",
    "payment",
    "unpaid",
    "pay",
    // delivery
    "giao hàng",
    "vận chuyển",
    "dự kiến",
    "khi nào đến",
    "delivery",
    "deliver",
    "ship",
    // next delivery
    "sắp giao",
    "giao tiếp theo",
    "next delivery",
    "arriving next",
    // summary
    "tổng quan",
    "thống kê",
    "summary",
    "overview",
    "statistics",
    // completed
    "đã giao",
    "hoàn thành",
    "completed",
    "delivered",
    // recent / latest
    "gần đây",
    "recent",
    "lately",
    "mới nhất",
    "latest",
    "newest",
    "last order",
    // value statistics
    "cao nhất",
    "đắt nhất",
    "highest",
    "most expensive",
    "thấp nhất",
    "rẻ nhất",
    "lowest",
    "cheapest",
    "trung bình",
    "average",
];

const BALANCE_GATE: &[&str] = &[
    "ví",
    "wallet",
    "tài khoản",
    "account",
    "số dư",
    "điểm",
    "balance",
    "point",
    "credit",
];

static DEFAULT_TABLE: Lazy<KeywordTable> = Lazy::new(|| {
    let tags = [
        (IntentTag::Pending, PENDING),
        (IntentTag::Payment, PAYMENT),
        (IntentTag::Delivery, DELIVERY),
        (IntentTag::NextDelivery, NEXT_DELIVERY),
        (IntentTag::Summary, SUMMARY),
        (IntentTag::Completed, COMPLETED),
        (IntentTag::Recent, RECENT),
        (IntentTag::Latest, LATEST),
        (IntentTag::HighestValue, HIGHEST_VALUE),
        (IntentTag::LowestValue, LOWEST_VALUE),
        (IntentTag::AverageValue, AVERAGE_VALUE),
        (IntentTag::Balance, BALANCE),
    ];
    let gates = [(Gate::OrderRelated, ORDER_GATE), (Gate::BalanceRelated, BALANCE_GATE)];

    let mut table = KeywordTable::empty();
    for (tag, phrases) in tags {
        table.set_tag(tag, phrases.iter().copied());
    }
    for (gate, phrases) in gates {
        table.set_gate(gate, phrases.iter().copied());
    }
    table
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingKeyword {
    pub gate: Gate,
    pub tag: IntentTag,
    pub phrase: String,
}

impl fmt::Display for MissingKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} lacks \"{}\" from {}", self.gate, self.phrase, self.tag)
    }
}

#[derive(Debug, Error)]
#[error("keyword gates do not cover {} fine-tag phrase(s): {}", .missing.len(), summarize(.missing))]
pub struct KeywordCoverageError {
    pub missing: Vec<MissingKeyword>,
}

fn summarize(missing: &[MissingKeyword]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Default)]
pub struct KeywordTable {
    tags: BTreeMap<IntentTag, Vec<String>>,
    gates: BTreeMap<Gate, Vec<String>>,
}

impl KeywordTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in Vietnamese/English table.
    pub fn builtin() -> &'static KeywordTable {
        &DEFAULT_TABLE
    }

    pub fn set_tag<I, S>(&mut self, tag: IntentTag, phrases: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags.insert(tag, normalize(phrases));
    }

    pub fn set_gate<I, S>(&mut self, gate: Gate, phrases: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.gates.insert(gate, normalize(phrases));
    }

    /// Add phrases to a tag and to its gate together.
    pub fn extend_tag<I, S>(&mut self, tag: IntentTag, phrases: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let added = normalize(phrases);
        self.tags.entry(tag).or_default().extend(added.iter().cloned());
        self.gates.entry(tag.gate()).or_default().extend(added);
    }

    pub fn tag_phrases(&self, tag: IntentTag) -> &[String] {
        self.tags.get(&tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn gate_phrases(&self, gate: Gate) -> &[String] {
        self.gates.get(&gate).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check that every gate list contains every phrase of its tags.
    pub fn validate(&self) -> Result<(), KeywordCoverageError> {
        let mut missing = Vec::new();
        for gate in Gate::ALL {
            let gate_phrases = self.gate_phrases(gate);
            for tag in gate.tags() {
                for phrase in self.tag_phrases(tag) {
                    if !gate_phrases.contains(phrase) {
                        missing.push(MissingKeyword {
                            gate,
                            tag,
                            phrase: phrase.clone(),
                        });
                    }
                }
            }
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(KeywordCoverageError { missing })
        }
    }
}

fn normalize<I, S>(phrases: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    phrases
        .into_iter()
        .map(|p| p.as_ref().trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}
