//! Intent classifiers: failed-call detection and bulk-order detection.
//!
//! Both detectors are heuristic, not hard booleans: the failed-call detector
//! returns a confidence the caller thresholds, the bulk-order detector is
//! intentionally permissive (false positives are cheap, false negatives lose
//! a sales lead).
//!
//! Priority rule: the orchestrator evaluates bulk-order detection before
//! failed-call detection on every turn where neither flow state is active,
//! and skips failed-call entirely when bulk fires.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::customer::{CustomerRecord, RequiredField};
use super::extractor::RuleBasedExtractor;

/// Classified intent category for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentCategory {
    FailedCall,
    BulkOrder,
    SpareParts,
    ServiceRequest,
    Emergency,
    Sales,
    BusinessInfo,
    General,
}

impl IntentCategory {
    /// Stable wire name used in API payloads.
    pub fn name(&self) -> &'static str {
        match self {
            IntentCategory::FailedCall => "failed_call",
            IntentCategory::BulkOrder => "bulk_order",
            IntentCategory::SpareParts => "spare_parts",
            IntentCategory::ServiceRequest => "service_request",
            IntentCategory::Emergency => "emergency",
            IntentCategory::Sales => "sales",
            IntentCategory::BusinessInfo => "business_info",
            IntentCategory::General => "general",
        }
    }
}

/// Urgency inferred from message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

// ────────────────────────────────────────────────────────────────────────────
// Failed-call detection
// ────────────────────────────────────────────────────────────────────────────

/// Result of failed-call detection on one message.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedCallSignal {
    /// True when the heuristics found any failed-contact evidence.
    pub detected: bool,
    /// Accumulated heuristic confidence, 0.0..=1.0. Callers threshold.
    pub confidence: f32,
    /// The strongest phrase that fired, for logging and state records.
    pub trigger_phrase: Option<String>,
    /// Required fields not already present in the message.
    pub missing_fields: Vec<RequiredField>,
    /// Customer data pre-filled from the trigger message itself.
    pub customer_data: CustomerRecord,
    /// Problem description, when one was extractable.
    pub problem: Option<String>,
    /// Heuristic urgency score.
    pub urgency: Urgency,
}

/// Phrases strongly implying a previous unsuccessful contact attempt.
const STRONG_PHRASES: [&str; 16] = [
    "tried calling",
    "tried to call",
    "no response",
    "no reply",
    "couldn't reach",
    "could not reach",
    "not picking",
    "no one answered",
    "nobody answered",
    "not answering",
    "call not connecting",
    "called but",
    "not reachable",
    "switched off",
    "busy tone",
    "call failed",
];

/// Weaker supporting phrases (persistence, repetition).
const SUPPORT_PHRASES: [&str; 6] = [
    "since morning",
    "since yesterday",
    "many times",
    "several times",
    "whole day",
    "again and again",
];

/// Urgency wording, shared with the response enhancer's simpler check.
pub const URGENT_WORDS: [&str; 9] = [
    "urgent",
    "emergency",
    "immediately",
    "asap",
    "right now",
    "today itself",
    "sparking",
    "smoke",
    "burning smell",
];

/// Detects messages implying the customer previously tried to call and
/// failed, by inference rather than explicit keywords.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailedCallDetector {
    extractor: RuleBasedExtractor,
}

impl FailedCallDetector {
    /// Creates the detector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs detection over the message plus recent conversation context.
    pub fn detect(&self, message: &str, context: &[&str]) -> FailedCallSignal {
        let lower = message.to_lowercase();

        let mut confidence: f32 = 0.0;
        let mut trigger_phrase = None;

        for phrase in STRONG_PHRASES {
            if lower.contains(phrase) {
                confidence += 0.5;
                if trigger_phrase.is_none() {
                    trigger_phrase = Some(phrase.to_string());
                }
            }
        }
        for phrase in SUPPORT_PHRASES {
            if lower.contains(phrase) {
                confidence += 0.15;
            }
        }

        // A mention of calling in recent context strengthens a vague
        // follow-up ("still nothing", "no response yet").
        let context_mentions_call = context
            .iter()
            .any(|line| line.to_lowercase().contains("call"));
        if context_mentions_call && (lower.contains("still") || lower.contains("yet")) {
            confidence += 0.2;
        }

        let confidence = confidence.min(1.0);
        let detected = confidence > 0.0;

        let fields = self.extractor.extract(message);
        let customer_data = fields.to_record();
        let missing_fields = customer_data.missing_required();
        let problem = customer_data.problem.clone();

        let urgency = Self::urgency_of(&lower, confidence);

        FailedCallSignal {
            detected,
            confidence,
            trigger_phrase,
            missing_fields,
            customer_data,
            problem,
            urgency,
        }
    }

    fn urgency_of(lower: &str, confidence: f32) -> Urgency {
        if URGENT_WORDS.iter().any(|w| lower.contains(w)) || confidence >= 0.9 {
            Urgency::High
        } else if confidence >= 0.5 {
            Urgency::Medium
        } else {
            Urgency::Low
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Bulk-order detection
// ────────────────────────────────────────────────────────────────────────────

/// Spare-part vocabulary shared by the detector and the bulk-order flow's
/// part extraction.
pub const PART_KEYWORDS: [&str; 14] = [
    "compressor",
    "remote",
    "filter",
    "motor",
    "pcb",
    "coil",
    "thermostat",
    "capacitor",
    "stabilizer",
    "gasket",
    "door seal",
    "drain pipe",
    "magnetron",
    "heating element",
];

/// Keyword/quantity heuristic for bulk spare-parts purchase intent.
#[derive(Debug, Clone, Copy, Default)]
pub struct BulkOrderDetector;

impl BulkOrderDetector {
    /// Creates the detector.
    pub fn new() -> Self {
        Self
    }

    /// Returns true when the message looks like a bulk or spare-parts
    /// purchase request.
    pub fn detect(&self, message: &str) -> bool {
        let lower = message.to_lowercase();

        if lower.contains("bulk") || lower.contains("wholesale") {
            return true;
        }
        if PART_KEYWORDS.iter().any(|part| lower.contains(part)) {
            return true;
        }
        extract_quantity(&lower).is_some() && lower.contains("order")
    }
}

/// Extracts the first plausible quantity from the message.
pub fn extract_quantity(text: &str) -> Option<u32> {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{1,6})\b").expect("valid regex"));
    RE.captures(text)?
        .get(1)?
        .as_str()
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
}

/// Extracts a catalog query for the first part keyword in the message.
pub fn extract_part_query(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    PART_KEYWORDS
        .iter()
        .find(|part| lower.contains(*part))
        .map(|part| {
            // "remote" alone is a weak query; widen it.
            if *part == "remote" {
                "remote control".to_string()
            } else {
                (*part).to_string()
            }
        })
}
