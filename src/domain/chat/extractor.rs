//! Information extraction and inbound message sanitization.
//!
//! Turns free text into structured candidate fields (name, phone, location,
//! problem). Extraction is a strategy pair behind one seam: a primary
//! AI-backed extractor (a port) whose fields are accepted only above a
//! confidence threshold, and a deterministic rule cascade that runs as
//! fallback and backfills whatever the primary omitted.
//!
//! The rule cascade is an explicit ordered list of named pure functions so
//! each heuristic can be tested and tuned in isolation.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::ports::FieldExtraction;

use super::customer::{is_valid_phone, normalize_phone, CustomerRecord};

/// Maximum accepted inbound message length, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 500;

/// Minimum confidence at which a primary (AI) field is accepted.
pub const MIN_AI_CONFIDENCE: f32 = 0.5;

// ────────────────────────────────────────────────────────────────────────────
// Inbound sanitization
// ────────────────────────────────────────────────────────────────────────────

/// Sanitizes an inbound chat message before any further processing.
///
/// Strips `<script>` blocks, removes remaining angle brackets, collapses
/// control characters, and caps the length at [`MAX_MESSAGE_LENGTH`].
pub fn sanitize_message(raw: &str) -> String {
    static SCRIPT_BLOCK: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?is)<script.*?(?:</script>|$)").expect("valid regex"));

    let without_scripts = SCRIPT_BLOCK.replace_all(raw, "");
    let cleaned: String = without_scripts
        .chars()
        .filter(|c| !matches!(c, '<' | '>'))
        .filter(|c| !c.is_control() || *c == '\n')
        .collect();

    let trimmed = cleaned.trim();
    trimmed.chars().take(MAX_MESSAGE_LENGTH).collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Extracted fields
// ────────────────────────────────────────────────────────────────────────────

/// A single extracted candidate value with its confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    pub value: String,
    /// Heuristic confidence, 0.0..=1.0.
    pub confidence: f32,
}

impl ExtractedField {
    /// Creates a field with the given confidence.
    pub fn new(value: impl Into<String>, confidence: f32) -> Self {
        Self {
            value: value.into(),
            confidence,
        }
    }
}

/// Structured candidate fields produced by one extraction call.
///
/// Ephemeral: never persisted directly, always merged into a flow state's
/// accumulating [`CustomerRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub name: Option<ExtractedField>,
    pub phone: Option<ExtractedField>,
    pub location: Option<ExtractedField>,
    pub problem: Option<ExtractedField>,
}

impl ExtractedFields {
    /// True when no field was extracted.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.location.is_none()
            && self.problem.is_none()
    }

    /// Drops fields below the confidence threshold.
    pub fn retain_confident(mut self, min_confidence: f32) -> Self {
        let confident =
            |f: &Option<ExtractedField>| f.as_ref().is_some_and(|v| v.confidence >= min_confidence);
        if !confident(&self.name) {
            self.name = None;
        }
        if !confident(&self.phone) {
            self.phone = None;
        }
        if !confident(&self.location) {
            self.location = None;
        }
        if !confident(&self.problem) {
            self.problem = None;
        }
        self
    }

    /// Fills fields this result lacks from `other` (per-field; the present
    /// side always wins).
    pub fn backfill_from(&mut self, other: &ExtractedFields) {
        if self.name.is_none() {
            self.name = other.name.clone();
        }
        if self.phone.is_none() {
            self.phone = other.phone.clone();
        }
        if self.location.is_none() {
            self.location = other.location.clone();
        }
        if self.problem.is_none() {
            self.problem = other.problem.clone();
        }
    }

    /// Converts to a plain customer record, dropping confidences.
    pub fn to_record(&self) -> CustomerRecord {
        CustomerRecord {
            name: self.name.as_ref().map(|f| f.value.clone()),
            phone: self.phone.as_ref().map(|f| f.value.clone()),
            location: self.location.as_ref().map(|f| f.value.clone()),
            problem: self.problem.as_ref().map(|f| f.value.clone()),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Deterministic rule cascade
// ────────────────────────────────────────────────────────────────────────────

/// A named deterministic extraction rule.
///
/// Rules are pure functions over the message text. For each field the
/// cascade is an ordered list; the first rule that fires wins.
pub struct ExtractionRule {
    pub name: &'static str,
    pub apply: fn(&str) -> Option<ExtractedField>,
}

/// Known service-area places, matched case-insensitively before any generic
/// location pattern.
pub const KNOWN_PLACES: [&str; 10] = [
    "Thiruvalla",
    "Changanassery",
    "Kottayam",
    "Chengannur",
    "Mallappally",
    "Ranni",
    "Pathanamthitta",
    "Kozhencherry",
    "Pandalam",
    "Adoor",
];

/// Words that disqualify a short reply from being taken as a name.
const REPLY_STOPWORDS: [&str; 12] = [
    "yes", "no", "ok", "okay", "thanks", "thank", "hi", "hello", "hey", "sure", "haan", "illa",
];

/// Appliance vocabulary used by the problem rules.
const APPLIANCE_WORDS: [&str; 14] = [
    "ac",
    "air conditioner",
    "fridge",
    "refrigerator",
    "washing machine",
    "microwave",
    "tv",
    "television",
    "fan",
    "mixer",
    "grinder",
    "water purifier",
    "inverter",
    "oven",
];

/// Fixed symptom phrases accepted as a problem description on their own.
const SYMPTOM_PHRASES: [&str; 8] = [
    "not cooling",
    "not working",
    "not starting",
    "leaking",
    "making noise",
    "no power",
    "not spinning",
    "not heating",
];

/// Words that terminate a captured name or location span.
const FIELD_KEYWORDS: [&str; 9] = [
    "phone", "number", "mobile", "from", "in", "at", "location", "problem", "my",
];

/// Time and filler words a list segment may carry that rule it out as a
/// name ("since morning", "still waiting").
const NON_NAME_WORDS: [&str; 10] = [
    "since",
    "still",
    "morning",
    "yesterday",
    "today",
    "tomorrow",
    "please",
    "not",
    "urgent",
    "waiting",
];

mod rules {
    use super::*;

    /// Phone mentioned with explicit phrasing ("my phone is 98765...").
    pub fn phone_statement(text: &str) -> Option<ExtractedField> {
        static RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?i)(?:phone|number|mobile|contact)\D{0,12}(\+?[\d][\d\s-]{8,14}\d)")
                .expect("valid regex")
        });
        let captured = RE.captures(text)?.get(1)?.as_str();
        let digits = normalize_phone(captured)?;
        is_valid_phone(&digits).then(|| ExtractedField::new(digits, 0.9))
    }

    /// Any token in the message that normalizes to a valid mobile number,
    /// including a bare-number reply.
    pub fn bare_phone(text: &str) -> Option<ExtractedField> {
        static RE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"\+?[\d][\d\s-]{8,14}\d").expect("valid regex"));
        for m in RE.find_iter(text) {
            if let Some(digits) = normalize_phone(m.as_str()) {
                if is_valid_phone(&digits) {
                    return Some(ExtractedField::new(digits, 0.85));
                }
            }
        }
        None
    }

    /// Name introduced by "my name is / I am / this is".
    pub fn name_statement(text: &str) -> Option<ExtractedField> {
        static RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?i)\b(?:my name is|i am|i'm|this is)\s+([a-zA-Z][a-zA-Z ]{0,40})")
                .expect("valid regex")
        });
        let captured = RE.captures(text)?.get(1)?.as_str();
        let truncated = truncate_at_boundary(captured);
        (truncated.chars().count() >= 2).then(|| ExtractedField::new(truncated, 0.8))
    }

    /// A name given as one segment of a comma or newline separated reply
    /// ("Ravi, 9876543210, Thiruvalla").
    ///
    /// A segment qualifies when it is one to three alphabetic words and no
    /// other cascade claims it: not a phone number, not a known place, not
    /// a problem description.
    pub fn list_reply_name(text: &str) -> Option<ExtractedField> {
        if !text.contains(',') && !text.contains('\n') {
            return None;
        }
        for segment in text.split([',', '\n']) {
            let segment = segment.trim();
            let words: Vec<&str> = segment.split_whitespace().collect();
            if words.is_empty() || words.len() > 3 {
                continue;
            }
            let alphabetic = words
                .iter()
                .all(|w| w.chars().all(|c| c.is_alphabetic()) && w.chars().count() >= 2);
            if !alphabetic {
                continue;
            }
            let blocked = words.iter().any(|w| {
                let lower = w.to_lowercase();
                REPLY_STOPWORDS.contains(&lower.as_str())
                    || NON_NAME_WORDS.contains(&lower.as_str())
                    || FIELD_KEYWORDS.contains(&lower.as_str())
            });
            if blocked {
                continue;
            }
            if bare_phone(segment).is_some()
                || gazetteer_location(segment).is_some()
                || appliance_problem(segment).is_some()
                || symptom_problem(segment).is_some()
            {
                continue;
            }
            let name = words
                .iter()
                .map(|w| capitalize(w))
                .collect::<Vec<_>>()
                .join(" ");
            return Some(ExtractedField::new(name, 0.45));
        }
        None
    }

    /// A short single-token reply that isn't a stopword, taken as a name.
    ///
    /// Low confidence: only meaningful when the flow is already asking for
    /// a name and nothing else matched.
    pub fn short_reply_name(text: &str) -> Option<ExtractedField> {
        let trimmed = text.trim();
        let mut words = trimmed.split_whitespace();
        let (first, second) = (words.next()?, words.next());
        if second.is_some() {
            return None;
        }
        if !first.chars().all(|c| c.is_alphabetic()) || first.chars().count() < 2 {
            return None;
        }
        if REPLY_STOPWORDS.contains(&first.to_lowercase().as_str()) {
            return None;
        }
        Some(ExtractedField::new(capitalize(first), 0.4))
    }

    /// Location matched against the known-places gazetteer.
    pub fn gazetteer_location(text: &str) -> Option<ExtractedField> {
        let lower = text.to_lowercase();
        KNOWN_PLACES
            .iter()
            .find(|place| lower.contains(&place.to_lowercase()))
            .map(|place| ExtractedField::new(*place, 0.9))
    }

    /// Generic "in/at/from X" location phrasing.
    pub fn prepositional_location(text: &str) -> Option<ExtractedField> {
        static RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?i)\b(?:in|at|from|near)\s+([a-zA-Z][a-zA-Z ]{1,30})")
                .expect("valid regex")
        });
        let captured = RE.captures(text)?.get(1)?.as_str();
        let truncated = truncate_at_boundary(captured);
        (truncated.chars().count() >= 3).then(|| ExtractedField::new(truncated, 0.7))
    }

    /// A bare short alphabetic reply taken as a location.
    pub fn bare_location(text: &str) -> Option<ExtractedField> {
        let trimmed = text.trim();
        let word_count = trimmed.split_whitespace().count();
        if word_count == 0 || word_count > 2 {
            return None;
        }
        let alphabetic = trimmed.chars().all(|c| c.is_alphabetic() || c == ' ');
        if !alphabetic || trimmed.chars().count() < 3 {
            return None;
        }
        if REPLY_STOPWORDS.contains(&trimmed.to_lowercase().as_str()) {
            return None;
        }
        Some(ExtractedField::new(trimmed, 0.4))
    }

    /// Problem introduced by "problem is / issue is / trouble with".
    pub fn problem_statement(text: &str) -> Option<ExtractedField> {
        static RE: Lazy<Regex> = Lazy::new(|| {
            Regex::new(r"(?i)(?:problem is|issue is|trouble with|complaint is)\s+(.{3,120})")
                .expect("valid regex")
        });
        let captured = RE.captures(text)?.get(1)?.as_str().trim();
        Some(ExtractedField::new(captured, 0.8))
    }

    /// Free text mentioning an appliance, taken whole as the problem.
    pub fn appliance_problem(text: &str) -> Option<ExtractedField> {
        let lower = text.to_lowercase();
        let mentions_appliance = APPLIANCE_WORDS.iter().any(|word| {
            lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|token| token == *word)
                || (word.contains(' ') && lower.contains(word))
        });
        if !mentions_appliance {
            return None;
        }
        let snippet: String = text.trim().chars().take(120).collect();
        Some(ExtractedField::new(snippet, 0.6))
    }

    /// One of the fixed symptom phrases on its own.
    pub fn symptom_problem(text: &str) -> Option<ExtractedField> {
        let lower = text.to_lowercase();
        SYMPTOM_PHRASES
            .iter()
            .find(|phrase| lower.contains(*phrase))
            .map(|_| {
                let snippet: String = text.trim().chars().take(120).collect();
                ExtractedField::new(snippet, 0.6)
            })
    }
}

/// Truncates a captured span at the first conjunction or field keyword.
///
/// The capture patterns only admit letters and spaces, so a comma already
/// ends the span at the regex level.
fn truncate_at_boundary(captured: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    for word in captured.split_whitespace() {
        let lower = word.to_lowercase();
        if lower == "and" || FIELD_KEYWORDS.contains(&lower.as_str()) {
            break;
        }
        kept.push(word);
    }
    kept.join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Deterministic extractor running the named rule cascades.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedExtractor;

impl RuleBasedExtractor {
    /// Creates the extractor.
    pub fn new() -> Self {
        Self
    }

    /// The ordered name rules.
    pub fn name_rules() -> Vec<ExtractionRule> {
        vec![
            ExtractionRule {
                name: "name_statement",
                apply: rules::name_statement,
            },
            ExtractionRule {
                name: "list_reply_name",
                apply: rules::list_reply_name,
            },
            ExtractionRule {
                name: "short_reply_name",
                apply: rules::short_reply_name,
            },
        ]
    }

    /// The ordered phone rules.
    pub fn phone_rules() -> Vec<ExtractionRule> {
        vec![
            ExtractionRule {
                name: "phone_statement",
                apply: rules::phone_statement,
            },
            ExtractionRule {
                name: "bare_phone",
                apply: rules::bare_phone,
            },
        ]
    }

    /// The ordered location rules.
    pub fn location_rules() -> Vec<ExtractionRule> {
        vec![
            ExtractionRule {
                name: "gazetteer_location",
                apply: rules::gazetteer_location,
            },
            ExtractionRule {
                name: "prepositional_location",
                apply: rules::prepositional_location,
            },
            ExtractionRule {
                name: "bare_location",
                apply: rules::bare_location,
            },
        ]
    }

    /// The ordered problem rules.
    pub fn problem_rules() -> Vec<ExtractionRule> {
        vec![
            ExtractionRule {
                name: "problem_statement",
                apply: rules::problem_statement,
            },
            ExtractionRule {
                name: "appliance_problem",
                apply: rules::appliance_problem,
            },
            ExtractionRule {
                name: "symptom_problem",
                apply: rules::symptom_problem,
            },
        ]
    }

    fn first_match(rules: &[ExtractionRule], text: &str) -> Option<ExtractedField> {
        rules.iter().find_map(|rule| (rule.apply)(text))
    }

    /// Runs every cascade over the text.
    pub fn extract(&self, text: &str) -> ExtractedFields {
        let phone = Self::first_match(&Self::phone_rules(), text);
        let name = Self::first_match(&Self::name_rules(), text);
        let location = Self::first_match(&Self::location_rules(), text);
        let problem = Self::first_match(&Self::problem_rules(), text);

        // A bare-number reply must not double as a name or location.
        let phone_only = phone.is_some() && text.trim().chars().all(|c| !c.is_alphabetic());
        ExtractedFields {
            name: if phone_only { None } else { name },
            phone,
            location: if phone_only { None } else { location },
            problem,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tiered extractor (AI primary + deterministic fallback)
// ────────────────────────────────────────────────────────────────────────────

/// Two-tier extractor: AI primary with confidence gating, deterministic
/// fallback on failure/timeout, fallback backfill otherwise.
#[derive(Clone)]
pub struct TieredExtractor {
    primary: Arc<dyn FieldExtraction>,
    fallback: RuleBasedExtractor,
    min_confidence: f32,
    timeout: Duration,
}

impl TieredExtractor {
    /// Creates a tiered extractor with the default confidence threshold.
    pub fn new(primary: Arc<dyn FieldExtraction>, timeout: Duration) -> Self {
        Self {
            primary,
            fallback: RuleBasedExtractor::new(),
            min_confidence: MIN_AI_CONFIDENCE,
            timeout,
        }
    }

    /// Overrides the confidence threshold.
    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Extracts candidate fields from free text.
    ///
    /// Never fails: primary errors, timeouts, and low-confidence fields all
    /// degrade silently to the deterministic rules.
    pub async fn extract(&self, text: &str) -> ExtractedFields {
        let fallback_fields = self.fallback.extract(text);

        let primary_fields =
            match tokio::time::timeout(self.timeout, self.primary.extract_fields(text)).await {
                Ok(Ok(fields)) => Some(fields.retain_confident(self.min_confidence)),
                Ok(Err(err)) => {
                    tracing::warn!(error = %err, "primary extractor failed, using rules only");
                    None
                }
                Err(_) => {
                    tracing::warn!(
                        timeout_ms = self.timeout.as_millis() as u64,
                        "primary extractor timed out, using rules only"
                    );
                    None
                }
            };

        match primary_fields {
            Some(mut fields) => {
                fields.backfill_from(&fallback_fields);
                fields
            }
            None => fallback_fields,
        }
    }
}
