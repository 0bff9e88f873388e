//! Customer data record accumulated across collection turns.
//!
//! Holds the partially-known customer fields (name, phone, location,
//! problem), the per-field validators that gate flow completion, and the
//! fill-gaps-only merge policy used when combining newly extracted fields
//! with already captured ones.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The minimal customer-identifying fields needed to create a service task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    Name,
    Phone,
    Location,
}

impl RequiredField {
    /// All required fields, in asking order.
    pub const ALL: [RequiredField; 3] = [
        RequiredField::Name,
        RequiredField::Phone,
        RequiredField::Location,
    ];

    /// Human wording used in follow-up prompts.
    pub fn label(&self) -> &'static str {
        match self {
            RequiredField::Name => "your name",
            RequiredField::Phone => "your phone number",
            RequiredField::Location => "your location",
        }
    }

    /// Joins field labels into natural phrasing.
    ///
    /// One field: "X". Two: "X and Y". Three or more: "X, Y, and Z".
    pub fn join_labels(fields: &[RequiredField]) -> String {
        let labels: Vec<&str> = fields.iter().map(|f| f.label()).collect();
        join_naturally(&labels)
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Joins a list of phrases into grammatical English.
pub fn join_naturally(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [only] => (*only).to_string(),
        [first, second] => format!("{} and {}", first, second),
        [init @ .., last] => format!("{}, and {}", init.join(", "), last),
    }
}

/// Partially-known customer data, merged across extraction calls.
///
/// Fields stay `None` until something non-empty arrives; the merge policy
/// never overwrites an existing value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub problem: Option<String>,
}

impl CustomerRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `other` into self with fill-gaps-only policy: an existing
    /// non-empty value is never overwritten. Idempotent.
    pub fn merge_missing(&mut self, other: &CustomerRecord) {
        fill_gap(&mut self.name, &other.name);
        fill_gap(&mut self.phone, &other.phone);
        fill_gap(&mut self.location, &other.location);
        fill_gap(&mut self.problem, &other.problem);
    }

    /// Returns the required fields that are absent or fail validation.
    pub fn missing_required(&self) -> Vec<RequiredField> {
        let mut missing = Vec::new();
        if !self.name.as_deref().is_some_and(is_valid_name) {
            missing.push(RequiredField::Name);
        }
        if !self.phone.as_deref().is_some_and(is_valid_phone) {
            missing.push(RequiredField::Phone);
        }
        if !self.location.as_deref().is_some_and(is_valid_location) {
            missing.push(RequiredField::Location);
        }
        missing
    }

    /// True iff name, phone, and location are all present and valid.
    pub fn is_complete(&self) -> bool {
        self.missing_required().is_empty()
    }
}

fn fill_gap(slot: &mut Option<String>, candidate: &Option<String>) {
    let has_value = slot.as_deref().is_some_and(|s| !s.trim().is_empty());
    if !has_value {
        if let Some(value) = candidate {
            if !value.trim().is_empty() {
                *slot = Some(value.clone());
            }
        }
    }
}

/// A name is at least 2 characters of letters and spaces.
pub fn is_valid_name(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.chars().count() >= 2
        && trimmed.chars().all(|c| c.is_alphabetic() || c == ' ')
        && trimmed.chars().any(|c| c.is_alphabetic())
}

/// A phone is exactly 10 digits with a leading 6-9 (Indian mobile
/// numbering), after stripping separators and country/trunk prefixes.
pub fn is_valid_phone(phone: &str) -> bool {
    match normalize_phone(phone) {
        Some(digits) => {
            digits.len() == 10 && matches!(digits.as_bytes()[0], b'6'..=b'9')
        }
        None => false,
    }
}

/// Strips spaces, dashes, and `+91`/`91`/`0` prefixes, returning the bare
/// digits when the input is otherwise numeric.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let digits = if digits.len() == 12 && digits.starts_with("91") {
        &digits[2..]
    } else if digits.len() == 11 && digits.starts_with('0') {
        &digits[1..]
    } else {
        digits
    };
    Some(digits.to_string())
}

/// A location is at least 3 characters of letters and spaces.
pub fn is_valid_location(location: &str) -> bool {
    let trimmed = location.trim();
    trimmed.chars().count() >= 3
        && trimmed.chars().all(|c| c.is_alphabetic() || c == ' ')
        && trimmed.chars().any(|c| c.is_alphabetic())
}
