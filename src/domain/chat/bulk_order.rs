//! Bulk spare-parts order flow.
//!
//! Four-step state machine (`initial -> collecting_contact -> confirming ->
//! complete`) with one explicit backward edge: cancellation from confirming
//! back to initial. Catalog search and order creation are collaboration
//! boundaries — the pure transition functions signal them to the caller via
//! [`BulkOrderOutcome`] instead of performing them.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{StateMachine, Timestamp};
use crate::ports::Part;

use super::customer::join_naturally;
use super::extractor::ExtractedFields;
use super::intent::{extract_part_query, extract_quantity};

/// Hard sanity ceiling: larger requests are redirected to direct contact.
pub const MAX_ORDER_QUANTITY: u32 = 1000;

/// Bulk unit pricing applies from this quantity, when a bulk price exists.
pub const BULK_PRICE_MIN_QUANTITY: u32 = 5;

/// Step of the bulk order flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkOrderStep {
    Initial,
    CollectingContact,
    Confirming,
    Complete,
}

impl StateMachine for BulkOrderStep {
    fn can_transition_to(&self, target: &Self) -> bool {
        use BulkOrderStep::*;
        matches!(
            (self, target),
            (Initial, CollectingContact)
                | (CollectingContact, Confirming)
                | (Confirming, Complete)
                // Explicit cancellation; the user may immediately start a
                // new order.
                | (Confirming, Initial)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use BulkOrderStep::*;
        match self {
            Initial => vec![CollectingContact],
            CollectingContact => vec![Confirming],
            Confirming => vec![Complete, Initial],
            Complete => vec![],
        }
    }
}

/// A priced order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub part_id: String,
    pub part_name: String,
    pub quantity: u32,
    /// Unit price in whole rupees.
    pub unit_price: u32,
    /// Line total in whole rupees.
    pub total_price: u32,
}

/// Contact details collected before confirmation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderContact {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl OrderContact {
    /// Labels of the contact pieces still missing.
    pub fn missing_labels(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.as_deref().map_or(true, |s| s.trim().is_empty()) {
            missing.push("your name");
        }
        if self.phone.as_deref().map_or(true, |s| s.trim().is_empty()) {
            missing.push("your phone number");
        }
        if self.email.as_deref().map_or(true, |s| s.trim().is_empty()) {
            missing.push("your email");
        }
        missing
    }

    /// True once name, phone, and email are all present.
    pub fn is_complete(&self) -> bool {
        self.missing_labels().is_empty()
    }
}

/// Accumulating state for one bulk order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkOrderState {
    pub step: BulkOrderStep,
    pub lines: Vec<OrderLine>,
    pub contact: OrderContact,
    /// Fixed at the pickup address once contact collection completes; this
    /// business is pickup-only.
    pub pickup_location: Option<String>,
    pub started_at: Timestamp,
}

impl BulkOrderState {
    /// Creates a fresh state at the initial step.
    pub fn new() -> Self {
        Self {
            step: BulkOrderStep::Initial,
            lines: Vec::new(),
            contact: OrderContact::default(),
            pickup_location: None,
            started_at: Timestamp::now(),
        }
    }

    /// Order total in whole rupees.
    pub fn total_amount(&self) -> u32 {
        self.lines.iter().map(|l| l.total_price).sum()
    }

    /// Returns true once the state has outlived `max_age_secs`.
    pub fn is_expired(&self, max_age_secs: u64) -> bool {
        self.started_at.age_secs() > max_age_secs
    }
}

impl Default for BulkOrderState {
    fn default() -> Self {
        Self::new()
    }
}

/// What the caller must do after a flow step.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkOrderOutcome {
    /// Persist the state and send this reply.
    Reply { text: String },
    /// Run a catalog search and re-invoke with the results.
    NeedsCatalogSearch { query: String, quantity: u32 },
    /// Order confirmed: clear the state, create the order record, and send
    /// the confirmation built by the caller.
    CreateOrder {
        lines: Vec<OrderLine>,
        contact: OrderContact,
        pickup_location: String,
        total_amount: u32,
    },
}

/// Pure engine for the bulk order flow.
#[derive(Debug, Clone)]
pub struct BulkOrderFlow {
    business_phone: String,
    pickup_address: String,
}

impl BulkOrderFlow {
    /// Creates the flow engine with the business contact facts it quotes.
    pub fn new(business_phone: impl Into<String>, pickup_address: impl Into<String>) -> Self {
        Self {
            business_phone: business_phone.into(),
            pickup_address: pickup_address.into(),
        }
    }

    /// Opens a new order from the triggering message.
    pub fn open(&self, message: &str) -> (BulkOrderState, BulkOrderOutcome) {
        let state = BulkOrderState::new();
        let lower = message.to_lowercase();
        let quantity = extract_quantity(&lower);
        let query = extract_part_query(message);

        if let Some(quantity) = quantity {
            if quantity > MAX_ORDER_QUANTITY {
                let text = format!(
                    "For orders above {} units, please contact us directly on {} so \
                     we can arrange special pricing and logistics.",
                    MAX_ORDER_QUANTITY, self.business_phone
                );
                return (state, BulkOrderOutcome::Reply { text });
            }
        }

        match (quantity, query) {
            (Some(quantity), Some(query)) => {
                (state, BulkOrderOutcome::NeedsCatalogSearch { query, quantity })
            }
            (Some(_), None) => {
                let text = "Happy to help with a parts order. Which spare part do you need?"
                    .to_string();
                (state, BulkOrderOutcome::Reply { text })
            }
            (None, Some(query)) => {
                let text = format!("How many units of the {} do you need?", query);
                (state, BulkOrderOutcome::Reply { text })
            }
            (None, None) => {
                let text = "Happy to help with a parts order. Which spare part do you \
                            need, and how many units?"
                    .to_string();
                (state, BulkOrderOutcome::Reply { text })
            }
        }
    }

    /// Applies catalog search results while at the initial step.
    pub fn apply_catalog_results(
        &self,
        mut state: BulkOrderState,
        quantity: u32,
        query: &str,
        parts: &[Part],
    ) -> (BulkOrderState, BulkOrderOutcome) {
        let Some(part) = parts.first() else {
            let text = format!(
                "I couldn't find \"{}\" in our parts catalog. Could you describe the \
                 part differently, or call us on {}?",
                query, self.business_phone
            );
            return (state, BulkOrderOutcome::Reply { text });
        };

        if part.stock_quantity == 0 {
            let text = format!(
                "{} is out of stock right now. We can suggest alternatives or take a \
                 back-order — call us on {} to arrange one.",
                part.name, self.business_phone
            );
            return (state, BulkOrderOutcome::Reply { text });
        }

        if quantity > part.stock_quantity {
            let text = format!(
                "We only have {} units of {} in stock at the moment. Would you like \
                 to order the {} available units instead?",
                part.stock_quantity, part.name, part.stock_quantity
            );
            return (state, BulkOrderOutcome::Reply { text });
        }

        let unit_price = match part.bulk_price {
            Some(bulk) if quantity >= BULK_PRICE_MIN_QUANTITY => bulk,
            _ => part.price,
        };
        state.lines.push(OrderLine {
            part_id: part.id.clone(),
            part_name: part.name.clone(),
            quantity,
            unit_price,
            total_price: unit_price * quantity,
        });
        state.step = BulkOrderStep::CollectingContact;

        let text = format!(
            "{} x {} at \u{20B9}{} each comes to \u{20B9}{}. To place the order I \
             need your name, your phone number, and your email.",
            quantity,
            part.name,
            unit_price,
            unit_price * quantity
        );
        (state, BulkOrderOutcome::Reply { text })
    }

    /// Advances an order past the initial step with a new user message.
    ///
    /// # Panics
    ///
    /// Never: initial/complete steps fall through to a neutral reply.
    pub fn advance(
        &self,
        state: BulkOrderState,
        message: &str,
        extracted: &ExtractedFields,
    ) -> (BulkOrderState, BulkOrderOutcome) {
        match state.step {
            BulkOrderStep::CollectingContact => self.collect_contact(state, message, extracted),
            BulkOrderStep::Confirming => self.confirm(state, message),
            BulkOrderStep::Initial | BulkOrderStep::Complete => {
                let text = "Which spare part do you need, and how many units?".to_string();
                (state, BulkOrderOutcome::Reply { text })
            }
        }
    }

    fn collect_contact(
        &self,
        mut state: BulkOrderState,
        message: &str,
        extracted: &ExtractedFields,
    ) -> (BulkOrderState, BulkOrderOutcome) {
        // Fill-gaps-only, same policy as the callback flow.
        if state.contact.name.is_none() {
            state.contact.name = extracted.name.as_ref().map(|f| f.value.clone());
        }
        if state.contact.phone.is_none() {
            state.contact.phone = extracted.phone.as_ref().map(|f| f.value.clone());
        }
        if state.contact.email.is_none() {
            state.contact.email = extract_email(message);
        }

        if state.contact.is_complete() {
            state.pickup_location = Some(self.pickup_address.clone());
            state.step = BulkOrderStep::Confirming;
            let text = self.summary(&state);
            return (state, BulkOrderOutcome::Reply { text });
        }

        let text = format!(
            "Almost there — I still need {}.",
            join_naturally(&state.contact.missing_labels())
        );
        (state, BulkOrderOutcome::Reply { text })
    }

    fn confirm(
        &self,
        mut state: BulkOrderState,
        message: &str,
    ) -> (BulkOrderState, BulkOrderOutcome) {
        let lower = message.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let affirmative = words.iter().any(|w| matches!(*w, "yes" | "confirm" | "ok" | "okay"))
            || lower.contains("place order")
            || lower.contains("place the order");
        let negative =
            words.iter().any(|w| *w == "no") || lower.contains("cancel") || lower.contains("don't want");

        if affirmative && !negative {
            state.step = BulkOrderStep::Complete;
            let outcome = BulkOrderOutcome::CreateOrder {
                lines: state.lines.clone(),
                contact: state.contact.clone(),
                pickup_location: state
                    .pickup_location
                    .clone()
                    .unwrap_or_else(|| self.pickup_address.clone()),
                total_amount: state.total_amount(),
            };
            return (state, outcome);
        }

        if negative {
            state.lines.clear();
            state.pickup_location = None;
            state.step = BulkOrderStep::Initial;
            let text = "No problem, I've cancelled that order. Tell me if you'd like \
                        to order a different part."
                .to_string();
            return (state, BulkOrderOutcome::Reply { text });
        }

        let text = self.summary(&state);
        (state, BulkOrderOutcome::Reply { text })
    }

    fn summary(&self, state: &BulkOrderState) -> String {
        let mut lines_text = String::new();
        for line in &state.lines {
            lines_text.push_str(&format!(
                "{} x {} (\u{20B9}{} each)",
                line.quantity, line.part_name, line.unit_price
            ));
        }
        format!(
            "Order summary: {} — total \u{20B9}{}. Pickup at {}. Reply \"yes\" to \
             confirm or \"no\" to cancel.",
            lines_text,
            state.total_amount(),
            self.pickup_address
        )
    }
}

/// Extracts the first email address in the message.
pub fn extract_email(text: &str) -> Option<String> {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("valid regex")
    });
    RE.find(text).map(|m| m.as_str().to_string())
}
