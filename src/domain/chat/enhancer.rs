//! Response enhancement.
//!
//! Wraps a raw generated reply with the structured extras the chat widget
//! renders: quick-reply chips, follow-up actions, and a guaranteed business
//! contact line. Pure over its inputs; the business facts come from config.

use serde::{Deserialize, Serialize};

use super::intent::{IntentCategory, URGENT_WORDS};

/// A tappable follow-up action attached to a bot reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseAction {
    /// Stable action kind the widget switches on ("call", "whatsapp", ...).
    pub kind: String,
    pub label: String,
    /// Target the widget opens: tel: / wa.me URL.
    pub target: String,
}

/// An enhanced bot reply, ready for the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedResponse {
    pub text: String,
    pub quick_replies: Vec<String>,
    pub actions: Vec<ResponseAction>,
    /// True when this turn should be flagged for human attention.
    pub escalated: bool,
}

/// Business facts quoted in replies and actions.
#[derive(Debug, Clone)]
pub struct BusinessContact {
    pub name: String,
    pub phone: String,
    pub whatsapp: String,
}

/// Decorates raw replies with contact details, quick replies, and actions.
#[derive(Debug, Clone)]
pub struct ResponseEnhancer {
    contact: BusinessContact,
}

impl ResponseEnhancer {
    /// Creates the enhancer around the business contact facts.
    pub fn new(contact: BusinessContact) -> Self {
        Self { contact }
    }

    /// Enhances a raw reply for the given intent category.
    ///
    /// The contact number is appended only when the reply does not already
    /// quote it. Service requests with urgent wording in the user message
    /// escalate the turn.
    pub fn enhance(
        &self,
        raw: &str,
        category: IntentCategory,
        user_message: &str,
        escalated: bool,
    ) -> EnhancedResponse {
        let mut text = raw.trim().to_string();
        let mut escalated = escalated;

        let urgent = {
            let lower = user_message.to_lowercase();
            URGENT_WORDS.iter().any(|w| lower.contains(w))
        };
        if matches!(
            category,
            IntentCategory::ServiceRequest | IntentCategory::Emergency
        ) && urgent
        {
            escalated = true;
        }

        if !text.contains(&self.contact.phone) {
            text.push_str(&format!(
                "\n\nYou can also reach {} directly on {}.",
                self.contact.name, self.contact.phone
            ));
        }

        EnhancedResponse {
            text,
            quick_replies: self.quick_replies_for(category),
            actions: self.actions_for(category, escalated),
            escalated,
        }
    }

    fn quick_replies_for(&self, category: IntentCategory) -> Vec<String> {
        let replies: &[&str] = match category {
            IntentCategory::SpareParts | IntentCategory::BulkOrder => {
                &["Check part price", "Order spare parts", "Talk to someone"]
            }
            IntentCategory::ServiceRequest | IntentCategory::FailedCall => {
                &["Book a repair visit", "Request a callback", "Service charges"]
            }
            IntentCategory::Emergency => &["Call now", "Request urgent visit"],
            IntentCategory::Sales => &["New appliance prices", "Exchange offers"],
            IntentCategory::BusinessInfo => &["Working hours", "Location", "Services offered"],
            IntentCategory::General => &["Book a repair", "Spare parts", "Working hours"],
        };
        replies.iter().map(|r| (*r).to_string()).collect()
    }

    fn actions_for(&self, category: IntentCategory, escalated: bool) -> Vec<ResponseAction> {
        let mut actions = vec![
            ResponseAction {
                kind: "call".to_string(),
                label: "Call us".to_string(),
                target: format!("tel:{}", self.contact.phone),
            },
            ResponseAction {
                kind: "whatsapp".to_string(),
                label: "WhatsApp".to_string(),
                target: format!("https://wa.me/{}", self.contact.whatsapp),
            },
        ];
        if escalated || category == IntentCategory::Emergency {
            actions[0].label = "Call now".to_string();
        }
        actions
    }
}
