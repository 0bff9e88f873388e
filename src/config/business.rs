//! Business facts configuration
//!
//! The shop details quoted in replies, actions, and the pickup address.

use serde::Deserialize;

use crate::domain::chat::BusinessContact;

use super::error::ValidationError;

/// Business facts.
#[derive(Debug, Clone, Deserialize)]
pub struct BusinessConfig {
    /// Shop name quoted in replies
    #[serde(default = "default_name")]
    pub name: String,

    /// Contact number quoted in replies and `tel:` actions
    #[serde(default = "default_phone")]
    pub phone: String,

    /// WhatsApp number in wa.me format (digits only)
    #[serde(default = "default_whatsapp")]
    pub whatsapp: String,

    /// Pickup address for spare-parts orders (pickup-only business)
    #[serde(default = "default_pickup_address")]
    pub pickup_address: String,

    /// Human-readable service hours
    #[serde(default = "default_service_hours")]
    pub service_hours: String,
}

impl BusinessConfig {
    /// Contact facts for the response enhancer.
    pub fn contact(&self) -> BusinessContact {
        BusinessContact {
            name: self.name.clone(),
            phone: self.phone.clone(),
            whatsapp: self.whatsapp.clone(),
        }
    }

    /// Validate business configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.phone.trim().is_empty() {
            return Err(ValidationError::MissingBusinessPhone);
        }
        Ok(())
    }
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            phone: default_phone(),
            whatsapp: default_whatsapp(),
            pickup_address: default_pickup_address(),
            service_hours: default_service_hours(),
        }
    }
}

fn default_name() -> String {
    "Kuttappan Electronics".to_string()
}

fn default_phone() -> String {
    "+91 94470 12345".to_string()
}

fn default_whatsapp() -> String {
    "919447012345".to_string()
}

fn default_pickup_address() -> String {
    "Kuttappan Electronics, MC Road, Thiruvalla".to_string()
}

fn default_service_hours() -> String {
    "Mon-Sat 9:00-19:00".to_string()
}
