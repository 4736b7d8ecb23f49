use serde::{Deserialize, Serialize};

/// A postal address captured at order time.
///
/// Orders embed one copy for billing and one for shipping. The copies are
/// snapshots: once an order is created they are never refreshed from the
/// customer's address book.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub recipient: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
}

impl Address {
    /// Reject addresses with blank mandatory fields.
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("recipient", &self.recipient),
            ("line1", &self.line1),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(format!("address field '{}' must not be empty", field));
            }
        }
        Ok(())
    }
}
