//! Doctor models.

use serde::{Deserialize, Serialize};

/// A treating doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Doctor {
    /// Row ID - assigned by the store on insert
    pub id: i64,
    pub name: String,
    /// Specialty (e.g., "orthodontics", "endodontics")
    pub specialty: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Doctor {
    /// Create a new, unsaved doctor.
    pub fn new(name: String) -> Self {
        Self {
            id: 0,
            name,
            specialty: None,
            phone: None,
            email: None,
        }
    }

    /// Builder-style specialty setter.
    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = Some(specialty.into());
        self
    }
}
