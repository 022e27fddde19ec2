//! Patient models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A registered patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Row ID - assigned by the store on insert, ignored when inserting
    pub id: i64,
    /// Full name
    pub name: String,
    /// Age in years
    pub age: u32,
    /// Gender
    pub gender: Gender,
    /// Contact phone
    pub phone: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Free-text medical history
    pub medical_history: Option<String>,
    /// Path to an uploaded image (dental x-ray, photo)
    pub image_path: Option<String>,
}

impl Patient {
    /// Create a new, unsaved patient with required fields.
    pub fn new(name: String, age: u32, gender: Gender) -> Self {
        Self {
            id: 0,
            name,
            age,
            gender,
            phone: None,
            address: None,
            medical_history: None,
            image_path: None,
        }
    }

    /// Whether an image has been attached.
    pub fn has_image(&self) -> bool {
        self.image_path.is_some()
    }
}

/// Patient gender as recorded on the registration form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(format!("Unknown gender: {}", other)),
        }
    }
}
