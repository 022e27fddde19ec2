//! Treatment catalog and revenue split configuration.

use serde::{Deserialize, Serialize};

/// Tolerance used when checking whether a split covers the whole net amount.
pub const SPLIT_TOLERANCE: f64 = 1e-9;

/// A treatment offered by the clinic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Treatment {
    /// Row ID - assigned by the store on insert
    pub id: i64,
    pub name: String,
    /// Nominal list price. Informational only, never used in share math.
    pub base_cost: f64,
}

impl Treatment {
    /// Create a new, unsaved treatment.
    pub fn new(name: String, base_cost: f64) -> Self {
        Self {
            id: 0,
            name,
            base_cost,
        }
    }
}

/// How a payment is divided between clinic and doctor, in percent.
///
/// Nothing forces the two halves to sum to 100. A split summing to less
/// under-allocates the net amount and one summing to more over-allocates it;
/// use [`ShareSplit::is_balanced`] to detect either case.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ShareSplit {
    pub clinic_percentage: f64,
    pub doctor_percentage: f64,
}

impl ShareSplit {
    pub fn new(clinic_percentage: f64, doctor_percentage: f64) -> Self {
        Self {
            clinic_percentage,
            doctor_percentage,
        }
    }

    /// Sum of both percentages.
    pub fn total_percentage(&self) -> f64 {
        self.clinic_percentage + self.doctor_percentage
    }

    /// True when the split allocates exactly 100% of the net amount.
    pub fn is_balanced(&self) -> bool {
        (self.total_percentage() - 100.0).abs() < SPLIT_TOLERANCE
    }

    /// Apply the split to a net amount.
    pub fn shares(&self, net_amount: f64) -> Shares {
        Shares {
            clinic_share: net_amount * (self.clinic_percentage / 100.0),
            doctor_share: net_amount * (self.doctor_percentage / 100.0),
        }
    }
}

impl Default for ShareSplit {
    /// Even 50/50 split used when no configuration exists for a pair.
    fn default() -> Self {
        Self::new(50.0, 50.0)
    }
}

/// Computed clinic and doctor portions of a net amount.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Shares {
    pub clinic_share: f64,
    pub doctor_share: f64,
}

impl Shares {
    pub fn total(&self) -> f64 {
        self.clinic_share + self.doctor_share
    }
}

impl From<Shares> for (f64, f64) {
    fn from(shares: Shares) -> Self {
        (shares.clinic_share, shares.doctor_share)
    }
}

/// Split configuration for one (treatment, doctor) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentPercentage {
    /// Row ID - assigned by the store on insert
    pub id: i64,
    pub treatment_id: i64,
    pub doctor_id: i64,
    pub clinic_percentage: f64,
    pub doctor_percentage: f64,
}

impl TreatmentPercentage {
    /// Create a new, unsaved split configuration.
    pub fn new(treatment_id: i64, doctor_id: i64, split: ShareSplit) -> Self {
        Self {
            id: 0,
            treatment_id,
            doctor_id,
            clinic_percentage: split.clinic_percentage,
            doctor_percentage: split.doctor_percentage,
        }
    }

    pub fn split(&self) -> ShareSplit {
        ShareSplit::new(self.clinic_percentage, self.doctor_percentage)
    }
}
