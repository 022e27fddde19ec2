//! Payment models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::treatment::Shares;

/// How the patient settled the bill.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "transfer" => Ok(PaymentMethod::Transfer),
            other => Err(format!("Unknown payment method: {}", other)),
        }
    }
}

/// Payment details as entered at the billing desk, before shares are computed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewPayment {
    pub appointment_id: i64,
    /// Amount billed before discounts and taxes
    pub total_amount: f64,
    /// Amount actually handed over
    pub paid_amount: f64,
    pub payment_method: PaymentMethod,
    pub discounts: f64,
    pub taxes: f64,
}

impl NewPayment {
    /// Payment with no discounts or taxes, fully paid in cash.
    pub fn new(appointment_id: i64, total_amount: f64) -> Self {
        Self {
            appointment_id,
            total_amount,
            paid_amount: total_amount,
            payment_method: PaymentMethod::Cash,
            discounts: 0.0,
            taxes: 0.0,
        }
    }

    pub fn with_discounts(mut self, discounts: f64) -> Self {
        self.discounts = discounts;
        self
    }

    pub fn with_taxes(mut self, taxes: f64) -> Self {
        self.taxes = taxes;
        self
    }
}

/// A recorded payment with its computed revenue split.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    /// Row ID - assigned by the store on insert
    pub id: i64,
    pub appointment_id: i64,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub clinic_share: f64,
    pub doctor_share: f64,
    pub payment_method: PaymentMethod,
    pub discounts: f64,
    pub taxes: f64,
    /// Settlement timestamp (clinic local time)
    pub date_paid: NaiveDateTime,
}

impl Payment {
    /// Build an unsaved payment from form input and computed shares.
    pub fn from_new(new: &NewPayment, shares: Shares, date_paid: NaiveDateTime) -> Self {
        Self {
            id: 0,
            appointment_id: new.appointment_id,
            total_amount: new.total_amount,
            paid_amount: new.paid_amount,
            clinic_share: shares.clinic_share,
            doctor_share: shares.doctor_share,
            payment_method: new.payment_method,
            discounts: new.discounts,
            taxes: new.taxes,
            date_paid,
        }
    }

    /// Total minus discounts plus taxes.
    pub fn net_amount(&self) -> f64 {
        self.total_amount - self.discounts + self.taxes
    }

    /// Amount still owed by the patient. Negative when overpaid.
    pub fn balance_due(&self) -> f64 {
        self.net_amount() - self.paid_amount
    }
}
