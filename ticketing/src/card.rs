//! Card details and the checks run before a charge reaches the gateway.

use crate::error::CardError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Card details as entered at checkout
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    /// Card number; spaces are allowed
    pub number: String,
    /// Expiry as `MM/YY`
    pub expiry: String,
    /// Security code
    pub cvv: String,
}

impl CardDetails {
    /// Convenience constructor
    #[must_use]
    pub fn new(number: impl Into<String>, expiry: impl Into<String>, cvv: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            expiry: expiry.into(),
            cvv: cvv.into(),
        }
    }

    /// Runs every check in order and returns the last four digits.
    ///
    /// A card stays valid through the last day of its expiry month.
    ///
    /// # Errors
    ///
    /// Returns the first [`CardError`] that applies: length, expiry format,
    /// CVV, expiry date, then the Luhn checksum.
    pub fn validate(&self, today: NaiveDate) -> Result<String, CardError> {
        let digits: String = self.number.chars().filter(|c| !c.is_whitespace()).collect();
        if digits.len() != 16 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(CardError::InvalidLength);
        }

        let (month, year) = parse_expiry(&self.expiry).ok_or(CardError::InvalidExpiryFormat)?;

        let cvv = self.cvv.trim();
        if !(3..=4).contains(&cvv.len()) || !cvv.chars().all(|c| c.is_ascii_digit()) {
            return Err(CardError::InvalidCvv);
        }

        if (year, month) < (today.year(), today.month()) {
            return Err(CardError::Expired);
        }

        if !luhn_valid(&digits) {
            return Err(CardError::FailedChecksum);
        }

        Ok(digits[digits.len() - 4..].to_string())
    }
}

/// `MM/YY` into (month, four-digit year)
fn parse_expiry(expiry: &str) -> Option<(u32, i32)> {
    let (month, year) = expiry.trim().split_once('/')?;
    if month.len() != 2 || year.len() != 2 {
        return None;
    }
    let month: u32 = month.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    (1..=12).contains(&month).then_some((month, 2000 + year))
}

/// Luhn checksum over a string of ASCII digits
#[must_use]
pub fn luhn_valid(digits: &str) -> bool {
    let mut sum = 0;
    for (index, c) in digits.chars().rev().enumerate() {
        let Some(mut digit) = c.to_digit(10) else {
            return false;
        };
        if index % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    !digits.is_empty() && sum % 10 == 0
}
