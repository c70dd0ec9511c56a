//! Format checks for the card fields captured on subscription.
//!
//! Nothing here talks to a payment provider; the fields are only stored.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static CARD_HOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z ]{2,64}$").expect("valid card holder pattern"));
static CARD_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{16}$").expect("valid card number pattern"));
static TWO_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}$").expect("valid month pattern"));
static FOUR_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").expect("valid year pattern"));
static CVV: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{3}$").expect("valid cvv pattern"));

pub const MISSING_FIELDS: &str = "Fill in all card fields.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardForm {
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default)]
    pub card_holder: String,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub expiry_month: String,
    #[serde(default)]
    pub expiry_year: String,
    #[serde(default)]
    pub cvv: String,
}

impl CardForm {
    pub fn trimmed(&self) -> CardForm {
        CardForm {
            plan: self.plan.clone(),
            card_holder: self.card_holder.trim().to_string(),
            card_number: self.card_number.trim().to_string(),
            expiry_month: self.expiry_month.trim().to_string(),
            expiry_year: self.expiry_year.trim().to_string(),
            cvv: self.cvv.trim().to_string(),
        }
    }

    /// Returns every problem with the (already trimmed) form.
    pub fn validate(&self) -> Vec<String> {
        let fields = [
            &self.card_holder,
            &self.card_number,
            &self.expiry_month,
            &self.expiry_year,
            &self.cvv,
        ];
        if fields.iter().any(|field| field.is_empty()) {
            return vec![MISSING_FIELDS.to_string()];
        }

        let mut errors = Vec::new();
        if !CARD_HOLDER.is_match(&self.card_holder) {
            errors.push("Card holder name must use Latin letters.".to_string());
        }
        if !CARD_NUMBER.is_match(&self.card_number) {
            errors.push("Card number must contain exactly 16 digits.".to_string());
        }
        let month_ok = TWO_DIGITS.is_match(&self.expiry_month)
            && matches!(self.expiry_month.parse::<u8>(), Ok(1..=12));
        if !month_ok {
            errors.push("Enter the expiry month as MM (01-12).".to_string());
        }
        if !FOUR_DIGITS.is_match(&self.expiry_year) {
            errors.push("Enter the expiry year as YYYY.".to_string());
        }
        if !CVV.is_match(&self.cvv) {
            errors.push("CVV/CVC must contain exactly 3 digits.".to_string());
        }
        errors
    }
}
