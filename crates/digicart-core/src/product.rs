//! # Product Types
//!
//! Product types for the digicart catalog.
//! The seed catalog is loaded from `config/products.toml`.

use serde::{Deserialize, Serialize};

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    INR,
    USD,
    EUR,
    GBP,
}

impl Currency {
    /// Returns the ISO 4217 currency code as sent to the gateway
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::INR => "INR",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
        }
    }

    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u8 {
        2
    }

    fn symbol(&self) -> &'static str {
        match self {
            Currency::INR => "₹",
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
        }
    }

    /// Format an amount in minor units (e.g. "₹249.00")
    pub fn format_minor(&self, amount: i64) -> String {
        let divisor = 10_u64.pow(u32::from(self.decimal_places()));
        let sign = if amount < 0 { "-" } else { "" };
        let abs = amount.unsigned_abs();
        format!(
            "{}{}{}.{:02}",
            sign,
            self.symbol(),
            abs / divisor,
            abs % divisor
        )
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INR" => Ok(Currency::INR),
            "USD" => Ok(Currency::USD),
            "EUR" => Ok(Currency::EUR),
            "GBP" => Ok(Currency::GBP),
            other => Err(format!("unsupported currency: {}", other)),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A purchasable digital product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier / SKU (e.g., "eb-js-beg")
    pub id: String,

    /// Display title
    pub title: String,

    /// Price in minor currency units (paise for INR)
    pub price: i64,

    /// Resource locator released after a verified payment
    pub url: String,

    /// Bumped on every committed edit
    #[serde(default)]
    pub version: u64,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        price: i64,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price,
            url: url.into(),
            version: 0,
        }
    }

    /// Format the price for display
    pub fn display_price(&self, currency: Currency) -> String {
        currency.format_minor(self.price)
    }

    /// Projection safe to hand to anonymous clients
    pub fn public(&self) -> PublicProduct {
        PublicProduct {
            id: self.id.clone(),
            title: self.title.clone(),
            price: self.price,
        }
    }
}

/// Product as listed publicly: no resource locator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicProduct {
    pub id: String,
    pub title: String,
    pub price: i64,
}
