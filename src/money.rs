// src/money.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    GBP, // Pound sterling, the marketplace currency
    EUR, // Euro
    SEK, // Swedish Krona
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::GBP => write!(f, "GBP"),
            Currency::EUR => write!(f, "EUR"),
            Currency::SEK => write!(f, "SEK"),
        }
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GBP" => Ok(Currency::GBP),
            "EUR" => Ok(Currency::EUR),
            "SEK" => Ok(Currency::SEK),
            _ => Err(format!("Unknown currency: {}", s)),
        }
    }
}

/// Amount value in the currency's minor unit (pence for GBP).
pub type AmountValue = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount {
    currency: Currency,
    value: AmountValue,
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer {
        serializer.serialize_str(&self.to_string())
    }
}
impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Amount::from_str(&text)
            .map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount is not a finite number")]
    NotFinite,

    #[error("Amount must be positive")]
    NotPositive,

    #[error("Amount has more than 2 fractional digits")]
    TooManyFractionDigits,

    #[error("Amount is out of range")]
    OutOfRange,
}

// Largest accepted amount in minor units. Kept far below i64::MAX so the
// fraction check on the scaled f64 stays meaningful.
const MAX_MINOR_UNITS: i64 = 100_000_000_000_000;

impl Amount {
    pub fn new(currency: Currency, value: AmountValue) -> Self {
        Amount { currency, value }
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Value in minor units (pence).
    pub fn value(&self) -> AmountValue {
        self.value
    }

    /// Interpret a caller-submitted decimal (major units, e.g. 5000.50) as an
    /// amount of `currency`. The number must be positive, finite and
    /// expressible in the currency's minor unit, i.e. carry at most 2
    /// fractional digits.
    pub fn from_decimal(currency: Currency, raw: f64) -> Result<Self, AmountError> {
        if !raw.is_finite() {
            return Err(AmountError::NotFinite);
        }
        if raw <= 0.0 {
            return Err(AmountError::NotPositive);
        }

        let scaled = raw * 100.0;
        if scaled > MAX_MINOR_UNITS as f64 {
            return Err(AmountError::OutOfRange);
        }

        let rounded = scaled.round();
        // Tolerance for the binary representation error of a genuine
        // 2-fraction-digit decimal; anything further off has extra digits.
        if (scaled - rounded).abs() > 1e-6 {
            return Err(AmountError::TooManyFractionDigits);
        }

        Ok(Amount {
            currency,
            value: rounded as i64,
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}.{:02}", self.currency, self.value / 100, self.value % 100)
    }
}

impl FromStr for Amount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let currency_end = s.chars().take_while(|c| c.is_alphabetic()).count();
        if currency_end == 0 {
            return Err("Invalid amount format: no currency".to_string());
        }

        let currency_str = &s[..currency_end];
        let currency = Currency::from_str(currency_str)?;

        let value_str = &s[currency_end..];
        let (major_str, minor_str) = match value_str.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (value_str, ""),
        };

        if minor_str.len() > 2 || !minor_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("Invalid amount value: {}", value_str));
        }

        let major = major_str.parse::<i64>()
            .map_err(|_| format!("Invalid amount value: {}", value_str))?;

        let minor = if minor_str.is_empty() {
            0
        } else {
            // Pad so that "5000.5" means 50 pence, not 5.
            format!("{:0<2}", minor_str).parse::<i64>()
                .map_err(|_| format!("Invalid amount value: {}", value_str))?
        };

        Ok(Amount {
            currency,
            value: major * 100 + minor,
        })
    }
}
