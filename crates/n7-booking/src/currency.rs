//! Currency conversion for displaying tour prices.
//!
//! Tour prices are quoted in US dollars. Rates are USD based: one dollar buys
//! `rates[code]` units of the target currency.

use std::collections::HashMap;

use serde::Serialize;

/// A currency the booking pages can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Currency {
    pub code: &'static str,
    pub symbol: &'static str,
    pub name: &'static str,
}

/// Base currency of all rates.
pub const BASE_CURRENCY: &str = "USD";

pub const SUPPORTED_CURRENCIES: &[Currency] = &[
    Currency { code: "USD", symbol: "$", name: "US Dollar" },
    Currency { code: "EUR", symbol: "€", name: "Euro" },
    Currency { code: "GBP", symbol: "£", name: "British Pound" },
    Currency { code: "DZD", symbol: "DA", name: "Algerian Dinar" },
    Currency { code: "MAD", symbol: "DH", name: "Moroccan Dirham" },
    Currency { code: "TND", symbol: "DT", name: "Tunisian Dinar" },
    Currency { code: "CAD", symbol: "C$", name: "Canadian Dollar" },
    Currency { code: "AUD", symbol: "A$", name: "Australian Dollar" },
    Currency { code: "JPY", symbol: "¥", name: "Japanese Yen" },
];

/// Rates used when the live exchange-rate service cannot be reached.
const FALLBACK_RATES: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 0.85),
    ("GBP", 0.73),
    ("DZD", 134.5),
    ("MAD", 10.2),
    ("TND", 3.1),
    ("CAD", 1.35),
    ("AUD", 1.52),
    ("JPY", 148.5),
];

/// Look up a supported currency by its ISO code, case-insensitively.
pub fn find_currency(code: &str) -> Option<&'static Currency> {
    SUPPORTED_CURRENCIES
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(code))
}

/// Static USD-based rates for every supported currency.
pub fn fallback_rates() -> HashMap<String, f64> {
    FALLBACK_RATES
        .iter()
        .map(|(code, rate)| ((*code).to_string(), *rate))
        .collect()
}

/// Convert a USD price into `code`. Without a known rate the price is returned unchanged.
pub fn convert(price_usd: f64, code: &str, rates: &HashMap<String, f64>) -> f64 {
    match rates.get(code) {
        Some(rate) => price_usd * rate,
        None => price_usd,
    }
}

/// Render an amount already expressed in `currency`.
///
/// Yen is shown as a rounded amount after its symbol. The Maghreb dinars and
/// dirham are rounded with the symbol after the amount. Everything else keeps
/// two decimals after the symbol.
pub fn format_amount(amount: f64, currency: &Currency) -> String {
    match currency.code {
        "JPY" => format!("{}{}", currency.symbol, group_thousands(amount.round() as i64)),
        "DZD" | "MAD" | "TND" => {
            format!("{} {}", group_thousands(amount.round() as i64), currency.symbol)
        }
        _ => format!("{}{:.2}", currency.symbol, amount),
    }
}

/// Convert a USD price and format it for display.
pub fn format_price(price_usd: f64, currency: &Currency, rates: &HashMap<String, f64>) -> String {
    format_amount(convert(price_usd, currency.code, rates), currency)
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
