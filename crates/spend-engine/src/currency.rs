//! Currency conversion and money labels
//!
//! Rates are multipliers from the snapshot's base currency. An unknown code is
//! not an error: it behaves as the base currency.

use std::collections::BTreeMap;

/// Multiplier for `code`, 1.0 when the code is absent or its rate is unusable
pub fn currency_multiplier(code: &str, rates: &BTreeMap<String, f64>) -> f64 {
    let code = code.trim();
    let rate = rates.get(code).copied().or_else(|| {
        rates
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(code))
            .map(|(_, r)| *r)
    });

    match rate {
        Some(r) if r.is_finite() && r > 0.0 => r,
        _ => {
            log::debug!("No usable exchange rate for '{}', using base currency", code);
            1.0
        }
    }
}

/// Display symbol for a currency code
pub fn currency_symbol(code: &str) -> Option<&'static str> {
    match code.trim().to_ascii_uppercase().as_str() {
        "GBP" => Some("£"),
        "EUR" => Some("€"),
        "USD" => Some("$"),
        _ => None,
    }
}

/// Compact money label such as `£1.25bn`, `-€35.0m` or `$980k`
pub fn format_money(amount: f64, code: &str) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let sign = if amount < 0.0 { "-" } else { "" };
    let abs = amount.abs();

    let body = if abs >= 1e9 {
        format!("{:.2}bn", abs / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}m", abs / 1e6)
    } else if abs >= 1e3 {
        format!("{:.0}k", abs / 1e3)
    } else {
        format!("{:.0}", abs)
    };

    match currency_symbol(code) {
        Some(symbol) => format!("{}{}{}", sign, symbol, body),
        None => format!("{}{} {}", sign, code.trim().to_ascii_uppercase(), body),
    }
}
