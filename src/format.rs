//! Display helpers for wallet details

use crate::config::Network;

/// Native asset code shown next to balances
pub const NATIVE_ASSET: &str = "XLM";

/// Shorten an address to `prefix...suffix`, keeping `chars` characters on each side.
///
/// Addresses too short to benefit are returned whole.
pub fn truncate_address(address: &str, chars: usize) -> String {
    let len = address.chars().count();
    if address.is_empty() || len <= chars * 2 {
        return address.to_string();
    }

    let head: String = address.chars().take(chars).collect();
    let tail: String = address.chars().skip(len - chars).collect();
    format!("{}...{}", head, tail)
}

/// Format an amount with thousands separators and at most three decimals,
/// e.g. `15420.5` -> `15,420.5 XLM`.
pub fn format_balance(amount: f64) -> String {
    format!("{} {}", group_thousands(amount), NATIVE_ASSET)
}

fn group_thousands(amount: f64) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }

    let rendered = format!("{:.3}", amount.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let negative = amount < 0.0 && (int_part != "0" || !frac_part.is_empty());
    let sign = if negative { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}

/// Account page on stellar.expert
pub fn explorer_url(network: Network, address: &str) -> String {
    format!(
        "https://stellar.expert/explorer/{}/account/{}",
        network.name(),
        address
    )
}
