//! Amount, phone and address helpers.

use sha2::{Digest, Sha256};

/// Octas per whole coin.
pub const OCTAS_PER_COIN: u64 = 100_000_000;

const DECIMALS: usize = 8;

/// Format octas as a coin amount with 8 decimals.
pub fn format_balance(octas: u64) -> String {
    format!("{}.{:08}", octas / OCTAS_PER_COIN, octas % OCTAS_PER_COIN)
}

/// Parse a positive decimal coin amount into octas.
///
/// Digits beyond the eighth decimal are truncated. Returns `None` for
/// malformed input or amounts that round down to zero.
pub fn parse_amount(text: &str) -> Option<u64> {
    let text = text.trim();
    let (whole, frac) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };

    let mut frac: String = frac.chars().take(DECIMALS).collect();
    while frac.len() < DECIMALS {
        frac.push('0');
    }
    let frac: u64 = frac.parse().ok()?;

    let octas = whole.checked_mul(OCTAS_PER_COIN)?.checked_add(frac)?;
    (octas > 0).then_some(octas)
}

/// Shorten an address for chat display: `0x12345678...abcdef`.
pub fn shorten_address(address: &str) -> String {
    if address.len() <= 16 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..10], &address[address.len() - 6..])
}

/// Whether `phone` is an E.164 number: `+` then 2 to 15 digits, no leading zero.
pub fn is_valid_phone_number(phone: &str) -> bool {
    let Some(digits) = phone.strip_prefix('+') else {
        return false;
    };
    (2..=15).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_digit())
        && !digits.starts_with('0')
}

/// Whether `address` is a full-length `0x` account address.
pub fn is_valid_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .is_some_and(|h| h.len() == 64 && h.chars().all(|c| c.is_ascii_hexdigit()))
}

/// SHA-256 of the phone number, as passed to the registry contract.
pub fn hash_phone_number(phone: &str) -> [u8; 32] {
    let digest = Sha256::digest(phone.as_bytes());
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&digest);
    hash
}

/// `0x`-prefixed hex of [`hash_phone_number`].
pub fn phone_hash_hex(phone: &str) -> String {
    format!("0x{}", hex::encode(hash_phone_number(phone)))
}
