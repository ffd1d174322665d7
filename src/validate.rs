//! Pure validators for free-text dialog input.
//!
//! Phone numbers and times of day are matched against fixed patterns.
//! Everything else the dialogs accept is either a button choice or
//! unconstrained text, so no other validators live here.

use std::sync::OnceLock;

use regex::Regex;

/// Optional leading `+`, then 9 to 15 digits.
const PHONE_PATTERN: &str = r"^\+?\d{9,15}$";

/// Strict 24-hour `HH:MM`. Hours are bounded to `00`–`23`.
const TIME_PATTERN: &str = r"^([01]\d|2[0-3]):[0-5]\d$";

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(PHONE_PATTERN).expect("static pattern is valid"))
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TIME_PATTERN).expect("static pattern is valid"))
}

/// Returns `true` if `phone` looks like an international phone number.
pub fn validate_phone(phone: &str) -> bool {
    phone_re().is_match(phone)
}

/// Returns `true` if `t` is a valid `HH:MM` time of day.
pub fn validate_time(t: &str) -> bool {
    time_re().is_match(t)
}
