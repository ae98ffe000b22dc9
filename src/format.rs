//! German display formatting shared by flowed and overlay documents.

use chrono::DateTime;

pub const EMPTY: &str = "-";

pub fn or_dash(value: &str) -> &str {
    let v = value.trim();
    if v.is_empty() {
        EMPTY
    } else {
        v
    }
}

/// `12.03.2024, 14:05 Uhr (Europe/Berlin)`. Timestamps that aren't RFC 3339
/// are shown as given.
pub fn signed_at(signed_at: Option<&str>, timezone: Option<&str>) -> Option<String> {
    let raw = signed_at.map(str::trim).filter(|s| !s.is_empty())?;
    let mut label = match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts.format("%d.%m.%Y, %H:%M Uhr").to_string(),
        Err(e) => {
            log::debug!("signedAt '{}' is not RFC 3339 ({}); showing it verbatim", raw, e);
            raw.to_string()
        }
    };
    if let Some(tz) = timezone.map(str::trim).filter(|s| !s.is_empty()) {
        label.push_str(&format!(" ({})", tz));
    }
    Some(label)
}

/// `1.234,56 €`
pub fn euro(value: f64) -> String {
    let cents = (value * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{}{},{:02} €", sign, group_thousands(cents / 100), cents % 100)
}

/// Decimal comma with at most `max_fraction` digits and no trailing zeros.
pub fn decimal(value: f64, max_fraction: usize) -> String {
    let mut s = format!("{:.*}", max_fraction, value);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s.replace('.', ",")
}

pub fn percent(value: f64) -> String {
    format!("{} %", decimal(value, 2))
}

fn group_thousands(mut n: u64) -> String {
    let mut groups = Vec::new();
    loop {
        if n < 1000 {
            groups.push(n.to_string());
            break;
        }
        groups.push(format!("{:03}", n % 1000));
        n /= 1000;
    }
    groups.reverse();
    groups.join(".")
}
