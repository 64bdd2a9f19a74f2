//! Phone number normalization.
//!
//! CRM records hold the same number in wildly different shapes
//! (`+919876543210`, `98765 43210`, `09876543210`). `generate_formats`
//! expands one raw number into the ordered list of representations worth
//! searching, most certain first.

/// Reduce a raw number to its canonical form: digits plus at most one
/// leading `+`.
pub fn canonicalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_digit() {
            out.push(c);
        } else if c == '+' && out.is_empty() {
            out.push(c);
        }
    }
    out
}

/// Digits only, no `+`. Queue identity and the webhook payload use this.
pub fn digit_core(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Generate the ordered candidate formats for one raw number.
///
/// The canonical form always comes first. When the Indian country-code
/// pattern is recognized the country-code/trunk variants follow, and a
/// 10-digit local part additionally gets the spaced and hyphenated shapes
/// CRMs tend to store. Output is deduplicated, first seen wins.
///
/// A number with no digits still yields its (near-empty) canonical form
/// as the single candidate; callers treat that as "not found" rather than
/// querying a store with it.
pub fn generate_formats(raw: &str) -> Vec<String> {
    let clean = canonicalize(raw);
    let mut formats = vec![clean.clone()];

    let local: Option<String> = if let Some(rest) = clean.strip_prefix("+91") {
        Some(rest.to_string())
    } else if clean.starts_with("91") && clean.len() == 12 {
        Some(clean[2..].to_string())
    } else if clean.len() == 10 && !clean.starts_with('+') {
        Some(clean.clone())
    } else if clean.starts_with('0') && clean.len() == 11 {
        Some(clean[1..].to_string())
    } else {
        None
    };

    if let Some(ref local) = local {
        for variant in [
            format!("+91{local}"),
            format!("91{local}"),
            format!("0{local}"),
            local.clone(),
        ] {
            push_unique(&mut formats, variant);
        }
    }

    if let Some(local) = local.filter(|l| l.len() == 10) {
        push_unique(&mut formats, format!("{} {}", &local[..5], &local[5..]));
        push_unique(
            &mut formats,
            format!("{}-{}-{}", &local[..3], &local[3..6], &local[6..]),
        );
        push_unique(&mut formats, format!("+91 {local}"));
        push_unique(&mut formats, format!("91 {local}"));
    }

    formats
}

fn push_unique(formats: &mut Vec<String>, candidate: String) {
    if !formats.contains(&candidate) {
        formats.push(candidate);
    }
}
