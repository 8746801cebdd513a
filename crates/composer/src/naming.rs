/// Removes a leading numeric ordering prefix such as `01-` or `3_`.
///
/// Digits only count as a prefix when a separator follows them and something
/// remains afterwards, so `3d-sponge` and `42` are returned untouched.
pub fn strip_order_prefix(stem: &str) -> &str {
    let digits = stem
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(stem.len());
    if digits == 0 {
        return stem;
    }

    let rest = &stem[digits..];
    let trimmed = rest.trim_start_matches(['-', '_', '.', ' ']);
    if trimmed.len() == rest.len() || trimmed.is_empty() {
        stem
    } else {
        trimmed
    }
}

/// Formats a fragment key for presentation (`02_neon-lava` -> `Neon Lava`).
pub fn format_display_name(key: &str) -> String {
    let stripped = strip_order_prefix(key);
    let mut label = String::with_capacity(stripped.len());
    let mut in_word = false;
    for ch in stripped.chars() {
        let ch = if ch == '-' || ch == '_' { ' ' } else { ch };
        if ch.is_alphanumeric() {
            if in_word {
                label.push(ch);
            } else {
                label.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            label.push(ch);
            in_word = false;
        }
    }
    label
}
