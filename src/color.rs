/// Background fill of a composite's subgraph at a given nesting level: each
/// channel starts at 255 and decays by its coefficient per level.
pub fn compute_background(coeffs: [u8; 3], level: u32) -> String {
    let channel = |c: u8| 255u32.saturating_sub((c as u32).saturating_mul(level));
    format!(
        "#{:02x}{:02x}{:02x}",
        channel(coeffs[0]),
        channel(coeffs[1]),
        channel(coeffs[2])
    )
}

/// Accept `#RRGGBB`, `#RRGGBBAA` or a plain color name.
pub fn is_valid_color(val: &str) -> bool {
    let val = val.trim();
    match val.strip_prefix('#') {
        Some(hex) => matches!(hex.len(), 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => !val.is_empty() && val.chars().all(|c| c.is_ascii_alphanumeric()),
    }
}
