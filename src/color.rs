//! Shared string utilities for color values and token names

use regex::Regex;
use std::sync::OnceLock;

static HEX_DIGITS_RE: OnceLock<Regex> = OnceLock::new();

fn hex_digits_re() -> &'static Regex {
    HEX_DIGITS_RE.get_or_init(|| Regex::new(r"^[0-9a-f]{6}([0-9a-f]{2})?$").unwrap())
}

/// Canonicalize a color string into lowercase `#rrggbb` / `#rrggbbaa` form.
///
/// Shorthand 3- and 4-digit forms are expanded by doubling each digit.
/// Variable references (`var(...)`) and anything that is not valid hex after
/// expansion are returned unchanged, so unknown tokens flow through intact.
///
/// # Examples
///
/// ```
/// use theme_sync::color::normalize_hex;
///
/// assert_eq!(normalize_hex("#abc"), "#aabbcc");
/// assert_eq!(normalize_hex("#ABCD"), "#aabbccdd");
/// assert_eq!(normalize_hex("not-a-color"), "not-a-color");
/// ```
pub fn normalize_hex(color: &str) -> String {
    let trimmed = color.trim();
    if trimmed.is_empty() {
        return color.to_string();
    }
    // Leave references/custom values alone
    if trimmed.starts_with("var(") {
        return color.to_string();
    }

    let mut digits = trimmed.strip_prefix('#').unwrap_or(trimmed).to_string();
    if digits.len() == 3 || digits.len() == 4 {
        // #rgb -> #rrggbb, #rgba -> #rrggbbaa
        digits = digits.chars().flat_map(|ch| [ch, ch]).collect();
    }
    digits.make_ascii_lowercase();

    if !hex_digits_re().is_match(&digits) {
        return color.to_string();
    }
    format!("#{digits}")
}

/// Convert a role key to kebab-case.
///
/// Inserts a dash at lowercase-to-uppercase boundaries, collapses
/// whitespace/underscore runs to single dashes, and lowercases the result.
///
/// # Examples
///
/// ```
/// use theme_sync::color::kebabize;
///
/// assert_eq!(kebabize("onPrimary"), "on-primary");
/// assert_eq!(kebabize("surface_container high"), "surface-container-high");
/// ```
pub fn kebabize(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    let mut prev_lower = false;
    let mut pending_dash = false;

    for ch in input.chars() {
        if ch.is_whitespace() || ch == '_' {
            if !out.is_empty() {
                pending_dash = true;
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower {
            pending_dash = true;
        }
        if pending_dash {
            out.push('-');
            pending_dash = false;
        }
        out.extend(ch.to_lowercase());
        prev_lower = ch.is_lowercase();
    }

    out
}

/// Strict slug: lowercase alphanumerics with non-alphanumeric runs collapsed
/// to single dashes and edge dashes trimmed. Used to match host mode names
/// against the canonical mode slugs.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_hex_expands_shorthand_rgb() {
        assert_eq!(normalize_hex("#abc"), "#aabbcc");
        assert_eq!(normalize_hex("abc"), "#aabbcc");
        assert_eq!(normalize_hex("#fff"), "#ffffff");
    }

    #[test]
    fn test_normalize_hex_expands_shorthand_rgba() {
        assert_eq!(normalize_hex("#abcd"), "#aabbccdd");
        assert_eq!(normalize_hex("1234"), "#11223344");
    }

    #[test]
    fn test_normalize_hex_lowercases_full_form() {
        assert_eq!(normalize_hex("#ABCDEF"), "#abcdef");
        assert_eq!(normalize_hex("ABCDEF12"), "#abcdef12");
    }

    #[test]
    fn test_normalize_hex_trims_whitespace() {
        assert_eq!(normalize_hex("  #123456  "), "#123456");
    }

    #[test]
    fn test_normalize_hex_passes_through_invalid() {
        assert_eq!(normalize_hex("not-a-color"), "not-a-color");
        assert_eq!(normalize_hex("#12345"), "#12345");
        assert_eq!(normalize_hex("#gggggg"), "#gggggg");
        assert_eq!(normalize_hex(""), "");
    }

    #[test]
    fn test_normalize_hex_preserves_var_references() {
        assert_eq!(normalize_hex("var(--primary)"), "var(--primary)");
    }

    #[test]
    fn test_normalize_hex_idempotent() {
        for input in ["#abc", "#abcd", "#ABCDEF", "not-a-color", "var(--x)", ""] {
            let once = normalize_hex(input);
            assert_eq!(normalize_hex(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_kebabize_camel_case() {
        assert_eq!(kebabize("onPrimaryContainer"), "on-primary-container");
        assert_eq!(kebabize("primary"), "primary");
    }

    #[test]
    fn test_kebabize_whitespace_and_underscores() {
        assert_eq!(kebabize("surface container"), "surface-container");
        assert_eq!(kebabize("surface__container"), "surface-container");
        assert_eq!(kebabize("Inverse Surface"), "inverse-surface");
    }

    #[test]
    fn test_kebabize_preserves_existing_dashes() {
        assert_eq!(kebabize("on-primary"), "on-primary");
    }

    #[test]
    fn test_slugify_strict() {
        assert_eq!(slugify("Light Medium Contrast"), "light-medium-contrast");
        assert_eq!(slugify("dark"), "dark");
        assert_eq!(slugify("  Dark / High Contrast!  "), "dark-high-contrast");
    }
}
