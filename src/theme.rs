//! Canonical theme model and the shape-tolerant export parser.
//!
//! Design-tool exports are only loosely structured: roles may live under
//! `schemes.<mode>.roles`, `schemes.<mode>.colors`, directly on the scheme
//! object, or as bare hex maps keyed by mode at the top level. The parser
//! tries an ordered list of shape matchers per mode and falls back to a
//! loose hex scan when none of them produce anything.

use crate::color::{kebabize, normalize_hex};
use crate::error::{Result, SyncError};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

/// The fixed set of contrast/appearance variants a theme export can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModeSlug {
    Light,
    LightMediumContrast,
    LightHighContrast,
    Dark,
    DarkMediumContrast,
    DarkHighContrast,
}

impl ModeSlug {
    /// All modes in canonical order. Iteration order is stable and drives
    /// seed-value selection and per-mode processing.
    pub const ALL: [ModeSlug; 6] = [
        ModeSlug::Light,
        ModeSlug::LightMediumContrast,
        ModeSlug::LightHighContrast,
        ModeSlug::Dark,
        ModeSlug::DarkMediumContrast,
        ModeSlug::DarkHighContrast,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModeSlug::Light => "light",
            ModeSlug::LightMediumContrast => "light-medium-contrast",
            ModeSlug::LightHighContrast => "light-high-contrast",
            ModeSlug::Dark => "dark",
            ModeSlug::DarkMediumContrast => "dark-medium-contrast",
            ModeSlug::DarkHighContrast => "dark-high-contrast",
        }
    }

    /// Match a canonical slug string back to a mode.
    pub fn from_slug(slug: &str) -> Option<ModeSlug> {
        ModeSlug::ALL.iter().copied().find(|m| m.as_str() == slug)
    }
}

impl fmt::Display for ModeSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token name -> normalized hex color for a single mode.
pub type TokenMap = BTreeMap<String, String>;

/// The normalized mode -> token -> hex mapping produced by the parser.
///
/// Invariant: every [`ModeSlug`] is present after a successful parse,
/// possibly with an empty token map.
#[derive(Debug, Clone, Default)]
pub struct CanonicalTheme {
    modes: BTreeMap<ModeSlug, TokenMap>,
}

impl CanonicalTheme {
    pub fn tokens(&self, mode: ModeSlug) -> &TokenMap {
        static EMPTY: OnceLock<TokenMap> = OnceLock::new();
        self.modes
            .get(&mode)
            .unwrap_or_else(|| EMPTY.get_or_init(TokenMap::new))
    }

    pub fn get(&self, mode: ModeSlug, token: &str) -> Option<&str> {
        self.modes.get(&mode)?.get(token).map(String::as_str)
    }

    /// Union of token names across all modes, lexicographically ordered.
    pub fn token_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .modes
            .values()
            .flat_map(|map| map.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Count of modes that carry at least one token.
    pub fn populated_mode_count(&self) -> usize {
        self.modes.values().filter(|m| !m.is_empty()).count()
    }
}

static LOOSE_HEX_RE: OnceLock<Regex> = OnceLock::new();

fn loose_hex_re() -> &'static Regex {
    LOOSE_HEX_RE.get_or_init(|| Regex::new(r"^#?[0-9a-fA-F]{3,8}$").unwrap())
}

/// Locate the scheme object for a mode. Matchers are tried in priority
/// order: `schemes[mode]`, then a top-level `[mode]` key.
fn locate_scheme<'a>(doc: &'a Map<String, Value>, mode: ModeSlug) -> Option<&'a Value> {
    if let Some(scheme) = doc
        .get("schemes")
        .and_then(|s| s.get(mode.as_str()))
        .filter(|s| !s.is_null())
    {
        return Some(scheme);
    }
    doc.get(mode.as_str()).filter(|s| !s.is_null())
}

/// Locate the role map inside a scheme: `.roles`, then `.colors`, else the
/// scheme object itself.
fn locate_roles(scheme: &Value) -> Option<&Map<String, Value>> {
    for key in ["roles", "colors"] {
        if let Some(roles) = scheme.get(key).and_then(Value::as_object) {
            return Some(roles);
        }
    }
    scheme.as_object()
}

/// Extract a color from a role value. Strings are taken as-is; objects are
/// probed for `.hex`, `.value`, `.color` in that order.
fn extract_color(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        Value::Object(obj) => ["hex", "value", "color"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_str)),
        _ => None,
    }
}

/// Parse an arbitrary theme-export JSON document into a [`CanonicalTheme`].
///
/// Fails with [`SyncError::InvalidInput`] when the document is not an
/// object, and with [`SyncError::NoSchemesFound`] when neither the scheme
/// matchers nor the loose hex fallback locate a single populated mode.
pub fn parse_theme(json: &Value) -> Result<CanonicalTheme> {
    let doc = json
        .as_object()
        .ok_or_else(|| SyncError::InvalidInput("theme document must be a JSON object".into()))?;

    let mut theme = CanonicalTheme::default();

    for mode in ModeSlug::ALL {
        let Some(scheme) = locate_scheme(doc, mode) else {
            continue;
        };
        let Some(roles) = locate_roles(scheme) else {
            continue;
        };

        let mut flat = TokenMap::new();
        for (key, value) in roles {
            // Entries yielding no usable color are skipped silently
            if let Some(hex) = extract_color(value) {
                flat.insert(kebabize(key), normalize_hex(hex));
            }
        }
        theme.modes.insert(mode, flat);
    }

    // Fallback: scan top-level mode objects for loose hex-valued properties
    if theme.modes.is_empty() {
        debug!("no schemes matched, trying loose hex scan");
        for mode in ModeSlug::ALL {
            let Some(node) = doc.get(mode.as_str()).and_then(Value::as_object) else {
                continue;
            };
            let mut flat = TokenMap::new();
            for (key, value) in node {
                if let Some(s) = value.as_str() {
                    if loose_hex_re().is_match(s) {
                        flat.insert(kebabize(key), normalize_hex(s));
                    }
                }
            }
            if !flat.is_empty() {
                theme.modes.insert(mode, flat);
            }
        }
    }

    if theme.modes.is_empty() {
        return Err(SyncError::NoSchemesFound);
    }

    // Missing modes are not an error; fill them with empty maps
    for mode in ModeSlug::ALL {
        theme.modes.entry(mode).or_default();
    }

    debug!(
        populated = theme.populated_mode_count(),
        tokens = theme.token_names().len(),
        "parsed theme export"
    );
    Ok(theme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_roles_under_schemes() {
        let data = json!({
            "schemes": {
                "light": { "roles": { "primary": "#123456", "on-primary": "#fff" } },
                "dark": { "roles": { "primary": "#abcdef" } },
            }
        });
        let theme = parse_theme(&data).unwrap();
        assert_eq!(theme.get(ModeSlug::Light, "primary"), Some("#123456"));
        assert_eq!(theme.get(ModeSlug::Light, "on-primary"), Some("#ffffff"));
        assert_eq!(theme.get(ModeSlug::Dark, "primary"), Some("#abcdef"));
        // All other enumerated modes present as empty maps
        for mode in [
            ModeSlug::LightMediumContrast,
            ModeSlug::LightHighContrast,
            ModeSlug::DarkMediumContrast,
            ModeSlug::DarkHighContrast,
        ] {
            assert!(theme.tokens(mode).is_empty(), "{mode} should be empty");
        }
    }

    #[test]
    fn test_parses_colors_key_and_bare_scheme() {
        let data = json!({
            "schemes": {
                "light": { "colors": { "surface": "#FFFBFE" } },
                "dark": { "primary": "#D0BCFF" },
            }
        });
        let theme = parse_theme(&data).unwrap();
        assert_eq!(theme.get(ModeSlug::Light, "surface"), Some("#fffbfe"));
        assert_eq!(theme.get(ModeSlug::Dark, "primary"), Some("#d0bcff"));
    }

    #[test]
    fn test_parses_top_level_mode_objects() {
        let data = json!({
            "light": { "roles": { "primary": "#6750A4" } },
        });
        let theme = parse_theme(&data).unwrap();
        assert_eq!(theme.get(ModeSlug::Light, "primary"), Some("#6750a4"));
    }

    #[test]
    fn test_extracts_object_role_values_in_priority_order() {
        let data = json!({
            "schemes": {
                "light": { "roles": {
                    "primary": { "hex": "#111111", "value": "#222222" },
                    "secondary": { "value": "#333333", "color": "#444444" },
                    "tertiary": { "color": "#555555" },
                    "ignored": { "name": "no color here" },
                    "alsoIgnored": 42,
                } },
            }
        });
        let theme = parse_theme(&data).unwrap();
        let light = theme.tokens(ModeSlug::Light);
        assert_eq!(light.get("primary").map(String::as_str), Some("#111111"));
        assert_eq!(light.get("secondary").map(String::as_str), Some("#333333"));
        assert_eq!(light.get("tertiary").map(String::as_str), Some("#555555"));
        assert!(!light.contains_key("ignored"));
        assert!(!light.contains_key("also-ignored"));
    }

    #[test]
    fn test_kebabizes_role_keys() {
        let data = json!({
            "schemes": {
                "light": { "roles": { "onPrimaryContainer": "#abc", "surface_dim": "#def" } },
            }
        });
        let theme = parse_theme(&data).unwrap();
        let light = theme.tokens(ModeSlug::Light);
        assert_eq!(
            light.get("on-primary-container").map(String::as_str),
            Some("#aabbcc")
        );
        assert_eq!(light.get("surface-dim").map(String::as_str), Some("#ddeeff"));
    }

    #[test]
    fn test_bare_mode_maps_pass_nonhex_strings_through() {
        // Top-level mode objects are handled by the shape matchers (the
        // role map is the object itself), so string values pass through
        // untouched and only non-strings are dropped
        let data = json!({
            "light": { "primary": "#6750A4", "label": "not hex", "count": 3 },
            "dark": { "primary": "1C1B1F" },
        });
        let theme = parse_theme(&data).unwrap();
        assert_eq!(theme.get(ModeSlug::Light, "primary"), Some("#6750a4"));
        assert_eq!(theme.get(ModeSlug::Dark, "primary"), Some("#1c1b1f"));
        assert_eq!(theme.get(ModeSlug::Light, "label"), Some("not hex"));
        assert!(!theme.tokens(ModeSlug::Light).contains_key("count"));
    }

    #[test]
    fn test_fallback_loose_hex_scan() {
        // schemes[light] exists but is not an object, so every shape
        // matcher comes up empty and the loose hex scan takes over. Unlike
        // the matchers, the scan keeps only hex-shaped string values.
        let data = json!({
            "schemes": { "light": "unresolved" },
            "light": { "primary": "#6750A4", "label": "not hex", "count": 3 },
        });
        let theme = parse_theme(&data).unwrap();
        assert_eq!(theme.get(ModeSlug::Light, "primary"), Some("#6750a4"));
        assert!(!theme.tokens(ModeSlug::Light).contains_key("label"));
        assert!(!theme.tokens(ModeSlug::Light).contains_key("count"));
    }

    #[test]
    fn test_invalid_input_on_non_object() {
        let err = parse_theme(&json!("bad")).unwrap_err();
        assert!(matches!(err, SyncError::InvalidInput(_)));
        let err = parse_theme(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, SyncError::InvalidInput(_)));
    }

    #[test]
    fn test_no_schemes_found_when_no_mode_key_exists() {
        let err = parse_theme(&json!({ "palette": { "blue": "#0000ff" } })).unwrap_err();
        assert!(matches!(err, SyncError::NoSchemesFound));
    }

    #[test]
    fn test_empty_scheme_object_is_not_an_error() {
        // A mode key exists, so the document is accepted even though the
        // token maps are empty
        let data = json!({ "schemes": { "light": {} } });
        let theme = parse_theme(&data).unwrap();
        assert!(theme.tokens(ModeSlug::Light).is_empty());
        assert_eq!(theme.populated_mode_count(), 0);
    }

    #[test]
    fn test_token_names_union_is_sorted_and_deduped() {
        let data = json!({
            "schemes": {
                "light": { "roles": { "b": "#111111", "a": "#222222" } },
                "dark": { "roles": { "b": "#333333", "c": "#444444" } },
            }
        });
        let theme = parse_theme(&data).unwrap();
        assert_eq!(theme.token_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_mode_slug_round_trip() {
        for mode in ModeSlug::ALL {
            assert_eq!(ModeSlug::from_slug(mode.as_str()), Some(mode));
        }
        assert_eq!(ModeSlug::from_slug("sepia"), None);
    }
}
