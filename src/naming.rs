//! Label naming for ledger entries.
//!
//! Two things live here: parsing photo filenames that follow the `NNN-name`
//! convention into a default caption, and the circled numerals used as
//! default label numbers.
//!
//! ## Display Titles
//!
//! Dashes and underscores in the name portion become spaces:
//! - `001-toilet-handrail.jpg` → "toilet handrail"
//! - `002_浴室.jpg` → "浴室"
//! - `玄関.jpg` → "玄関"

/// Result of parsing a numbered entry name like `020-bath-floor`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Number prefix if present (e.g., `20` from `020-bath-floor`)
    pub number: Option<u32>,
    /// Raw name part after the prefix, separators preserved. Empty if
    /// number-only. For unnumbered entries, this is the full input.
    pub name: String,
    /// Display title: name with separators converted to spaces.
    pub display_title: String,
}

fn to_display(raw: &str) -> String {
    raw.replace(['-', '_'], " ").trim().to_string()
}

/// Parse an entry name following the `NNN-name` convention.
///
/// Handles these patterns:
/// - `"020-bath-floor"` → number=Some(20), name="bath-floor", display_title="bath floor"
/// - `"003_玄関"` → number=Some(3), name="玄関", display_title="玄関"
/// - `"001"` → number=Some(1), name="", display_title=""
/// - `"トイレ"` → number=None, name="トイレ", display_title="トイレ"
/// - `"wip-drafts"` → number=None, name="wip-drafts", display_title="wip drafts"
pub fn parse_entry_name(name: &str) -> ParsedName {
    if let Some(sep_pos) = name.find(['-', '_']) {
        let prefix = &name[..sep_pos];
        if let Ok(num) = prefix.parse::<u32>() {
            let raw = &name[sep_pos + 1..];
            return ParsedName {
                number: Some(num),
                name: raw.to_string(),
                display_title: to_display(raw),
            };
        }
    }
    if let Ok(num) = name.parse::<u32>() {
        return ParsedName {
            number: Some(num),
            name: String::new(),
            display_title: String::new(),
        };
    }
    ParsedName {
        number: None,
        name: name.to_string(),
        display_title: to_display(name),
    }
}

/// Default label number for the entry at a 0-based position.
///
/// Positions 0–19 map to ①–⑳; later positions fall back to `(21)`, `(22)`, ...
pub fn circled_number(index: usize) -> String {
    if index < 20 {
        // ① is U+2460 and the run is contiguous up to ⑳ (U+2473).
        if let Some(c) = char::from_u32(0x2460 + index as u32) {
            return c.to_string();
        }
    }
    format!("({})", index + 1)
}
