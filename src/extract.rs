//! Value normalization: turn one source's free-form textual output into a
//! numeric reading or a typed extraction failure.
//!
//! Sources print loosely formatted status lines such as
//! `"R11=42.0% TRL9 | Fresh=3d"` or `"R09 Brent=$67.4 via API"`. Extraction
//! tries, in strict precedence order: the source-specific pattern from the
//! registry, then a fixed cascade of generic patterns, then the first bare
//! decimal anywhere in the text. Nothing in this module panics or returns a
//! non-finite float — a reading that cannot be normalized becomes an
//! [`ExtractionError`] carrying a short snippet of the cleaned text.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::config::SourcePattern;

/// Maximum length of the snippet preserved when no number is found.
const SNIPPET_LEN: usize = 50;

/// Why a raw reading produced no numeric value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// The source printed nothing (or the literal no-output marker).
    #[error("source produced no output")]
    NoOutput,

    /// The source printed text, but no pattern matched a number in it.
    #[error("no numeric value in output: {snippet:?}")]
    NoNumber { snippet: String },
}

/// Which pattern produced a successful extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    /// The source-specific pattern from the signal registry.
    SourcePattern,
    /// Generic `label=number` pattern.
    LabeledNumber,
    /// Generic number-before-unit-symbol pattern (`%`, `°`, `€`, `$`).
    UnitSymbol,
    /// Generic number-before-unit-word pattern (`k`, `M`, `kt`, `Mbpd`, ...).
    UnitWord,
    /// Last resort: first bare decimal anywhere in the text.
    BareNumber,
}

impl ExtractionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SourcePattern => "source_pattern",
            Self::LabeledNumber => "labeled_number",
            Self::UnitSymbol => "unit_symbol",
            Self::UnitWord => "unit_word",
            Self::BareNumber => "bare_number",
        }
    }
}

/// The outcome of normalizing one raw reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub value: Result<f64, ExtractionError>,
    /// Present only when `value` is `Ok`.
    pub method: Option<ExtractionMethod>,
}

impl Extraction {
    fn ok(value: f64, method: ExtractionMethod) -> Self {
        Self {
            value: Ok(value),
            method: Some(method),
        }
    }

    fn failed(err: ExtractionError) -> Self {
        Self {
            value: Err(err),
            method: None,
        }
    }
}

// Compile-once generic patterns via OnceLock, tried in cascade order.

fn re_labeled() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z_][A-Za-z0-9_]*\s*=\s*[$€]?\s*(-?\d[\d,]*(?:\.\d+)?)").unwrap()
    })
}

fn re_unit_symbol() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(-?\d[\d,]*(?:\.\d+)?)\s*[%°€$£]").unwrap())
}

fn re_unit_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(-?\d+(?:\.\d+)?)\s*(?:kt|km³|kbpd|Mha|Mbpd|MWh|TWh|mm|k|K|M|B|T)\b").unwrap()
    })
}

fn re_bare_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-?\d+(?:[.,]\d+)?").unwrap())
}

/// Parse a captured numeric token, tolerating thousands separators.
///
/// Commas are stripped as thousands separators unless the capturing pattern
/// was declared `decimal_comma`, in which case the comma becomes the decimal
/// point. Non-finite results are rejected.
fn parse_token(token: &str, decimal_comma: bool) -> Option<f64> {
    let trimmed: String = token.trim().chars().filter(|c| !c.is_whitespace()).collect();
    let cleaned = if decimal_comma {
        trimmed.replace(',', ".")
    } else {
        trimmed.replace(',', "")
    };
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Normalize one raw source output into a numeric value.
///
/// `pattern` is the optional source-specific extraction pattern from the
/// registry; its first capture group is the numeric token. This function
/// never panics: any input, including empty text or binary garbage, yields
/// either a finite `f64` or an [`ExtractionError`].
pub fn extract_value(raw: &str, pattern: Option<&SourcePattern>) -> Extraction {
    let cleaned = raw.trim();
    if cleaned.is_empty() || cleaned == "None" || cleaned == "NO_OUTPUT" {
        return Extraction::failed(ExtractionError::NoOutput);
    }

    // 1. Source-specific pattern, first capture group.
    if let Some(src) = pattern {
        if let Some(caps) = src.regex.captures(cleaned) {
            if let Some(token) = caps.get(1) {
                if let Some(v) = parse_token(token.as_str(), src.decimal_comma) {
                    return Extraction::ok(v, ExtractionMethod::SourcePattern);
                }
            }
        }
    }

    // 2. Generic cascade, first match wins.
    let cascade = [
        (re_labeled(), ExtractionMethod::LabeledNumber),
        (re_unit_symbol(), ExtractionMethod::UnitSymbol),
        (re_unit_word(), ExtractionMethod::UnitWord),
    ];
    for (re, method) in cascade {
        if let Some(caps) = re.captures(cleaned) {
            if let Some(token) = caps.get(1) {
                if let Some(v) = parse_token(token.as_str(), false) {
                    return Extraction::ok(v, method);
                }
            }
        }
    }

    // 3. Last resort: first bare decimal anywhere. A lone comma here is a
    // decimal comma ("42,5"), not a thousands separator.
    if let Some(m) = re_bare_number().find(cleaned) {
        let token = m.as_str();
        let decimal_comma = token.contains(',') && !token.contains('.');
        if let Some(v) = parse_token(token, decimal_comma) {
            return Extraction::ok(v, ExtractionMethod::BareNumber);
        }
    }

    // 4. Nothing numeric: keep a snippet so the failure is diagnosable.
    let snippet: String = cleaned.chars().take(SNIPPET_LEN).collect();
    Extraction::failed(ExtractionError::NoNumber { snippet })
}
