//! Parser for the free-text time/branch mini-language.
//!
//! Field values are loosely typed: up to two decimal numbers anywhere
//! in the string, an optional `<`/`>` relation, and an optional
//! trailing run of marker symbols (`!@#$%^&*`). Parsing never fails;
//! anything unextractable degrades to [`Value::Empty`]. Formatting a
//! parsed value yields a canonical string whose re-parse gives the
//! same value back.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::LabelType;

static NUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-+]?[0-9]*\.?[0-9]+").unwrap());
static SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[!@#$%^&*]+").unwrap());

/// Structured form of a field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Empty,
    Point(f64),
    Range(f64, f64),
    /// `<n` - before coordinate n on the parent timeline.
    Before(f64),
    /// `n>` - after coordinate n on the parent timeline.
    After(f64),
}

impl Value {
    /// Numeric components in the order they were typed.
    pub fn numbers(&self) -> Vec<f64> {
        match *self {
            Value::Empty => vec![],
            Value::Point(a) | Value::Before(a) | Value::After(a) => vec![a],
            Value::Range(a, b) => vec![a, b],
        }
    }

    pub fn first(&self) -> Option<f64> {
        self.numbers().first().copied()
    }
}

/// A parsed value plus its optional marker suffix.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub value: Value,
    pub suffix: Option<String>,
}

impl Parsed {
    pub fn empty() -> Self {
        Self {
            value: Value::Empty,
            suffix: None,
        }
    }
}

/// Up to two decimal numbers, in order of appearance.
pub fn extract_numbers(raw: &str) -> Vec<f64> {
    NUM_RE
        .find_iter(raw)
        .take(2)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}

fn extract_suffix(raw: &str) -> Option<String> {
    SUFFIX_RE.find(raw).map(|m| m.as_str().to_string())
}

/// Parse a temporal field value. Time values carry no relation sign.
pub fn parse_time(raw: &str) -> Parsed {
    let numbers = extract_numbers(raw);
    let value = match numbers.len() {
        0 => Value::Empty,
        1 => Value::Point(numbers[0]),
        _ => Value::Range(numbers[0], numbers[1]),
    };
    Parsed {
        value,
        suffix: extract_suffix(raw),
    }
}

/// Parse a branch / related-to value. A `<` anywhere means "before",
/// a `>` means "after"; either defaults its coordinate to 1 when no
/// number was typed.
pub fn parse_relative(raw: &str) -> Parsed {
    let numbers = extract_numbers(raw);
    let value = if raw.contains('<') {
        Value::Before(numbers.first().copied().unwrap_or(1.0))
    } else if raw.contains('>') {
        Value::After(numbers.first().copied().unwrap_or(1.0))
    } else if raw.contains(':') && numbers.is_empty() {
        Value::Point(1.0)
    } else {
        match numbers.len() {
            0 => Value::Empty,
            1 => Value::Point(numbers[0]),
            _ => Value::Range(numbers[0], numbers[1]),
        }
    };
    Parsed {
        value,
        suffix: extract_suffix(raw),
    }
}

/// Shortest decimal form; integral values print without a fraction.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Canonical string for a parsed value: `a`, `a:b`, `<a`, `a>`, plus
/// the suffix when present. `Empty` formats as `""`.
pub fn format_value(parsed: &Parsed) -> String {
    let base = match parsed.value {
        Value::Empty => String::new(),
        Value::Point(a) => format_number(a),
        Value::Range(a, b) => format!("{}:{}", format_number(a), format_number(b)),
        Value::Before(a) => format!("<{}", format_number(a)),
        Value::After(a) => format!("{}>", format_number(a)),
    };
    match &parsed.suffix {
        Some(suffix) => format!("{}{}", base, suffix),
        None => base,
    }
}

/// Normalize a time field to canonical form. An empty value takes a
/// label-dependent placeholder: `0` for bounded labels, `:` for the
/// unbounded ones, `1` for irrealis.
pub fn normalize_time(raw: &str, label: LabelType) -> String {
    let parsed = parse_time(raw);
    if parsed.value == Value::Empty {
        let default = match label {
            LabelType::UnboundedBoth | LabelType::UnboundedRight | LabelType::UnboundedLeft => ":",
            LabelType::Irrealis => "1",
            _ => "0",
        };
        match &parsed.suffix {
            Some(suffix) => format!("{}{}", default, suffix),
            None => default.to_string(),
        }
    } else {
        format_value(&parsed)
    }
}

/// Normalize a branch field to canonical form (empty stays empty).
pub fn normalize_relative(raw: &str) -> String {
    format_value(&parse_relative(raw))
}

const FACTUALITY_VOCAB: [&str; 3] = ["-", "m", "m-"];

/// A factuality value is kept as typed when its non-numeric residue is
/// in the fixed vocabulary (or nothing but numbers/markers was typed);
/// anything else is wiped.
pub fn normalize_factuality(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let residue: String = SUFFIX_RE
        .replace_all(&NUM_RE.replace_all(raw, ""), "")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    if residue.is_empty() || FACTUALITY_VOCAB.contains(&residue.as_str()) {
        raw.to_string()
    } else {
        String::new()
    }
}

/// Rewrite a time value with an integer offset applied, used when an
/// adjudication chunk is copied into the live registry. The shift is
/// label-dependent; notably an `UnboundedLeft` value keeps its last
/// coordinate unshifted, and irrealis always resets to `:`.
pub fn offset_time(raw: &str, label: LabelType, offset: f64) -> String {
    let parsed = parse_time(raw);
    let value = match label {
        LabelType::Begin | LabelType::Continuation => match parsed.value {
            Value::Empty => Value::Point(offset),
            Value::Point(a) => Value::Point(a + offset),
            Value::Range(a, b) => Value::Range(a + offset, b + offset),
            other => other,
        },
        LabelType::UnboundedBoth => match parsed.value {
            Value::Empty => Value::Empty,
            Value::Point(a) => Value::Point(a + offset),
            Value::Range(a, b) => Value::Range(a + offset, b + offset),
            other => other,
        },
        LabelType::UnboundedRight => match parsed.value.first() {
            Some(a) => Value::Point(a + offset),
            None => Value::Point(offset),
        },
        LabelType::UnboundedLeft => match parsed.value {
            Value::Empty => Value::Point(offset),
            Value::Point(a) => Value::Point(a),
            Value::Range(_, b) => Value::Point(b),
            other => other,
        },
        LabelType::Irrealis => Value::Empty,
        LabelType::RelativeAfter | LabelType::RelativeBefore => parsed.value,
    };
    // Empty unbounded and irrealis values keep their placeholder.
    let base = match (value, label) {
        (_, LabelType::Irrealis) => ":".to_string(),
        (Value::Empty, LabelType::UnboundedBoth) => ":".to_string(),
        _ => format_value(&Parsed {
            value,
            suffix: None,
        }),
    };
    match &parsed.suffix {
        Some(suffix) => format!("{}{}", base, suffix),
        None => base,
    }
}
