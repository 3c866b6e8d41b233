//! Constraint arithmetic for type restrictions.
//!
//! Ranges and lengths are both kept as sorted, disjoint `i128` intervals. Decimal64
//! ranges store unscaled values at the type's fraction-digits, so one interval type
//! covers every numeric restriction.

use std::fmt;
use std::sync::Arc;

use yangkit_core::{Decimal64, QName, RoundingMode};

/// Why a type restriction could not be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstraintError {
    /// A restriction that loosens or contradicts its base.
    #[error("{0}")]
    Restriction(String),
    /// Bit position or enum value auto-increment ran out of space.
    #[error("{0}")]
    Overflow(String),
    /// Two members share a name or number.
    #[error("{0}")]
    Duplicate(String),
    #[error("{0}")]
    Pattern(String),
}

/// A union of closed intervals.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeSet {
    intervals: Vec<(i128, i128)>,
}

impl RangeSet {
    pub fn new(min: i128, max: i128) -> Self {
        Self {
            intervals: vec![(min, max)],
        }
    }

    pub fn intervals(&self) -> &[(i128, i128)] {
        &self.intervals
    }

    pub fn min(&self) -> i128 {
        self.intervals.first().map_or(0, |(lo, _)| *lo)
    }

    pub fn max(&self) -> i128 {
        self.intervals.last().map_or(0, |(_, hi)| *hi)
    }

    pub fn contains(&self, value: i128) -> bool {
        self.intervals
            .iter()
            .any(|(lo, hi)| (*lo..=*hi).contains(&value))
    }

    /// Every interval lies inside a single interval of `base`.
    pub fn is_subset_of(&self, base: &RangeSet) -> bool {
        self.intervals.iter().all(|(lo, hi)| {
            base.intervals
                .iter()
                .any(|(base_lo, base_hi)| base_lo <= lo && hi <= base_hi)
        })
    }

    /// Render with a custom bound formatter (decimal64 bounds need their scale).
    pub fn display_with(&self, bound: impl Fn(i128) -> String) -> String {
        self.intervals
            .iter()
            .map(|(lo, hi)| {
                if lo == hi {
                    bound(*lo)
                } else {
                    format!("{}..{}", bound(*lo), bound(*hi))
                }
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_with(|v| v.to_string()))
    }
}

/// Parse a `range`/`length` argument against `base`.
///
/// `min` and `max` name the base's lowest and highest bound. Parts must be ascending
/// and disjoint.
fn parse_intervals(
    text: &str,
    base: &RangeSet,
    value: &dyn Fn(&str) -> Result<i128, String>,
) -> Result<RangeSet, String> {
    let bound = |part: &str| -> Result<i128, String> {
        match part.trim() {
            "min" => Ok(base.min()),
            "max" => Ok(base.max()),
            other => value(other),
        }
    };

    let mut intervals: Vec<(i128, i128)> = Vec::new();
    for part in text.split('|') {
        let part = part.trim();
        if part.is_empty() {
            return Err("empty part".to_string());
        }
        let (lo, hi) = match part.split_once("..") {
            Some((lo, hi)) => (bound(lo)?, bound(hi)?),
            None => {
                let single = bound(part)?;
                (single, single)
            }
        };
        if lo > hi {
            return Err(format!("`{part}` has its bounds reversed"));
        }
        if let Some((_, prev_hi)) = intervals.last()
            && lo <= *prev_hi
        {
            return Err(format!("`{part}` is not in ascending order"));
        }
        intervals.push((lo, hi));
    }
    Ok(RangeSet { intervals })
}

fn parse_integer(text: &str) -> Result<i128, String> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("`{text}` is not an integer"));
    }
    text.parse().map_err(|_| format!("`{text}` is out of range"))
}

/// `range` on an integral type.
pub fn integral_range(text: &str, base: &RangeSet) -> Result<RangeSet, ConstraintError> {
    let ranges = parse_intervals(text, base, &parse_integer).map_err(|detail| {
        ConstraintError::Restriction(format!("Invalid range constraint `{text}`: {detail}"))
    })?;
    if !ranges.is_subset_of(base) {
        return Err(ConstraintError::Restriction(format!(
            "Invalid range constraint: {ranges} (base {base})"
        )));
    }
    Ok(ranges)
}

/// `range` on a decimal64 type with `fraction_digits`.
pub fn decimal_range(
    text: &str,
    base: &RangeSet,
    fraction_digits: u8,
) -> Result<RangeSet, ConstraintError> {
    let value = |part: &str| -> Result<i128, String> {
        let parsed: Decimal64 = part.parse().map_err(|err| format!("`{part}`: {err}"))?;
        let scaled = parsed
            .scale_to(fraction_digits, RoundingMode::Unnecessary)
            .map_err(|err| err.to_string())?;
        Ok(i128::from(scaled.unscaled_value()))
    };
    let ranges = parse_intervals(text, base, &value).map_err(|detail| {
        ConstraintError::Restriction(format!("Invalid range constraint `{text}`: {detail}"))
    })?;
    if !ranges.is_subset_of(base) {
        let show = |set: &RangeSet| set.display_with(|v| decimal_bound(v, fraction_digits));
        return Err(ConstraintError::Restriction(format!(
            "Invalid range constraint: {} (base {})",
            show(&ranges),
            show(base)
        )));
    }
    Ok(ranges)
}

pub(crate) fn decimal_bound(unscaled: i128, fraction_digits: u8) -> String {
    i64::try_from(unscaled)
        .ok()
        .and_then(|v| Decimal64::new(fraction_digits, v).ok())
        .map_or_else(|| unscaled.to_string(), |d| d.to_string())
}

/// `length` on a string or binary type.
pub fn length(text: &str, base: &RangeSet) -> Result<RangeSet, ConstraintError> {
    let value = |part: &str| -> Result<i128, String> {
        if part.starts_with('-') {
            return Err(format!("`{part}` is negative"));
        }
        let v = parse_integer(part)?;
        if v > i128::from(u64::MAX) {
            return Err(format!("`{part}` is out of range"));
        }
        Ok(v)
    };
    let lengths = parse_intervals(text, base, &value).map_err(|detail| {
        ConstraintError::Restriction(format!("Invalid length constraint `{text}`: {detail}"))
    })?;
    if !lengths.is_subset_of(base) {
        return Err(ConstraintError::Restriction(format!(
            "Invalid length constraint {lengths} (base {base})"
        )));
    }
    Ok(lengths)
}

/// A `bit` or `enum` as written: name and optional explicit number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberDecl {
    pub name: Arc<str>,
    pub explicit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bit {
    pub name: Arc<str>,
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumMember {
    pub name: Arc<str>,
    pub value: i32,
}

/// Assign bit positions: explicit, or one past the highest seen so far.
pub fn number_bits(decls: &[MemberDecl]) -> Result<Vec<Bit>, ConstraintError> {
    let mut bits: Vec<Bit> = Vec::with_capacity(decls.len());
    let mut highest: Option<u32> = None;
    for decl in decls {
        let position = match decl.explicit {
            Some(explicit) => u32::try_from(explicit).map_err(|_| {
                ConstraintError::Overflow(format!(
                    "Bit {} position {explicit} is outside 0..4294967295",
                    decl.name
                ))
            })?,
            None => match highest {
                None => 0,
                Some(h) => h.checked_add(1).ok_or_else(|| {
                    ConstraintError::Overflow(format!("Bit {} has overflown position", decl.name))
                })?,
            },
        };
        if let Some(existing) = bits.iter().find(|b| b.name == decl.name) {
            return Err(ConstraintError::Duplicate(format!(
                "Bit {} is defined more than once",
                existing.name
            )));
        }
        if let Some(existing) = bits.iter().find(|b| b.position == position) {
            return Err(ConstraintError::Duplicate(format!(
                "Bit {} has position {position} already used by bit {}",
                decl.name, existing.name
            )));
        }
        highest = Some(highest.map_or(position, |h| h.max(position)));
        bits.push(Bit {
            name: decl.name.clone(),
            position,
        });
    }
    Ok(bits)
}

/// Assign enum values: explicit, or one past the highest seen so far.
pub fn number_enums(decls: &[MemberDecl]) -> Result<Vec<EnumMember>, ConstraintError> {
    let mut enums: Vec<EnumMember> = Vec::with_capacity(decls.len());
    let mut highest: Option<i32> = None;
    for decl in decls {
        let value = match decl.explicit {
            Some(explicit) => i32::try_from(explicit).map_err(|_| {
                ConstraintError::Overflow(format!(
                    "Enum {} value {explicit} is outside -2147483648..2147483647",
                    decl.name
                ))
            })?,
            None => match highest {
                None => 0,
                Some(h) => h.checked_add(1).ok_or_else(|| {
                    ConstraintError::Overflow(format!("Enum {} has overflown value", decl.name))
                })?,
            },
        };
        if let Some(existing) = enums.iter().find(|e| e.name == decl.name) {
            return Err(ConstraintError::Duplicate(format!(
                "Enum {} is defined more than once",
                existing.name
            )));
        }
        if let Some(existing) = enums.iter().find(|e| e.value == value) {
            return Err(ConstraintError::Duplicate(format!(
                "Enum {} has value {value} already used by enum {}",
                decl.name, existing.name
            )));
        }
        highest = Some(highest.map_or(value, |h| h.max(value)));
        enums.push(EnumMember {
            name: decl.name.clone(),
            value,
        });
    }
    Ok(enums)
}

/// YANG 1.1 bits restriction: a subset of `base`, positions unchanged.
pub fn restrict_bits(
    decls: &[MemberDecl],
    base: &[Bit],
    base_name: &QName,
) -> Result<Vec<Bit>, ConstraintError> {
    decls
        .iter()
        .map(|decl| {
            let Some(inherited) = base.iter().find(|b| b.name == decl.name) else {
                return Err(ConstraintError::Restriction(format!(
                    "Bit '{}' is not a subset of its base bits type {base_name}.",
                    decl.name
                )));
            };
            if let Some(explicit) = decl.explicit
                && explicit != i64::from(inherited.position)
            {
                return Err(ConstraintError::Restriction(format!(
                    "Position of bit '{}' must be the same as the position of corresponding bit in the base bits type {base_name}.",
                    decl.name
                )));
            }
            Ok(inherited.clone())
        })
        .collect()
}

/// YANG 1.1 enumeration restriction: a subset of `base`, values unchanged.
pub fn restrict_enums(
    decls: &[MemberDecl],
    base: &[EnumMember],
    base_name: &QName,
) -> Result<Vec<EnumMember>, ConstraintError> {
    decls
        .iter()
        .map(|decl| {
            let Some(inherited) = base.iter().find(|e| e.name == decl.name) else {
                return Err(ConstraintError::Restriction(format!(
                    "Enum '{}' is not a subset of its base enumeration type {base_name}.",
                    decl.name
                )));
            };
            if let Some(explicit) = decl.explicit
                && explicit != i64::from(inherited.value)
            {
                return Err(ConstraintError::Restriction(format!(
                    "Value of enum '{}' must be the same as the value of corresponding enum in the base enumeration type {base_name}.",
                    decl.name
                )));
            }
            Ok(inherited.clone())
        })
        .collect()
}

/// A `pattern` restriction, validated when built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    regex: Arc<str>,
    inverted: bool,
}

impl Pattern {
    pub fn new(regex: &str, inverted: bool) -> Result<Self, ConstraintError> {
        regex_syntax::Parser::new()
            .parse(&translate_xsd(regex))
            .map_err(|err| {
                ConstraintError::Pattern(format!("Pattern `{regex}` is not a valid regular expression: {err}"))
            })?;
        Ok(Self {
            regex: regex.into(),
            inverted,
        })
    }

    pub fn regex(&self) -> &str {
        &self.regex
    }

    /// `modifier invert-match`
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }
}

/// Rewrite XSD-only escapes (`\i`, `\c` and their negations) into classes regex-syntax knows.
fn translate_xsd(regex: &str) -> String {
    let mut out = String::with_capacity(regex.len());
    let mut chars = regex.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('i') => out.push_str("[_:A-Za-z]"),
            Some('I') => out.push_str("[^_:A-Za-z]"),
            Some('c') => out.push_str("[-._:A-Za-z0-9]"),
            Some('C') => out.push_str("[^-._:A-Za-z0-9]"),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
