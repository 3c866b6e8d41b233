//! The YANG `decimal64` value space.
//!
//! A value is an `i64` unscaled integer plus a scale in `1..=18`, so `1.25` at
//! scale 2 is stored as `125`. Equality, hashing and ordering are scale-normalized:
//! `1.5` at scale 1 equals `1.50` at scale 2.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

pub(crate) const MAX_SCALE: u8 = 18;

const POWERS: [i64; 19] = {
    let mut table = [1i64; 19];
    let mut i = 1;
    while i < 19 {
        table[i] = table[i - 1] * 10;
        i += 1;
    }
    table
};

#[inline]
fn pow10(exp: u8) -> i64 {
    POWERS[exp as usize]
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Decimal64Error {
    #[error("empty string is not a valid decimal64 representation")]
    Empty,

    #[error("Missing digits after sign")]
    MissingDigits,

    #[error("Value '{0}' is missing fraction digits")]
    MissingFraction(String),

    #[error("Integer part is longer than 18 digits")]
    IntegerTooLong,

    #[error("Fraction part longer than {0} digits")]
    FractionTooLong(usize),

    #[error("Illegal character at offset {0}")]
    IllegalCharacter(usize),

    #[error("scale {0} is outside of [1..18]")]
    InvalidScale(u8),

    #[error("Decimal64 {value} cannot be represented at scale {scale}")]
    Overflow { value: String, scale: u8 },

    #[error("Decimal64 {value} requires rounding to scale {scale}")]
    RequiresRounding { value: String, scale: u8 },
}

/// How to drop digits when [`Decimal64::scale_to`] narrows the scale.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RoundingMode {
    /// Away from zero.
    Up,
    /// Towards zero.
    Down,
    /// Towards positive infinity.
    Ceiling,
    /// Towards negative infinity.
    Floor,
    /// Nearest neighbour, ties away from zero.
    HalfUp,
    /// Nearest neighbour, ties towards zero.
    HalfDown,
    /// Nearest neighbour, ties to the even neighbour.
    HalfEven,
    /// Fail with [`Decimal64Error::RequiresRounding`] if any non-zero digit is dropped.
    Unnecessary,
}

#[derive(Clone, Copy, Debug)]
pub struct Decimal64 {
    scale: u8,
    value: i64,
}

impl Decimal64 {
    pub fn new(scale: u8, unscaled: i64) -> Result<Self, Decimal64Error> {
        check_scale(scale)?;
        Ok(Self {
            scale,
            value: unscaled,
        })
    }

    /// Integral value at the given scale, e.g. `from_integer(2, 7)` is `7.00`.
    pub fn from_integer(scale: u8, value: i64) -> Result<Self, Decimal64Error> {
        check_scale(scale)?;
        let unscaled = value
            .checked_mul(pow10(scale))
            .ok_or_else(|| Decimal64Error::Overflow {
                value: value.to_string(),
                scale,
            })?;
        Ok(Self {
            scale,
            value: unscaled,
        })
    }

    /// Smallest representable value at `scale`.
    pub fn min_value(scale: u8) -> Result<Self, Decimal64Error> {
        Self::new(scale, i64::MIN)
    }

    /// Largest representable value at `scale`.
    pub fn max_value(scale: u8) -> Result<Self, Decimal64Error> {
        Self::new(scale, i64::MAX)
    }

    pub fn scale(self) -> u8 {
        self.scale
    }

    pub fn unscaled_value(self) -> i64 {
        self.value
    }

    pub fn int_part(self) -> i64 {
        self.value / pow10(self.scale)
    }

    pub fn frac_part(self) -> i64 {
        (self.value % pow10(self.scale)).abs()
    }

    pub fn is_negative(self) -> bool {
        self.value < 0
    }

    /// Re-express this value at another scale.
    ///
    /// Widening multiplies and can overflow. Narrowing drops digits according to `mode`.
    pub fn scale_to(self, scale: u8, mode: RoundingMode) -> Result<Self, Decimal64Error> {
        check_scale(scale)?;
        match scale.cmp(&self.scale) {
            Ordering::Equal => Ok(self),
            Ordering::Greater => {
                let factor = pow10(scale - self.scale);
                let value =
                    self.value
                        .checked_mul(factor)
                        .ok_or_else(|| Decimal64Error::Overflow {
                            value: self.to_string(),
                            scale,
                        })?;
                Ok(Self { scale, value })
            }
            Ordering::Less => {
                let divisor = pow10(self.scale - scale);
                let quotient = self.value / divisor;
                let remainder = self.value % divisor;
                if remainder == 0 {
                    return Ok(Self {
                        scale,
                        value: quotient,
                    });
                }

                let signum = self.value.signum();
                let twice = remainder.unsigned_abs() * 2;
                let divisor = divisor.unsigned_abs();
                let away = match mode {
                    RoundingMode::Up => true,
                    RoundingMode::Down => false,
                    RoundingMode::Ceiling => signum > 0,
                    RoundingMode::Floor => signum < 0,
                    RoundingMode::HalfUp => twice >= divisor,
                    RoundingMode::HalfDown => twice > divisor,
                    RoundingMode::HalfEven => {
                        twice > divisor || (twice == divisor && quotient % 2 != 0)
                    }
                    RoundingMode::Unnecessary => {
                        return Err(Decimal64Error::RequiresRounding {
                            value: self.to_string(),
                            scale,
                        });
                    }
                };

                let value = if away { quotient + signum } else { quotient };
                Ok(Self { scale, value })
            }
        }
    }

    /// Lowest scale that represents this value exactly.
    fn normalized(self) -> Self {
        let mut norm = self;
        while norm.scale > 1 && norm.value % 10 == 0 {
            norm.value /= 10;
            norm.scale -= 1;
        }
        norm
    }

    fn widened(self) -> i128 {
        self.value as i128 * pow10(MAX_SCALE - self.scale) as i128
    }
}

fn check_scale(scale: u8) -> Result<(), Decimal64Error> {
    if (1..=MAX_SCALE).contains(&scale) {
        Ok(())
    } else {
        Err(Decimal64Error::InvalidScale(scale))
    }
}

fn digit(byte: u8, offset: usize) -> Result<i64, Decimal64Error> {
    if byte.is_ascii_digit() {
        Ok((byte - b'0') as i64)
    } else {
        Err(Decimal64Error::IllegalCharacter(offset))
    }
}

impl FromStr for Decimal64 {
    type Err = Decimal64Error;

    /// RFC 7950 section 9.3.1 lexical form: optional sign, digits, optional `.digits`.
    ///
    /// The resulting scale is the number of fraction digits after trimming trailing
    /// zeroes (at least 1).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.is_empty() {
            return Err(Decimal64Error::Empty);
        }

        let (negative, mut idx) = match bytes[0] {
            b'-' => (true, 1),
            b'+' => (false, 1),
            _ => (false, 0),
        };
        if idx == bytes.len() {
            return Err(Decimal64Error::MissingDigits);
        }

        let mut limit = bytes.len() - 1;

        // Leading zeroes, keeping the last one before a non-digit.
        while idx < limit && bytes[idx] == b'0' && bytes[idx + 1].is_ascii_digit() {
            idx += 1;
        }

        let mut int_len = 0usize;
        let mut int_part = 0i64;
        while idx <= limit && bytes[idx] != b'.' {
            if int_len == MAX_SCALE as usize {
                return Err(Decimal64Error::IntegerTooLong);
            }
            int_part = int_part * 10 + digit(bytes[idx], idx)?;
            idx += 1;
            int_len += 1;
        }

        let overflow = || Decimal64Error::Overflow {
            value: s.to_owned(),
            scale: 1,
        };

        if idx > limit {
            let value = int_part.checked_mul(10).ok_or_else(overflow)?;
            return Ok(Self {
                scale: 1,
                value: if negative { -value } else { value },
            });
        }

        // Skip the period.
        idx += 1;
        if idx > limit {
            return Err(Decimal64Error::MissingFraction(s.to_owned()));
        }

        while idx < limit && bytes[limit] == b'0' {
            limit -= 1;
        }

        let frac_limit = MAX_SCALE as usize - int_len + 1;
        let mut frac_len = 0usize;
        let mut frac_part = 0i64;
        while idx <= limit {
            if frac_len == frac_limit {
                return Err(Decimal64Error::FractionTooLong(frac_limit));
            }
            frac_part = frac_part * 10 + digit(bytes[idx], idx)?;
            idx += 1;
            frac_len += 1;
        }

        let scale = frac_len as u8;
        if scale > MAX_SCALE {
            return Err(Decimal64Error::FractionTooLong(MAX_SCALE as usize));
        }
        let value = int_part
            .checked_mul(pow10(scale))
            .and_then(|v| v.checked_add(frac_part))
            .ok_or_else(overflow)?;

        Ok(Self {
            scale,
            value: if negative { -value } else { value },
        })
    }
}

impl fmt::Display for Decimal64 {
    /// Canonical form: no `+`, at least one digit on each side of the point,
    /// no redundant zeroes. Zero is `0.0`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let norm = self.normalized();
        let sign = if norm.value < 0 { "-" } else { "" };
        let int = norm.int_part().unsigned_abs();
        let frac = norm.frac_part();
        if frac == 0 {
            return write!(f, "{sign}{int}.0");
        }
        write!(
            f,
            "{sign}{int}.{frac:0width$}",
            width = norm.scale as usize
        )
    }
}

impl PartialEq for Decimal64 {
    fn eq(&self, other: &Self) -> bool {
        if self.scale == other.scale {
            return self.value == other.value;
        }
        self.widened() == other.widened()
    }
}

impl Eq for Decimal64 {}

impl Hash for Decimal64 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let norm = self.normalized();
        norm.scale.hash(state);
        norm.value.hash(state);
    }
}

impl PartialOrd for Decimal64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal64 {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.scale == other.scale {
            return self.value.cmp(&other.value);
        }
        self.widened().cmp(&other.widened())
    }
}
