//! Parsing of Kubernetes resource quantities (`500m`, `1Gi`, `2e3`, ...).
//!
//! Quantities are kept as nano-units, rounded up, which is the finest precision the API
//! machinery keeps as well.

use std::str::FromStr;

use crate::error::ReferenceError;

const NANOS_PER_UNIT: i128 = 1_000_000_000;
const NANOS_PER_MILLI: i128 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ParsedQuantity {
    nanos: i128,
}

impl ParsedQuantity {
    pub const ZERO: Self = ParsedQuantity { nanos: 0 };
    pub const ONE: Self = ParsedQuantity {
        nanos: NANOS_PER_UNIT,
    };

    pub fn is_zero(&self) -> bool {
        self.nanos == 0
    }

    pub fn is_positive(&self) -> bool {
        self.nanos > 0
    }

    /// Value in whole units, rounded up.
    pub fn value(&self) -> i128 {
        ceil_div(self.nanos, NANOS_PER_UNIT)
    }

    /// Value in milli-units, rounded up.
    pub fn milli_value(&self) -> i128 {
        ceil_div(self.nanos, NANOS_PER_MILLI)
    }
}

/// Division rounding towards positive infinity, `divisor` must be positive.
pub(crate) fn ceil_div(dividend: i128, divisor: i128) -> i128 {
    let quotient = dividend / divisor;
    if dividend % divisor > 0 {
        quotient + 1
    } else {
        quotient
    }
}

enum Suffix {
    Decimal(i32),
    Binary(u32),
}

impl FromStr for Suffix {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let suffix = match s {
            "" => Suffix::Decimal(0),
            "n" => Suffix::Decimal(-9),
            "u" => Suffix::Decimal(-6),
            "m" => Suffix::Decimal(-3),
            "k" => Suffix::Decimal(3),
            "M" => Suffix::Decimal(6),
            "G" => Suffix::Decimal(9),
            "T" => Suffix::Decimal(12),
            "P" => Suffix::Decimal(15),
            "E" => Suffix::Decimal(18),
            "Ki" => Suffix::Binary(10),
            "Mi" => Suffix::Binary(20),
            "Gi" => Suffix::Binary(30),
            "Ti" => Suffix::Binary(40),
            "Pi" => Suffix::Binary(50),
            "Ei" => Suffix::Binary(60),
            exponent => {
                let exponent = exponent
                    .strip_prefix('e')
                    .or_else(|| exponent.strip_prefix('E'))
                    .ok_or(())?;
                Suffix::Decimal(exponent.parse().map_err(|_| ())?)
            }
        };

        Ok(suffix)
    }
}

impl FromStr for ParsedQuantity {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ReferenceError::InvalidQuantity(s.to_owned());
        let trimmed = s.trim();

        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let number_end = unsigned
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(unsigned.len());
        let (number, suffix) = unsigned.split_at(number_end);

        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if whole.is_empty() && fraction.is_empty() || fraction.contains('.') {
            return Err(invalid());
        }

        let mantissa: i128 = format!("{whole}{fraction}").parse().map_err(|_| invalid())?;
        let fraction_digits = i32::try_from(fraction.len()).map_err(|_| invalid())?;

        let (exponent, binary_shift) = match suffix.parse::<Suffix>().map_err(|_| invalid())? {
            Suffix::Decimal(exponent) => (exponent, 0),
            Suffix::Binary(shift) => (0, shift),
        };

        let scaled = mantissa
            .checked_mul(2i128.checked_pow(binary_shift).ok_or_else(invalid)?)
            .ok_or_else(invalid)?;

        // nano-units = mantissa * 2^shift * 10^(9 + exponent - fraction digits)
        let power = 9i32
            .checked_add(exponent)
            .and_then(|power| power.checked_sub(fraction_digits))
            .ok_or_else(invalid)?;
        let nanos = if power >= 0 {
            let factor = 10i128.checked_pow(power as u32).ok_or_else(invalid)?;
            scaled.checked_mul(factor).ok_or_else(invalid)?
        } else {
            match 10i128.checked_pow(power.unsigned_abs()) {
                Some(factor) => ceil_div(scaled, factor),
                // anything this small rounds up to the smallest unit
                None => i128::from(scaled > 0),
            }
        };

        Ok(ParsedQuantity {
            nanos: if negative { -nanos } else { nanos },
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("1", 1, 1000)]
    #[case("500m", 1, 500)]
    #[case("100m", 1, 100)]
    #[case("1.5", 2, 1500)]
    #[case("0.1", 1, 100)]
    #[case("2k", 2000, 2_000_000)]
    #[case("128Mi", 134_217_728, 134_217_728_000)]
    #[case("1Gi", 1_073_741_824, 1_073_741_824_000)]
    #[case("1e3", 1000, 1_000_000)]
    #[case("100M", 100_000_000, 100_000_000_000)]
    #[case("1n", 1, 1)]
    #[case("0", 0, 0)]
    fn parses_quantities(#[case] input: &str, #[case] value: i128, #[case] milli_value: i128) {
        let quantity: ParsedQuantity = input.parse().unwrap();

        assert_eq!(quantity.value(), value);
        assert_eq!(quantity.milli_value(), milli_value);
    }

    #[rstest]
    #[case("")]
    #[case("Gi")]
    #[case("12XB")]
    #[case("1e")]
    #[case("1.2.3")]
    #[case("1e2147483647")]
    fn rejects_invalid_quantities(#[case] input: &str) {
        assert!(matches!(
            input.parse::<ParsedQuantity>(),
            Err(ReferenceError::InvalidQuantity(_))
        ));
    }
}
