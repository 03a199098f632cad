// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
use std::cmp::Ordering;
use std::fmt;

use crate::exec::expr::CastError;

/// Compute 10^exp in i128, None on overflow.
pub fn pow10_i128(exp: u32) -> Option<i128> {
    let mut out: i128 = 1;
    for _ in 0..exp {
        out = out.checked_mul(10)?;
    }
    Some(out)
}

/// Integer division with ROUND_HALF_UP.
///
/// case 1: |b| is odd. if [|b|/2] < |r|, then add carry; otherwise add 0.
/// case 2: |b| is even. if [|b|/2] <= |r|, then add carry; otherwise add 0.
/// carry depends on the sign of a^b.
pub fn div_round_i128(dividend: i128, divisor: i128) -> i128 {
    debug_assert!(divisor != 0);

    let mut q = dividend / divisor;
    let r = dividend % divisor;

    if r == 0 {
        return q;
    }

    let abs_b = divisor.abs();
    let abs_r = r.abs();
    let threshold = (abs_b >> 1) + (abs_b & 1);

    if abs_r.cmp(&threshold) != Ordering::Less {
        let carry = if (dividend ^ divisor) < 0 { -1 } else { 1 };
        q += carry;
    }

    q
}

/// Fixed-point decimal: an i128 unscaled value and an i8 scale. A negative
/// scale means `unscaled * 10^-scale` trailing zeros, so the representable
/// magnitude is bounded by what the expansion fits into i128; conversions
/// that would leave that range report `Overflow`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Decimal {
    unscaled: i128,
    scale: i8,
}

impl Decimal {
    pub const ZERO: Decimal = Decimal {
        unscaled: 0,
        scale: 0,
    };

    pub fn new(unscaled: i128, scale: i8) -> Self {
        Self { unscaled, scale }
    }

    pub fn unscaled(&self) -> i128 {
        self.unscaled
    }

    pub fn scale(&self) -> i8 {
        self.scale
    }

    pub fn is_negative(&self) -> bool {
        self.unscaled < 0
    }

    /// Exact-to-approximate conversion.
    pub fn to_f64(&self) -> Result<f64, CastError> {
        if self.scale >= 0 {
            return Ok(self.unscaled as f64 / 10f64.powi(self.scale as i32));
        }
        let factor = pow10_i128((-self.scale) as u32).ok_or_else(|| self.overflow("DOUBLE"))?;
        let expanded = self
            .unscaled
            .checked_mul(factor)
            .ok_or_else(|| self.overflow("DOUBLE"))?;
        Ok(expanded as f64)
    }

    /// Nearest integer with half-up rounding.
    pub fn round_to_i64(&self) -> Result<i64, CastError> {
        let integral = if self.scale >= 0 {
            match pow10_i128(self.scale as u32) {
                Some(divisor) => div_round_i128(self.unscaled, divisor),
                // scale beyond i128 digits: |value| < 0.5
                None => 0,
            }
        } else {
            let factor =
                pow10_i128((-self.scale) as u32).ok_or_else(|| self.overflow("BIGINT"))?;
            self.unscaled
                .checked_mul(factor)
                .ok_or_else(|| self.overflow("BIGINT"))?
        };
        i64::try_from(integral).map_err(|_| self.overflow("BIGINT"))
    }

    /// Changes the scale, rounding half-up when fractional digits are
    /// dropped.
    pub fn rescale(&self, scale: i8) -> Result<Decimal, CastError> {
        if scale == self.scale {
            return Ok(*self);
        }
        let unscaled = if scale > self.scale {
            let factor = pow10_i128((scale - self.scale) as u32)
                .ok_or_else(|| self.overflow("DECIMAL"))?;
            self.unscaled
                .checked_mul(factor)
                .ok_or_else(|| self.overflow("DECIMAL"))?
        } else {
            match pow10_i128((self.scale - scale) as u32) {
                Some(divisor) => div_round_i128(self.unscaled, divisor),
                None => 0,
            }
        };
        Ok(Decimal::new(unscaled, scale))
    }

    /// Nearest decimal of the given scale, half-up, matching fixed-point
    /// float rounding: scale, add +-0.5, truncate.
    pub fn from_f64_with_scale(value: f64, scale: i8) -> Result<Decimal, CastError> {
        if !value.is_finite() {
            return Err(CastError::MalformedInput {
                value: value.to_string(),
                target: "DECIMAL",
            });
        }
        let scaled = value * 10f64.powi(scale as i32);
        let delta = if scaled >= 0.0 { 0.5 } else { -0.5 };
        let unscaled_f = (scaled + delta).trunc();
        if unscaled_f > i128::MAX as f64 || unscaled_f < i128::MIN as f64 {
            return Err(CastError::Overflow {
                value: value.to_string(),
                target: "DECIMAL",
            });
        }
        Ok(Decimal::new(unscaled_f as i128, scale))
    }

    /// Parses `[+-]digits[.digits]`, keeping the literal's natural scale.
    pub fn parse(s: &str) -> Result<Decimal, CastError> {
        let malformed = || CastError::MalformedInput {
            value: s.to_string(),
            target: "DECIMAL",
        };
        let overflow = || CastError::Overflow {
            value: s.to_string(),
            target: "DECIMAL",
        };

        let trimmed = s.trim();
        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (int_part, frac_part) = match rest.split_once('.') {
            Some((i, f)) => (i, f),
            None => (rest, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(malformed());
        }
        if frac_part.len() > i8::MAX as usize {
            return Err(overflow());
        }

        let mut unscaled: i128 = 0;
        for b in int_part.bytes().chain(frac_part.bytes()) {
            if !b.is_ascii_digit() {
                return Err(malformed());
            }
            unscaled = unscaled
                .checked_mul(10)
                .and_then(|v| v.checked_add((b - b'0') as i128))
                .ok_or_else(overflow)?;
        }
        if negative {
            unscaled = -unscaled;
        }
        Ok(Decimal::new(unscaled, frac_part.len() as i8))
    }

    fn overflow(&self, target: &'static str) -> CastError {
        CastError::Overflow {
            value: self.to_string(),
            target,
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale <= 0 {
            write!(f, "{}", self.unscaled)?;
            for _ in 0..(-self.scale) {
                write!(f, "0")?;
            }
            return Ok(());
        }
        let scale = self.scale as usize;
        let abs = self.unscaled.unsigned_abs().to_string();
        let sign = if self.unscaled < 0 { "-" } else { "" };
        if abs.len() <= scale {
            write!(f, "{sign}0.{abs:0>scale$}")
        } else {
            let split = abs.len() - scale;
            write!(f, "{sign}{}.{}", &abs[..split], &abs[split..])
        }
    }
}
