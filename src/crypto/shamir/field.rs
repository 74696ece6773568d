//! Arithmetic over GF(2^8) with the AES reduction polynomial.
//!
//! Kept private to the splitter so every use goes through the validated
//! `split` / `combine` API.

use std::ops::{Add, Div, Mul};
use zeroize::Zeroize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Zeroize)]
pub(crate) struct Gf256(pub(crate) u8);

impl Gf256 {
    pub(crate) const ZERO: Self = Gf256(0);
    pub(crate) const ONE: Self = Gf256(1);

    /// Multiplicative inverse as `a^254`. Callers never pass zero: share ids
    /// are validated non-zero and distinct before interpolation.
    fn inverse(self) -> Self {
        let mut acc = Gf256::ONE;
        let mut base = self;
        let mut exp = 254u8;
        while exp > 0 {
            if exp & 1 == 1 {
                acc = acc * base;
            }
            base = base * base;
            exp >>= 1;
        }
        acc
    }

    /// Horner evaluation; `coeffs[0]` is the constant term.
    pub(crate) fn eval_polynomial(coeffs: &[Self], x: Self) -> Self {
        coeffs
            .iter()
            .rev()
            .fold(Gf256::ZERO, |acc, &c| acc * x + c)
    }

    /// Lagrange interpolation of `f(0)` from `(x, y)` points with distinct,
    /// non-zero `x`.
    pub(crate) fn interpolate_at_zero(points: &[(Self, Self)]) -> Self {
        let mut acc = Gf256::ZERO;
        for (i, &(xi, yi)) in points.iter().enumerate() {
            let mut num = Gf256::ONE;
            let mut den = Gf256::ONE;
            for (j, &(xj, _)) in points.iter().enumerate() {
                if i != j {
                    num = num * xj;
                    // subtraction is xor in characteristic 2
                    den = den * (xj + xi);
                }
            }
            acc = acc + yi * (num / den);
        }
        acc
    }
}

impl Add for Gf256 {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn add(self, rhs: Self) -> Self {
        Gf256(self.0 ^ rhs.0)
    }
}

impl Mul for Gf256 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let (mut a, mut b, mut product) = (self.0, rhs.0, 0u8);
        while b != 0 {
            if b & 1 != 0 {
                product ^= a;
            }
            let carry = a & 0x80;
            a <<= 1;
            if carry != 0 {
                // x^8 + x^4 + x^3 + x + 1
                a ^= 0x1b;
            }
            b >>= 1;
        }
        Gf256(product)
    }
}

impl Div for Gf256 {
    type Output = Self;

    #[allow(clippy::suspicious_arithmetic_impl)]
    fn div(self, rhs: Self) -> Self {
        self * rhs.inverse()
    }
}
