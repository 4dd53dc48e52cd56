use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops;

/// A complex number stored as a pair of 64-bit floats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    #[inline]
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// The magnitude of the number.
    #[inline]
    pub fn abs(self) -> f64 {
        self.re.hypot(self.im)
    }

    /// The phase angle in radians.
    #[inline]
    pub fn arg(self) -> f64 {
        self.im.atan2(self.re)
    }

    pub fn exp(self) -> Self {
        let r = self.re.exp();
        Self::new(r * self.im.cos(), r * self.im.sin())
    }

    pub fn ln(self) -> Self {
        Self::new(self.abs().ln(), self.arg())
    }

    /// Raise to a real power via polar form.
    pub fn powf(self, exp: f64) -> Self {
        if self.re == 0.0 && self.im == 0.0 {
            return if exp == 0.0 {
                Self::new(1.0, 0.0)
            } else {
                Self::new(0.0, 0.0)
            };
        }
        let r = self.abs().powf(exp);
        let theta = self.arg() * exp;
        Self::new(r * theta.cos(), r * theta.sin())
    }

    /// Raise to a complex power: `z.powc(w) == exp(w * ln(z))`.
    pub fn powc(self, exp: Complex) -> Self {
        if exp.im == 0.0 {
            return self.powf(exp.re);
        }
        (exp * self.ln()).exp()
    }
}

impl From<f64> for Complex {
    fn from(value: f64) -> Self {
        Self::new(value, 0.0)
    }
}

impl ops::Neg for Complex {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.re, -self.im)
    }
}

impl ops::Add for Complex {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl ops::Sub for Complex {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl ops::Mul for Complex {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::new(
            self.re.mul_add(rhs.re, -(self.im * rhs.im)),
            self.re.mul_add(rhs.im, self.im * rhs.re),
        )
    }
}

impl ops::Div for Complex {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        let denom = rhs.re.mul_add(rhs.re, rhs.im * rhs.im);
        Self::new(
            self.re.mul_add(rhs.re, self.im * rhs.im) / denom,
            self.im.mul_add(rhs.re, -(self.re * rhs.im)) / denom,
        )
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.im < 0.0 {
            write!(f, "{}-{}j", self.re, -self.im)
        } else {
            write!(f, "{}+{}j", self.re, self.im)
        }
    }
}
