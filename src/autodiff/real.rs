use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

use super::tape::Var;

/// Scalar that transforms and penalties are written against.
///
/// Implemented for plain `f64` (evaluation only) and for [`Var`] (recorded on
/// a tape, differentiable), so every curve and penalty is written once.
pub trait Real:
    Copy
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Add<f64, Output = Self>
    + Sub<f64, Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
{
    fn value(self) -> f64;
    /// A constant living wherever `self` lives.
    fn lift(self, c: f64) -> Self;
    fn exp(self) -> Self;
    fn ln(self) -> Self;
    fn sqrt(self) -> Self;
    fn abs(self) -> Self;
    fn powi(self, n: i32) -> Self;
    fn recip(self) -> Self;
    fn relu(self) -> Self;
    fn max(self, other: Self) -> Self;
    fn min(self, other: Self) -> Self;

    #[inline]
    fn square(self) -> Self {
        self * self
    }
}

impl Real for f64 {
    #[inline]
    fn value(self) -> f64 {
        self
    }
    #[inline]
    fn lift(self, c: f64) -> Self {
        c
    }
    #[inline]
    fn exp(self) -> Self {
        f64::exp(self)
    }
    #[inline]
    fn ln(self) -> Self {
        f64::ln(self)
    }
    #[inline]
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }
    #[inline]
    fn abs(self) -> Self {
        f64::abs(self)
    }
    #[inline]
    fn powi(self, n: i32) -> Self {
        f64::powi(self, n)
    }
    #[inline]
    fn recip(self) -> Self {
        f64::recip(self)
    }
    #[inline]
    fn relu(self) -> Self {
        f64::max(self, 0.0)
    }
    #[inline]
    fn max(self, other: Self) -> Self {
        f64::max(self, other)
    }
    #[inline]
    fn min(self, other: Self) -> Self {
        f64::min(self, other)
    }
}

impl<'t> Real for Var<'t> {
    #[inline]
    fn value(self) -> f64 {
        Var::value(&self)
    }
    #[inline]
    fn lift(self, c: f64) -> Self {
        Var::lift(&self, c)
    }
    #[inline]
    fn exp(self) -> Self {
        Var::exp(self)
    }
    #[inline]
    fn ln(self) -> Self {
        Var::ln(self)
    }
    #[inline]
    fn sqrt(self) -> Self {
        Var::sqrt(self)
    }
    #[inline]
    fn abs(self) -> Self {
        Var::abs(self)
    }
    #[inline]
    fn powi(self, n: i32) -> Self {
        Var::powi(self, n)
    }
    #[inline]
    fn recip(self) -> Self {
        Var::recip(self)
    }
    #[inline]
    fn relu(self) -> Self {
        Var::relu(self)
    }
    #[inline]
    fn max(self, other: Self) -> Self {
        Var::max(self, other)
    }
    #[inline]
    fn min(self, other: Self) -> Self {
        Var::min(self, other)
    }
}

/// Sum of a non-empty slice; `None` when empty.
pub fn sum<T: Real>(xs: &[T]) -> Option<T> {
    let (first, rest) = xs.split_first()?;
    Some(rest.iter().fold(*first, |acc, &x| acc + x))
}

/// Arithmetic mean of a non-empty slice; `None` when empty.
pub fn mean<T: Real>(xs: &[T]) -> Option<T> {
    sum(xs).map(|s| s / xs.len() as f64)
}
