use crate::backend::Backend;
use std::marker::PhantomData;

/// Trait for scalar operations required by numerical backends.
///
/// Covers exactly what the logistic loss needs from a backend's native
/// scalar when it maps over a tensor. Implemented for `f64`.
///
/// # Required operations
/// - Subtraction via `Sub`
/// - Mathematical functions: `abs`, `exp`, `ln_1p`, `max`
/// - Conversion to `f64` for reporting
/// - Constant: `zero()`
///
/// # Example
/// ```
/// use logitfit::backend::ScalarOps;
///
/// assert_eq!(ScalarOps::abs(-4.0f64), 4.0);
/// assert_eq!(<f64 as ScalarOps>::zero(), 0.0);
/// assert_eq!(ScalarOps::ln_1p(0.0f64), 0.0);
/// ```
pub trait ScalarOps:
    Clone + Copy + Send + Sync + PartialOrd + std::fmt::Debug + std::ops::Sub<Output = Self>
{
    /// Returns the absolute value of the scalar.
    fn abs(self) -> Self;

    /// Returns the additive identity (zero) for this scalar type.
    fn zero() -> Self;

    /// Converts this scalar to an `f64` value.
    fn to_f64(self) -> f64;

    /// Computes the exponential function `e^x`.
    fn exp(self) -> Self;

    /// Computes `ln(1 + x)`, accurate for `x` near zero.
    fn ln_1p(self) -> Self;

    /// Returns the larger of `self` and `other`.
    fn max(self, other: Self) -> Self;
}

/// `f64` implementation of `ScalarOps`.
///
/// Follows IEEE 754 semantics (NaN propagation, infinities).
impl ScalarOps for f64 {
    fn abs(self) -> Self {
        f64::abs(self)
    }

    fn zero() -> Self {
        0.0
    }

    fn to_f64(self) -> f64 {
        self
    }

    fn exp(self) -> Self {
        f64::exp(self)
    }

    fn ln_1p(self) -> Self {
        f64::ln_1p(self)
    }

    fn max(self, other: Self) -> Self {
        f64::max(self, other)
    }
}

/// Backend-typed scalar wrapper providing compile-time type safety.
///
/// Wraps a backend's native scalar type (`B::Scalar`) while carrying phantom
/// type information about its originating backend. Scalars are produced by
/// reductions (`dot`, `sum`) and consumed by tensor scaling.
///
/// # Example
/// ```
/// use logitfit::backend::{CpuBackend, Scalar, Tensor1D};
///
/// let v = Tensor1D::<CpuBackend>::new(vec![1.0, 2.0]);
/// let doubled = v.scale(&Scalar::new(2.0));
/// assert_eq!(doubled.sum().to_f64(), 6.0);
/// ```
#[derive(Clone, Debug, Copy)]
pub struct Scalar<B: Backend> {
    pub(crate) data: B::Scalar,
    pub(crate) backend: PhantomData<B>,
}

impl<B: Backend> Scalar<B> {
    /// Creates a new scalar from an `f64` host value.
    pub fn new(f: f64) -> Self {
        Self {
            data: B::scalar_f64(f),
            backend: PhantomData,
        }
    }

    pub(crate) fn from_raw(data: B::Scalar) -> Self {
        Self {
            data,
            backend: PhantomData,
        }
    }

    /// Converts this backend scalar to a host `f64` value.
    pub fn to_f64(&self) -> f64 {
        self.data.to_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;
    use approx::assert_relative_eq;

    #[test]
    fn test_scalar_ops_f64() {
        assert_eq!(ScalarOps::abs(-4.0f64), 4.0);
        assert_eq!(<f64 as ScalarOps>::zero(), 0.0);
        assert_eq!(ScalarOps::to_f64(3.14f64), 3.14);
        assert_eq!(ScalarOps::exp(1.0f64), std::f64::consts::E);
        assert_eq!(ScalarOps::max(-1.0f64, 0.0), 0.0);
    }

    #[test]
    fn test_ln_1p_keeps_tiny_values() {
        let tiny = 1e-20f64;
        assert_relative_eq!(ScalarOps::ln_1p(tiny), tiny, max_relative = 1e-15);
        assert_eq!((1.0 + tiny).ln(), 0.0);
    }

    #[test]
    fn test_scalar_roundtrip() {
        let s: Scalar<CpuBackend> = Scalar::new(-2.5);
        assert_eq!(s.to_f64(), -2.5);
    }
}
