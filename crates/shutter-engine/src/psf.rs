//! Point-spread functions and the smearing operator.
//!
//! A code of `m` slots is resampled onto the `k` pixels the motion covers.
//! The smearing operator is the `(n + k − 1) × n` matrix of full linear
//! convolution with that PSF.

use crate::code::ExposureCode;
use nalgebra::DMatrix;
use shutter_core::{Result, ShutterError};

/// A normalized blur kernel along the motion axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Psf {
    taps: Vec<f64>,
}

impl Psf {
    /// Normalize raw non-negative taps to sum to 1.
    pub fn from_taps(taps: Vec<f64>) -> Result<Self> {
        let sum: f64 = taps.iter().sum();
        if taps.is_empty() || !sum.is_finite() || sum <= 0.0 {
            return Err(ShutterError::invalid(format!(
                "PSF taps sum to {sum}; cannot normalize"
            )));
        }
        Ok(Self {
            taps: taps.into_iter().map(|t| t / sum).collect(),
        })
    }

    /// The PSF the smearing operator uses: the code itself when it already
    /// spans `blur_length` pixels, otherwise the resampled code.
    pub fn for_code(code: &ExposureCode, blur_length: usize) -> Result<Self> {
        if code.len() == blur_length {
            Self::from_taps(code.bits().iter().map(|b| *b as f64).collect())
        } else {
            code_to_psf(code, blur_length)
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    #[inline]
    pub fn taps(&self) -> &[f64] {
        &self.taps
    }

    /// Full linear convolution of `signal` with this PSF
    /// (output length `signal.len() + k − 1`).
    pub fn convolve_full(&self, signal: &[f64]) -> Vec<f64> {
        if signal.is_empty() {
            return Vec::new();
        }
        let mut out = vec![0.0; signal.len() + self.taps.len() - 1];
        for (i, s) in signal.iter().enumerate() {
            for (j, t) in self.taps.iter().enumerate() {
                out[i + j] += s * t;
            }
        }
        out
    }
}

/// Resample a binary code onto `blur_length` pixels by piecewise-linear
/// interpolation and normalize the result.
///
/// Code samples sit at `i / (m − 1)` on `[0, 1]`; PSF samples sit at
/// `j / k` on `[0, 1)`, so the last PSF sample never lands on the last code
/// slot.
pub fn code_to_psf(code: &ExposureCode, blur_length: usize) -> Result<Psf> {
    if blur_length == 0 {
        return Err(ShutterError::invalid("Blur length must be positive"));
    }
    let values: Vec<f64> = code.bits().iter().map(|b| *b as f64).collect();
    let m = values.len();

    let taps = (0..blur_length)
        .map(|j| {
            if m == 1 {
                return values[0];
            }
            let x = j as f64 / blur_length as f64;
            let pos = x * (m - 1) as f64;
            let i = (pos.floor() as usize).min(m - 2);
            let frac = pos - i as f64;
            values[i] + (values[i + 1] - values[i]) * frac
        })
        .collect();

    Psf::from_taps(taps).map_err(|_| {
        ShutterError::invalid(format!(
            "Code {code} interpolates to an all-zero PSF at blur length {blur_length}"
        ))
    })
}

/// Build the `(n + k − 1) × n` smearing matrix: column `i` holds the PSF in
/// rows `i..i + k`.
pub fn create_smearing_matrix(
    code: &ExposureCode,
    blur_length: usize,
    n: usize,
) -> Result<DMatrix<f64>> {
    if n == 0 {
        return Err(ShutterError::invalid("Signal length must be positive"));
    }
    let psf = Psf::for_code(code, blur_length)?;
    Ok(smearing_matrix_for_psf(&psf, n))
}

/// Smearing matrix for an already-built PSF.
pub fn smearing_matrix_for_psf(psf: &Psf, n: usize) -> DMatrix<f64> {
    let k = psf.len();
    let mut a = DMatrix::zeros(n + k - 1, n);
    for i in 0..n {
        for (j, t) in psf.taps().iter().enumerate() {
            a[(i + j, i)] = *t;
        }
    }
    a
}

/// Append an unnormalized column of ones so one extra unknown, a constant
/// background level, is solved alongside the signal.
pub fn extend_for_constant_background(a: &DMatrix<f64>) -> DMatrix<f64> {
    a.clone().insert_column(a.ncols(), 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::generate_code;
    use proptest::prelude::*;
    use shutter_core::CodeMethod;

    #[test]
    fn psf_sums_to_one() {
        let code = generate_code(52, CodeMethod::Optimal).unwrap();
        for k in [1, 5, 20, 51, 52, 53, 100, 250] {
            let psf = code_to_psf(&code, k).unwrap();
            assert_eq!(psf.len(), k);
            let sum: f64 = psf.taps().iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "k={k} sum={sum}");
        }
    }

    #[test]
    fn psf_interpolates_between_slots() {
        // Slots at 0, 0.5, 1; samples at 0, 0.25, 0.5, 0.75.
        let code = ExposureCode::from_bits(vec![1, 0, 1]).unwrap();
        let psf = code_to_psf(&code, 4).unwrap();
        let expected = [1.0, 0.5, 0.0, 0.5];
        for (got, want) in psf.taps().iter().zip(expected) {
            assert!((got - want / 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn all_zero_interpolation_is_rejected() {
        let code = ExposureCode::from_bits(vec![0, 0, 1]).unwrap();
        assert!(matches!(
            code_to_psf(&code, 1),
            Err(ShutterError::InvalidArgument(_))
        ));
        let closed = ExposureCode::from_bits(vec![0; 4]).unwrap();
        assert!(code_to_psf(&closed, 10).is_err());
        assert!(code_to_psf(&closed, 0).is_err());
    }

    #[test]
    fn matching_length_uses_code_directly() {
        let code = ExposureCode::parse("1101").unwrap();
        let psf = Psf::for_code(&code, 4).unwrap();
        let third = 1.0 / 3.0;
        assert_eq!(psf.taps(), &[third, third, 0.0, third]);
    }

    #[test]
    fn smearing_matrix_shape_and_band() {
        let code = generate_code(52, CodeMethod::Optimal).unwrap();
        let (k, n) = (20, 30);
        let a = create_smearing_matrix(&code, k, n).unwrap();
        assert_eq!(a.shape(), (n + k - 1, n));

        let psf = code_to_psf(&code, k).unwrap();
        for i in 0..n {
            let col = a.column(i);
            assert!((col.sum() - 1.0).abs() < 1e-9);
            for r in 0..a.nrows() {
                if r >= i && r < i + k {
                    assert_eq!(col[r], psf.taps()[r - i]);
                } else {
                    assert_eq!(col[r], 0.0);
                }
            }
        }
    }

    #[test]
    fn smearing_matrix_matches_convolution() {
        let code = generate_code(52, CodeMethod::Mura).unwrap();
        let psf = Psf::for_code(&code, 9).unwrap();
        let signal: Vec<f64> = (0..15).map(|i| (i * 7 % 11) as f64).collect();
        let a = smearing_matrix_for_psf(&psf, signal.len());
        let product = &a * nalgebra::DVector::from_column_slice(&signal);
        for (x, y) in product.iter().zip(psf.convolve_full(&signal)) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn extension_appends_ones_column() {
        let code = generate_code(52, CodeMethod::Box).unwrap();
        let a = create_smearing_matrix(&code, 6, 10).unwrap();
        let ext = extend_for_constant_background(&a);
        assert_eq!(ext.shape(), (15, 11));
        assert!(ext.column(10).iter().all(|v| *v == 1.0));
        assert_eq!(ext.columns(0, 10), a.columns(0, 10));
    }

    proptest! {
        #[test]
        fn psf_is_normalized_for_any_code_opening_first(
            tail in proptest::collection::vec(0u8..=1, 1..80),
            k in 1usize..200,
        ) {
            let mut bits = vec![1u8];
            bits.extend(tail);
            let code = ExposureCode::from_bits(bits).unwrap();
            let psf = code_to_psf(&code, k).unwrap();
            prop_assert_eq!(psf.len(), k);
            prop_assert!(psf.taps().iter().all(|t| *t >= 0.0));
            let sum: f64 = psf.taps().iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-6);
        }

        #[test]
        fn smearing_columns_sum_to_one(k in 1usize..40, n in 1usize..40) {
            let code = generate_code(52, CodeMethod::Optimal).unwrap();
            let a = create_smearing_matrix(&code, k, n).unwrap();
            prop_assert_eq!(a.shape(), (n + k - 1, n));
            for col in a.column_iter() {
                prop_assert!((col.sum() - 1.0).abs() < 1e-9);
            }
        }
    }
}
