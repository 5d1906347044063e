//! Binary exposure codes for the flutter shutter.

use rand::rngs::StdRng;
use rand::{seq::index, SeedableRng};
use shutter_core::{CodeMethod, Result, ShutterError, OPTIMAL_CODE};

/// An ordered sequence of shutter slots, each open (1) or closed (0).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExposureCode {
    bits: Vec<u8>,
}

impl ExposureCode {
    /// Wrap a bit sequence. Every entry must be 0 or 1 and the sequence
    /// must not be empty.
    pub fn from_bits(bits: Vec<u8>) -> Result<Self> {
        if bits.is_empty() {
            return Err(ShutterError::invalid("Exposure code must not be empty"));
        }
        if let Some(bad) = bits.iter().find(|b| **b > 1) {
            return Err(ShutterError::invalid(format!(
                "Exposure code entries must be 0 or 1, found {bad}"
            )));
        }
        Ok(Self { bits })
    }

    /// Parse a string of '0' and '1' characters.
    pub fn parse(s: &str) -> Result<Self> {
        let bits = s
            .chars()
            .map(|c| match c {
                '0' => Ok(0),
                '1' => Ok(1),
                other => Err(ShutterError::invalid(format!(
                    "Invalid exposure code character: {other:?}"
                ))),
            })
            .collect::<Result<Vec<u8>>>()?;
        Self::from_bits(bits)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    #[inline]
    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    /// Number of open slots.
    pub fn open_count(&self) -> usize {
        self.bits.iter().filter(|b| **b == 1).count()
    }

    /// Per-slot weights normalized to sum to 1.
    ///
    /// Fails with `InvalidArgument` when every slot is closed.
    pub fn weights(&self) -> Result<Vec<f64>> {
        let open = self.open_count();
        if open == 0 {
            return Err(ShutterError::invalid(
                "Exposure code has no open slots; weights cannot be normalized",
            ));
        }
        let inv = 1.0 / open as f64;
        Ok(self.bits.iter().map(|b| *b as f64 * inv).collect())
    }
}

impl std::fmt::Display for ExposureCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in &self.bits {
            write!(f, "{b}")?;
        }
        Ok(())
    }
}

/// Produces exposure codes by named method.
///
/// Only [`CodeMethod::Random`] consumes randomness. Without a seed it draws
/// from entropy and is not reproducible.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeGenerator {
    seed: Option<u64>,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator whose random codes are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    /// Generator with an optional seed, as carried by parameter sets.
    pub fn from_seed(seed: Option<u64>) -> Self {
        Self { seed }
    }

    /// Generate a code of `length` slots.
    pub fn generate(&self, length: usize, method: CodeMethod) -> Result<ExposureCode> {
        if length == 0 {
            return Err(ShutterError::invalid("Code length must be positive"));
        }

        let bits = match method {
            CodeMethod::Optimal => OPTIMAL_CODE
                .bytes()
                .map(|b| b - b'0')
                .cycle()
                .take(length)
                .collect(),
            CodeMethod::Box => vec![1; length],
            CodeMethod::Random => {
                let mut rng = match self.seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                let mut bits = vec![0u8; length];
                for i in index::sample(&mut rng, length, length / 2) {
                    bits[i] = 1;
                }
                bits
            }
            CodeMethod::Mura => (0..length)
                .map(|i| u8::from(i % 2 == 0 || i % 3 == 0))
                .collect(),
        };

        Ok(ExposureCode { bits })
    }
}

/// Generate a code with an unseeded generator.
pub fn generate_code(length: usize, method: CodeMethod) -> Result<ExposureCode> {
    CodeGenerator::new().generate(length, method)
}

/// Generate a code by method name (`"optimal"`, `"box"`, `"random"`, `"mura"`).
pub fn generate_code_named(length: usize, method: &str) -> Result<ExposureCode> {
    generate_code(length, method.parse()?)
}
