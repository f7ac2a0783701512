use std::fmt;

use rand::Rng;

pub const BYTE_MIN: i64 = i8::MIN as i64;
pub const BYTE_MAX: i64 = i8::MAX as i64;
pub const BINARY_MAX: i64 = 128;

/// A single generated scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write_float(f, *x),
        }
    }
}

/// Shortest round-trip representation, always with a decimal point or an
/// exponent. Exponents carry an explicit sign and at least two digits
/// (`1e-05`, `1.5e+16`).
fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    let repr = format!("{x:?}");
    let Some((mantissa, exponent)) = repr.split_once('e') else {
        return f.write_str(&repr);
    };
    let (sign, digits) = match exponent.strip_prefix('-') {
        Some(digits) => ('-', digits),
        None => ('+', exponent),
    };

    write!(f, "{mantissa}e{sign}{digits:0>2}")
}

/// Writes `[a, b, c]`.
pub struct VectorDisplay<'a>(pub &'a [Value]);

impl fmt::Display for VectorDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, value) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{value}")?;
        }
        f.write_str("]")
    }
}

/// Sampling policy per data type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueSampler {
    Float { min: f64, max: f64 },
    Byte { min: f64, max: f64 },
    Binary,
}

/// `min + (max - min) * u` for `u` in [0, 1).
///
/// Unlike `gen_range` this does not require `min < max`. Inverted bounds
/// yield samples in the reversed interval, so the default bounds of 2 and -2
/// produce values in [-2, 2].
fn uniform<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    min + (max - min) * rng.gen::<f64>()
}

impl ValueSampler {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        match *self {
            ValueSampler::Float { min, max } => Value::Float(uniform(rng, min, max)),
            ValueSampler::Byte { min, max } => {
                // `as` truncates toward zero and saturates at the i64 range
                let truncated = uniform(rng, min, max) as i64;
                Value::Int(truncated.clamp(BYTE_MIN, BYTE_MAX))
            }
            ValueSampler::Binary => Value::Int(rng.gen_range(0..=BINARY_MAX)),
        }
    }
}

/// Value generator bound to an injected random source.
pub struct ValueGenerator<R> {
    sampler: ValueSampler,
    rng: R,
}

impl<R: Rng> ValueGenerator<R> {
    pub fn new(sampler: ValueSampler, rng: R) -> Self {
        Self { sampler, rng }
    }

    pub fn sampler(&self) -> ValueSampler {
        self.sampler
    }

    pub fn generate(&mut self) -> Value {
        self.sampler.sample(&mut self.rng)
    }

    pub fn generate_vector(&mut self, len: usize) -> Vec<Value> {
        (0..len).map(|_| self.generate()).collect()
    }
}
