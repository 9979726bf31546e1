//! Numeric functions
//!
//! Every function takes an argument tuple and the host's allocation context
//! and answers with a freshly allocated float, or the null sentinel when the
//! arguments are malformed or outside the function's domain. The reason is
//! reported on the diagnostic channel.
//!
//! Elements may be floats or integers; integers are widened.

use clambda_sdk::{Bridge, BridgeError, GcRef, GcSystem, Tuple};
use thiserror::Error;

use crate::options::{options, SqrtPolicy};

/// Why a numeric function produced no value
#[derive(Debug, Error)]
pub enum MathError {
    /// The bridge could not reach the host or the arguments were malformed
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// The input is outside the function's domain
    #[error("{0}")]
    Domain(&'static str),
}

type MathResult<T> = Result<T, MathError>;

fn finish(name: &str, bridge: &Bridge, gc: GcSystem, result: MathResult<f64>) -> GcRef {
    match result {
        Ok(value) => bridge.new_float(value, gc),
        Err(err) => {
            tracing::warn!(target: "clambda", function = name, "{}", err);
            GcRef::null()
        }
    }
}

/// Element `index` as a float. A non-numeric element reads as 0.0.
fn arg(tuple: &Tuple<'_>, index: usize) -> MathResult<f64> {
    match tuple.get_f64(index) {
        Ok(x) => Ok(x),
        Err(err) if err.is_resolution_failure() => Err(err.into()),
        Err(err) => {
            tracing::warn!(target: "clambda", "Expected numeric value at index {}: {}", index, err);
            Ok(0.0)
        }
    }
}

fn unary(
    name: &str,
    bridge: &Bridge,
    args: GcRef,
    gc: GcSystem,
    f: impl FnOnce(f64) -> MathResult<f64>,
) -> GcRef {
    let result = Tuple::with_arity(bridge, args, gc, 1)
        .map_err(MathError::from)
        .and_then(|tuple| arg(&tuple, 0))
        .and_then(f);
    finish(name, bridge, gc, result)
}

fn fold(name: &str, bridge: &Bridge, args: GcRef, gc: GcSystem, pick: fn(f64, f64) -> f64) -> GcRef {
    let result = (|| -> MathResult<f64> {
        let tuple = Tuple::wrap(bridge, args, gc)?;
        let len = tuple.len()?;
        if len == 0 {
            return Err(MathError::Bridge(BridgeError::ArgumentError(
                "Expected at least one argument".to_string(),
            )));
        }
        let mut acc = arg(&tuple, 0)?;
        for i in 1..len {
            acc = pick(acc, arg(&tuple, i)?);
        }
        Ok(acc)
    })();
    finish(name, bridge, gc, result)
}

// ============================================================================
// Trigonometry
// ============================================================================

/// Sine
pub fn sin(bridge: &Bridge, args: GcRef, gc: GcSystem) -> GcRef {
    unary("sin", bridge, args, gc, |x| Ok(x.sin()))
}

/// Cosine
pub fn cos(bridge: &Bridge, args: GcRef, gc: GcSystem) -> GcRef {
    unary("cos", bridge, args, gc, |x| Ok(x.cos()))
}

/// Tangent
pub fn tan(bridge: &Bridge, args: GcRef, gc: GcSystem) -> GcRef {
    unary("tan", bridge, args, gc, |x| Ok(x.tan()))
}

// ============================================================================
// Powers and roots
// ============================================================================

/// `base` raised to `exponent`
pub fn pow(bridge: &Bridge, args: GcRef, gc: GcSystem) -> GcRef {
    let result = Tuple::with_arity(bridge, args, gc, 2)
        .map_err(MathError::from)
        .and_then(|tuple| Ok(arg(&tuple, 0)?.powf(arg(&tuple, 1)?)));
    finish("pow", bridge, gc, result)
}

/// Square root, with negative input handled by the process-wide options
pub fn sqrt(bridge: &Bridge, args: GcRef, gc: GcSystem) -> GcRef {
    sqrt_with(options().sqrt, bridge, args, gc)
}

/// Square root under an explicit policy
pub fn sqrt_with(policy: SqrtPolicy, bridge: &Bridge, args: GcRef, gc: GcSystem) -> GcRef {
    unary("sqrt", bridge, args, gc, |x| {
        if x >= 0.0 {
            return Ok(x.sqrt());
        }
        match policy {
            SqrtPolicy::Magnitude => {
                tracing::warn!(target: "clambda", "Taking square root of negative number {}", x);
                Ok(x.abs().sqrt())
            }
            SqrtPolicy::Strict => Err(MathError::Domain(
                "Cannot take square root of negative number",
            )),
        }
    })
}

/// e raised to `x`
pub fn exp(bridge: &Bridge, args: GcRef, gc: GcSystem) -> GcRef {
    unary("exp", bridge, args, gc, |x| Ok(x.exp()))
}

// ============================================================================
// Logarithms
// ============================================================================

fn positive(x: f64) -> MathResult<f64> {
    if x <= 0.0 {
        Err(MathError::Domain(
            "Cannot take logarithm of non-positive number",
        ))
    } else {
        Ok(x)
    }
}

/// Natural logarithm; null for x <= 0
pub fn log(bridge: &Bridge, args: GcRef, gc: GcSystem) -> GcRef {
    unary("log", bridge, args, gc, |x| positive(x).map(f64::ln))
}

/// Base-10 logarithm; null for x <= 0
pub fn log10(bridge: &Bridge, args: GcRef, gc: GcSystem) -> GcRef {
    unary("log10", bridge, args, gc, |x| positive(x).map(f64::log10))
}

// ============================================================================
// Rounding
// ============================================================================

/// Round half away from zero
pub fn round(bridge: &Bridge, args: GcRef, gc: GcSystem) -> GcRef {
    unary("round", bridge, args, gc, |x| Ok(x.round()))
}

/// Round down
pub fn floor(bridge: &Bridge, args: GcRef, gc: GcSystem) -> GcRef {
    unary("floor", bridge, args, gc, |x| Ok(x.floor()))
}

/// Round up
pub fn ceil(bridge: &Bridge, args: GcRef, gc: GcSystem) -> GcRef {
    unary("ceil", bridge, args, gc, |x| Ok(x.ceil()))
}

/// Absolute value
pub fn abs(bridge: &Bridge, args: GcRef, gc: GcSystem) -> GcRef {
    unary("abs", bridge, args, gc, |x| Ok(x.abs()))
}

// ============================================================================
// Extremes
// ============================================================================

/// Largest of one or more arguments
pub fn max(bridge: &Bridge, args: GcRef, gc: GcSystem) -> GcRef {
    fold("max", bridge, args, gc, |a, b| if b > a { b } else { a })
}

/// Smallest of one or more arguments
pub fn min(bridge: &Bridge, args: GcRef, gc: GcSystem) -> GcRef {
    fold("min", bridge, args, gc, |a, b| if b < a { b } else { a })
}

// ============================================================================
// Constants
// ============================================================================

/// π. Arguments are ignored.
pub fn pi(bridge: &Bridge, _args: GcRef, gc: GcSystem) -> GcRef {
    bridge.new_float(std::f64::consts::PI, gc)
}

/// Euler's number. Arguments are ignored.
pub fn e(bridge: &Bridge, _args: GcRef, gc: GcSystem) -> GcRef {
    bridge.new_float(std::f64::consts::E, gc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_bridge_yields_null() {
        let bridge = Bridge::detached();
        let gc = GcSystem::null();
        assert!(sin(&bridge, GcRef::null(), gc).is_null());
        assert!(max(&bridge, GcRef::null(), gc).is_null());
        assert!(pi(&bridge, GcRef::null(), gc).is_null());
    }

    #[test]
    fn test_domain_check() {
        assert!(positive(0.0).is_err());
        assert!(positive(-1.0).is_err());
        assert_eq!(positive(2.0).ok(), Some(2.0));
    }
}
