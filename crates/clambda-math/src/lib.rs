//! CLambda numeric function library
//!
//! An extension module exporting `clambda_<name>` for each function in
//! [`functions`]. It reaches the host only through the bridge's value and
//! collection protocols.
//!
//! `sqrt` of a negative number follows [`SqrtPolicy`], chosen through the
//! `CLAMBDA_MATH_SQRT` environment variable (`magnitude` by default).

#![warn(missing_docs)]

pub mod functions;
pub mod options;

pub use functions::MathError;
pub use options::{MathOptions, SqrtPolicy, SQRT_POLICY_ENV};

/// Names of the exported functions, without the `clambda_` prefix
pub const FUNCTIONS: &[&str] = &[
    "sin", "cos", "tan", "pow", "sqrt", "round", "floor", "ceil", "log", "log10", "exp", "max",
    "min", "abs", "pi", "e",
];

clambda_sdk::export_module!();

clambda_sdk::export_functions! {
    clambda_sin => functions::sin,
    clambda_cos => functions::cos,
    clambda_tan => functions::tan,
    clambda_pow => functions::pow,
    clambda_sqrt => functions::sqrt,
    clambda_round => functions::round,
    clambda_floor => functions::floor,
    clambda_ceil => functions::ceil,
    clambda_log => functions::log,
    clambda_log10 => functions::log10,
    clambda_exp => functions::exp,
    clambda_max => functions::max,
    clambda_min => functions::min,
    clambda_abs => functions::abs,
    clambda_pi => functions::pi,
    clambda_e => functions::e,
}
