//! `clambda call`

use std::path::Path;

use anyhow::Context;
use clambda_host::{Extension, Heap, Object};
use clap::ValueEnum;

/// Read by the numeric library when it first handles `sqrt`
const SQRT_POLICY_ENV: &str = "CLAMBDA_MATH_SQRT";

/// Negative `sqrt` handling passed on to the numeric library
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SqrtPolicy {
    /// Square root of the magnitude, with a warning
    Magnitude,
    /// Null result
    Strict,
}

impl SqrtPolicy {
    /// The spelling the numeric library reads
    pub fn as_str(self) -> &'static str {
        match self {
            SqrtPolicy::Magnitude => "magnitude",
            SqrtPolicy::Strict => "strict",
        }
    }
}

pub fn execute(library: &Path, function: &str, args: &[String], sqrt: Option<SqrtPolicy>) -> anyhow::Result<()> {
    if let Some(policy) = sqrt {
        std::env::set_var(SQRT_POLICY_ENV, policy.as_str());
    }

    let extension = Extension::load(library)
        .with_context(|| format!("failed to load {}", library.display()))?;

    let heap = Heap::new();
    let items: Vec<_> = args.iter().map(|arg| heap.alloc(parse_arg(arg))).collect();
    let tuple = heap.tuple(&items);
    for item in items {
        heap.release(item);
    }

    let result = extension
        .call(function, tuple, &heap)
        .with_context(|| format!("{}({}) failed", function, args.join(", ")))?;
    println!("{}", heap.describe(result));
    Ok(())
}

/// Interpret a command line argument as a host value
fn parse_arg(arg: &str) -> Object {
    if let Ok(v) = arg.parse::<i64>() {
        return Object::Int(v);
    }
    if let Ok(v) = arg.parse::<f64>() {
        return Object::Float(v);
    }
    match arg {
        "true" => Object::Boolean(true),
        "false" => Object::Boolean(false),
        "null" => Object::Null,
        _ => Object::String(arg.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arg() {
        assert_eq!(parse_arg("16"), Object::Int(16));
        assert_eq!(parse_arg("-4.5"), Object::Float(-4.5));
        assert_eq!(parse_arg("1e3"), Object::Float(1000.0));
        assert_eq!(parse_arg("true"), Object::Boolean(true));
        assert_eq!(parse_arg("null"), Object::Null);
        assert_eq!(parse_arg("pi"), Object::String("pi".into()));
    }

    #[test]
    fn test_sqrt_policy_is_exported_lowercase() {
        let err = execute(Path::new("/nonexistent.so"), "sqrt", &[], Some(SqrtPolicy::Strict)).unwrap_err();
        assert!(err.to_string().contains("failed to load"));
        assert_eq!(std::env::var(SQRT_POLICY_ENV).as_deref(), Ok("strict"));
    }

    #[test]
    fn test_missing_library() {
        let err = execute(Path::new("/nonexistent/libnothing.so"), "sin", &[], None).unwrap_err();
        assert!(err.to_string().contains("failed to load"));
    }
}
