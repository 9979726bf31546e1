//! Library configuration

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;

/// Environment variable selecting the [`SqrtPolicy`]
pub const SQRT_POLICY_ENV: &str = "CLAMBDA_MATH_SQRT";

/// What `sqrt` does with a negative argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqrtPolicy {
    /// Warn and return the root of the magnitude: `sqrt(-4) == 2`
    #[default]
    Magnitude,
    /// Treat it as a domain error and return the null sentinel, like `log`
    Strict,
}

impl FromStr for SqrtPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "magnitude" => Ok(SqrtPolicy::Magnitude),
            "strict" => Ok(SqrtPolicy::Strict),
            other => Err(format!("unknown sqrt policy '{}'", other)),
        }
    }
}

impl fmt::Display for SqrtPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqrtPolicy::Magnitude => f.write_str("magnitude"),
            SqrtPolicy::Strict => f.write_str("strict"),
        }
    }
}

/// Options for the numeric functions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MathOptions {
    /// Negative `sqrt` handling
    pub sqrt: SqrtPolicy,
}

impl MathOptions {
    /// Options from the environment. Unset or unparsable values fall back to
    /// the defaults.
    pub fn from_env() -> Self {
        let sqrt = match std::env::var(SQRT_POLICY_ENV) {
            Ok(value) => value.parse().unwrap_or_else(|err| {
                tracing::warn!(target: "clambda", "{}: {}, using default", SQRT_POLICY_ENV, err);
                SqrtPolicy::default()
            }),
            Err(_) => SqrtPolicy::default(),
        };
        MathOptions { sqrt }
    }

    /// Options with the given sqrt policy
    pub fn with_sqrt(mut self, sqrt: SqrtPolicy) -> Self {
        self.sqrt = sqrt;
        self
    }
}

static OPTIONS: Lazy<MathOptions> = Lazy::new(MathOptions::from_env);

/// Options used by the exported functions, read once per process
pub fn options() -> MathOptions {
    *OPTIONS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policy() {
        assert_eq!("strict".parse(), Ok(SqrtPolicy::Strict));
        assert_eq!(" Magnitude ".parse(), Ok(SqrtPolicy::Magnitude));
        assert!("loose".parse::<SqrtPolicy>().is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(MathOptions::default().sqrt, SqrtPolicy::Magnitude);
        assert_eq!(
            MathOptions::default().with_sqrt(SqrtPolicy::Strict).sqrt,
            SqrtPolicy::Strict
        );
        assert_eq!(SqrtPolicy::Strict.to_string(), "strict");
    }
}
