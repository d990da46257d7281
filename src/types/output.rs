use serde::{Deserialize, Serialize};

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// A single JSON document on stdout
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Whitespace around `==` when a pin is rendered.
///
/// `Spaced` gives `numpy == 1.19.2`, `Compact` gives `numpy==1.19.2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Spacing {
    #[default]
    Spaced,
    Compact,
}

impl Spacing {
    pub fn operator(&self) -> &'static str {
        match self {
            Spacing::Spaced => " == ",
            Spacing::Compact => "==",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spacing_operator() {
        assert_eq!(Spacing::Spaced.operator(), " == ");
        assert_eq!(Spacing::Compact.operator(), "==");
        assert_eq!(Spacing::default(), Spacing::Spaced);
    }
}
