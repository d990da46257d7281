//! Lint rule identifiers and their configured levels.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::RuleLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    /// Line is neither blank, a comment, nor a valid `name == version` pin.
    InvalidLine,
    /// Same package pinned to two different versions in one file.
    ConflictingPin,
    /// Same package pinned twice to the same version in one file.
    DuplicatePin,
    /// Comment header with no pins under it.
    EmptySection,
    /// Pins within a section are not in name order.
    UnsortedSection,
    /// Same package pinned to different versions in different files.
    CrossFileConflict,
}

impl Rule {
    pub const ALL: [Rule; 6] = [
        Rule::InvalidLine,
        Rule::ConflictingPin,
        Rule::DuplicatePin,
        Rule::EmptySection,
        Rule::UnsortedSection,
        Rule::CrossFileConflict,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rule::InvalidLine => "invalid-line",
            Rule::ConflictingPin => "conflicting-pin",
            Rule::DuplicatePin => "duplicate-pin",
            Rule::EmptySection => "empty-section",
            Rule::UnsortedSection => "unsorted-section",
            Rule::CrossFileConflict => "cross-file-conflict",
        }
    }

    pub fn default_level(&self) -> RuleLevel {
        match self {
            Rule::InvalidLine | Rule::ConflictingPin => RuleLevel::Error,
            Rule::DuplicatePin | Rule::EmptySection | Rule::CrossFileConflict => {
                RuleLevel::Warning
            }
            Rule::UnsortedSection => RuleLevel::Off,
        }
    }
}

impl std::fmt::Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Rule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_lowercase().replace('_', "-");
        Rule::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unknown rule: {}", s))
    }
}

/// Rule level overrides from the `[rules]` table of `.reqpin.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, RuleLevel>")]
pub struct RuleConfig {
    overrides: BTreeMap<Rule, RuleLevel>,
}

impl RuleConfig {
    pub fn level(&self, rule: Rule) -> RuleLevel {
        self.overrides
            .get(&rule)
            .copied()
            .unwrap_or_else(|| rule.default_level())
    }

    pub fn set(&mut self, rule: Rule, level: RuleLevel) {
        self.overrides.insert(rule, level);
    }
}

impl TryFrom<BTreeMap<String, RuleLevel>> for RuleConfig {
    type Error = String;

    fn try_from(table: BTreeMap<String, RuleLevel>) -> Result<Self, Self::Error> {
        let overrides = table
            .into_iter()
            .map(|(name, level)| Ok((name.parse::<Rule>()?, level)))
            .collect::<Result<_, String>>()?;
        Ok(Self { overrides })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_roundtrip() {
        for rule in Rule::ALL {
            assert_eq!(rule.as_str().parse::<Rule>().unwrap(), rule);
        }
        assert_eq!(
            "Duplicate_Pin".parse::<Rule>().unwrap(),
            Rule::DuplicatePin
        );
        assert!("nope".parse::<Rule>().is_err());
    }

    #[test]
    fn test_rule_config_overrides() {
        let mut config = RuleConfig::default();
        assert_eq!(config.level(Rule::InvalidLine), RuleLevel::Error);
        assert_eq!(config.level(Rule::UnsortedSection), RuleLevel::Off);

        config.set(Rule::UnsortedSection, RuleLevel::Warning);
        assert_eq!(config.level(Rule::UnsortedSection), RuleLevel::Warning);
    }

    #[test]
    fn test_rule_config_from_table() {
        let mut table = BTreeMap::new();
        table.insert("empty-section".to_string(), RuleLevel::Off);
        let config = RuleConfig::try_from(table).unwrap();
        assert_eq!(config.level(Rule::EmptySection), RuleLevel::Off);

        let mut table = BTreeMap::new();
        table.insert("bogus".to_string(), RuleLevel::Off);
        assert!(RuleConfig::try_from(table).is_err());
    }
}
