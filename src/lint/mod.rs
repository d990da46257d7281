//! Manifest linting.
//!
//! Every line must be blank, a comment, or a valid `name == version` pin, and
//! no package may be pinned to two different versions. The remaining rules
//! are hygiene checks with configurable levels.

mod rules;

pub use rules::{Rule, RuleConfig};

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::manifests::{Manifest, Pin};
use crate::types::Severity;

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub line: usize,
    pub severity: Severity,
    pub rule: Rule,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {}[{}] {}",
            self.path.display(),
            self.line,
            self.severity,
            self.rule,
            self.message
        )
    }
}

/// Collects diagnostics, dropping rules that are switched off.
struct Sink<'a> {
    rules: &'a RuleConfig,
    out: Vec<Diagnostic>,
}

impl<'a> Sink<'a> {
    fn new(rules: &'a RuleConfig) -> Self {
        Self {
            rules,
            out: Vec::new(),
        }
    }

    fn push(&mut self, path: &Path, line: usize, rule: Rule, message: String) {
        if let Some(severity) = self.rules.level(rule).severity() {
            self.out.push(Diagnostic {
                path: path.to_path_buf(),
                line,
                severity,
                rule,
                message,
            });
        }
    }

    fn finish(mut self) -> Vec<Diagnostic> {
        self.out
            .sort_by(|a, b| (&a.path, a.line, a.rule).cmp(&(&b.path, b.line, b.rule)));
        self.out
    }
}

/// Lint a single manifest.
pub fn lint_manifest(manifest: &Manifest, rules: &RuleConfig) -> Vec<Diagnostic> {
    let mut sink = Sink::new(rules);
    check_manifest(manifest, &mut sink);
    sink.finish()
}

/// Lint several manifests, adding cross-file conflict checks.
pub fn lint_workspace(manifests: &[Manifest], rules: &RuleConfig) -> Vec<Diagnostic> {
    let mut sink = Sink::new(rules);

    for manifest in manifests {
        sink.out.extend(lint_manifest(manifest, rules));
    }

    // Every pin seen so far, by normalized name
    let mut seen: HashMap<String, Vec<(&Path, usize, &Pin)>> = HashMap::new();
    for manifest in manifests {
        let path = manifest.path.as_path();
        for (line, pin) in manifest.pins() {
            let earlier = seen.entry(pin.normalized_name()).or_default();
            let conflict = earlier.iter().find(|(other_path, _, other)| {
                *other_path != path && pin.overlaps(other) && !pin.same_version(other)
            });
            if let Some((other_path, other_line, other)) = conflict {
                sink.push(
                    path,
                    line,
                    Rule::CrossFileConflict,
                    format!(
                        "`{}` is pinned to {} here but to {} in {}:{}",
                        pin.name,
                        pin.version,
                        other.version,
                        other_path.display(),
                        other_line
                    ),
                );
            }
            earlier.push((path, line, pin));
        }
    }

    let diagnostics = sink.finish();
    debug!(
        files = manifests.len(),
        diagnostics = diagnostics.len(),
        "linted workspace"
    );
    diagnostics
}

fn check_manifest(manifest: &Manifest, sink: &mut Sink<'_>) {
    let path = manifest.path.as_path();

    for (line, reason) in manifest.invalid_lines() {
        sink.push(path, line, Rule::InvalidLine, reason.to_string());
    }

    let mut seen: HashMap<String, Vec<(usize, &Pin)>> = HashMap::new();
    for (line, pin) in manifest.pins() {
        let earlier = seen.entry(pin.normalized_name()).or_default();

        // First overlapping pin with another version, else the first overlapping one
        let mut conflict = None;
        let mut duplicate = None;
        for (other_line, other) in earlier.iter().filter(|(_, other)| pin.overlaps(other)) {
            if !pin.same_version(other) {
                conflict = Some((*other_line, *other));
                break;
            }
            duplicate.get_or_insert((*other_line, *other));
        }

        if let Some((first_line, first)) = conflict {
            sink.push(
                path,
                line,
                Rule::ConflictingPin,
                format!(
                    "`{}` is pinned to {} here but to {} on line {}",
                    pin.name, pin.version, first.version, first_line
                ),
            );
        } else if let Some((first_line, first)) = duplicate {
            sink.push(
                path,
                line,
                Rule::DuplicatePin,
                format!(
                    "`{}` is already pinned to {} on line {}",
                    pin.name, first.version, first_line
                ),
            );
        }

        earlier.push((line, pin));
    }

    for section in manifest.sections() {
        if let Some(title) = section.title {
            if section.pins.is_empty() {
                sink.push(
                    path,
                    section.start_line,
                    Rule::EmptySection,
                    format!("section `{}` has no pins", title),
                );
            }
        }

        let out_of_order = section
            .pins
            .windows(2)
            .find(|pair| pair[0].1.normalized_name() > pair[1].1.normalized_name());
        if let Some(pair) = out_of_order {
            let (line, pin) = pair[1];
            sink.push(
                path,
                line,
                Rule::UnsortedSection,
                format!(
                    "`{}` should come before `{}`",
                    pin.name, pair[0].1.name
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifests::parse_str;
    use crate::types::RuleLevel;

    fn manifest(path: &str, content: &str) -> Manifest {
        parse_str(Path::new(path), content)
    }

    fn rules_of(diags: &[Diagnostic]) -> Vec<(usize, Rule)> {
        diags.iter().map(|d| (d.line, d.rule)).collect()
    }

    #[test]
    fn test_clean_manifest() {
        let m = manifest(
            "requirements.txt",
            "# core utilities\nnumpy == 1.19.2\npandas == 1.1.3\n\n# for scraping\nrequests == 2.24.0\n",
        );
        assert!(lint_manifest(&m, &RuleConfig::default()).is_empty());
    }

    #[test]
    fn test_invalid_lines_are_errors() {
        let m = manifest("r.txt", "# misc\nsix == 1.15.0\nnumpy >= 1.19\nscipy\n");
        let diags = lint_manifest(&m, &RuleConfig::default());

        assert_eq!(
            rules_of(&diags),
            vec![(3, Rule::InvalidLine), (4, Rule::InvalidLine)]
        );
        assert!(diags.iter().all(|d| d.severity == Severity::Error));
        assert!(diags[0].message.contains(">="));
    }

    #[test]
    fn test_conflicting_pin_names_first_line() {
        let m = manifest(
            "r.txt",
            "# a\nnumpy == 1.19.2\n# b\nNumPy == 1.18.0\n",
        );
        let diags = lint_manifest(&m, &RuleConfig::default());

        assert_eq!(rules_of(&diags), vec![(4, Rule::ConflictingPin)]);
        assert_eq!(diags[0].severity, Severity::Error);
        assert!(diags[0].message.contains("on line 2"));
    }

    #[test]
    fn test_duplicate_pin_is_warning() {
        let m = manifest("r.txt", "# a\npython_Levenshtein == 0.12.0\npython-levenshtein == 0.12.0\n");
        let diags = lint_manifest(&m, &RuleConfig::default());

        assert_eq!(rules_of(&diags), vec![(3, Rule::DuplicatePin)]);
        assert_eq!(diags[0].severity, Severity::Warning);
    }

    #[test]
    fn test_markers_keep_pins_apart() {
        let m = manifest(
            "r.txt",
            "# a\nnumpy == 1.19.5 ; python_version < '3.7'\nnumpy == 1.21.0 ; python_version >= '3.7'\n",
        );
        assert!(lint_manifest(&m, &RuleConfig::default()).is_empty());
    }

    #[test]
    fn test_unmarked_pin_conflicts_with_marked_pin() {
        let m = manifest(
            "r.txt",
            "# core utilities\nnumpy == 1.19.2\nnumpy == 1.21.0 ; python_version >= '3.7'\n",
        );
        let diags = lint_manifest(&m, &RuleConfig::default());

        assert_eq!(rules_of(&diags), vec![(3, Rule::ConflictingPin)]);
        assert!(diags[0].message.contains("on line 2"));

        // Order doesn't matter
        let m = manifest(
            "r.txt",
            "# a\nnumpy == 1.21.0 ; python_version >= '3.7'\nnumpy == 1.19.2\n",
        );
        let diags = lint_manifest(&m, &RuleConfig::default());
        assert_eq!(rules_of(&diags), vec![(3, Rule::ConflictingPin)]);
    }

    #[test]
    fn test_conflict_preferred_over_duplicate() {
        let m = manifest(
            "r.txt",
            "# a\nsix == 1.15.0 ; os_name == 'nt'\nsix == 1.16.0 ; os_name != 'nt'\nsix == 1.15.0\n",
        );
        let diags = lint_manifest(&m, &RuleConfig::default());

        assert_eq!(rules_of(&diags), vec![(4, Rule::ConflictingPin)]);
        assert!(diags[0].message.contains("1.16.0 on line 3"));
    }

    #[test]
    fn test_empty_section() {
        let m = manifest("r.txt", "# for statistics / using R\n\n# misc\nsix == 1.15.0\n");
        let diags = lint_manifest(&m, &RuleConfig::default());

        assert_eq!(rules_of(&diags), vec![(1, Rule::EmptySection)]);
        assert!(diags[0].message.contains("for statistics / using R"));
    }

    #[test]
    fn test_bare_hash_is_not_an_empty_section() {
        let m = manifest("r.txt", "#\n\n# misc\nsix == 1.15.0\n#\n");
        assert!(lint_manifest(&m, &RuleConfig::default()).is_empty());
    }

    #[test]
    fn test_unsorted_section_only_when_enabled() {
        let m = manifest("r.txt", "# a\nrequests == 2.24.0\nbeautifulsoup4 == 4.9.3\n");
        assert!(lint_manifest(&m, &RuleConfig::default()).is_empty());

        let mut rules = RuleConfig::default();
        rules.set(Rule::UnsortedSection, RuleLevel::Warning);
        let diags = lint_manifest(&m, &rules);
        assert_eq!(rules_of(&diags), vec![(3, Rule::UnsortedSection)]);
    }

    #[test]
    fn test_rule_off_suppresses() {
        let m = manifest("r.txt", "# a\nsix == 1.15.0\nsix == 1.15.0\n");
        let mut rules = RuleConfig::default();
        rules.set(Rule::DuplicatePin, RuleLevel::Off);
        assert!(lint_manifest(&m, &rules).is_empty());

        rules.set(Rule::DuplicatePin, RuleLevel::Error);
        let diags = lint_manifest(&m, &rules);
        assert_eq!(diags[0].severity, Severity::Error);
    }

    #[test]
    fn test_cross_file_conflict() {
        let a = manifest("a/requirements.txt", "# a\nrequests == 2.24.0\nsix == 1.15.0\n");
        let b = manifest("b/requirements.txt", "# b\nrequests == 2.25.1\nsix == 1.15.0\n");

        let diags = lint_workspace(&[a, b], &RuleConfig::default());

        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].rule, Rule::CrossFileConflict);
        assert_eq!(diags[0].path, PathBuf::from("b/requirements.txt"));
        assert_eq!(diags[0].line, 2);
        assert!(diags[0].message.contains("a/requirements.txt:2"));
    }

    #[test]
    fn test_cross_file_conflict_with_marked_pin() {
        let a = manifest("a/requirements.txt", "# a\nnumpy == 1.19.2\n");
        let b = manifest(
            "b/requirements.txt",
            "# b\nnumpy == 1.21.0 ; python_version >= '3.7'\nnumpy == 1.19.5 ; python_version < '3.7'\n",
        );

        let diags = lint_workspace(&[a, b], &RuleConfig::default());

        assert_eq!(rules_of(&diags), vec![(2, Rule::CrossFileConflict), (3, Rule::CrossFileConflict)]);
        assert!(diags.iter().all(|d| d.path == PathBuf::from("b/requirements.txt")));
        assert!(diags[0].message.contains("a/requirements.txt:2"));
    }

    #[test]
    fn test_cross_file_disjoint_markers_do_not_conflict() {
        let a = manifest("a/requirements.txt", "# a\nnumpy == 1.19.5 ; python_version < '3.7'\n");
        let b = manifest("b/requirements.txt", "# b\nnumpy == 1.21.0 ; python_version >= '3.7'\n");
        assert!(lint_workspace(&[a, b], &RuleConfig::default()).is_empty());
    }

    #[test]
    fn test_same_file_conflict_not_reported_twice() {
        let a = manifest("a.txt", "# a\nsix == 1.15.0\nsix == 1.16.0\n");
        let diags = lint_workspace(&[a], &RuleConfig::default());
        assert_eq!(rules_of(&diags), vec![(3, Rule::ConflictingPin)]);
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic {
            path: PathBuf::from("requirements.txt"),
            line: 7,
            severity: Severity::Error,
            rule: Rule::ConflictingPin,
            message: "boom".to_string(),
        };
        assert_eq!(
            d.to_string(),
            "requirements.txt:7: error[conflicting-pin] boom"
        );
    }
}
