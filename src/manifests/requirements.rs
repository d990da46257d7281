//! Pinned requirements manifest parsing.
//!
//! A manifest is a plain-text list of `name == version` pins grouped under
//! comment headers:
//!
//! ```text
//! # core utilities
//! numpy == 1.19.2
//! pandas == 1.1.3
//!
//! # for scraping
//! requests == 2.24.0
//! ```
//!
//! Parsing never fails on content. Lines that don't fit the grammar become
//! [`LineKind::Invalid`] so the linter can point at them.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// PEP 508 distribution name.
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9._-]*[A-Za-z0-9])?$").expect("name regex is valid")
});

/// PEP 440 version characters, with an optional `.*` prefix wildcard.
static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9.+!_-]*[A-Za-z0-9])?(\.\*)?$")
        .expect("version regex is valid")
});

static SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_.]+").expect("separator regex is valid"));

const OPERATOR_CHARS: &[char] = &['=', '<', '>', '!', '~'];

/// A parsed manifest file.
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub path: PathBuf,
    pub lines: Vec<Line>,
}

/// One physical line of a manifest.
#[derive(Debug, Clone, Serialize)]
pub struct Line {
    /// 1-based line number.
    pub number: usize,
    pub raw: String,
    pub kind: LineKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum LineKind {
    Blank,
    /// Full-line comment, without the leading `#`.
    Comment(String),
    Pin(Pin),
    Invalid(InvalidLine),
}

/// An exact `name == version` requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pin {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Pin {
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Whether both pins can be installed into the same environment.
    ///
    /// A pin without a marker applies everywhere, so it overlaps every pin of
    /// the same package. Two marked pins overlap only when their markers are
    /// identical; markers are compared as text, never evaluated.
    pub fn overlaps(&self, other: &Pin) -> bool {
        if self.normalized_name() != other.normalized_name() {
            return false;
        }
        match (&self.marker, &other.marker) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }

    /// Versions compare case-insensitively (`1.0RC1` == `1.0rc1`).
    pub fn same_version(&self, other: &Pin) -> bool {
        self.version.eq_ignore_ascii_case(&other.version)
    }

    /// Whether the version is a `1.2.*` prefix match rather than an exact release.
    pub fn is_wildcard(&self) -> bool {
        self.version.ends_with(".*")
    }
}

impl std::fmt::Display for Pin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            write!(f, "[{}]", self.extras.join(","))?;
        }
        write!(f, "=={}", self.version)
    }
}

/// Why a line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "reason", content = "text", rename_all = "kebab-case")]
pub enum InvalidLine {
    #[error("missing package name before `==`")]
    MissingName,

    #[error("invalid package name `{0}`")]
    InvalidName(String),

    #[error("expected `<package> == <version>`")]
    MissingOperator,

    #[error("unsupported operator `{0}`, only exact `==` pins are allowed")]
    UnsupportedOperator(String),

    #[error("missing version after `==`")]
    MissingVersion,

    #[error("invalid version `{0}`")]
    InvalidVersion(String),

    #[error("pip option lines are not supported: `{0}`")]
    OptionLine(String),
}

/// A group of pins introduced by a run of comment lines.
#[derive(Debug, Clone)]
pub struct Section<'a> {
    /// First comment of the run, `None` for pins that precede any comment.
    pub title: Option<&'a str>,
    /// Remaining comments of the run.
    pub notes: Vec<&'a str>,
    pub start_line: usize,
    pub pins: Vec<(usize, &'a Pin)>,
}

impl Manifest {
    /// All valid pins with their line numbers, in file order.
    pub fn pins(&self) -> impl Iterator<Item = (usize, &Pin)> {
        self.lines.iter().filter_map(|line| match &line.kind {
            LineKind::Pin(pin) => Some((line.number, pin)),
            _ => None,
        })
    }

    pub fn invalid_lines(&self) -> impl Iterator<Item = (usize, &InvalidLine)> {
        self.lines.iter().filter_map(|line| match &line.kind {
            LineKind::Invalid(reason) => Some((line.number, reason)),
            _ => None,
        })
    }

    /// Group pins under their comment headers.
    ///
    /// Consecutive comment lines form a single header. Blank lines don't close
    /// a section; only the next header does. Empty comments are skipped. A leading untitled section is
    /// only returned when it actually holds pins.
    pub fn sections(&self) -> Vec<Section<'_>> {
        let mut sections = Vec::new();
        let mut current = Section {
            title: None,
            notes: Vec::new(),
            start_line: 1,
            pins: Vec::new(),
        };
        let mut in_header = false;

        for line in &self.lines {
            match &line.kind {
                // A bare `#` is a visual separator, not a header
                LineKind::Comment(text) if text.is_empty() => {}
                LineKind::Comment(text) => {
                    if in_header {
                        current.notes.push(text.as_str());
                    } else {
                        let finished = std::mem::replace(
                            &mut current,
                            Section {
                                title: Some(text.as_str()),
                                notes: Vec::new(),
                                start_line: line.number,
                                pins: Vec::new(),
                            },
                        );
                        if finished.title.is_some() || !finished.pins.is_empty() {
                            sections.push(finished);
                        }
                    }
                    in_header = true;
                }
                LineKind::Pin(pin) => {
                    current.pins.push((line.number, pin));
                    in_header = false;
                }
                LineKind::Blank | LineKind::Invalid(_) => in_header = false,
            }
        }

        if current.title.is_some() || !current.pins.is_empty() {
            sections.push(current);
        }

        sections
    }
}

/// Read and parse a manifest file.
pub fn parse_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(parse_str(path, &content))
}

/// Parse manifest text. Yields exactly one [`Line`] per input line.
pub fn parse_str(path: &Path, content: &str) -> Manifest {
    let lines: Vec<Line> = content
        .lines()
        .enumerate()
        .map(|(i, raw)| Line {
            number: i + 1,
            raw: raw.to_string(),
            kind: parse_line(raw),
        })
        .collect();

    debug!(path = %path.display(), lines = lines.len(), "parsed manifest");

    Manifest {
        path: path.to_path_buf(),
        lines,
    }
}

/// Classify a single line.
pub fn parse_line(raw: &str) -> LineKind {
    let line = raw.trim();

    if line.is_empty() {
        return LineKind::Blank;
    }

    if line.starts_with('#') {
        return LineKind::Comment(line.trim_start_matches('#').trim().to_string());
    }

    if line.starts_with('-') {
        return LineKind::Invalid(InvalidLine::OptionLine(line.to_string()));
    }

    match parse_pin(line) {
        Ok(pin) => LineKind::Pin(pin),
        Err(reason) => LineKind::Invalid(reason),
    }
}

fn parse_pin(line: &str) -> Result<Pin, InvalidLine> {
    let (body, comment) = split_inline_comment(line);

    // Environment markers: "pkg==1.0 ; python_version < '3.8'"
    let (body, marker) = match body.split_once(';') {
        Some((spec, marker)) => {
            let marker = marker.trim();
            (spec.trim(), (!marker.is_empty()).then(|| marker.to_string()))
        }
        None => (body.trim(), None),
    };

    let op_start = body.find(OPERATOR_CHARS).ok_or(InvalidLine::MissingOperator)?;
    let rest = &body[op_start..];
    let op_len = rest
        .find(|c: char| !OPERATOR_CHARS.contains(&c))
        .unwrap_or(rest.len());
    let op = &rest[..op_len];

    let (name, extras) = parse_name(body[..op_start].trim())?;

    if op != "==" {
        return Err(InvalidLine::UnsupportedOperator(op.to_string()));
    }

    let version = rest[op_len..].trim();
    if version.is_empty() {
        return Err(InvalidLine::MissingVersion);
    }
    if !VERSION_RE.is_match(version) {
        return Err(InvalidLine::InvalidVersion(version.to_string()));
    }

    Ok(Pin {
        name,
        extras,
        version: version.to_string(),
        marker,
        comment,
    })
}

/// Parse "name" or "name[extra1, extra2]".
fn parse_name(spec: &str) -> Result<(String, Vec<String>), InvalidLine> {
    if spec.is_empty() {
        return Err(InvalidLine::MissingName);
    }

    let invalid = || InvalidLine::InvalidName(spec.to_string());

    let (name, extras) = match spec.split_once('[') {
        Some((name, tail)) => {
            let inner = tail.strip_suffix(']').ok_or_else(invalid)?;
            let extras: Vec<String> = inner
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(String::from)
                .collect();
            if extras.iter().any(|e| !NAME_RE.is_match(e)) {
                return Err(invalid());
            }
            (name.trim(), extras)
        }
        None => (spec, Vec::new()),
    };

    if !NAME_RE.is_match(name) {
        return Err(invalid());
    }

    Ok((name.to_string(), extras))
}

/// Split off a trailing `# comment`. pip only treats `#` as a comment when it
/// starts the line or follows whitespace.
fn split_inline_comment(line: &str) -> (&str, Option<String>) {
    let mut prev_ws = false;
    for (i, c) in line.char_indices() {
        if c == '#' && prev_ws {
            let comment = line[i + 1..].trim();
            let comment = (!comment.is_empty()).then(|| comment.to_string());
            return (line[..i].trim_end(), comment);
        }
        prev_ws = c.is_whitespace();
    }
    (line, None)
}

/// PEP 503 name normalization: lowercase, runs of `-`, `_`, `.` become `-`.
pub fn normalize_name(name: &str) -> String {
    SEPARATOR_RE.replace_all(name, "-").to_lowercase()
}
