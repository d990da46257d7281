//! Canonical manifest rendering.

use super::requirements::{LineKind, Manifest, Pin};
use crate::types::Spacing;

/// Render a manifest canonically.
///
/// Pins are rewritten as `name[extras] == version ; marker  # comment`,
/// comments as `# text`, runs of blank lines collapse to one and leading or
/// trailing blanks are dropped. Invalid lines are kept verbatim so nothing is
/// lost. The result is stable under re-formatting.
pub fn format_manifest(manifest: &Manifest, spacing: Spacing) -> String {
    let mut out = String::new();
    let mut pending_blank = false;

    for line in &manifest.lines {
        let rendered = match &line.kind {
            LineKind::Blank => {
                pending_blank = !out.is_empty();
                continue;
            }
            LineKind::Comment(text) if text.is_empty() => "#".to_string(),
            LineKind::Comment(text) => format!("# {}", text),
            LineKind::Pin(pin) => format_pin(pin, spacing),
            LineKind::Invalid(_) => line.raw.trim_end().to_string(),
        };

        if pending_blank {
            out.push('\n');
            pending_blank = false;
        }
        out.push_str(&rendered);
        out.push('\n');
    }

    out
}

fn format_pin(pin: &Pin, spacing: Spacing) -> String {
    let mut s = pin.name.clone();
    if !pin.extras.is_empty() {
        s.push('[');
        s.push_str(&pin.extras.join(","));
        s.push(']');
    }
    s.push_str(spacing.operator());
    s.push_str(&pin.version);
    if let Some(marker) = &pin.marker {
        s.push_str(" ; ");
        s.push_str(marker);
    }
    if let Some(comment) = &pin.comment {
        s.push_str("  # ");
        s.push_str(comment);
    }
    s
}
