//! Top-level segment splitting on `&&`, `||`, `;`, `|`, respecting quotes.

/// Split a command line into segments at top-level `&&`, `||`, `;`, and
/// `|`, without looking inside single- or double-quoted regions.
///
/// This is deliberately not a full shell grammar (spec.md Non-goals) — it
/// only needs to find the control-operator boundaries so each segment can
/// be classified independently.
#[must_use]
pub fn split_segments(command: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = command.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;

    while let Some(c) = chars.next() {
        match c {
            '\'' if !in_double => {
                in_single = !in_single;
                current.push(c);
            }
            '"' if !in_single => {
                in_double = !in_double;
                current.push(c);
            }
            '\\' if !in_single => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '&' if !in_single && !in_double && chars.peek() == Some(&'&') => {
                chars.next();
                push_segment(&mut segments, &mut current);
            }
            '|' if !in_single && !in_double && chars.peek() == Some(&'|') => {
                chars.next();
                push_segment(&mut segments, &mut current);
            }
            '|' if !in_single && !in_double => {
                push_segment(&mut segments, &mut current);
            }
            ';' if !in_single && !in_double => {
                push_segment(&mut segments, &mut current);
            }
            _ => current.push(c),
        }
    }
    push_segment(&mut segments, &mut current);

    segments.into_iter().filter(|s| !s.is_empty()).collect()
}

fn push_segment(segments: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim().to_string();
    if !trimmed.is_empty() {
        segments.push(trimmed);
    }
    current.clear();
}
