//! Unified-diff parser for GitHub `patch` fields.
//!
//! Only `@@ -a[,b] +c[,d] @@` hunk headers are understood; file headers
//! (`diff --git`, `index`, `---`, `+++`) and markers such as
//! `\ No newline at end of file` are dropped. Each `-`, `+` or ` ` line becomes
//! one [`DiffLine`], in patch order.
//!
//! A hunk ends once the line counts of its header are used up, or at the next
//! `diff --git` line, so file headers of a following file are never read as
//! changes.

use feedback_store::LineKind;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    static ref HUNK_HEADER: Regex =
        Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").unwrap();
}

/// One changed or context line.
///
/// `line_number` is the new-file line for `Insert` / `Normal` and the
/// old-file line for `Delete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub line_number: u32,
    pub kind: LineKind,
    pub content: String,
}

/// A hunk with its header counts and parsed lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    /// Lines counted against the old side (delete + normal).
    pub fn old_span(&self) -> u32 {
        self.lines
            .iter()
            .filter(|l| l.kind != LineKind::Insert)
            .count() as u32
    }

    /// Lines counted against the new side (insert + normal).
    pub fn new_span(&self) -> u32 {
        self.lines
            .iter()
            .filter(|l| l.kind != LineKind::Delete)
            .count() as u32
    }
}

#[derive(Debug, Clone, Copy)]
struct HunkCursor {
    old_line: u32,
    new_line: u32,
    old_left: u32,
    new_left: u32,
}

impl HunkCursor {
    fn exhausted(&self) -> bool {
        self.old_left == 0 && self.new_left == 0
    }
}

/// Parses `patch` into a flat, ordered list of lines.
pub fn parse(patch: &str) -> Vec<DiffLine> {
    parse_hunks(patch)
        .into_iter()
        .flat_map(|h| h.lines)
        .collect()
}

/// Parses `patch` and keeps lines grouped by hunk.
pub fn parse_hunks(patch: &str) -> Vec<Hunk> {
    let mut hunks: Vec<Hunk> = Vec::new();
    let mut cursor: Option<HunkCursor> = None;

    for line in patch.lines() {
        if let Some(caps) = HUNK_HEADER.captures(line) {
            let num = |i: usize, default: u32| {
                caps.get(i)
                    .and_then(|m| m.as_str().parse::<u32>().ok())
                    .unwrap_or(default)
            };
            let (old_start, new_start) = (num(1, 0), num(3, 0));
            let (old_count, new_count) = (num(2, 1), num(4, 1));
            hunks.push(Hunk {
                old_start,
                old_count,
                new_start,
                new_count,
                lines: Vec::new(),
            });
            cursor = Some(HunkCursor {
                old_line: old_start,
                new_line: new_start,
                old_left: old_count,
                new_left: new_count,
            });
            continue;
        }

        if line.starts_with("diff --git ") {
            cursor = None;
            continue;
        }

        let Some(first) = line.chars().next() else {
            continue;
        };
        if !matches!(first, '-' | '+' | ' ') {
            continue;
        }
        let (Some(cur), Some(hunk)) = (cursor.as_mut(), hunks.last_mut()) else {
            debug!(line, "diff line outside a hunk, skipped");
            continue;
        };

        let content = line[1..].to_string();
        let record = match first {
            '-' => {
                let n = cur.old_line;
                cur.old_line = cur.old_line.saturating_add(1);
                cur.old_left = cur.old_left.saturating_sub(1);
                DiffLine {
                    line_number: n,
                    kind: LineKind::Delete,
                    content,
                }
            }
            '+' => {
                let n = cur.new_line;
                cur.new_line = cur.new_line.saturating_add(1);
                cur.new_left = cur.new_left.saturating_sub(1);
                DiffLine {
                    line_number: n,
                    kind: LineKind::Insert,
                    content,
                }
            }
            _ => {
                let n = cur.new_line;
                cur.old_line = cur.old_line.saturating_add(1);
                cur.new_line = cur.new_line.saturating_add(1);
                cur.old_left = cur.old_left.saturating_sub(1);
                cur.new_left = cur.new_left.saturating_sub(1);
                DiffLine {
                    line_number: n,
                    kind: LineKind::Normal,
                    content,
                }
            }
        };
        hunk.lines.push(record);
        if cur.exhausted() {
            cursor = None;
        }
    }

    hunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dl(n: u32, kind: LineKind, content: &str) -> DiffLine {
        DiffLine {
            line_number: n,
            kind,
            content: content.into(),
        }
    }

    #[test]
    fn parses_reference_example() {
        let out = parse("@@ -1,2 +1,3 @@\n-a\n+b\n+c\n d\n");
        assert_eq!(
            out,
            vec![
                dl(1, LineKind::Delete, "a"),
                dl(1, LineKind::Insert, "b"),
                dl(2, LineKind::Insert, "c"),
                dl(3, LineKind::Normal, "d"),
            ]
        );
    }

    #[test]
    fn hunk_spans_match_header_counts() {
        let patch = "\
diff --git a/src/lib.rs b/src/lib.rs
index 1111111..2222222 100644
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -3,4 +3,5 @@ fn main() {
 let a = 1;
-let b = 2;
+let b = 3;
+let c = 4;
 let d = 5;
 let e = 6;
@@ -20,3 +21,2 @@
 x
-y
 z
\\ No newline at end of file
";
        let hunks = parse_hunks(patch);
        assert_eq!(hunks.len(), 2);
        for h in &hunks {
            assert_eq!(h.old_span(), h.old_count, "old span of hunk @{}", h.old_start);
            assert_eq!(h.new_span(), h.new_count, "new span of hunk @{}", h.new_start);
        }

        let second = &hunks[1].lines;
        assert_eq!(second[0], dl(21, LineKind::Normal, "x"));
        assert_eq!(second[1], dl(21, LineKind::Delete, "y"));
        assert_eq!(second[2], dl(22, LineKind::Normal, "z"));
    }

    #[test]
    fn header_without_counts_defaults_to_one() {
        let hunks = parse_hunks("@@ -7 +7 @@\n-old\n+new\n");
        assert_eq!(hunks[0].old_count, 1);
        assert_eq!(hunks[0].new_count, 1);
        assert_eq!(
            hunks[0].lines,
            vec![dl(7, LineKind::Delete, "old"), dl(7, LineKind::Insert, "new")]
        );
    }

    #[test]
    fn lines_before_first_header_are_dropped() {
        let out = parse("+orphan\n-orphan\n context\n@@ -1 +1 @@\n+kept\n");
        assert_eq!(out, vec![dl(1, LineKind::Insert, "kept")]);
    }

    #[test]
    fn new_file_starting_at_zero() {
        let out = parse("@@ -0,0 +1,2 @@\n+fn a() {}\n+fn b() {}\n");
        assert_eq!(out[0].line_number, 1);
        assert_eq!(out[1].line_number, 2);
        assert!(out.iter().all(|l| l.kind == LineKind::Insert));
    }

    #[test]
    fn file_headers_between_files_are_not_changes() {
        let patch = "\
diff --git a/a.rs b/a.rs
--- a/a.rs
+++ b/a.rs
@@ -1 +1 @@
-x
+y
diff --git a/b.rs b/b.rs
index 1..2 100644
--- a/b.rs
+++ b/b.rs
@@ -5 +5 @@
-p
+q
";
        assert_eq!(
            parse(patch),
            vec![
                dl(1, LineKind::Delete, "x"),
                dl(1, LineKind::Insert, "y"),
                dl(5, LineKind::Delete, "p"),
                dl(5, LineKind::Insert, "q"),
            ]
        );
    }

    #[test]
    fn hunk_stops_when_header_counts_are_used() {
        let patch = "@@ -1 +1,2 @@
-a
+b
+c
--- a/next.rs
+++ b/next.rs
@@ -9 +9 @@
 d
";
        let hunks = parse_hunks(patch);
        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[0].lines.len(), 3);
        assert_eq!(hunks[1].lines, vec![dl(9, LineKind::Normal, "d")]);
    }

    #[test]
    fn empty_and_garbage_input() {
        assert!(parse("").is_empty());
        assert!(parse("Binary files a/x.png and b/x.png differ").is_empty());
        assert!(parse("@@ -1 +1 @@\n\n").is_empty());
    }
}
