//! Prompt builders for the per-file review and the PR summary.
//!
//! Both templates ask for bare JSON; `normalize` depends on the wording.

use std::fmt::Write as _;

use feedback_store::FileFeedback;

use crate::diff::DiffLine;

/// Per-file review prompt. Expects a JSON array of `{type, comment, lineNumber}` back.
pub fn build_review_prompt(lines: &[DiffLine]) -> String {
    let mut s = String::new();
    s.push_str("You are a senior software engineer reviewing a code change.\n");
    s.push_str("Below are the changed lines of one file, one per row, in the form\n");
    s.push_str("`Line <number> (<type>): <content>` where <type> is insert, delete or normal.\n\n");

    for l in lines {
        let _ = writeln!(s, "Line {} ({}): {}", l.line_number, l.kind, l.content);
    }

    s.push_str("\nReturn ONLY a JSON array. Each element must be an object:\n");
    s.push_str("{\"type\": \"insert\" | \"delete\" | \"normal\", \"comment\": string, \"lineNumber\": integer}\n");
    s.push_str("Use the line number and type of the line you comment on.\n");
    s.push_str("Comment only where there is a concrete problem or improvement; return [] if there is none.\n");
    s.push_str("Do NOT restate the input. Do NOT add explanations, prose or markdown outside the JSON.\n");
    s
}

/// Summary prompt over all per-file feedback of a PR.
///
/// Expects a JSON object `{summary, quality, recommended_resources}` back.
pub fn build_summary_prompt(
    repo_name: &str,
    pr_ref: &str,
    feedback: &[FileFeedback],
    changed_line_count: u64,
) -> String {
    let mut s = String::new();
    let _ = writeln!(
        s,
        "You are a senior software engineer writing the retrospective of pull request {pr_ref} in repository {repo_name}."
    );
    let _ = writeln!(
        s,
        "The pull request changes {changed_line_count} lines. Review comments per file:\n"
    );

    for f in feedback {
        let comments: Vec<&str> = f.comments.iter().map(|c| c.comment.as_str()).collect();
        let _ = writeln!(s, "- {}: {}", f.file_path, comments.join("; "));
    }

    s.push_str("\nReturn ONLY a JSON object with exactly these fields:\n");
    s.push_str("{\"summary\": string, \"quality\": number between 0 and 10, ");
    s.push_str("\"recommended_resources\": [{\"title\": string, \"link\": string}]}\n");
    s.push_str("`summary` is a short paragraph for the author. `quality` rates the change overall.\n");
    s.push_str("Include at least 3 recommended_resources relevant to the comments above.\n");
    s.push_str("Do NOT add explanations, prose or markdown outside the JSON.\n");
    s
}
