//! Nested folder/file tree over a flat list of changed files.

use std::collections::BTreeMap;

use github_gateway::PullRequestFile;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileTreeNode {
    Folder {
        name: String,
        children: Vec<FileTreeNode>,
    },
    File {
        name: String,
        status: String,
        file: PullRequestFile,
    },
}

impl FileTreeNode {
    pub fn name(&self) -> &str {
        match self {
            Self::Folder { name, .. } | Self::File { name, .. } => name,
        }
    }
}

#[derive(Default)]
struct Dir<'a> {
    children: BTreeMap<&'a str, Dir<'a>>,
    file: Option<&'a PullRequestFile>,
}

/// Builds the tree; siblings are sorted by name.
///
/// A path segment that is both a file and a folder prefix (only possible
/// across renames) is rendered as the file.
pub fn build_file_tree(files: &[PullRequestFile]) -> Vec<FileTreeNode> {
    let mut root = Dir::default();
    for f in files {
        let mut node = &mut root;
        for part in f.filename.split('/').filter(|p| !p.is_empty()) {
            node = node.children.entry(part).or_default();
        }
        node.file = Some(f);
    }
    render(&root)
}

fn render(dir: &Dir<'_>) -> Vec<FileTreeNode> {
    dir.children
        .iter()
        .map(|(name, child)| match child.file {
            Some(f) => FileTreeNode::File {
                name: (*name).to_string(),
                status: f.status.clone(),
                file: f.clone(),
            },
            None => FileTreeNode::Folder {
                name: (*name).to_string(),
                children: render(child),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(name: &str, status: &str) -> PullRequestFile {
        PullRequestFile {
            filename: name.into(),
            status: status.into(),
            additions: 1,
            deletions: 0,
            changes: 1,
            patch: None,
            previous_filename: None,
            sha: None,
            blob_url: None,
        }
    }

    #[test]
    fn nests_and_sorts() {
        let tree = build_file_tree(&[
            f("src/main.rs", "modified"),
            f("README.md", "added"),
            f("src/api/routes.rs", "removed"),
        ]);

        let names: Vec<_> = tree.iter().map(FileTreeNode::name).collect();
        assert_eq!(names, vec!["README.md", "src"]);

        let FileTreeNode::Folder { children, .. } = &tree[1] else {
            panic!("src should be a folder");
        };
        let names: Vec<_> = children.iter().map(FileTreeNode::name).collect();
        assert_eq!(names, vec!["api", "main.rs"]);
        assert!(matches!(&children[1], FileTreeNode::File { status, .. } if status == "modified"));
    }

    #[test]
    fn serializes_with_type_tag() {
        let tree = build_file_tree(&[f("a/b.rs", "added")]);
        let v = serde_json::to_value(&tree).unwrap();
        assert_eq!(v[0]["type"], "folder");
        assert_eq!(v[0]["children"][0]["type"], "file");
        assert_eq!(v[0]["children"][0]["status"], "added");
        assert_eq!(v[0]["children"][0]["file"]["filename"], "a/b.rs");
    }

    #[test]
    fn empty_input_gives_empty_tree() {
        assert!(build_file_tree(&[]).is_empty());
    }
}
