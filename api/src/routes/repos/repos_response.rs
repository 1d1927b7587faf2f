use github_gateway::Repository;
use serde::Serialize;

/// Repository card of the user's repository list.
#[derive(Debug, Serialize)]
pub struct RepoSummary {
    pub id: u64,
    pub full_name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    /// `YYYY-MM-DD`
    pub updated_at: Option<String>,
    /// `public` or `private`
    pub visibility: &'static str,
}

impl From<Repository> for RepoSummary {
    fn from(r: Repository) -> Self {
        Self {
            id: r.id,
            full_name: r.full_name,
            description: r.description,
            language: r.language,
            updated_at: r.updated_at.map(|d| d.format("%Y-%m-%d").to_string()),
            visibility: if r.private { "private" } else { "public" },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BranchesResponse {
    pub branches: Vec<String>,
    pub default_branch: String,
}

impl BranchesResponse {
    /// Repository default, else the first branch, else `main`.
    pub fn new(branches: Vec<String>, repo_default: Option<String>) -> Self {
        let default_branch = repo_default
            .filter(|b| !b.trim().is_empty())
            .or_else(|| branches.first().cloned())
            .unwrap_or_else(|| "main".to_string());
        Self {
            branches,
            default_branch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_branch_fallbacks() {
        let names = || vec!["dev".to_string(), "main".to_string()];
        assert_eq!(BranchesResponse::new(names(), Some("trunk".into())).default_branch, "trunk");
        assert_eq!(BranchesResponse::new(names(), None).default_branch, "dev");
        assert_eq!(BranchesResponse::new(vec![], Some("".into())).default_branch, "main");
    }
}
