use feedback_store::FeedbackStore;

use crate::error_handler::{AppError, AppResult};

/// GitHub access of one employee.
pub struct GitHubCredentials {
    pub token: String,
    pub username: String,
}

/// Loads the employee's GitHub token and username.
///
/// Unknown employees, blank tokens and missing usernames are all 404s.
pub async fn github_credentials(
    store: &FeedbackStore,
    user_id: i64,
) -> AppResult<GitHubCredentials> {
    let employee = store
        .find_employee(user_id)
        .await?
        .ok_or(AppError::NotFound("GitHub credentials not found"))?;

    let token = employee
        .github_token
        .filter(|t| !t.trim().is_empty())
        .ok_or(AppError::NotFound("GitHub token is empty"))?;
    let username = employee
        .github_username
        .filter(|u| !u.trim().is_empty())
        .ok_or(AppError::NotFound("GitHub username is missing"))?;

    Ok(GitHubCredentials { token, username })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn each_gap_is_a_distinct_404() {
        let store = FeedbackStore::open_in_memory().unwrap();
        let full = store.insert_employee(Some("dev"), Some("ghp_1")).await.unwrap();
        let no_token = store.insert_employee(Some("dev2"), Some(" ")).await.unwrap();
        let no_name = store.insert_employee(None, Some("ghp_3")).await.unwrap();

        let ok = github_credentials(&store, full).await.unwrap();
        assert_eq!((ok.token.as_str(), ok.username.as_str()), ("ghp_1", "dev"));

        for (id, msg) in [
            (999, "GitHub credentials not found"),
            (no_token, "GitHub token is empty"),
            (no_name, "GitHub username is missing"),
        ] {
            match github_credentials(&store, id).await {
                Err(AppError::NotFound(m)) => assert_eq!(m, msg),
                Err(other) => panic!("unexpected error {other}"),
                Ok(_) => panic!("employee {id} should not resolve"),
            }
        }
    }
}
