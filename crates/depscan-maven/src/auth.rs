//! Repository authentication using credentials from `~/.depscan/config.toml`.
//!
//! ```toml
//! [repositories]
//! corp = { url = "https://nexus.corp/maven", username = "ci", password = "..." }
//! ```
//!
//! A password without a username is sent as a bearer token.

use reqwest::RequestBuilder;

use crate::repository::MavenRepository;

/// Apply authentication to a request if the repository has credentials.
pub fn apply_auth(request: RequestBuilder, repo: &MavenRepository) -> RequestBuilder {
    match (&repo.username, &repo.password) {
        (Some(user), password) => request.basic_auth(user, password.as_deref()),
        (None, Some(token)) => request.bearer_auth(token),
        (None, None) => request,
    }
}
