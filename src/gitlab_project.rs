use serde::{Deserialize, Serialize};

use crate::config::CloneProtocol;

/// A project as listed under a group. Only the clone-relevant fields are kept.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// The name of the project.
    pub name: String,
    /// URL to clone the repository over SSH.
    pub ssh_url_to_repo: String,
    /// URL to clone the repository over HTTP(S).
    #[serde(default)]
    pub http_url_to_repo: Option<String>,
}

impl Project {
    pub fn clone_url(&self, protocol: CloneProtocol) -> &str {
        match protocol {
            CloneProtocol::Ssh => &self.ssh_url_to_repo,
            CloneProtocol::Http => self
                .http_url_to_repo
                .as_deref()
                .unwrap_or(&self.ssh_url_to_repo),
        }
    }
}
