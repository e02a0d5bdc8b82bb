use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Which of a project's clone URLs to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CloneProtocol {
    #[default]
    Ssh,
    Http,
}

/// Mirror every group, subgroup and project of a GitLab instance into a local tree.
#[derive(Debug, Parser)]
#[command(name = "gitlab-mirror", version)]
pub struct Args {
    /// GitLab host, e.g. gitlab.example.com. A scheme prefix is accepted.
    #[arg(long, env = "GITLAB_HOST")]
    pub host: String,

    /// Private access token.
    #[arg(long, env = "GITLAB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Directory the group tree is created in.
    #[arg(long, env = "CLONE_DIR", default_value = ".")]
    pub clone_dir: PathBuf,

    /// Use plain HTTP for API requests.
    #[arg(long)]
    pub insecure: bool,

    /// Clone over SSH or HTTP(S).
    #[arg(long, value_enum, default_value_t = CloneProtocol::Ssh)]
    pub protocol: CloneProtocol,

    /// Seconds a single git clone or pull may take, 0 for no limit.
    #[arg(long, default_value_t = 1800)]
    pub git_timeout: u64,
}

/// Settings for one mirror run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorConfig {
    pub host: String,
    pub token: String,
    pub clone_dir: PathBuf,
    pub insecure: bool,
    pub protocol: CloneProtocol,
    pub git_timeout: Option<Duration>,
}

impl MirrorConfig {
    pub fn new(host: &str, token: impl Into<String>, clone_dir: impl Into<PathBuf>) -> Self {
        let insecure = host.starts_with("http://");
        Self {
            host: normalize_host(host),
            token: token.into(),
            clone_dir: clone_dir.into(),
            insecure,
            protocol: CloneProtocol::default(),
            git_timeout: None,
        }
    }
}

impl From<Args> for MirrorConfig {
    fn from(args: Args) -> Self {
        let mut config = MirrorConfig::new(&args.host, args.token, args.clone_dir);
        config.insecure |= args.insecure;
        config.protocol = args.protocol;
        config.git_timeout = (args.git_timeout > 0).then(|| Duration::from_secs(args.git_timeout));
        config
    }
}

// The gitlab crate expects a bare hostname and adds the scheme itself.
fn normalize_host(host: &str) -> String {
    host.trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_string()
}
