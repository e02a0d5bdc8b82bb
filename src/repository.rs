//! Clone-or-update of a single repository.
//!
//! `git` is run as a subprocess with its output going straight to the
//! console. A non-zero exit status aborts the run.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::Duration;

use wait_timeout::ChildExt;

use crate::error::MirrorError;

/// Version control operations needed by the mirror.
pub trait Vcs {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), MirrorError>;

    fn pull(&self, repo: &Path) -> Result<(), MirrorError>;
}

/// What [`sync`] did for a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Cloned,
    Updated,
}

/// Local directory name for a clone URL: its last segment without `.git`.
pub fn repo_name(clone_url: &str) -> &str {
    let last = clone_url
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(clone_url);
    last.strip_suffix(".git").unwrap_or(last)
}

/// Clones `clone_url` under `target_dir`, or pulls it if already there.
pub fn sync(vcs: &impl Vcs, clone_url: &str, target_dir: &Path) -> Result<SyncAction, MirrorError> {
    ensure_dir(target_dir)?;

    let name = repo_name(clone_url);
    let repo_path = target_dir.join(name);

    if repo_path.exists() {
        log::info!("Repository {name} already exists. Pulling latest changes.");
        vcs.pull(&repo_path)?;
        Ok(SyncAction::Updated)
    } else {
        log::info!("Cloning repository {name}.");
        vcs.clone_repo(clone_url, &repo_path)?;
        Ok(SyncAction::Cloned)
    }
}

/// Creates `dir` and its ancestors; succeeds if it already exists.
pub fn ensure_dir(dir: &Path) -> Result<(), MirrorError> {
    fs::create_dir_all(dir).map_err(|source| MirrorError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// [`Vcs`] backed by the system `git` binary.
#[derive(Debug, Clone, Default)]
pub struct GitCli {
    timeout: Option<Duration>,
}

impl GitCli {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn run(&self, command: &'static str, mut cmd: Command, path: &Path) -> Result<(), MirrorError> {
        cmd.env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        log::debug!("Running {cmd:?}");
        let mut child = cmd
            .spawn()
            .map_err(|source| MirrorError::GitSpawn { command, source })?;

        let status = match self.timeout {
            Some(timeout) => wait_or_kill(&mut child, timeout)
                .map_err(|source| MirrorError::GitSpawn { command, source })?
                .ok_or_else(|| MirrorError::GitTimeout {
                    command,
                    path: path.to_path_buf(),
                    timeout,
                })?,
            None => child
                .wait()
                .map_err(|source| MirrorError::GitSpawn { command, source })?,
        };

        if status.success() {
            Ok(())
        } else {
            Err(MirrorError::Git {
                command,
                path: path.to_path_buf(),
                status,
            })
        }
    }
}

impl Vcs for GitCli {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), MirrorError> {
        let mut cmd = Command::new("git");
        cmd.arg("clone").arg(url).arg(dest);
        self.run("clone", cmd, dest)
    }

    fn pull(&self, repo: &Path) -> Result<(), MirrorError> {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(repo).arg("pull");
        self.run("pull", cmd, repo)
    }
}

/// Waits up to `timeout` for `child`; `None` means it was killed.
fn wait_or_kill(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    match child.wait_timeout(timeout)? {
        Some(status) => Ok(Some(status)),
        None => {
            // It may exit between the timeout and the kill.
            let _ = child.kill();
            child.wait()?;
            Ok(None)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;

    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Call {
        Clone(String, PathBuf),
        Pull(PathBuf),
    }

    /// Records calls; a clone creates the destination directory.
    #[derive(Default)]
    pub(crate) struct FakeVcs {
        pub calls: RefCell<Vec<Call>>,
        /// Clone URL that fails like `git clone` exiting with 128.
        pub failing_url: Option<String>,
    }

    #[cfg(unix)]
    fn exit_128() -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(128 << 8)
    }

    #[cfg(windows)]
    fn exit_128() -> ExitStatus {
        use std::os::windows::process::ExitStatusExt;
        ExitStatus::from_raw(128)
    }

    impl Vcs for FakeVcs {
        fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), MirrorError> {
            self.calls
                .borrow_mut()
                .push(Call::Clone(url.to_string(), dest.to_path_buf()));
            if self.failing_url.as_deref() == Some(url) {
                return Err(MirrorError::Git {
                    command: "clone",
                    path: dest.to_path_buf(),
                    status: exit_128(),
                });
            }
            fs::create_dir_all(dest).unwrap();
            Ok(())
        }

        fn pull(&self, repo: &Path) -> Result<(), MirrorError> {
            self.calls.borrow_mut().push(Call::Pull(repo.to_path_buf()));
            Ok(())
        }
    }

    #[test]
    fn repo_name_strips_git_suffix() {
        assert_eq!(repo_name("git@host:group/infra/repoA.git"), "repoA");
        assert_eq!(repo_name("https://host/group/repoB.git"), "repoB");
        assert_eq!(repo_name("https://host/group/repoC"), "repoC");
        assert_eq!(repo_name("git@host:repoD.git"), "repoD");
        assert_eq!(repo_name("https://host/group/my.gitlab.tools.git"), "my.gitlab.tools");
    }

    #[test]
    fn absent_repository_is_cloned() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("eng");
        let vcs = FakeVcs::default();

        let action = sync(&vcs, "git@host:eng/repoA.git", &target).unwrap();

        assert_eq!(action, SyncAction::Cloned);
        assert!(target.is_dir());
        assert_eq!(
            *vcs.calls.borrow(),
            vec![Call::Clone(
                "git@host:eng/repoA.git".to_string(),
                target.join("repoA")
            )]
        );
    }

    #[test]
    fn present_repository_is_pulled() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("repoA")).unwrap();
        let vcs = FakeVcs::default();

        let action = sync(&vcs, "git@host:eng/repoA.git", dir.path()).unwrap();

        assert_eq!(action, SyncAction::Updated);
        assert_eq!(*vcs.calls.borrow(), vec![Call::Pull(dir.path().join("repoA"))]);
    }

    #[test]
    fn git_pull_outside_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitCli::new(Some(Duration::from_secs(60)));

        let err = git.pull(dir.path()).unwrap_err();

        match err {
            MirrorError::Git {
                command,
                path,
                status,
            } => {
                assert_eq!(command, "pull");
                assert_eq!(path, dir.path());
                assert!(!status.success());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn git_clone_of_missing_source_fails_without_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-repo");
        let git = GitCli::new(None);

        let err = git
            .clone_repo(missing.to_str().unwrap(), &dir.path().join("copy"))
            .unwrap_err();

        assert!(matches!(err, MirrorError::Git { command: "clone", .. }));
    }

    #[cfg(unix)]
    #[test]
    fn slow_child_is_killed_after_timeout() {
        let mut child = Command::new("sleep").arg("5").spawn().unwrap();
        let started = std::time::Instant::now();

        let status = wait_or_kill(&mut child, Duration::from_millis(100)).unwrap();

        assert_eq!(status, None);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(child.try_wait().unwrap().is_some());
    }

    #[cfg(unix)]
    #[test]
    fn fast_child_reports_status() {
        let mut child = Command::new("true").spawn().unwrap();
        let status = wait_or_kill(&mut child, Duration::from_secs(5)).unwrap();
        assert!(status.is_some_and(|s| s.success()));
    }

    #[test]
    fn ensure_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn ensure_dir_fails_on_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("taken");
        fs::write(&file, b"").unwrap();
        let err = ensure_dir(&file.join("sub")).unwrap_err();
        assert!(matches!(err, MirrorError::CreateDir { .. }));
    }
}
