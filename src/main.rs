use std::process::ExitCode;

use clap::Parser;

mod api;
mod config;
mod error;
mod gitlab_group;
mod gitlab_project;
mod hierarchy;
mod mirror;
mod repository;

use api::GitlabApi;
use config::{Args, MirrorConfig};
use error::MirrorError;
use mirror::{Mirror, RunSummary};
use repository::GitCli;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = MirrorConfig::from(Args::parse());
    match run(&config) {
        Ok(summary) => {
            log::info!(
                "Mirrored {} of {} groups into {}: {} cloned, {} updated, {} subgroups skipped",
                summary.groups_processed,
                summary.groups_found,
                config.clone_dir.display(),
                summary.repositories_cloned,
                summary.repositories_updated,
                summary.skipped_subgroups.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &MirrorConfig) -> Result<RunSummary, MirrorError> {
    let api = GitlabApi::connect(config)?;
    Mirror::new(config, api, GitCli::new(config.git_timeout)).run()
}
