//! Walks the group listing and mirrors each group's projects to disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use gitlab::GroupId;

use crate::api::GitlabSource;
use crate::config::MirrorConfig;
use crate::error::MirrorError;
use crate::gitlab_group::Group;
use crate::hierarchy;
use crate::repository::{self, SyncAction, Vcs};

/// Groups already handled during the current run.
#[derive(Debug, Default)]
pub struct ProcessedGroups(HashSet<GroupId>);

impl ProcessedGroups {
    pub fn insert(&mut self, id: GroupId) {
        self.0.insert(id);
    }

    pub fn contains(&self, id: GroupId) -> bool {
        self.0.contains(&id)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub groups_found: usize,
    pub groups_processed: usize,
    pub repositories_cloned: usize,
    pub repositories_updated: usize,
    pub skipped_subgroups: Vec<GroupId>,
}

impl RunSummary {
    fn record(&mut self, action: SyncAction) {
        match action {
            SyncAction::Cloned => self.repositories_cloned += 1,
            SyncAction::Updated => self.repositories_updated += 1,
        }
    }
}

pub struct Mirror<'a, S, V> {
    config: &'a MirrorConfig,
    source: S,
    vcs: V,
}

impl<'a, S, V> Mirror<'a, S, V>
where
    S: GitlabSource,
    V: Vcs,
{
    pub fn new(config: &'a MirrorConfig, source: S, vcs: V) -> Self {
        Self { config, source, vcs }
    }

    /// Mirrors every group visible to the configured token.
    pub fn run(&self) -> Result<RunSummary, MirrorError> {
        let all_groups = self.source.list_groups()?;
        log::info!("Found {} total groups.", all_groups.len());

        let mut summary = RunSummary {
            groups_found: all_groups.len(),
            ..Default::default()
        };
        let (roots, subgroups) = hierarchy::partition(&all_groups);
        let mut processed = ProcessedGroups::default();
        let base = self.config.clone_dir.as_path();

        for group in roots {
            log::info!("Processing root group: {} (ID: {})", group.name, group.id);
            self.process_group(group, base, &mut processed, &mut summary)?;
        }

        for group in subgroups {
            let Some(parent_id) = group.parent_id else {
                continue;
            };
            let (parent_dir, parent) = match hierarchy::resolve_parent_dir(parent_id, &all_groups) {
                Ok(resolved) => resolved,
                Err(e) => {
                    log::error!("Error: {e} Skipping subgroup {} (ID: {}).", group.name, group.id);
                    summary.skipped_subgroups.push(group.id);
                    continue;
                }
            };
            if let Some(grandparent) = parent.parent_id {
                log::warn!(
                    "Subgroup {} (ID: {}) sits below group {grandparent}; placed under {} only.",
                    group.name,
                    group.id,
                    parent.name
                );
            }
            log::info!("Processing subgroup: {} (ID: {})", group.name, group.id);
            self.process_group(group, &base.join(parent_dir), &mut processed, &mut summary)?;
        }

        Ok(summary)
    }

    /// Creates the group's directory under `parent_dir` and syncs its projects.
    ///
    /// Returns `None` when the group was already processed in this run.
    pub fn process_group(
        &self,
        group: &Group,
        parent_dir: &Path,
        processed: &mut ProcessedGroups,
        summary: &mut RunSummary,
    ) -> Result<Option<PathBuf>, MirrorError> {
        if processed.contains(group.id) {
            log::debug!("Group {} (ID: {}) already processed", group.name, group.id);
            return Ok(None);
        }
        processed.insert(group.id);
        summary.groups_processed += 1;

        let group_dir = parent_dir.join(group.dir_name());
        repository::ensure_dir(&group_dir)?;

        let parent_id = group.parent_id.map_or("None".into(), |p| p.to_string());
        log::info!(
            "Processing group: {} (ID: {}, Parent ID: {parent_id})",
            group.name,
            group.id
        );

        let projects = self.source.list_projects(group.id)?;
        log::info!("  Found {} projects in group {}.", projects.len(), group.name);

        for project in &projects {
            log::info!("  Cloning repository: {}", project.name);
            let action = repository::sync(
                &self.vcs,
                project.clone_url(self.config.protocol),
                &group_dir,
            )?;
            summary.record(action);
        }

        Ok(Some(group_dir))
    }
}
