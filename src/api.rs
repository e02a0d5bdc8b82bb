//! Page-by-page retrieval of groups and projects.
//!
//! GitLab endpoints are queried one page at a time with a fixed page size.
//! A listing ends at the first empty page.

use std::marker::PhantomData;

use gitlab::api::endpoint_prelude::*;
use gitlab::api::Query;
use gitlab::{Gitlab, GroupId};

use crate::config::MirrorConfig;
use crate::error::MirrorError;
use crate::gitlab_group::Group;
use crate::gitlab_project::Project;

pub const PER_PAGE: u64 = 100;

/// One page of `GET /groups`, including groups the caller is not a member of.
#[derive(Debug, Clone, Copy)]
pub struct GroupsPage {
    pub page: u64,
}

impl Endpoint for GroupsPage {
    fn method(&self) -> Method {
        Method::GET
    }

    fn endpoint(&self) -> Cow<'static, str> {
        "groups".into()
    }

    fn parameters(&self) -> QueryParams {
        let mut params = QueryParams::default();
        params
            .push("per_page", PER_PAGE)
            .push("page", self.page)
            .push("all_available", true);
        params
    }
}

/// One page of `GET /groups/:id/projects`.
#[derive(Debug, Clone, Copy)]
pub struct GroupProjectsPage {
    pub group: GroupId,
    pub page: u64,
}

impl Endpoint for GroupProjectsPage {
    fn method(&self) -> Method {
        Method::GET
    }

    fn endpoint(&self) -> Cow<'static, str> {
        format!("groups/{}/projects", self.group).into()
    }

    fn parameters(&self) -> QueryParams {
        let mut params = QueryParams::default();
        params.push("per_page", PER_PAGE).push("page", self.page);
        params
    }
}

/// Where groups and projects come from.
pub trait GitlabSource {
    fn groups_page(&self, page: u64) -> Result<Vec<Group>, MirrorError>;

    fn projects_page(&self, group: GroupId, page: u64) -> Result<Vec<Project>, MirrorError>;

    fn groups(&self) -> impl Iterator<Item = Result<Vec<Group>, MirrorError>> + '_ {
        Pages::new(move |page| self.groups_page(page))
    }

    fn projects(
        &self,
        group: GroupId,
    ) -> impl Iterator<Item = Result<Vec<Project>, MirrorError>> + '_ {
        Pages::new(move |page| self.projects_page(group, page))
    }

    fn list_groups(&self) -> Result<Vec<Group>, MirrorError> {
        collect_pages(self.groups())
    }

    fn list_projects(&self, group: GroupId) -> Result<Vec<Project>, MirrorError> {
        collect_pages(self.projects(group))
    }
}

/// Lazily fetches pages starting at page 1.
///
/// Yields every non-empty page, then stops at the first empty one. After an
/// error nothing more is requested.
pub struct Pages<T, E, F> {
    fetch: F,
    next_page: u64,
    done: bool,
    _item: PhantomData<fn() -> Result<T, E>>,
}

impl<T, E, F> Pages<T, E, F>
where
    F: FnMut(u64) -> Result<Vec<T>, E>,
{
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            next_page: 1,
            done: false,
            _item: PhantomData,
        }
    }
}

impl<T, E, F> Iterator for Pages<T, E, F>
where
    F: FnMut(u64) -> Result<Vec<T>, E>,
{
    type Item = Result<Vec<T>, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match (self.fetch)(self.next_page) {
            Ok(items) if items.is_empty() => {
                self.done = true;
                None
            }
            Ok(items) => {
                self.next_page += 1;
                Some(Ok(items))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<T, E, F> std::iter::FusedIterator for Pages<T, E, F> where
    F: FnMut(u64) -> Result<Vec<T>, E>
{
}

/// Drains `pages` into one list, failing on the first error.
pub fn collect_pages<T, E>(
    pages: impl Iterator<Item = Result<Vec<T>, E>>,
) -> Result<Vec<T>, E> {
    let mut all = Vec::new();
    for page in pages {
        all.extend(page?);
    }
    Ok(all)
}

/// [`GitlabSource`] backed by a live GitLab instance.
pub struct GitlabApi {
    client: Gitlab,
}

impl GitlabApi {
    pub fn connect(config: &MirrorConfig) -> Result<Self, MirrorError> {
        let client = if config.insecure {
            Gitlab::new_insecure(&config.host, &config.token)?
        } else {
            Gitlab::new(&config.host, &config.token)?
        };
        log::info!("Connected to Gitlab at {}", config.host);
        Ok(Self { client })
    }
}

impl GitlabSource for GitlabApi {
    fn groups_page(&self, page: u64) -> Result<Vec<Group>, MirrorError> {
        log::debug!("Requesting groups page {page}");
        let groups: Vec<Group> = GroupsPage { page }.query(&self.client)?;
        Ok(groups)
    }

    fn projects_page(&self, group: GroupId, page: u64) -> Result<Vec<Project>, MirrorError> {
        log::debug!("Requesting projects page {page} of group {group}");
        let projects: Vec<Project> = GroupProjectsPage { group, page }.query(&self.client)?;
        Ok(projects)
    }
}
