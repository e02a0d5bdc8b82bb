use gitlab::GroupId;
use serde::{Deserialize, Serialize};

/// The subset of a GitLab group needed to lay out the mirror tree.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// The ID of the group.
    pub id: GroupId,
    /// The name of the group.
    pub name: String,
    /// The ID of the parent group, `None` for root groups.
    pub parent_id: Option<GroupId>,
}

impl Group {
    /// Directory segment used for this group on disk.
    pub fn dir_name(&self) -> String {
        sanitize(&self.name)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Replaces every path separator in `name` with an underscore.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if std::path::is_separator(c) { '_' } else { c })
        .collect()
}
