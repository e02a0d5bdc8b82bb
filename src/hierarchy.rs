use gitlab::GroupId;

use crate::error::ParentNotFound;
use crate::gitlab_group::Group;

/// Splits `groups` into roots and subgroups, keeping listing order.
pub fn partition(groups: &[Group]) -> (Vec<&Group>, Vec<&Group>) {
    groups.iter().partition(|group| group.is_root())
}

pub fn find_group(groups: &[Group], id: GroupId) -> Option<&Group> {
    groups.iter().find(|group| group.id == id)
}

/// Directory segment of the group with ID `parent_id`.
///
/// Only the parent's own name is returned, not its full ancestry, so a
/// subgroup whose parent is itself a subgroup ends up one level too high.
pub fn resolve_parent_dir(
    parent_id: GroupId,
    groups: &[Group],
) -> Result<(String, &Group), ParentNotFound> {
    let parent = find_group(groups, parent_id).ok_or(ParentNotFound { parent_id })?;
    Ok((parent.dir_name(), parent))
}
