use super::model::{
    DistributionMode, GroupBody, ReportGroup, ReportPath, ReportResponse, ReportTotals,
};
use super::selection::{recompute, Recomputation, SelectionSet};

/// A tree restricted to a selection, ready for export sinks
#[derive(Debug, Clone, PartialEq)]
pub struct PrunedTree {
    pub groups: Vec<ReportGroup>,
    pub total: ReportTotals,
}

/// Copy of `tree` holding only selected leaves. Groups left without any surviving
/// descendant are dropped and every subtotal is the recomputed, filtered one.
pub fn prune(tree: &[ReportGroup], selection: &SelectionSet, mode: DistributionMode) -> PrunedTree {
    let recomputed = recompute(tree, selection, mode);
    let root = ReportPath::root();
    let groups = tree
        .iter()
        .enumerate()
        .filter_map(|(index, group)| prune_group(group, root.child(index), selection, &recomputed))
        .collect();

    PrunedTree {
        groups,
        total: recomputed.total,
    }
}

fn prune_group(
    group: &ReportGroup,
    path: ReportPath,
    selection: &SelectionSet,
    recomputed: &Recomputation,
) -> Option<ReportGroup> {
    let body = match &group.body {
        GroupBody::Rows { rows } => {
            let rows: Vec<_> = rows
                .iter()
                .filter(|row| selection.contains(&row.id))
                .cloned()
                .collect();
            if rows.is_empty() {
                return None;
            }
            GroupBody::Rows { rows }
        }
        GroupBody::Summary { id, .. } => {
            if !selection.contains(id) {
                return None;
            }
            group.body.clone()
        }
        GroupBody::Subgroups { groups } => {
            let groups: Vec<_> = groups
                .iter()
                .enumerate()
                .filter_map(|(index, child)| {
                    prune_group(child, path.child(index), selection, recomputed)
                })
                .collect();
            if groups.is_empty() {
                return None;
            }
            GroupBody::Subgroups { groups }
        }
    };

    Some(ReportGroup {
        key: group.key.clone(),
        label: group.label.clone(),
        value: group.value.clone(),
        body,
        subtotal: recomputed.subtotal(&path),
    })
}

impl ReportResponse {
    /// Self-contained copy of this report restricted to `selection`
    pub fn select(&self, selection: &SelectionSet) -> ReportResponse {
        let pruned = prune(&self.groups, selection, self.distribution);
        ReportResponse {
            groups: pruned.groups,
            total: pruned.total,
            ..self.clone()
        }
    }
}
