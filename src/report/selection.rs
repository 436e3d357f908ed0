use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::model::{
    DistributionMode, GroupBody, LeafId, ReportGroup, ReportPath, ReportRow, ReportTotals,
};
use super::totals::aggregate;

/// Every selectable leaf id of a tree, in tree order
pub fn leaf_ids(tree: &[ReportGroup]) -> Vec<LeafId> {
    let mut ids = Vec::new();
    for group in tree {
        collect_leaf_ids(group, &mut ids);
    }
    ids
}

fn collect_leaf_ids(group: &ReportGroup, ids: &mut Vec<LeafId>) {
    match &group.body {
        GroupBody::Subgroups { groups } => {
            for child in groups {
                collect_leaf_ids(child, ids);
            }
        }
        GroupBody::Rows { rows } => ids.extend(rows.iter().map(|row| row.id.clone())),
        GroupBody::Summary { id, .. } => ids.push(id.clone()),
    }
}

/// Leaf ids currently included in the view or export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: HashSet<LeafId>,
}

impl SelectionSet {
    /// Everything selected; the state of a freshly generated report
    pub fn all(tree: &[ReportGroup]) -> Self {
        Self {
            ids: leaf_ids(tree).into_iter().collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &LeafId) -> bool {
        self.ids.contains(id)
    }

    pub fn include(&mut self, id: LeafId) {
        self.ids.insert(id);
    }

    pub fn exclude(&mut self, id: &LeafId) {
        self.ids.remove(id);
    }

    /// Flip one id; returns whether it is now selected
    pub fn toggle(&mut self, id: LeafId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Drop ids that no longer exist in `tree`
    pub fn retain_known(&mut self, tree: &[ReportGroup]) {
        let known: HashSet<LeafId> = leaf_ids(tree).into_iter().collect();
        let before = self.ids.len();
        self.ids.retain(|id| known.contains(id));
        if self.ids.len() != before {
            debug!(dropped = before - self.ids.len(), "ignoring stale selection ids");
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LeafId> {
        self.ids.iter()
    }
}

impl FromIterator<LeafId> for SelectionSet {
    fn from_iter<T: IntoIterator<Item = LeafId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

/// Subtotals of a tree restricted to a selection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recomputation {
    pub subtotal_by_path: HashMap<ReportPath, ReportTotals>,
    pub total: ReportTotals,
}

impl Recomputation {
    /// Filtered subtotal at `path`; zero for unknown paths
    pub fn subtotal(&self, path: &ReportPath) -> ReportTotals {
        self.subtotal_by_path
            .get(path)
            .copied()
            .unwrap_or(ReportTotals::ZERO)
    }
}

/// What survives the filter below one node
#[derive(Default)]
struct Surviving<'a> {
    rows: Vec<&'a ReportRow>,
    /// Sum of selected summary-only leaves, whose orders are disjoint by construction
    summaries: ReportTotals,
}

impl<'a> Surviving<'a> {
    fn extend(&mut self, other: Surviving<'a>) {
        self.rows.extend(other.rows);
        self.summaries += other.summaries;
    }

    fn totals(&self, mode: DistributionMode) -> ReportTotals {
        aggregate(self.rows.iter().copied(), mode) + self.summaries
    }
}

/// Recompute every node's subtotal and the grand total for a selection.
///
/// Internal nodes aggregate the concatenated surviving rows of their descendants, and the
/// grand total aggregates all surviving rows at once, so an order split across groups has
/// its freight counted a single time. The input tree is not modified.
pub fn recompute(
    tree: &[ReportGroup],
    selection: &SelectionSet,
    mode: DistributionMode,
) -> Recomputation {
    let mut subtotal_by_path = HashMap::new();
    let mut everything = Surviving::default();
    let root = ReportPath::root();

    for (index, group) in tree.iter().enumerate() {
        let surviving = visit(group, root.child(index), selection, mode, &mut subtotal_by_path);
        everything.extend(surviving);
    }

    Recomputation {
        subtotal_by_path,
        total: everything.totals(mode),
    }
}

fn visit<'a>(
    group: &'a ReportGroup,
    path: ReportPath,
    selection: &SelectionSet,
    mode: DistributionMode,
    out: &mut HashMap<ReportPath, ReportTotals>,
) -> Surviving<'a> {
    let mut surviving = Surviving::default();
    match &group.body {
        GroupBody::Rows { rows } => {
            surviving.rows = rows
                .iter()
                .filter(|row| selection.contains(&row.id))
                .collect();
        }
        GroupBody::Summary { id, .. } => {
            if selection.contains(id) {
                surviving.summaries = group.subtotal;
            }
        }
        GroupBody::Subgroups { groups } => {
            for (index, child) in groups.iter().enumerate() {
                surviving.extend(visit(child, path.child(index), selection, mode, out));
            }
        }
    }
    out.insert(path, surviving.totals(mode));
    surviving
}
