use std::collections::HashSet;

use tws_types::{AvailableRange, PackageId};

/// Delta planner: computes which package ids still have to be fetched.
///
/// Pure and synchronous, no I/O.
pub struct DeltaPlanner;

impl DeltaPlanner {
    /// Ids in `available` at or after `earliest` that are not cached.
    ///
    /// Input order is preserved, so ascending input yields ascending output.
    pub fn plan(
        available: impl IntoIterator<Item = PackageId>,
        earliest: PackageId,
        cached: &HashSet<PackageId>,
    ) -> Vec<PackageId> {
        available
            .into_iter()
            .filter(|id| *id >= earliest && !cached.contains(id))
            .collect()
    }

    /// Plan against the server's advertised range.
    pub fn plan_range(
        range: &AvailableRange,
        earliest: PackageId,
        cached: &HashSet<PackageId>,
    ) -> Vec<PackageId> {
        Self::plan(range.ids_from(earliest), earliest, cached)
    }
}
