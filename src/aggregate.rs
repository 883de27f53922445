use tracing::debug;

use crate::domain::{AbundanceIndex, Dataset, TissueAbundance};

/// Merges parsed datasets into one index keyed by external protein id.
///
/// The order of `datasets` is a contract: the caller must supply them in a
/// deterministic order (the importer sorts files lexically by name) so the
/// per-protein entry order is reproducible across runs. Ranks are local to
/// the dataset an entry came from and are never renumbered.
pub fn aggregate(datasets: &[Dataset]) -> AbundanceIndex {
    let mut index = AbundanceIndex::default();

    for dataset in datasets {
        let total = dataset.count();
        for (pos, entry) in dataset.abundances.iter().enumerate() {
            index.append(
                &entry.eid,
                TissueAbundance {
                    tissue: dataset.organ.clone(),
                    value: entry.value,
                    rank: format!("{}/{}", pos + 1, total),
                },
            );
        }
    }

    debug!(
        datasets = datasets.len(),
        proteins = index.len(),
        entries = index.total_entries(),
        "aggregated abundance datasets"
    );
    index
}
