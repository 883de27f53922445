use std::fmt;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::aggregate;
use crate::batch::{self, BatchSummary, PROTEIN_LABEL};
use crate::config::ResolvedConfig;
use crate::datasets;
use crate::error::TissuegraphError;
use crate::fs_util;
use crate::neo4j::{CommitSummary, GraphStore};
use crate::proteins;

/// Property the uniqueness index is kept on. It is what makes re-running the
/// import against the same store safe.
pub const PROTEIN_INDEX_PROPERTY: &str = "iid";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Init,
    IndexEnsured,
    Parsed,
    Aggregated,
    BatchBuilt,
    Committed,
    Failed,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportStage::Init => "init",
            ImportStage::IndexEnsured => "index_ensured",
            ImportStage::Parsed => "parsed",
            ImportStage::Aggregated => "aggregated",
            ImportStage::BatchBuilt => "batch_built",
            ImportStage::Committed => "committed",
            ImportStage::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Treat any malformed input line as fatal instead of skip-and-count.
    pub strict: bool,
    /// Parse, aggregate and build without touching the graph store.
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetReport {
    pub file: String,
    pub organ: String,
    pub records: usize,
    pub skipped_short: usize,
    pub malformed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub species: String,
    pub proteins: usize,
    pub malformed_proteins: usize,
    pub datasets: Vec<DatasetReport>,
    pub abundance_entries: usize,
    pub batch: BatchSummary,
    pub committed: bool,
    pub commit: Option<CommitSummary>,
    pub started_at: String,
    pub finished_at: String,
}

/// Runs the whole pipeline: ensure index, parse the protein list, parse the
/// abundance datasets in sorted file order, aggregate, build the batch and
/// commit it as one transaction. Stops at the first fatal error; nothing is
/// retried internally.
pub struct Importer<G: GraphStore> {
    store: G,
    config: ResolvedConfig,
    options: ImportOptions,
}

impl<G: GraphStore> Importer<G> {
    pub fn new(store: G, config: ResolvedConfig, options: ImportOptions) -> Self {
        Self {
            store,
            config,
            options,
        }
    }

    pub fn run(&self) -> Result<ImportReport, TissuegraphError> {
        match self.run_pipeline() {
            Ok(report) => Ok(report),
            Err(err) => {
                error!(stage = %ImportStage::Failed, cause = %err, "import failed");
                Err(err)
            }
        }
    }

    fn run_pipeline(&self) -> Result<ImportReport, TissuegraphError> {
        let started_at = iso_timestamp();
        let mut stage = ImportStage::Init;
        debug!(stage = %stage, species = %self.config.species, "starting import run");

        // The index gates everything else: without it a re-run would
        // silently duplicate protein nodes, so no file is read before the
        // store confirms it.
        if self.options.dry_run {
            debug!("dry run, skipping index creation");
        } else {
            self.store
                .ensure_unique_index(PROTEIN_LABEL, PROTEIN_INDEX_PROPERTY)?;
            stage = ImportStage::IndexEnsured;
            info!(
                stage = %stage,
                label = PROTEIN_LABEL,
                property = PROTEIN_INDEX_PROPERTY,
                "uniqueness index ensured"
            );
        }

        let text = fs_util::read_text(&self.config.protein_file)?;
        let protein_parse = proteins::parse_proteins(&text);
        if self.options.strict && !protein_parse.malformed.is_empty() {
            return Err(TissuegraphError::MalformedRecords {
                path: self.config.protein_file.to_string(),
                count: protein_parse.malformed.len(),
            });
        }

        let files = fs_util::discover_datasets(&self.config.abundances_dir, &self.config.species)?;
        let mut parsed_datasets = Vec::with_capacity(files.len());
        let mut dataset_reports = Vec::with_capacity(files.len());
        for file in &files {
            let text = fs_util::read_text(file)?;
            let parsed = datasets::parse_dataset(&text, file.as_str())?;
            if self.options.strict && !parsed.malformed.is_empty() {
                return Err(TissuegraphError::MalformedRecords {
                    path: file.to_string(),
                    count: parsed.malformed.len(),
                });
            }
            dataset_reports.push(DatasetReport {
                file: file.to_string(),
                organ: parsed.dataset.organ.clone(),
                records: parsed.dataset.count(),
                skipped_short: parsed.skipped_short,
                malformed: parsed.malformed.len(),
            });
            parsed_datasets.push(parsed.dataset);
        }
        stage = ImportStage::Parsed;
        info!(
            stage = %stage,
            proteins = protein_parse.records.len(),
            malformed = protein_parse.malformed.len(),
            datasets = parsed_datasets.len(),
            "input files parsed"
        );

        let index = aggregate::aggregate(&parsed_datasets);
        stage = ImportStage::Aggregated;
        info!(stage = %stage, entries = index.total_entries(), "abundances aggregated");

        let graph_batch = batch::build(&protein_parse.records, &index)?;
        stage = ImportStage::BatchBuilt;
        info!(stage = %stage, operations = graph_batch.len(), "graph batch built");

        let commit = if self.options.dry_run {
            debug!("dry run, skipping commit");
            None
        } else {
            let summary = self.store.commit(&graph_batch)?;
            stage = ImportStage::Committed;
            info!(stage = %stage, operations = summary.operations, "batch committed");
            Some(summary)
        };

        Ok(ImportReport {
            species: self.config.species.to_string(),
            proteins: protein_parse.records.len(),
            malformed_proteins: protein_parse.malformed.len(),
            datasets: dataset_reports,
            abundance_entries: index.total_entries(),
            batch: graph_batch.summary(),
            committed: commit.is_some(),
            commit,
            started_at,
            finished_at: iso_timestamp(),
        })
    }
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
