use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::{AbundanceIndex, ProteinRecord, RelationshipType, TissueAbundance};
use crate::error::TissuegraphError;

pub const PROTEIN_LABEL: &str = "Protein";
pub const ABUNDANCE_LABEL: &str = "Abundance";

/// Handle to a node created earlier in the same batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef(pub(crate) usize);

#[derive(Debug, Clone, PartialEq)]
pub enum BatchOp {
    CreateNode {
        properties: Map<String, Value>,
    },
    AddLabel {
        node: NodeRef,
        label: String,
    },
    CreateRelationship {
        from: NodeRef,
        rel_type: RelationshipType,
        to: NodeRef,
    },
}

/// The pending operations of one import run, submitted to the store as a
/// single atomic unit. Built fresh per run and discarded after commit.
#[derive(Debug, Default)]
pub struct GraphBatch {
    ops: Vec<BatchOp>,
}

impl GraphBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_node(&mut self, properties: Map<String, Value>) -> NodeRef {
        let node = NodeRef(self.ops.len());
        self.ops.push(BatchOp::CreateNode { properties });
        node
    }

    pub fn add_label(&mut self, node: NodeRef, label: &str) {
        self.ops.push(BatchOp::AddLabel {
            node,
            label: label.to_string(),
        });
    }

    pub fn relate(&mut self, from: NodeRef, rel_type: RelationshipType, to: NodeRef) {
        self.ops.push(BatchOp::CreateRelationship { from, rel_type, to });
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for op in &self.ops {
            match op {
                BatchOp::CreateNode { .. } => summary.nodes += 1,
                BatchOp::AddLabel { .. } => summary.labels += 1,
                BatchOp::CreateRelationship { .. } => summary.relationships += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub nodes: usize,
    pub labels: usize,
    pub relationships: usize,
}

/// Builds the batch for one run: a labeled node per protein, and for every
/// aggregated abundance of that protein a labeled abundance node plus a
/// relationship typed by the tissue the abundance was measured in. Tissue
/// strings are validated before they become relationship types.
pub fn build(
    proteins: &[ProteinRecord],
    abundances: &AbundanceIndex,
) -> Result<GraphBatch, TissuegraphError> {
    let mut batch = GraphBatch::new();

    for protein in proteins {
        let node = batch.create_node(protein_properties(protein));
        batch.add_label(node, PROTEIN_LABEL);

        let Some(entries) = abundances.get(&protein.eid) else {
            continue;
        };
        for entry in entries {
            let rel_type: RelationshipType = entry.tissue.parse()?;
            let abundance = batch.create_node(abundance_properties(entry));
            batch.add_label(abundance, ABUNDANCE_LABEL);
            batch.relate(node, rel_type, abundance);
        }
    }

    Ok(batch)
}

fn protein_properties(protein: &ProteinRecord) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("iid".to_string(), Value::from(protein.iid));
    properties.insert("eid".to_string(), Value::from(protein.eid.clone()));
    properties.insert("name".to_string(), Value::from(protein.name.clone()));
    properties
}

fn abundance_properties(entry: &TissueAbundance) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert("value".to_string(), Value::from(entry.value));
    properties.insert("rank".to_string(), Value::from(entry.rank.clone()));
    properties
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn protein(iid: i64, eid: &str, name: &str) -> ProteinRecord {
        ProteinRecord {
            iid,
            eid: eid.to_string(),
            name: name.to_string(),
        }
    }

    fn abundance(tissue: &str, value: f64, rank: &str) -> TissueAbundance {
        TissueAbundance {
            tissue: tissue.to_string(),
            value,
            rank: rank.to_string(),
        }
    }

    #[test]
    fn protein_without_abundances_gets_node_and_label_only() {
        let batch = build(&[protein(1, "P001", "Alpha")], &AbundanceIndex::default()).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(
            batch.summary(),
            BatchSummary {
                nodes: 1,
                labels: 1,
                relationships: 0,
            }
        );
        assert_matches!(&batch.ops()[1], BatchOp::AddLabel { label, .. } if label == PROTEIN_LABEL);
    }

    #[test]
    fn abundances_become_labeled_nodes_and_typed_relationships() {
        let mut index = AbundanceIndex::default();
        index.append("P001", abundance("LIVER", 3.5, "1/2"));
        index.append("P001", abundance("KIDNEY", 1.25, "1/1"));

        let batch = build(&[protein(1, "P001", "Alpha")], &index).unwrap();

        assert_eq!(
            batch.summary(),
            BatchSummary {
                nodes: 3,
                labels: 3,
                relationships: 2,
            }
        );
        let protein_node = NodeRef(0);
        assert_matches!(
            &batch.ops()[4],
            BatchOp::CreateRelationship { from, rel_type, to }
                if *from == protein_node && rel_type.as_str() == "LIVER" && *to == NodeRef(2)
        );
        assert_matches!(
            &batch.ops()[7],
            BatchOp::CreateRelationship { from, rel_type, to }
                if *from == protein_node && rel_type.as_str() == "KIDNEY" && *to == NodeRef(5)
        );
    }

    #[test]
    fn abundances_of_unknown_proteins_are_not_imported() {
        let mut index = AbundanceIndex::default();
        index.append("P999", abundance("LIVER", 3.5, "1/1"));

        let batch = build(&[protein(1, "P001", "Alpha")], &index).unwrap();
        assert_eq!(batch.summary().relationships, 0);
        assert_eq!(batch.summary().nodes, 1);
    }

    #[test]
    fn unsafe_tissue_string_is_a_build_error() {
        let mut index = AbundanceIndex::default();
        index.append("P001", abundance("LIVER LOBE", 3.5, "1/1"));

        let err = build(&[protein(1, "P001", "Alpha")], &index).unwrap_err();
        assert_matches!(err, TissuegraphError::UnsafeRelationshipType(value) if value == "LIVER LOBE");
    }

    #[test]
    fn protein_properties_carry_all_fields() {
        let properties = protein_properties(&protein(7, "P007", "Gamma"));
        assert_eq!(properties["iid"], Value::from(7));
        assert_eq!(properties["eid"], Value::from("P007"));
        assert_eq!(properties["name"], Value::from("Gamma"));
    }
}
