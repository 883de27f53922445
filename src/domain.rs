use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::TissuegraphError;

/// Numeric species identifier shared by the protein list file and every
/// abundance dataset file of one import run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SpeciesId(String);

impl SpeciesId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SpeciesId {
    type Err = TissuegraphError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        let is_valid =
            !normalized.is_empty() && normalized.chars().all(|ch| ch.is_ascii_digit());
        if !is_valid {
            return Err(TissuegraphError::InvalidSpeciesId(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// Relationship type accepted by the graph store. Organ strings come from
/// free-text dataset headers, so anything that is not a plain identifier is
/// rejected instead of being handed to the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RelationshipType(String);

impl RelationshipType {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RelationshipType {
    type Err = TissuegraphError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let mut chars = value.chars();
        let is_valid = match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {
                chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
            }
            _ => false,
        };
        if !is_valid {
            return Err(TissuegraphError::UnsafeRelationshipType(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }
}

/// One line of the protein list file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProteinRecord {
    pub iid: i64,
    pub eid: String,
    pub name: String,
}

/// One body line of one abundance dataset file.
#[derive(Debug, Clone, PartialEq)]
pub struct AbundanceEntry {
    pub iid: i64,
    pub eid: String,
    pub value: f64,
}

/// A parsed abundance dataset file: the organ it was measured in plus its
/// records in body-line order.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub organ: String,
    pub abundances: Vec<AbundanceEntry>,
}

impl Dataset {
    pub fn count(&self) -> usize {
        self.abundances.len()
    }
}

/// One aggregated abundance observation attached to a protein: the tissue it
/// came from and its dataset-local rank.
#[derive(Debug, Clone, PartialEq)]
pub struct TissueAbundance {
    pub tissue: String,
    pub value: f64,
    pub rank: String,
}

/// External protein id to its abundance observations, in dataset order and
/// body-line order within each dataset.
#[derive(Debug, Default)]
pub struct AbundanceIndex {
    by_eid: HashMap<String, Vec<TissueAbundance>>,
}

impl AbundanceIndex {
    pub fn append(&mut self, eid: &str, entry: TissueAbundance) {
        self.by_eid.entry(eid.to_string()).or_default().push(entry);
    }

    pub fn get(&self, eid: &str) -> Option<&[TissueAbundance]> {
        self.by_eid.get(eid).map(Vec::as_slice)
    }

    /// Number of distinct external ids with at least one observation.
    pub fn len(&self) -> usize {
        self.by_eid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_eid.is_empty()
    }

    pub fn total_entries(&self) -> usize {
        self.by_eid.values().map(Vec::len).sum()
    }
}

/// One input line a parser could not turn into a record.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedLine {
    pub line: usize,
    pub reason: String,
}
