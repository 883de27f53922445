use tracing::debug;

use crate::domain::{MalformedLine, ProteinRecord};

/// Outcome of parsing one protein list file. Malformed lines are collected
/// rather than aborting the parse; the importer decides whether they are
/// fatal.
#[derive(Debug, Default)]
pub struct ProteinParse {
    pub records: Vec<ProteinRecord>,
    pub malformed: Vec<MalformedLine>,
}

/// Parses a protein list: one record per line, tab-separated
/// `internal id \t external id \t name`. Lines that are empty after
/// trimming are skipped.
pub fn parse_proteins(contents: &str) -> ProteinParse {
    let mut parse = ProteinParse::default();

    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            parse.malformed.push(MalformedLine {
                line: idx + 1,
                reason: format!("expected 3 tab-separated fields, got {}", fields.len()),
            });
            continue;
        }

        let iid = match fields[0].parse::<i64>() {
            Ok(value) => value,
            Err(_) => {
                parse.malformed.push(MalformedLine {
                    line: idx + 1,
                    reason: format!("internal id is not an integer: {:?}", fields[0]),
                });
                continue;
            }
        };

        parse.records.push(ProteinRecord {
            iid,
            eid: fields[1].to_string(),
            name: fields[2].to_string(),
        });
    }

    debug!(
        records = parse.records.len(),
        malformed = parse.malformed.len(),
        "parsed protein list"
    );
    parse
}
