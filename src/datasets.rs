use regex::Regex;
use tracing::debug;

use crate::domain::{AbundanceEntry, Dataset, MalformedLine};
use crate::error::TissuegraphError;

/// Outcome of parsing one abundance dataset file. Short body lines are
/// skipped with a count so the loss is observable; numeric parse failures
/// are collected as malformed lines.
#[derive(Debug)]
pub struct DatasetParse {
    pub dataset: Dataset,
    pub skipped_short: usize,
    pub malformed: Vec<MalformedLine>,
}

/// Parses one abundance dataset file: a maximal contiguous prefix of
/// `#`-prefixed header lines, then tab-separated body records
/// `internal id \t external id \t value`. The header must carry an
/// `organ: <UPPER_SNAKE>` directive; `origin` names the file in errors.
pub fn parse_dataset(contents: &str, origin: &str) -> Result<DatasetParse, TissuegraphError> {
    let organ_re = Regex::new(r"organ:\s+([A-Z_]+)").unwrap();
    let lines: Vec<&str> = contents.lines().collect();

    let mut organ = None;
    let mut body_start = lines.len();
    for (idx, line) in lines.iter().enumerate() {
        if !line.starts_with('#') {
            body_start = idx;
            break;
        }
        if let Some(caps) = organ_re.captures(line) {
            organ = Some(caps[1].to_string());
        }
    }
    let Some(organ) = organ else {
        return Err(TissuegraphError::MissingOrgan(origin.to_string()));
    };

    let mut abundances = Vec::new();
    let mut skipped_short = 0usize;
    let mut malformed = Vec::new();
    for (offset, raw) in lines[body_start..].iter().enumerate() {
        let line_no = body_start + offset + 1;
        let fields: Vec<&str> = raw.trim().split('\t').collect();
        if fields.len() < 2 {
            skipped_short += 1;
            continue;
        }

        let iid = match fields[0].parse::<i64>() {
            Ok(value) => value,
            Err(_) => {
                malformed.push(MalformedLine {
                    line: line_no,
                    reason: format!("internal id is not an integer: {:?}", fields[0]),
                });
                continue;
            }
        };
        let value = match fields.get(2) {
            Some(field) => match field.parse::<f64>() {
                Ok(value) => value,
                Err(_) => {
                    malformed.push(MalformedLine {
                        line: line_no,
                        reason: format!("abundance value is not a number: {:?}", field),
                    });
                    continue;
                }
            },
            None => 0.0,
        };

        abundances.push(AbundanceEntry {
            iid,
            eid: fields[1].to_string(),
            value,
        });
    }

    debug!(
        origin,
        organ,
        records = abundances.len(),
        skipped = skipped_short,
        malformed = malformed.len(),
        "parsed abundance dataset"
    );
    Ok(DatasetParse {
        dataset: Dataset { organ, abundances },
        skipped_short,
        malformed,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_header_and_body() {
        let parse =
            parse_dataset("#organ: LIVER\n1\tP001\t3.5\n2\tP002\t7.0\n", "liver.txt").unwrap();
        assert_eq!(parse.dataset.organ, "LIVER");
        assert_eq!(parse.dataset.count(), 2);
        assert_eq!(parse.dataset.abundances[0].eid, "P001");
        assert_eq!(parse.dataset.abundances[0].value, 3.5);
        assert_eq!(parse.dataset.abundances[1].value, 7.0);
        assert_eq!(parse.skipped_short, 0);
        assert!(parse.malformed.is_empty());
    }

    #[test]
    fn organ_directive_may_follow_other_header_lines() {
        let text = "# abundance export\n# organ: CELL_LINE\n#score: 0.9\n1\tP001\t2.0\n";
        let parse = parse_dataset(text, "cells.txt").unwrap();
        assert_eq!(parse.dataset.organ, "CELL_LINE");
        assert_eq!(parse.dataset.count(), 1);
    }

    #[test]
    fn missing_organ_is_an_error() {
        let err = parse_dataset("# no directive here\n1\tP001\t3.5\n", "x.txt").unwrap_err();
        assert_matches!(err, TissuegraphError::MissingOrgan(origin) if origin == "x.txt");
    }

    #[test]
    fn organ_outside_header_prefix_does_not_count() {
        // Once a non-header line is seen the header is over; a later
        // `#organ:` line is a body line (and a short one, so skipped).
        let err = parse_dataset("1\tP001\t3.5\n# organ: LIVER\n", "x.txt").unwrap_err();
        assert_matches!(err, TissuegraphError::MissingOrgan(_));
    }

    #[test]
    fn short_body_lines_are_skipped_and_counted() {
        let text = "# organ: LIVER\n1\tP001\t3.5\nnoise\n2\tP002\t7.0\n\n";
        let parse = parse_dataset(text, "liver.txt").unwrap();
        assert_eq!(parse.dataset.count(), 2);
        assert_eq!(parse.skipped_short, 2);
    }

    #[test]
    fn missing_value_field_defaults_to_zero() {
        let parse = parse_dataset("# organ: LIVER\n1\tP001\n", "liver.txt").unwrap();
        assert_eq!(parse.dataset.count(), 1);
        assert_eq!(parse.dataset.abundances[0].value, 0.0);
    }

    #[test]
    fn non_numeric_fields_are_malformed_not_records() {
        let text = "# organ: LIVER\nx\tP001\t3.5\n2\tP002\thigh\n3\tP003\t1.0\n";
        let parse = parse_dataset(text, "liver.txt").unwrap();
        assert_eq!(parse.dataset.count(), 1);
        assert_eq!(parse.dataset.abundances[0].eid, "P003");
        assert_eq!(parse.malformed.len(), 2);
        assert_eq!(parse.malformed[0].line, 2);
        assert_eq!(parse.malformed[1].line, 3);
    }

    #[test]
    fn header_only_file_has_empty_body() {
        let parse = parse_dataset("# organ: LIVER\n", "liver.txt").unwrap();
        assert_eq!(parse.dataset.count(), 0);
        assert_eq!(parse.skipped_short, 0);
    }
}
