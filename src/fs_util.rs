use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use tracing::debug;

use crate::domain::SpeciesId;
use crate::error::TissuegraphError;

pub fn read_text(path: &Utf8Path) -> Result<String, TissuegraphError> {
    fs::read_to_string(path.as_std_path()).map_err(|err| TissuegraphError::FileRead {
        path: path.to_string(),
        message: err.to_string(),
    })
}

/// Extracts the species id from a `<speciesId>-proteins.txt` file name.
pub fn species_from_protein_path(path: &Utf8Path) -> Result<SpeciesId, TissuegraphError> {
    let re = Regex::new(r"(\d+)-proteins\.txt$").unwrap();
    path.file_name()
        .and_then(|name| re.captures(name))
        .and_then(|caps| caps[1].parse().ok())
        .ok_or_else(|| TissuegraphError::InvalidSpeciesId(path.to_string()))
}

/// Abundance dataset files for a species: `<speciesId>-<suffix>.txt` inside
/// `dir`, sorted lexically by file name so repeated runs aggregate in the
/// same order. The protein list file name is never a dataset.
pub fn discover_datasets(
    dir: &Utf8Path,
    species: &SpeciesId,
) -> Result<Vec<Utf8PathBuf>, TissuegraphError> {
    let prefix = format!("{}-", species.as_str());
    let proteins_name = format!("{}-proteins.txt", species.as_str());

    let entries = fs::read_dir(dir.as_std_path())
        .map_err(|err| TissuegraphError::Filesystem(format!("read dir {dir}: {err}")))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| TissuegraphError::Filesystem(err.to_string()))?;
        if !entry
            .file_type()
            .map_err(|err| TissuegraphError::Filesystem(err.to_string()))?
            .is_file()
        {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with(&prefix) && name.ends_with(".txt") && name != proteins_name {
            files.push(dir.join(&name));
        }
    }

    files.sort();
    debug!(dir = %dir, count = files.len(), "discovered abundance dataset files");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use camino::Utf8PathBuf;

    use super::*;

    #[test]
    fn species_from_valid_protein_path() {
        let path = Utf8PathBuf::from("data/proteins/10090-proteins.txt");
        let species = species_from_protein_path(&path).unwrap();
        assert_eq!(species.as_str(), "10090");
    }

    #[test]
    fn species_from_non_matching_path_fails() {
        for path in ["data/10090-liver.txt", "proteins.txt", "x-proteins.txt"] {
            let err = species_from_protein_path(Utf8Path::new(path)).unwrap_err();
            assert_matches!(err, TissuegraphError::InvalidSpeciesId(_));
        }
    }

    #[test]
    fn discovery_is_sorted_and_excludes_protein_list() {
        let temp = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        for name in [
            "10090-liver.txt",
            "10090-kidney.txt",
            "10090-proteins.txt",
            "9606-liver.txt",
            "notes.md",
        ] {
            std::fs::write(temp.path().join(name), "x").unwrap();
        }

        let species: SpeciesId = "10090".parse().unwrap();
        let files = discover_datasets(&dir, &species).unwrap();
        let names: Vec<&str> = files.iter().filter_map(|path| path.file_name()).collect();
        assert_eq!(names, vec!["10090-kidney.txt", "10090-liver.txt"]);
    }

    #[test]
    fn discovery_of_missing_dir_is_an_error() {
        let species: SpeciesId = "10090".parse().unwrap();
        let err = discover_datasets(Utf8Path::new("does/not/exist"), &species).unwrap_err();
        assert_matches!(err, TissuegraphError::Filesystem(_));
    }
}
