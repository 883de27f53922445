use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::SpeciesId;
use crate::error::TissuegraphError;
use crate::fs_util;
use crate::neo4j::GraphAuth;

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub server_url: String,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    #[serde(default)]
    pub species_id: Option<String>,
    pub protein_file_path: String,
    pub abundances_directory: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Credentials {
    pub user: String,
    pub pass: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub server_url: String,
    pub auth: Option<GraphAuth>,
    pub species: SpeciesId,
    pub protein_file: Utf8PathBuf,
    pub abundances_dir: Utf8PathBuf,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, TissuegraphError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("tissuegraph.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Err(TissuegraphError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| TissuegraphError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| TissuegraphError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, TissuegraphError> {
        let protein_file = Utf8PathBuf::from(config.protein_file_path);

        // An explicit speciesId wins; otherwise it is derived from the
        // protein file name.
        let species = match config.species_id {
            Some(value) => value.parse()?,
            None => fs_util::species_from_protein_path(&protein_file)?,
        };

        let auth = config.credentials.map(|credentials| GraphAuth {
            user: credentials.user,
            pass: credentials.pass,
        });

        Ok(ResolvedConfig {
            server_url: config.server_url,
            auth,
            species,
            protein_file,
            abundances_dir: Utf8PathBuf::from(config.abundances_directory),
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn base_config() -> Config {
        Config {
            server_url: "http://localhost:7474".to_string(),
            credentials: None,
            species_id: None,
            protein_file_path: "data/proteins/10090-proteins.txt".to_string(),
            abundances_directory: "data/abundances".to_string(),
        }
    }

    #[test]
    fn species_is_derived_from_protein_file_name() {
        let resolved = ConfigLoader::resolve_config(base_config()).unwrap();
        assert_eq!(resolved.species.as_str(), "10090");
        assert!(resolved.auth.is_none());
    }

    #[test]
    fn explicit_species_wins_over_file_name() {
        let config = Config {
            species_id: Some("9606".to_string()),
            ..base_config()
        };
        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.species.as_str(), "9606");
    }

    #[test]
    fn underivable_species_is_an_error() {
        let config = Config {
            protein_file_path: "data/proteins/mouse.txt".to_string(),
            ..base_config()
        };
        let err = ConfigLoader::resolve_config(config).unwrap_err();
        assert_matches!(err, TissuegraphError::InvalidSpeciesId(_));
    }

    #[test]
    fn credentials_become_graph_auth() {
        let config = Config {
            credentials: Some(Credentials {
                user: "neo4j".to_string(),
                pass: "secret".to_string(),
            }),
            ..base_config()
        };
        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.auth.as_ref().unwrap().user, "neo4j");
    }

    #[test]
    fn config_json_uses_camel_case_keys() {
        let config: Config = serde_json::from_str(
            r#"{
                "serverUrl": "http://localhost:7474",
                "credentials": { "user": "neo4j", "pass": "neo4j" },
                "proteinFilePath": "data/proteins/10090-proteins.txt",
                "abundancesDirectory": "data/abundances"
            }"#,
        )
        .unwrap();
        assert_eq!(config.server_url, "http://localhost:7474");
        assert_eq!(config.abundances_directory, "data/abundances");
        assert_eq!(config.credentials.unwrap().user, "neo4j");
    }
}
