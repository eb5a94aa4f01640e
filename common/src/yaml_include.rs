use std::fs;
use std::path::{Path, PathBuf};
use yaml_rust2::{Yaml, YamlLoader, yaml::Hash};

const INCLUDE_DIRECTIVE: &str = "!include";
const MAX_INCLUDE_DEPTH: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum IncludeError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: yaml_rust2::ScanError,
    },

    #[error("includes nested deeper than {MAX_INCLUDE_DEPTH} levels at {0}")]
    TooDeep(PathBuf),
}

/// Loads a YAML file, resolving `!include <relative path>` lines first.
///
/// Included documents are merged in order; the including file's own keys
/// override anything they provide. Hashes merge recursively, every other
/// value is replaced.
pub fn load_yaml_with_includes(path: &Path) -> Result<Yaml, IncludeError> {
    load_recursive(path, 0)
}

fn load_recursive(path: &Path, depth: usize) -> Result<Yaml, IncludeError> {
    if depth > MAX_INCLUDE_DEPTH {
        return Err(IncludeError::TooDeep(path.to_path_buf()));
    }

    let contents = fs::read_to_string(path).map_err(|source| IncludeError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let base_path = path.parent().unwrap_or(Path::new(""));

    let (includes, rest): (Vec<&str>, Vec<&str>) = contents
        .lines()
        .partition(|line| line.trim().starts_with(INCLUDE_DIRECTIVE));

    let mut merged = Yaml::Hash(Hash::new());
    for line in includes {
        let include_path = line.trim()[INCLUDE_DIRECTIVE.len()..].trim();
        let included = load_recursive(&base_path.join(include_path), depth + 1)?;
        merged = merge_yaml(&merged, &included);
    }

    let documents =
        YamlLoader::load_from_str(&rest.join("\n")).map_err(|source| IncludeError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(documents
        .iter()
        .fold(merged, |acc, document| merge_yaml(&acc, document)))
}

fn merge_yaml(base: &Yaml, override_yaml: &Yaml) -> Yaml {
    match (base, override_yaml) {
        (Yaml::Hash(base_hash), Yaml::Hash(override_hash)) => {
            let mut result = base_hash.clone();
            for (key, value) in override_hash {
                let merged = match base_hash.get(key) {
                    Some(base_value) => merge_yaml(base_value, value),
                    None => value.clone(),
                };
                result.insert(key.clone(), merged);
            }
            Yaml::Hash(result)
        }
        (_, Yaml::Null) | (_, Yaml::BadValue) => base.clone(),
        (_, override_value) => override_value.clone(),
    }
}
