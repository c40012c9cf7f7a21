//! Input readers and output writers.
//!
//! All inputs are read-only artifacts prepared upstream: the candidate
//! molecule table (TSV with a `smiles` column), the accession/name
//! mapping table, the free-text protein-of-interest list, and two kinds
//! of JSON bundle (hit observations and similarity matrices). Malformed
//! inputs are fatal; a missing or unresolvable protein token is not.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;
use ndarray::Array2;
use serde::Deserialize;

use crate::assemble::MoleculeTable;
use crate::error::{Error, Result};
use crate::similarity::SimilarityMatrix;
use crate::task::TaskEvaluation;

/// Accession/display-name mapping.
///
/// Both the accession and the display name resolve back to the
/// accession, so free-text tokens may use either form.
#[derive(Debug, Clone, Default)]
pub struct NameMap {
    any2pid: HashMap<String, String>,
    pid2name: HashMap<String, String>,
}

impl NameMap {
    /// Build from (accession, display name) pairs.
    pub fn from_pairs<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut map = NameMap::default();
        for (pid, name) in pairs {
            map.any2pid.insert(pid.clone(), pid.clone());
            map.any2pid.insert(name.clone(), pid.clone());
            map.pid2name.insert(pid, name);
        }
        map
    }

    /// Resolve a free-text token (accession or name) to an accession.
    pub fn resolve(&self, token: &str) -> Option<&str> {
        self.any2pid.get(token).map(String::as_str)
    }

    /// Display name for an accession.
    pub fn display_name(&self, pid: &str) -> Option<&str> {
        self.pid2name.get(pid).map(String::as_str)
    }
}

/// Precomputed hit-observation index.
///
/// Maps each protein to its observed hit fragments and hit count, and
/// each fragment to its promiscuity. Loaded once per run as a single
/// JSON bundle; hit-selector implementations draw on it.
#[derive(Debug, Clone, Deserialize)]
pub struct HitsBundle {
    /// Protein accession to observed hit-fragment identifiers.
    pub hits: HashMap<String, Vec<String>>,
    /// Fragment identifier to promiscuity (distinct proteins hit).
    pub fragment_promiscuity: HashMap<String, u32>,
    /// Protein accession to observed hit-fragment count.
    pub protein_hit_counts: HashMap<String, u32>,
}

impl HitsBundle {
    /// Whether the bundle holds hit observations for `pid`.
    pub fn has_protein(&self, pid: &str) -> bool {
        self.protein_hit_counts.contains_key(pid)
    }
}

#[derive(Deserialize)]
struct SimilarityBundle {
    ids: Vec<String>,
    matrix: Vec<Vec<f64>>,
}

/// Read the candidate-molecule TSV; the `smiles` column is required.
pub fn read_molecule_table(path: &Path) -> Result<MoleculeTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .map_err(|e| parse_error(path, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| parse_error(path, e))?
        .iter()
        .map(str::to_string)
        .collect();
    let smiles_idx = headers
        .iter()
        .position(|h| h == "smiles")
        .ok_or_else(|| Error::MissingColumn {
            path: path.to_path_buf(),
            column: "smiles".into(),
        })?;

    let mut rows = Vec::new();
    let mut smiles = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| parse_error(path, e))?;
        let row: Vec<String> = record.iter().map(str::to_string).collect();
        let structure = row.get(smiles_idx).cloned().ok_or_else(|| Error::Parse {
            path: path.to_path_buf(),
            message: format!("row {} is shorter than the header", rows.len() + 2),
        })?;
        smiles.push(structure);
        rows.push(row);
    }

    Ok(MoleculeTable {
        headers,
        rows,
        smiles,
    })
}

/// Read the two-column accession/display-name TSV (no header row).
pub fn read_name_map(path: &Path) -> Result<NameMap> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(path)
        .map_err(|e| parse_error(path, e))?;

    let mut pairs = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| parse_error(path, e))?;
        match (record.get(0), record.get(1)) {
            (Some(pid), Some(name)) => pairs.push((pid.to_string(), name.to_string())),
            _ => {
                return Err(Error::Parse {
                    path: path.to_path_buf(),
                    message: "expected two tab-separated columns".into(),
                })
            }
        }
    }
    Ok(NameMap::from_pairs(pairs))
}

/// Read the free-text protein-of-interest list, one token per line.
/// Blank lines are skipped; tokens are not resolved here.
pub fn read_protein_tokens(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    let mut tokens = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| io_error(path, e))?;
        let token = line.trim_end();
        if !token.is_empty() {
            tokens.push(token.to_string());
        }
    }
    Ok(tokens)
}

/// Load the hit-observation bundle.
pub fn load_hits(path: &Path) -> Result<HitsBundle> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| parse_error(path, e))
}

/// Load a similarity-matrix bundle and derive its percentile cutoffs.
pub fn load_similarity(path: &Path, percentiles: &[f64]) -> Result<SimilarityMatrix> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    let bundle: SimilarityBundle =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| parse_error(path, e))?;

    let n = bundle.ids.len();
    let mut flat = Vec::with_capacity(n * n);
    for row in &bundle.matrix {
        if row.len() != n {
            return Err(Error::Parse {
                path: path.to_path_buf(),
                message: format!("ragged matrix row: {} values, expected {n}", row.len()),
            });
        }
        flat.extend_from_slice(row);
    }
    if bundle.matrix.len() != n {
        return Err(Error::Parse {
            path: path.to_path_buf(),
            message: format!("{} matrix rows, expected {n}", bundle.matrix.len()),
        });
    }
    let values = Array2::from_shape_vec((n, n), flat).map_err(|e| Error::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    SimilarityMatrix::from_parts(bundle.ids, values, percentiles)
}

/// Write retained evaluation records as JSON, in column order.
pub fn write_metadata(path: &Path, metadata: &[TaskEvaluation]) -> Result<()> {
    let file = File::create(path).map_err(|e| io_error(path, e))?;
    serde_json::to_writer_pretty(file, metadata).map_err(|e| parse_error(path, e))
}

/// Resolve free-text tokens to the working protein set.
///
/// A token survives only if it maps to a known accession that carries
/// hit observations; everything else is dropped (logged at debug
/// level). The result is deduplicated preserving first-seen order.
pub fn resolve_input_proteins(
    tokens: &[String],
    names: &NameMap,
    hits: &HitsBundle,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut pids = Vec::new();
    for token in tokens {
        let Some(pid) = names.resolve(token) else {
            debug!("token '{token}' does not resolve to a known protein, dropped");
            continue;
        };
        if !hits.has_protein(pid) {
            debug!("protein '{pid}' has no hit observations, dropped");
            continue;
        }
        if seen.insert(pid.to_string()) {
            pids.push(pid.to_string());
        }
    }
    pids
}

fn io_error(path: &Path, e: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source: e,
    }
}

fn parse_error<E: std::fmt::Display>(path: &Path, e: E) -> Error {
    Error::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn sample_hits() -> HitsBundle {
        serde_json::from_str(
            r#"{
                "hits": {"P1": ["f1", "f2"], "P2": ["f2"]},
                "fragment_promiscuity": {"f1": 1, "f2": 2},
                "protein_hit_counts": {"P1": 2, "P2": 1}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_read_molecule_table() {
        let file = write_temp("smiles\tname\nCCO\tethanol\nCCN\tethylamine\n");
        let table = read_molecule_table(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.smiles, vec!["CCO", "CCN"]);
        assert_eq!(table.headers, vec!["smiles", "name"]);
    }

    #[test]
    fn test_molecule_table_requires_smiles_column() {
        let file = write_temp("structure\tname\nCCO\tethanol\n");
        assert!(matches!(
            read_molecule_table(file.path()),
            Err(Error::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_name_map_resolves_both_forms() {
        let file = write_temp("P1\tSLC6A8\nP2\tSLC7A5\n");
        let names = read_name_map(file.path()).unwrap();
        assert_eq!(names.resolve("P1"), Some("P1"));
        assert_eq!(names.resolve("SLC7A5"), Some("P2"));
        assert_eq!(names.resolve("unknown"), None);
        assert_eq!(names.display_name("P1"), Some("SLC6A8"));
    }

    #[test]
    fn test_read_protein_tokens_skips_blanks() {
        let file = write_temp("SLC6A8\n\nP2\n");
        let tokens = read_protein_tokens(file.path()).unwrap();
        assert_eq!(tokens, vec!["SLC6A8", "P2"]);
    }

    #[test]
    fn test_resolve_input_proteins_drops_and_dedups() {
        let names = NameMap::from_pairs(vec![
            ("P1".to_string(), "SLC6A8".to_string()),
            ("P2".to_string(), "SLC7A5".to_string()),
            ("P9".to_string(), "NOHITS1".to_string()),
        ]);
        let hits = sample_hits();
        let tokens: Vec<String> = ["SLC6A8", "P1", "ghost", "NOHITS1", "P2"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        // SLC6A8 and P1 are the same protein; ghost is unknown; P9 has
        // no hits.
        let pids = resolve_input_proteins(&tokens, &names, &hits);
        assert_eq!(pids, vec!["P1", "P2"]);
    }

    #[test]
    fn test_load_similarity_bundle() {
        let file = write_temp(
            r#"{"ids": ["A", "B", "C"],
                "matrix": [[1.0, 0.5, 0.2], [0.5, 1.0, 0.8], [0.2, 0.8, 1.0]]}"#,
        );
        let m = load_similarity(file.path(), &[100.0]).unwrap();
        assert_eq!(m.ids(), &["A", "B", "C"]);
        assert_eq!(m.cutoffs(), &[0.8]);
        assert_eq!(m.value("B", "C").unwrap(), 0.8);
    }

    #[test]
    fn test_load_similarity_rejects_ragged_matrix() {
        let file = write_temp(r#"{"ids": ["A", "B"], "matrix": [[1.0, 0.5], [0.5]]}"#);
        assert!(matches!(
            load_similarity(file.path(), &[90.0]),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_load_similarity_rejects_missing_rows() {
        let file = write_temp(r#"{"ids": ["A", "B"], "matrix": [[1.0, 0.5]]}"#);
        assert!(matches!(
            load_similarity(file.path(), &[90.0]),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_load_hits_bundle() {
        let file = write_temp(
            r#"{
                "hits": {"P1": ["f1"]},
                "fragment_promiscuity": {"f1": 3},
                "protein_hit_counts": {"P1": 1}
            }"#,
        );
        let bundle = load_hits(file.path()).unwrap();
        assert!(bundle.has_protein("P1"));
        assert!(!bundle.has_protein("P2"));
        assert_eq!(bundle.fragment_promiscuity["f1"], 3);
    }

    #[test]
    fn test_load_hits_missing_file_is_io_error() {
        let missing = Path::new("/nonexistent/hits.json");
        assert!(matches!(load_hits(missing), Err(Error::Io { .. })));
    }

    #[test]
    fn test_metadata_round_trip() {
        let file = NamedTempFile::new().unwrap();
        let metadata = vec![TaskEvaluation {
            auroc: Some(0.75),
            auroc_std: Some(0.03),
            n_samples: 120,
            n_positives: 30,
        }];
        write_metadata(file.path(), &metadata).unwrap();
        let back: Vec<TaskEvaluation> =
            serde_json::from_reader(File::open(file.path()).unwrap()).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].auroc, Some(0.75));
    }
}
