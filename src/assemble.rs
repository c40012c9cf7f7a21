//! Results assembly: base molecule table plus retained score columns.

use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};
use crate::grid::ScoreColumn;

/// Candidate-molecule table parsed from TSV.
///
/// Keeps the original columns verbatim for pass-through into the
/// results table; the SMILES column is additionally extracted for
/// batch scoring.
#[derive(Debug, Clone)]
pub struct MoleculeTable {
    /// Original column headers.
    pub headers: Vec<String>,
    /// Original rows, in input order.
    pub rows: Vec<Vec<String>>,
    /// Molecular-structure strings, one per row.
    pub smiles: Vec<String>,
}

impl MoleculeTable {
    /// Number of candidate molecules.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no molecules.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Final results: the molecule table with score columns appended.
#[derive(Debug, Clone)]
pub struct ResultsTable {
    base: MoleculeTable,
    columns: Vec<ScoreColumn>,
}

/// Append the retained score columns onto the molecule table.
///
/// Molecule row order and score-column order are preserved. Fails with
/// [`Error::ColumnLength`] when any column length differs from the
/// molecule count; a mismatch here means a collaborator misbehaved and
/// must never be papered over by truncation or padding.
pub fn assemble(base: MoleculeTable, columns: Vec<ScoreColumn>) -> Result<ResultsTable> {
    let n = base.len();
    for column in &columns {
        if column.scores.len() != n {
            return Err(Error::ColumnLength {
                column: column.name.clone(),
                expected: n,
                found: column.scores.len(),
            });
        }
    }
    Ok(ResultsTable { base, columns })
}

impl ResultsTable {
    /// Number of molecule rows.
    pub fn n_rows(&self) -> usize {
        self.base.len()
    }

    /// Number of retained score columns.
    pub fn n_score_columns(&self) -> usize {
        self.columns.len()
    }

    /// Retained score columns, in retention order.
    pub fn score_columns(&self) -> &[ScoreColumn] {
        &self.columns
    }

    /// Write the table as TSV: original columns first, then one column
    /// per retained task.
    pub fn write_tsv<W: Write>(&self, writer: W) -> Result<()> {
        let mut tsv = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(writer);

        let mut header: Vec<&str> = self.base.headers.iter().map(String::as_str).collect();
        header.extend(self.columns.iter().map(|c| c.name.as_str()));
        tsv.write_record(&header).map_err(write_error)?;

        for (i, row) in self.base.rows.iter().enumerate() {
            let mut record: Vec<String> = row.clone();
            record.extend(self.columns.iter().map(|c| c.scores[i].to_string()));
            tsv.write_record(&record).map_err(write_error)?;
        }
        tsv.flush().map_err(|e| Error::Io {
            path: "<results>".into(),
            source: e,
        })?;
        Ok(())
    }

    /// Write the table to a file path.
    pub fn write_tsv_path(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|e| Error::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.write_tsv(file)
    }
}

fn write_error(e: csv::Error) -> Error {
    Error::Parse {
        path: "<results>".into(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_table() -> MoleculeTable {
        MoleculeTable {
            headers: vec!["smiles".into(), "name".into()],
            rows: vec![
                vec!["CCO".into(), "ethanol".into()],
                vec!["CCN".into(), "ethylamine".into()],
            ],
            smiles: vec!["CCO".into(), "CCN".into()],
        }
    }

    fn column(name: &str, scores: Vec<f64>) -> ScoreColumn {
        ScoreColumn {
            name: name.into(),
            scores,
        }
    }

    #[test]
    fn test_assemble_preserves_order() {
        let table = assemble(
            base_table(),
            vec![
                column("clu0_50_100", vec![0.1, 0.2]),
                column("protP1_50_100", vec![0.3, 0.4]),
            ],
        )
        .unwrap();
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.n_score_columns(), 2);
        assert_eq!(table.score_columns()[0].name, "clu0_50_100");
        assert_eq!(table.score_columns()[1].scores, vec![0.3, 0.4]);
    }

    #[test]
    fn test_assemble_rejects_short_column() {
        let err = assemble(base_table(), vec![column("clu0_50_100", vec![0.1])]);
        assert!(matches!(
            err,
            Err(Error::ColumnLength {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_assemble_rejects_long_column() {
        let err = assemble(
            base_table(),
            vec![column("clu0_50_100", vec![0.1, 0.2, 0.3])],
        );
        assert!(matches!(err, Err(Error::ColumnLength { .. })));
    }

    #[test]
    fn test_assemble_with_no_columns_is_valid() {
        // A run with too-strict thresholds ends with zero score
        // columns; that is a successful outcome, not a failure.
        let table = assemble(base_table(), Vec::new()).unwrap();
        assert_eq!(table.n_score_columns(), 0);
        assert_eq!(table.n_rows(), 2);
    }

    #[test]
    fn test_write_tsv_layout() {
        let table = assemble(base_table(), vec![column("clu0_50_100", vec![0.5, 0.25])]).unwrap();
        let mut buf = Vec::new();
        table.write_tsv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "smiles\tname\tclu0_50_100");
        assert_eq!(lines[1], "CCO\tethanol\t0.5");
        assert_eq!(lines[2], "CCN\tethylamine\t0.25");
    }
}
