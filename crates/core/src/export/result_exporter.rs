use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::aggregation::aggregate::AggregationPolicy;
use crate::export::result_row::ResultRow;
use crate::identity::domain::identity::Identity;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("no faces found")]
pub struct EmptyResultError;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Empty(#[from] EmptyResultError),
    #[error("CSV error at {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Flattens identities into one result row each.
pub struct ResultExporter {
    policy: AggregationPolicy,
}

impl ResultExporter {
    pub fn new(policy: AggregationPolicy) -> Self {
        Self { policy }
    }

    /// Rows in identity insertion order. Identities with no observations are
    /// skipped.
    pub fn rows(&self, identities: &[Identity]) -> Result<Vec<ResultRow>, EmptyResultError> {
        let rows: Vec<ResultRow> = identities
            .iter()
            .filter_map(|identity| {
                let agg = identity.aggregate(&self.policy);
                if agg.is_none() {
                    log::debug!("Identity {} has no observations", identity.key());
                }
                agg
            })
            .map(|agg| ResultRow::from(&agg))
            .collect();

        if rows.is_empty() {
            return Err(EmptyResultError);
        }
        Ok(rows)
    }

    /// Writes header plus rows to `path`; returns the row count.
    pub fn write_csv(&self, identities: &[Identity], path: &Path) -> Result<usize, ExportError> {
        let rows = self.rows(identities)?;
        write_rows(&rows, path)?;
        log::info!("Wrote {} rows to {}", rows.len(), path.display());
        Ok(rows.len())
    }
}

impl Default for ResultExporter {
    fn default() -> Self {
        Self::new(AggregationPolicy::default())
    }
}

pub fn write_rows(rows: &[ResultRow], path: &Path) -> Result<(), ExportError> {
    let csv_err = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    for row in rows {
        wtr.serialize(row).map_err(csv_err)?;
    }
    wtr.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Parses a table written by [`ResultExporter::write_csv`].
pub fn read_csv(path: &Path) -> Result<Vec<ResultRow>, ExportError> {
    let csv_err = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    reader
        .deserialize()
        .collect::<Result<Vec<ResultRow>, _>>()
        .map_err(csv_err)
}

/// Concatenates several exported tables, in argument order.
pub fn read_tables<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<ResultRow>, ExportError> {
    let mut rows = Vec::new();
    for path in paths {
        let table = read_csv(path.as_ref())?;
        log::debug!("Read {} rows from {}", table.len(), path.as_ref().display());
        rows.extend(table);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::aggregate::GenderTiePolicy;
    use crate::analysis::domain::observation::Observation;
    use crate::identity::domain::identity::IdentityKey;
    use crate::shared::region::FaceRegion;
    use tempfile::TempDir;

    fn obs(age: f64, gender: &str, race: &str, emotion: &str) -> Observation {
        Observation {
            age,
            gender: gender.into(),
            race: race.into(),
            emotion: emotion.into(),
            region: FaceRegion::new(0, 0, 10, 10),
        }
    }

    fn identity(id: u32, history: Vec<Observation>) -> Identity {
        let mut identity = Identity::new(IdentityKey::new(id));
        for o in history {
            identity.push(o);
        }
        identity
    }

    fn sample() -> Vec<Identity> {
        vec![
            identity(
                0,
                vec![
                    obs(30.0, "Man", "white", "happy"),
                    obs(31.0, "Man", "white", "happy"),
                    obs(33.0, "Woman", "white", "neutral"),
                ],
            ),
            identity(1, vec![obs(22.9, "Woman", "asian", "sad")]),
        ]
    }

    #[test]
    fn test_rows_one_per_identity_in_order() {
        let rows = ResultExporter::default().rows(&sample()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].age, 31);
        assert_eq!(rows[0].gender, "Man");
        assert_eq!(rows[0].happy, 2);
        assert_eq!(rows[0].neutral, 1);
        assert_eq!(rows[1].age, 22);
        assert_eq!(rows[1].gender, "Woman");
        assert_eq!(rows[1].sad, 1);
    }

    #[test]
    fn test_gender_tie_follows_policy() {
        let tied = vec![identity(
            0,
            vec![obs(30.0, "Man", "white", "happy"), obs(30.0, "Woman", "white", "happy")],
        )];

        let default_rows = ResultExporter::default().rows(&tied).unwrap();
        let man_rows = ResultExporter::new(AggregationPolicy {
            gender_tie: GenderTiePolicy::PreferMan,
        })
        .rows(&tied)
        .unwrap();

        assert_eq!(default_rows[0].gender, "Woman");
        assert_eq!(man_rows[0].gender, "Man");
    }

    #[test]
    fn test_no_identities_is_empty_result() {
        assert_eq!(ResultExporter::default().rows(&[]), Err(EmptyResultError));
    }

    #[test]
    fn test_identities_without_observations_are_skipped() {
        let identities = vec![identity(0, vec![])];
        assert_eq!(
            ResultExporter::default().rows(&identities),
            Err(EmptyResultError)
        );
    }

    #[test]
    fn test_csv_header_and_column_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("results.csv");

        let n = ResultExporter::default()
            .write_csv(&sample(), &path)
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("age,gender,race,angry,disgust,fear,happy,sad,surprise,neutral")
        );
        assert_eq!(lines.next(), Some("31,Man,white,0,0,0,2,0,0,1"));
        assert_eq!(lines.next(), Some("22,Woman,asian,0,0,0,0,1,0,0"));
        assert_eq!(n, 2);
    }

    #[test]
    fn test_csv_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("results.csv");
        let exporter = ResultExporter::default();

        exporter.write_csv(&sample(), &path).unwrap();

        assert_eq!(read_csv(&path).unwrap(), exporter.rows(&sample()).unwrap());
    }

    #[test]
    fn test_round_trip_of_two_observations() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("results.csv");
        let identities = vec![identity(
            0,
            vec![obs(30.0, "Man", "white", "happy"), obs(32.0, "Man", "white", "sad")],
        )];

        ResultExporter::default().write_csv(&identities, &path).unwrap();
        let row = &read_csv(&path).unwrap()[0];

        assert_eq!(row.age, 31);
        assert_eq!((row.happy, row.sad), (1, 1));
        assert_eq!(row.angry + row.disgust + row.fear + row.surprise + row.neutral, 0);
    }

    #[test]
    fn test_labels_with_commas_are_quoted() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("results.csv");
        let identities = vec![identity(0, vec![obs(40.0, "Man", "latino, hispanic", "fear")])];

        ResultExporter::default().write_csv(&identities, &path).unwrap();

        assert_eq!(read_csv(&path).unwrap()[0].race, "latino, hispanic");
    }

    #[test]
    fn test_empty_export_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("results.csv");

        let result = ResultExporter::default().write_csv(&[], &path);

        assert!(matches!(result, Err(ExportError::Empty(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_read_tables_keeps_argument_order() {
        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join("first.csv");
        let second = tmp.path().join("second.csv");
        let exporter = ResultExporter::default();
        exporter.write_csv(&sample(), &first).unwrap();
        exporter
            .write_csv(&[identity(0, vec![obs(60.0, "Man", "black", "angry")])], &second)
            .unwrap();

        let rows = read_tables(&[&second, &first]).unwrap();

        let ages: Vec<i32> = rows.iter().map(|r| r.age).collect();
        assert_eq!(ages, vec![60, 31, 22]);
    }

    #[test]
    fn test_read_tables_fails_on_missing_table() {
        let tmp = TempDir::new().unwrap();
        let present = tmp.path().join("present.csv");
        ResultExporter::default().write_csv(&sample(), &present).unwrap();

        let result = read_tables(&[present, tmp.path().join("absent.csv")]);

        assert!(matches!(result, Err(ExportError::Csv { .. })));
    }

    #[test]
    fn test_missing_directory_is_csv_error() {
        let result =
            ResultExporter::default().write_csv(&sample(), Path::new("/nonexistent/dir/out.csv"));
        assert!(matches!(result, Err(ExportError::Csv { .. })));
    }
}
