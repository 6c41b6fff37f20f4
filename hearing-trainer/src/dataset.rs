//! Labelled audiogram dataset ingestion

use std::path::Path;

use hearing_common::features::FEATURE_COUNT;
use hearing_common::labels::CLASS_COUNT;
use hearing_common::{ClassLabel, Error, FeatureVector, Frequency, Result};
use serde::Serialize;
use tracing::info;

/// Name of the class-code column
pub const LABEL_COLUMN: &str = "Label";

/// One labelled training row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudiogramSample {
    pub thresholds: FeatureVector,
    pub label: ClassLabel,
}

/// In-memory training table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    samples: Vec<AudiogramSample>,
}

impl Dataset {
    pub fn new(samples: Vec<AudiogramSample>) -> Self {
        Self { samples }
    }

    /// Read a header-bearing delimited file.
    ///
    /// Columns are located by name, so their order in the file does not
    /// matter and extra columns are ignored.
    pub fn load_csv(path: &Path, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| Error::DatasetLoad(format!("cannot open {}: {}", path.display(), e)))?;
        let dataset = Self::from_reader(&mut reader)
            .map_err(|e| match e {
                Error::DatasetLoad(msg) => Error::DatasetLoad(format!("{}: {}", path.display(), msg)),
                other => other,
            })?;
        info!("Loaded {} samples from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    fn from_reader<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<Self> {
        let headers = reader
            .headers()
            .map_err(|e| Error::DatasetLoad(format!("cannot read header: {}", e)))?
            .clone();

        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| Error::DatasetLoad(format!("missing column '{}'", name)))
        };

        let mut feature_columns = [0usize; FEATURE_COUNT];
        for freq in Frequency::ALL {
            feature_columns[freq.position()] = column(freq.key())?;
        }
        let label_column = column(LABEL_COLUMN)?;

        let mut samples = Vec::new();
        for (i, record) in reader.records().enumerate() {
            // header is line 1
            let line = i + 2;
            let record =
                record.map_err(|e| Error::DatasetLoad(format!("line {}: {}", line, e)))?;

            let mut values = [0.0; FEATURE_COUNT];
            for freq in Frequency::ALL {
                let raw = record.get(feature_columns[freq.position()]).unwrap_or("");
                let value = raw.parse::<f64>().map_err(|_| {
                    Error::DatasetLoad(format!(
                        "line {}: column '{}' is not numeric: '{}'",
                        line,
                        freq.key(),
                        raw
                    ))
                })?;
                if !value.is_finite() {
                    return Err(Error::DatasetLoad(format!(
                        "line {}: column '{}' is not a finite number: '{}'",
                        line,
                        freq.key(),
                        raw
                    )));
                }
                values[freq.position()] = value;
            }

            let raw_label = record.get(label_column).unwrap_or("");
            let label = raw_label
                .parse::<usize>()
                .ok()
                .and_then(|index| ClassLabel::from_index(index).ok())
                .ok_or_else(|| {
                    Error::DatasetLoad(format!(
                        "line {}: label '{}' is not a class code 0-4",
                        line, raw_label
                    ))
                })?;

            samples.push(AudiogramSample {
                thresholds: FeatureVector::new(values),
                label,
            });
        }

        if samples.is_empty() {
            return Err(Error::DatasetLoad("dataset has no rows".to_string()));
        }
        Ok(Self { samples })
    }

    /// Write the dataset with the canonical column order
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        #[derive(Serialize)]
        struct Row {
            #[serde(rename = "250Hz")]
            hz250: f64,
            #[serde(rename = "500Hz")]
            hz500: f64,
            #[serde(rename = "1000Hz")]
            hz1000: f64,
            #[serde(rename = "2000Hz")]
            hz2000: f64,
            #[serde(rename = "4000Hz")]
            hz4000: f64,
            #[serde(rename = "8000Hz")]
            hz8000: f64,
            #[serde(rename = "Label")]
            label: usize,
        }

        let write_err = |e: csv::Error| Error::Io(std::io::Error::from(e));
        let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
        for sample in &self.samples {
            let [hz250, hz500, hz1000, hz2000, hz4000, hz8000] = sample.thresholds.to_array();
            writer
                .serialize(Row {
                    hz250,
                    hz500,
                    hz1000,
                    hz2000,
                    hz4000,
                    hz8000,
                    label: sample.label.index(),
                })
                .map_err(write_err)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn samples(&self) -> &[AudiogramSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Row count per class code
    pub fn class_counts(&self) -> [usize; CLASS_COUNT] {
        let mut counts = [0; CLASS_COUNT];
        for sample in &self.samples {
            counts[sample.label.index()] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Dataset> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());
        Dataset::from_reader(&mut reader)
    }

    #[test]
    fn test_reads_canonical_layout() {
        let ds = parse(
            "250Hz,500Hz,1000Hz,2000Hz,4000Hz,8000Hz,Label\n\
             10,10,15,15,20,20,0\n\
             60,62,65,70,75,80,4\n",
        )
        .unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.samples()[0].thresholds.as_slice(), &[10.0, 10.0, 15.0, 15.0, 20.0, 20.0]);
        assert_eq!(ds.samples()[1].label, ClassLabel::SevereLoss);
    }

    #[test]
    fn test_columns_located_by_name() {
        let ds = parse(
            "Label,8000Hz,4000Hz,2000Hz,1000Hz,500Hz,250Hz,patient\n\
             2,6,5,4,3,2,1,abc\n",
        )
        .unwrap();
        let sample = ds.samples()[0];
        assert_eq!(sample.thresholds.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(sample.label, ClassLabel::NoiseInducedLoss);
    }

    #[test]
    fn test_missing_column_is_error() {
        let err = parse("250Hz,500Hz,1000Hz,2000Hz,4000Hz,Label\n1,2,3,4,5,0\n").unwrap_err();
        assert!(err.to_string().contains("8000Hz"));
    }

    #[test]
    fn test_non_numeric_cell_names_line_and_column() {
        let err = parse(
            "250Hz,500Hz,1000Hz,2000Hz,4000Hz,8000Hz,Label\n\
             10,10,15,15,20,20,0\n\
             10,x,15,15,20,20,0\n",
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("line 3"), "{}", msg);
        assert!(msg.contains("500Hz"), "{}", msg);
    }

    #[test]
    fn test_non_finite_cells_rejected() {
        for cell in ["NaN", "inf", "-inf"] {
            let text = format!(
                "250Hz,500Hz,1000Hz,2000Hz,4000Hz,8000Hz,Label\n\
                 10,10,15,15,20,20,0\n\
                 {},10,15,15,20,20,0\n",
                cell
            );
            let err = parse(&text).unwrap_err();
            assert!(matches!(err, Error::DatasetLoad(_)), "{}: {:?}", cell, err);
            let msg = err.to_string();
            assert!(msg.contains("line 3"), "{}", msg);
            assert!(msg.contains("250Hz"), "{}", msg);
            assert!(msg.contains("not a finite number"), "{}", msg);
        }
    }

    #[test]
    fn test_unknown_label_is_error() {
        let err = parse("250Hz,500Hz,1000Hz,2000Hz,4000Hz,8000Hz,Label\n1,2,3,4,5,6,5\n")
            .unwrap_err();
        assert!(matches!(err, Error::DatasetLoad(_)));
    }

    #[test]
    fn test_empty_table_is_error() {
        assert!(parse("250Hz,500Hz,1000Hz,2000Hz,4000Hz,8000Hz,Label\n").is_err());
    }

    #[test]
    fn test_class_counts() {
        let ds = parse(
            "250Hz,500Hz,1000Hz,2000Hz,4000Hz,8000Hz,Label\n\
             1,1,1,1,1,1,0\n1,1,1,1,1,1,0\n9,9,9,9,9,9,3\n",
        )
        .unwrap();
        assert_eq!(ds.class_counts(), [2, 0, 0, 1, 0]);
    }
}
