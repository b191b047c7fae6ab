//! Loading points and writing results.
//!
//! Input is headerless comma-separated text, one point per line, every field a
//! number. The first row fixes the dimension; any later row with a different
//! field count is rejected with its line number before clustering starts.
//!
//! ```text
//! 0.0,0.0
//! 0.1,0.1
//! 10.0,10.0
//! ```

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Parse comma-separated points from `reader`.
pub fn read_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut width: Option<usize> = None;

    for record in rdr.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record.position().map_or(0, |p| p.line());

        if let Some(expected) = width {
            if record.len() != expected {
                return Err(Error::Parse {
                    line,
                    message: format!(
                        "mismatched dimension: expected {expected}-D, found {}-D",
                        record.len()
                    ),
                });
            }
        } else {
            width = Some(record.len());
        }

        let row = record
            .iter()
            .enumerate()
            .map(|(j, field)| {
                let value = field.parse::<f64>().map_err(|e| Error::Parse {
                    line,
                    message: format!("field {} ({field:?}): {e}", j + 1),
                })?;
                if !value.is_finite() {
                    return Err(Error::Parse {
                        line,
                        message: format!("field {} ({field:?}): not a finite number", j + 1),
                    });
                }
                Ok(value)
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    Dataset::new(&rows)
}

/// Open `path` and parse it with [`read_csv`].
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    read_csv(File::open(path)?)
}

/// Write `result` as JSON (`{"clusters": [...], "count": k}`).
#[cfg(feature = "serde")]
pub fn write_json<W: std::io::Write>(
    result: &crate::cluster::ClusteringResult,
    writer: W,
    pretty: bool,
) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(writer, result)?;
    } else {
        serde_json::to_writer(writer, result)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_csv_basic() -> Result<()> {
        let ds = read_csv("0,0\n0.1, 0.1\n10,10\n".as_bytes())?;
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.dim(), 2);
        assert_eq!(ds.point(1).to_vec(), vec![0.1, 0.1]);
        Ok(())
    }

    #[test]
    fn test_read_csv_empty_input() -> Result<()> {
        let ds = read_csv("".as_bytes())?;
        assert!(ds.is_empty());
        Ok(())
    }

    #[test]
    fn test_read_csv_skips_blank_lines() -> Result<()> {
        let ds = read_csv("1,2\n\n3,4\n".as_bytes())?;
        assert_eq!(ds.len(), 2);
        Ok(())
    }

    #[test]
    fn test_read_csv_dimension_mismatch_has_line() {
        let err = read_csv("1,2\n3,4\n5\n".as_bytes()).unwrap_err();
        match err {
            Error::Parse { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("expected 2-D"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_csv_bad_number_has_line() {
        let err = read_csv("1,2\n3,abc\n".as_bytes()).unwrap_err();
        match err {
            Error::Parse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("abc"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_csv_rejects_non_finite() {
        for bad in ["NaN", "inf", "-inf"] {
            let input = format!("0,0\n1,{bad}\n");
            match read_csv(input.as_bytes()).unwrap_err() {
                Error::Parse { line, message } => {
                    assert_eq!(line, 2, "{bad}");
                    assert!(message.contains("not a finite number"), "{message}");
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_load_csv_from_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "0.5,1.5,2.5")?;
        writeln!(file, "3.5,4.5,5.5")?;
        file.flush()?;

        let ds = load_csv(file.path())?;
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.dim(), 3);
        Ok(())
    }

    #[test]
    fn test_load_csv_missing_file() {
        let err = load_csv("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_write_json_compact() -> Result<()> {
        let ds = read_csv("0,0\n0.05,0\n".as_bytes())?;
        let result = crate::cluster::Mac::new(0.5).with_parallelism(1).fit(&ds)?;

        let mut out = Vec::new();
        write_json(&result, &mut out, false)?;
        let value: serde_json::Value = serde_json::from_slice(&out)?;
        assert_eq!(value["count"], 1);
        assert_eq!(value["clusters"][0]["size"], 2);
        Ok(())
    }
}
