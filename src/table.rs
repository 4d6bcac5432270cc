//! Whitespace-delimited numeric tables.

use crate::error::Error;
use crate::reduce::Frame;
use anyhow::{Context, Result};
use std::io::{BufRead, Write};

/// Raw samples: one time coordinate and one row of channel values per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    times: Vec<f64>,
    rows: Vec<Vec<f64>>,
}

impl RawTable {
    pub fn new(times: Vec<f64>, rows: Vec<Vec<f64>>) -> Result<Self, Error> {
        if times.is_empty() {
            return Err(Error::EmptySeries);
        }
        if times.len() != rows.len() {
            return Err(Error::shape(
                0,
                format!("{} time values for {} rows", times.len(), rows.len()),
            ));
        }
        let n_channels = rows[0].len();
        if n_channels == 0 {
            return Err(Error::shape(1, "row has no channel columns"));
        }
        for (i_row, row) in rows.iter().enumerate() {
            if row.len() != n_channels {
                return Err(Error::shape(
                    i_row + 1,
                    format!("expected {n_channels} channels, but found {}", row.len()),
                ));
            }
        }
        Ok(Self { times, rows })
    }

    pub fn n_frames(&self) -> usize {
        self.times.len()
    }

    pub fn n_channels(&self) -> usize {
        self.rows[0].len()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }
}

/// Parse the data lines of a table as `(line number, values)` pairs.
///
/// Blank lines and lines starting with any of `comment_markers` are skipped.
/// Every data line must have the same number of columns.
fn parse_rows<R: BufRead, S: AsRef<str>>(
    reader: R,
    comment_markers: &[S],
) -> Result<Vec<(usize, Vec<f64>)>> {
    let mut rows: Vec<(usize, Vec<f64>)> = Vec::new();
    for (i_line, line) in reader.lines().enumerate() {
        let line_no = i_line + 1;
        let line = line.with_context(|| format!("failed to read line {line_no}"))?;
        let line = line.trim();
        if line.is_empty() || comment_markers.iter().any(|m| line.starts_with(m.as_ref())) {
            continue;
        }

        let vals = line
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<f64>()
                    .map_err(|_| Error::shape(line_no, format!("invalid number {token:?}")))
            })
            .collect::<Result<Vec<f64>, Error>>()?;

        if let Some((_, first)) = rows.first() {
            if first.len() != vals.len() {
                return Err(Error::shape(
                    line_no,
                    format!("expected {} columns, but found {}", first.len(), vals.len()),
                )
                .into());
            }
        }
        rows.push((line_no, vals));
    }

    if rows.is_empty() {
        return Err(Error::EmptySeries.into());
    }
    Ok(rows)
}

/// Read a raw sample table: column 0 is the time, the rest are channels.
pub fn read_table<R: BufRead, S: AsRef<str>>(
    reader: R,
    comment_markers: &[S],
) -> Result<RawTable> {
    let rows = parse_rows(reader, comment_markers)?;

    let mut times = Vec::with_capacity(rows.len());
    let mut channels = Vec::with_capacity(rows.len());
    for (_, mut vals) in rows {
        times.push(vals.remove(0));
        channels.push(vals);
    }

    Ok(RawTable::new(times, channels)?)
}

/// Read a two-column reduced series; `nan` values come back as missing frames.
pub fn read_series<R: BufRead>(reader: R) -> Result<Vec<Frame>> {
    let rows = parse_rows(reader, &["#", "@"])?;

    let mut frames = Vec::with_capacity(rows.len());
    for (line_no, vals) in rows {
        let [time, val] = vals[..] else {
            return Err(Error::shape(
                line_no,
                format!("expected 2 columns, but found {}", vals.len()),
            )
            .into());
        };
        frames.push(Frame {
            time,
            value: (!val.is_nan()).then_some(val),
        });
    }
    Ok(frames)
}

pub fn write_series<W: Write, S: AsRef<str>>(
    writer: &mut W,
    frames: &[Frame],
    header: &[S],
) -> Result<()> {
    for line in header {
        writeln!(writer, "# {}", line.as_ref()).context("failed to write header")?;
    }
    for frame in frames {
        let res = match frame.value {
            Some(val) => writeln!(writer, "{:10.3}  {:10.4}", frame.time, val),
            None => writeln!(writer, "{:10.3}  {:>10}", frame.time, "nan"),
        };
        res.context("failed to write frame")?;
    }
    Ok(())
}

pub fn write_block_means<W: Write>(writer: &mut W, means: &[f64]) -> Result<()> {
    for mean in means {
        writeln!(writer, "{mean:.3}").context("failed to write block mean")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: &str = "\
# GROMACS-style header
@    title \"Twist\"
@ s0 legend \"step 1\"
   0.000   33.1   34.0   35.2
  10.000   36.0  999.0   35.0

  20.000   35.5   35.5  101.0
";

    #[test]
    fn reads_table_skipping_comments() {
        let table = read_table(RAW.as_bytes(), &["@", "#"]).unwrap();
        assert_eq!(table.n_frames(), 3);
        assert_eq!(table.n_channels(), 3);
        assert_eq!(table.times(), &[0.0, 10.0, 20.0]);
        assert_eq!(table.rows()[1], vec![36.0, 999.0, 35.0]);
    }

    #[test]
    fn ragged_rows_are_shape_errors() {
        let raw = "0.0 1.0 2.0\n1.0 1.0\n";
        let err = read_table(raw.as_bytes(), &["#"]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Error>(),
            Some(&Error::Shape {
                line: 2,
                reason: "expected 3 columns, but found 2".to_string()
            })
        );
    }

    #[test]
    fn unparsable_tokens_are_shape_errors() {
        let raw = "0.0 1.0\n1.0 abc\n";
        let err = read_table(raw.as_bytes(), &["#"]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::Shape { line: 2, .. })
        ));
    }

    #[test]
    fn comment_only_table_is_empty() {
        let err = read_table("# nothing\n@ here\n".as_bytes(), &["#", "@"]).unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::EmptySeries));
    }

    #[test]
    fn time_only_table_has_no_channels() {
        let err = read_table("0.0\n1.0\n".as_bytes(), &["#"]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::Shape { .. })
        ));
    }

    #[test]
    fn series_keeps_missing_frames() {
        let frames = vec![
            Frame {
                time: 0.0,
                value: Some(35.25),
            },
            Frame {
                time: 10.0,
                value: None,
            },
        ];
        let mut buf = Vec::new();
        write_series(&mut buf, &frames, &["Time(ps)   Avg(deg)"]).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("# Time(ps)   Avg(deg)\n"));
        assert!(text.contains("     0.000     35.2500\n"));
        assert!(text.contains("    10.000         nan\n"));

        assert_eq!(read_series(buf.as_slice()).unwrap(), frames);
    }

    #[test]
    fn block_means_are_one_per_line() {
        let mut buf = Vec::new();
        write_block_means(&mut buf, &[35.1914, 34.9]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "35.191\n34.900\n");
    }
}
