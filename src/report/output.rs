use super::Report;
use crate::error::Result;
use crate::model::{Dimension, ReportOutput, Stats, SCHEMA_VERSION};
use chrono::Utc;
use std::io::Write;

const HEADER: [&str; 4] = ["name", "commits", "additions", "deletions"];

fn row(s: &Stats) -> [String; 4] {
    [
        s.name.clone(),
        s.commits.to_string(),
        s.additions.to_string(),
        s.deletions.to_string(),
    ]
}

fn write_row<W: Write>(w: &mut W, cells: &[String; 4], widths: &[usize; 4]) -> Result<()> {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    writeln!(w, "{}", line.join(" | ").trim_end())?;
    Ok(())
}

fn write_table<W: Write>(w: &mut W, dimension: Dimension, entries: &[&Stats]) -> Result<()> {
    writeln!(w, "{}", dimension.as_str().to_uppercase())?;

    let header = HEADER.map(String::from);
    let rows: Vec<[String; 4]> = entries.iter().map(|s| row(s)).collect();
    let mut widths = header.clone().map(|h| h.chars().count());
    for r in &rows {
        for (width, cell) in widths.iter_mut().zip(r) {
            *width = (*width).max(cell.chars().count());
        }
    }

    write_row(w, &header, &widths)?;
    let rule: Vec<String> = widths.iter().map(|n| "-".repeat(*n)).collect();
    writeln!(w, "{}", rule.join("-+-"))?;
    for r in &rows {
        write_row(w, r, &widths)?;
    }
    Ok(())
}

impl Report {
    /// Writes one table per dimension in `groups`, each ranked independently.
    /// `top` caps the number of rows per table; `None` writes them all.
    pub fn render<W: Write>(&self, w: &mut W, groups: &[Dimension], top: Option<usize>) -> Result<()> {
        for (i, &dimension) in groups.iter().enumerate() {
            if i > 0 {
                writeln!(w)?;
            }
            let mut entries = self.ranked(dimension);
            let hidden = match top {
                Some(n) if entries.len() > n => {
                    let hidden = entries.len() - n;
                    entries.truncate(n);
                    hidden
                }
                _ => 0,
            };
            write_table(w, dimension, &entries)?;
            if hidden > 0 {
                writeln!(w, "... and {hidden} more entries")?;
            }
        }
        Ok(())
    }

    pub fn to_output(&self, repository_path: &str, groups: &[Dimension]) -> ReportOutput {
        ReportOutput {
            version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            repository_path: repository_path.to_string(),
            commits: self.commits(),
            groups: self.groups(groups),
        }
    }
}

pub fn output_json<W: Write>(w: &mut W, report: &Report, repository_path: &str, groups: &[Dimension]) -> Result<()> {
    let output = report.to_output(repository_path, groups);
    serde_json::to_writer_pretty(&mut *w, &output)?;
    writeln!(w)?;
    Ok(())
}

/// One JSON object per entry, groups in the requested order.
pub fn output_ndjson<W: Write>(w: &mut W, report: &Report, groups: &[Dimension]) -> Result<()> {
    for &dimension in groups {
        for entry in report.ranked(dimension) {
            writeln!(w, "{}", serde_json::to_string(entry)?)?;
        }
    }
    Ok(())
}
