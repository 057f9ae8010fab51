use anyhow::{anyhow, Context};
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use std::io::Cursor;
use std::path::Path;

const NAME_HEADERS: [&str; 5] = ["name", "names", "student", "student name", "姓名"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterFormat {
    Text,
    Csv,
    Xlsx,
}

impl RosterFormat {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "txt" => Ok(RosterFormat::Text),
            "csv" => Ok(RosterFormat::Csv),
            "xlsx" => Ok(RosterFormat::Xlsx),
            _ => Err(anyhow!(
                "unsupported roster file type '{}' (expected .txt, .csv or .xlsx)",
                ext
            )),
        }
    }
}

pub fn read_roster_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let format = RosterFormat::from_path(path)?;
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read roster file {}", path.to_string_lossy()))?;
    match format {
        RosterFormat::Text => Ok(parse_text_roster(&decode_text(&bytes))),
        RosterFormat::Csv => parse_csv_roster(&decode_text(&bytes)),
        RosterFormat::Xlsx => parse_xlsx_roster(&bytes),
    }
}

fn decode_text(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes).into_owned();
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

/// One name per line.
pub fn parse_text_roster(text: &str) -> Vec<String> {
    text.lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(|l| l.to_string())
        .collect()
}

pub fn parse_csv_roster(text: &str) -> anyhow::Result<Vec<String>> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines
        .next()
        .map(parse_csv_record)
        .ok_or_else(|| anyhow!("csv file has no header row"))?;
    let col = name_column(&header);
    Ok(lines
        .filter_map(|line| parse_csv_record(line).into_iter().nth(col))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect())
}

pub fn parse_xlsx_roster(bytes: &[u8]) -> anyhow::Result<Vec<String>> {
    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes)).context("not a readable .xlsx workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("workbook has no worksheets"))?
        .context("failed to read first worksheet")?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| anyhow!("worksheet is empty"))?
        .iter()
        .map(|c| cell_text(c).unwrap_or_default())
        .collect();
    let col = name_column(&header);
    Ok(rows
        .filter_map(|row| row.get(col).and_then(cell_text))
        .collect())
}

pub fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        _ => return None,
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

// Falls back to the first column when no header looks like a name column.
fn name_column(header: &[String]) -> usize {
    header
        .iter()
        .position(|h| {
            let h = h.trim().to_lowercase();
            NAME_HEADERS.iter().any(|n| *n == h)
        })
        .unwrap_or(0)
}

fn parse_csv_record(line: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '"' {
            if in_quotes && chars.peek() == Some(&'"') {
                buf.push('"');
                chars.next();
                continue;
            }
            in_quotes = !in_quotes;
            continue;
        }
        if ch == ',' && !in_quotes {
            out.push(std::mem::take(&mut buf));
            continue;
        }
        buf.push(ch);
    }
    out.push(buf);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_record_handles_quotes() {
        assert_eq!(
            parse_csv_record(r#"1,"Smith, Jo","say ""hi""""#),
            vec!["1", "Smith, Jo", "say \"hi\""]
        );
        assert_eq!(parse_csv_record(""), vec![""]);
    }

    #[test]
    fn name_column_matches_known_headers() {
        let header = |cols: &[&str]| cols.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(name_column(&header(&["id", "Name"])), 1);
        assert_eq!(name_column(&header(&["学号", "姓名"])), 1);
        assert_eq!(name_column(&header(&["id", "grade"])), 0);
    }
}
