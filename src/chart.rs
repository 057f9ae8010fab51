use crate::import::cell_text;
use crate::seat::{SeatId, ROW_LETTERS};
use crate::session::Session;
use anyhow::{anyhow, Context};
use calamine::{open_workbook_from_rs, Reader, Xlsx};
use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const SEATING_SHEET: &str = "Seating";
pub const SUMMARY_SHEET: &str = "Summary";
pub const EMPTY_MARKER: &str = "(empty)";

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

#[derive(Debug, Clone)]
pub struct ChartExport {
    pub path: PathBuf,
    pub seats_exported: usize,
    pub sheet_count: usize,
}

pub fn export_file_name(now: chrono::DateTime<chrono::Local>) -> String {
    format!("seating-chart_{}.xlsx", now.format("%Y%m%d_%H%M%S"))
}

pub fn write_seating_chart(
    session: &Session,
    out_dir: &Path,
    include_summary: bool,
) -> anyhow::Result<ChartExport> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create directory {}", out_dir.to_string_lossy()))?;
    let path = out_dir.join(export_file_name(chrono::Local::now()));
    let bytes = render_workbook(session, include_summary)?;
    std::fs::write(&path, bytes)
        .with_context(|| format!("failed to write {}", path.to_string_lossy()))?;
    Ok(ChartExport {
        path,
        seats_exported: session.summary().occupied_seats,
        sheet_count: if include_summary { 2 } else { 1 },
    })
}

// A `None` slot in a worksheet row leaves that cell blank.
enum Cell {
    Text(String),
    Number(usize),
}

struct SharedStrings {
    index: HashMap<String, usize>,
    items: Vec<String>,
}

impl SharedStrings {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            items: Vec::new(),
        }
    }

    fn intern(&mut self, s: &str) -> usize {
        if let Some(i) = self.index.get(s) {
            return *i;
        }
        let i = self.items.len();
        self.items.push(s.to_string());
        self.index.insert(s.to_string(), i);
        i
    }
}

fn seating_rows(session: &Session) -> Vec<Vec<Option<Cell>>> {
    let layout = session.layout();
    let mut rows: Vec<Vec<Option<Cell>>> = Vec::new();

    let mut header = vec![None];
    header.extend((1..=layout.cols).map(|c| Some(Cell::Text(format!("Column {}", c)))));
    rows.push(header);

    for (r, occupants) in session.seating_grid().into_iter().enumerate() {
        let mut row = vec![Some(Cell::Text(format!("Row {}", ROW_LETTERS[r])))];
        for (c, occupant) in occupants.into_iter().enumerate() {
            let seat = format!("{}{}", ROW_LETTERS[r], c + 1);
            let text = format!("{}: {}", seat, occupant.unwrap_or(EMPTY_MARKER));
            row.push(Some(Cell::Text(text)));
        }
        rows.push(row);
    }
    rows
}

fn summary_rows(session: &Session) -> Vec<Vec<Option<Cell>>> {
    let s = session.summary();
    [
        ("Total seats", s.total_seats),
        ("Occupied seats", s.occupied_seats),
        ("Empty seats", s.empty_seats),
        ("Total students", s.total_students),
        ("Unassigned students", s.unassigned_students),
    ]
    .into_iter()
    .map(|(label, n)| vec![Some(Cell::Text(label.to_string())), Some(Cell::Number(n))])
    .collect()
}

pub fn render_workbook(session: &Session, include_summary: bool) -> anyhow::Result<Vec<u8>> {
    let mut sheets: Vec<(&str, Vec<Vec<Option<Cell>>>)> =
        vec![(SEATING_SHEET, seating_rows(session))];
    if include_summary {
        sheets.push((SUMMARY_SHEET, summary_rows(session)));
    }

    let mut strings = SharedStrings::new();
    let sheet_xml: Vec<String> = sheets
        .iter()
        .map(|(_, rows)| worksheet_xml(rows, &mut strings))
        .collect();
    let names: Vec<&str> = sheets.iter().map(|(name, _)| *name).collect();

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut put = |name: &str, body: &str| -> anyhow::Result<()> {
        zip.start_file(name, opts)
            .with_context(|| format!("failed to start {}", name))?;
        zip.write_all(body.as_bytes())
            .with_context(|| format!("failed to write {}", name))?;
        Ok(())
    };

    put("[Content_Types].xml", &content_types_xml(names.len()))?;
    put("_rels/.rels", &root_rels_xml())?;
    put("xl/workbook.xml", &workbook_xml(&names))?;
    put("xl/_rels/workbook.xml.rels", &workbook_rels_xml(names.len()))?;
    put("xl/styles.xml", &styles_xml())?;
    put("xl/sharedStrings.xml", &shared_strings_xml(&strings))?;
    for (i, xml) in sheet_xml.iter().enumerate() {
        put(&format!("xl/worksheets/sheet{}.xml", i + 1), xml)?;
    }

    let cursor = zip.finish().context("failed to finalize workbook")?;
    Ok(cursor.into_inner())
}

fn column_letter(col: usize) -> String {
    let mut label = String::new();
    let mut n = col + 1;
    while n > 0 {
        n -= 1;
        label.insert(0, char::from(b'A' + (n % 26) as u8));
        n /= 26;
    }
    label
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn worksheet_xml(rows: &[Vec<Option<Cell>>], strings: &mut SharedStrings) -> String {
    let mut xml = format!("{}<worksheet xmlns=\"{}\"><sheetData>", XML_DECL, NS_MAIN);
    for (r, row) in rows.iter().enumerate() {
        xml.push_str(&format!("<row r=\"{}\">", r + 1));
        for (c, cell) in row.iter().enumerate() {
            let Some(cell) = cell else { continue };
            let reference = format!("{}{}", column_letter(c), r + 1);
            match cell {
                Cell::Text(s) => xml.push_str(&format!(
                    "<c r=\"{}\" t=\"s\"><v>{}</v></c>",
                    reference,
                    strings.intern(s)
                )),
                Cell::Number(n) => {
                    xml.push_str(&format!("<c r=\"{}\"><v>{}</v></c>", reference, n))
                }
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn shared_strings_xml(strings: &SharedStrings) -> String {
    let mut xml = format!(
        "{}<sst xmlns=\"{}\" count=\"{}\" uniqueCount=\"{}\">",
        XML_DECL,
        NS_MAIN,
        strings.items.len(),
        strings.items.len()
    );
    for s in &strings.items {
        xml.push_str(&format!("<si><t xml:space=\"preserve\">{}</t></si>", xml_escape(s)));
    }
    xml.push_str("</sst>");
    xml
}

fn content_types_xml(sheet_count: usize) -> String {
    let mut xml = format!(
        "{}<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
         <Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>\
         <Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>\
         <Override PartName=\"/xl/sharedStrings.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml\"/>",
        XML_DECL
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            "<Override PartName=\"/xl/worksheets/sheet{}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>",
            i
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn root_rels_xml() -> String {
    format!(
        "{}<Relationships xmlns=\"{}\">\
         <Relationship Id=\"rId1\" Type=\"{}/officeDocument\" Target=\"xl/workbook.xml\"/>\
         </Relationships>",
        XML_DECL, NS_PKG_REL, NS_REL
    )
}

fn workbook_xml(names: &[&str]) -> String {
    let mut xml = format!(
        "{}<workbook xmlns=\"{}\" xmlns:r=\"{}\"><sheets>",
        XML_DECL, NS_MAIN, NS_REL
    );
    for (i, name) in names.iter().enumerate() {
        xml.push_str(&format!(
            "<sheet name=\"{}\" sheetId=\"{}\" r:id=\"rId{}\"/>",
            xml_escape(name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn workbook_rels_xml(sheet_count: usize) -> String {
    let mut xml = format!("{}<Relationships xmlns=\"{}\">", XML_DECL, NS_PKG_REL);
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            "<Relationship Id=\"rId{}\" Type=\"{}/worksheet\" Target=\"worksheets/sheet{}.xml\"/>",
            i, NS_REL, i
        ));
    }
    xml.push_str(&format!(
        "<Relationship Id=\"rId{}\" Type=\"{}/styles\" Target=\"styles.xml\"/>",
        sheet_count + 1,
        NS_REL
    ));
    xml.push_str(&format!(
        "<Relationship Id=\"rId{}\" Type=\"{}/sharedStrings\" Target=\"sharedStrings.xml\"/>",
        sheet_count + 2,
        NS_REL
    ));
    xml.push_str("</Relationships>");
    xml
}

fn styles_xml() -> String {
    format!(
        "{}<styleSheet xmlns=\"{}\">\
         <fonts count=\"1\"><font><sz val=\"11\"/><name val=\"Calibri\"/></font></fonts>\
         <fills count=\"2\"><fill><patternFill patternType=\"none\"/></fill><fill><patternFill patternType=\"gray125\"/></fill></fills>\
         <borders count=\"1\"><border><left/><right/><top/><bottom/><diagonal/></border></borders>\
         <cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>\
         <cellXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/></cellXfs>\
         </styleSheet>",
        XML_DECL, NS_MAIN
    )
}

pub fn read_seating_chart(path: &Path) -> anyhow::Result<BTreeMap<SeatId, String>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read seating chart {}", path.to_string_lossy()))?;
    parse_seating_chart(&bytes)
}

/// Rebuilds seat -> student from the grid sheet of an exported chart.
pub fn parse_seating_chart(bytes: &[u8]) -> anyhow::Result<BTreeMap<SeatId, String>> {
    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes)).context("not a readable .xlsx workbook")?;
    let range = match workbook.worksheet_range(SEATING_SHEET) {
        Ok(r) => r,
        Err(_) => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| anyhow!("workbook has no worksheets"))?
            .context("failed to read first worksheet")?,
    };

    let mut seats = BTreeMap::new();
    let mut seat_cells = 0usize;
    for text in range.rows().flat_map(|row| row.iter().filter_map(cell_text)) {
        let Some((raw_seat, occupant)) = text.split_once(':') else {
            continue;
        };
        let Ok(seat) = raw_seat.parse::<SeatId>() else {
            continue;
        };
        seat_cells += 1;
        let occupant = occupant.trim();
        if occupant.is_empty() || occupant == EMPTY_MARKER {
            continue;
        }
        seats.insert(seat, occupant.to_string());
    }
    if seat_cells == 0 {
        return Err(anyhow!("no seat cells found; is this an exported seating chart?"));
    }
    Ok(seats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seat::Layout;
    use crate::seatmap::OccupiedSeatPolicy;
    use chrono::TimeZone;

    fn seat(raw: &str) -> SeatId {
        raw.parse().expect("seat id")
    }

    fn sample_session() -> Session {
        let mut session = Session::new(Layout::new(2, 3).expect("layout"), OccupiedSeatPolicy::Overwrite);
        session
            .roster
            .import_roster(["Alice", "Bob", "Carol & Co", "Dan"], false);
        session.assign("Alice", seat("A1")).expect("alice");
        session.assign("Bob", seat("B3")).expect("bob");
        session.assign("Carol & Co", seat("A2")).expect("carol");
        session
    }

    #[test]
    fn export_then_reimport_reconstructs_mapping() {
        let session = sample_session();
        let bytes = render_workbook(&session, true).expect("render");
        let seats = parse_seating_chart(&bytes).expect("parse");

        let expected: BTreeMap<SeatId, String> = session
            .seats
            .iter()
            .map(|(s, n)| (s, n.to_string()))
            .collect();
        assert_eq!(seats, expected);
    }

    #[test]
    fn summary_sheet_counts_seats_and_students() {
        let session = sample_session();
        let bytes = render_workbook(&session, true).expect("render");
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).expect("open");
        assert_eq!(
            workbook.sheet_names(),
            vec![SEATING_SHEET.to_string(), SUMMARY_SHEET.to_string()]
        );
        let range = workbook.worksheet_range(SUMMARY_SHEET).expect("summary sheet");
        let rows: Vec<(String, String)> = range
            .rows()
            .map(|r| {
                (
                    cell_text(&r[0]).expect("label"),
                    cell_text(&r[1]).expect("value"),
                )
            })
            .collect();
        assert_eq!(rows[0], ("Total seats".to_string(), "6".to_string()));
        assert_eq!(rows[1], ("Occupied seats".to_string(), "3".to_string()));
        assert_eq!(rows[2], ("Empty seats".to_string(), "3".to_string()));
        assert_eq!(rows[3], ("Total students".to_string(), "4".to_string()));
        assert_eq!(rows[4], ("Unassigned students".to_string(), "1".to_string()));
    }

    #[test]
    fn grid_sheet_marks_empty_seats() {
        let session = sample_session();
        let bytes = render_workbook(&session, false).expect("render");
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).expect("open");
        assert_eq!(workbook.sheet_names().len(), 1);
        let range = workbook.worksheet_range(SEATING_SHEET).expect("grid sheet");
        let cells: Vec<String> = range
            .rows()
            .flat_map(|r| r.iter().filter_map(cell_text))
            .collect();
        assert!(cells.contains(&"Column 3".to_string()));
        assert!(cells.contains(&"Row B".to_string()));
        assert!(cells.contains(&"A3: (empty)".to_string()));
        assert!(cells.contains(&"A2: Carol & Co".to_string()));
    }

    #[test]
    fn file_name_embeds_timestamp() {
        let at = chrono::Local
            .with_ymd_and_hms(2026, 3, 9, 14, 5, 7)
            .single()
            .expect("local time");
        assert_eq!(export_file_name(at), "seating-chart_20260309_140507.xlsx");
    }

    #[test]
    fn empty_grid_reimports_as_empty_mapping() {
        let session = Session::default();
        let bytes = render_workbook(&session, false).expect("render");
        assert!(parse_seating_chart(&bytes).expect("parse").is_empty());
        assert!(parse_seating_chart(b"not a zip").is_err());
    }

    #[test]
    fn column_letters_follow_spreadsheet_order() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(10), "K");
        assert_eq!(column_letter(26), "AA");
    }
}
