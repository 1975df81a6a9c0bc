//! CSV import and export of the roster.

use thiserror::Error;

use crate::models::record::{CardField, CardRecord, Roster};
use crate::roster::aliases::{canonical_header, field_for_header};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("no column matches a known header")]
    NoKnownColumns,

    #[error("failed to write CSV: {0}")]
    Write(String),
}

/// Reads a roster from CSV. The first row is the header row.
///
/// Columns are matched to fields through the alias table; the first column
/// matching a field wins and the rest are ignored. Rows whose mapped cells are
/// all blank are skipped. Every imported row gets a fresh id.
pub fn import_csv(data: &[u8]) -> Result<Roster, RosterError> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let mut columns: Vec<(CardField, usize)> = Vec::new();
    for (index, header) in reader.headers()?.iter().enumerate() {
        if let Some(field) = field_for_header(header) {
            if !columns.iter().any(|(f, _)| *f == field) {
                columns.push((field, index));
            }
        }
    }
    if columns.is_empty() {
        return Err(RosterError::NoKnownColumns);
    }

    let mut roster = Roster::default();
    for row in reader.records() {
        let row = row?;
        let mut record = CardRecord::blank();
        for &(field, index) in &columns {
            // Short rows read as empty cells.
            record.set_field(field, row.get(index).unwrap_or("").trim());
        }
        if !record.is_blank() {
            roster.push(record);
        }
    }
    Ok(roster)
}

/// Writes records as CSV with the canonical header of each field, in field
/// order. Output starts with a BOM so spreadsheet tools detect UTF-8.
pub fn export_csv(records: &[CardRecord]) -> Result<Vec<u8>, RosterError> {
    let mut writer = csv::WriterBuilder::new().from_writer(UTF8_BOM.to_vec());
    writer.write_record(CardField::ALL.map(canonical_header))?;
    for record in records {
        writer.write_record(CardField::ALL.map(|f| record.field(f)))?;
    }
    writer
        .into_inner()
        .map_err(|e| RosterError::Write(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imports_aliased_columns_and_ignores_the_rest() {
        let csv = "\u{FEFF}Email,姓名,Pinyin,公司,Organization\n\
                   a@x.cn,张伟,Zhang Wei,星辰科技,Star Tech\n";
        let roster = import_csv(csv.as_bytes()).unwrap();
        assert_eq!(roster.len(), 1);
        let r = &roster.records()[0];
        assert_eq!(r.chinese_name, "张伟");
        assert_eq!(r.english_name, "Zhang Wei");
        assert_eq!(r.chinese_company, "星辰科技");
        assert_eq!(r.english_company, "Star Tech");
        assert!(!r.id.is_empty());
    }

    #[test]
    fn skips_blank_rows_and_pads_short_ones() {
        let csv = "中文名,英文名,中文单位\n李娜,Li Na,\n,,\n王芳\n";
        let roster = import_csv(csv.as_bytes()).unwrap();
        let names: Vec<_> = roster.records().iter().map(|r| r.chinese_name.as_str()).collect();
        assert_eq!(names, ["李娜", "王芳"]);
        assert_eq!(roster.records()[1].english_name, "");
    }

    #[test]
    fn each_row_gets_its_own_id() {
        let csv = "Name\nA\nB\n";
        let roster = import_csv(csv.as_bytes()).unwrap();
        assert_ne!(roster.records()[0].id, roster.records()[1].id);
    }

    #[test]
    fn unknown_headers_are_an_error() {
        assert!(matches!(
            import_csv(b"Email,Phone\na,b\n"),
            Err(RosterError::NoKnownColumns)
        ));
    }

    #[test]
    fn export_uses_canonical_headers_and_reimports() {
        let mut record = CardRecord::blank();
        record.chinese_name = "张伟".to_string();
        record.english_company = "Star, Tech".to_string();
        let out = export_csv(&[record]).unwrap();

        assert!(out.starts_with(UTF8_BOM));
        let text = String::from_utf8(out[UTF8_BOM.len()..].to_vec()).unwrap();
        assert!(text.starts_with("中文名,英文名,中文单位,英文单位\n"));

        let roster = import_csv(&out).unwrap();
        assert_eq!(roster.records()[0].chinese_name, "张伟");
        assert_eq!(roster.records()[0].english_company, "Star, Tech");
    }
}
