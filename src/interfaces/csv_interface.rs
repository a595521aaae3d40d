use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use crate::data_structures::ReportRecord;
use crate::error::Result;
use crate::interfaces::timestamped_filename;

/// Spreadsheet tools only render non-ASCII text correctly when the UTF-8 file
/// carries a byte-order mark.
pub const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

const EMPTY_PLACEHOLDER: &str = "No records for the selected window";

/// Write one CSV per record set: BOM, header row from the field names, one row
/// per record. An empty set still yields a valid file with a single
/// explanatory placeholder row.
pub fn write_csv<R: ReportRecord>(dir: &Path, stem: &str, records: &[R]) -> Result<PathBuf> {
    let path = dir.join(timestamped_filename(stem, "csv"));

    let mut file = File::create(&path)?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(R::field_names())?;

    if records.is_empty() {
        let mut placeholder = vec![String::new(); R::field_names().len()];
        placeholder[0] = EMPTY_PLACEHOLDER.to_string();
        writer.write_record(&placeholder)?;
    } else {
        for record in records {
            writer.write_record(record.field_values())?;
        }
    }
    writer.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::TransportRuleRecord;
    use tempfile::tempdir;

    fn rules(n: usize) -> Vec<TransportRuleRecord> {
        (0..n)
            .map(|i| TransportRuleRecord {
                name: format!("Rule {}", i),
                state: "Enabled".to_string(),
                priority: i as i32,
            })
            .collect()
    }

    #[test]
    fn test_row_count_is_len_plus_header() {
        let dir = tempdir().unwrap();
        let path = write_csv(dir.path(), "rules", &rules(7)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text.lines().count(), 8);
        assert!(text.starts_with("Name,State,Priority"));
    }

    #[test]
    fn test_bom_prefix() {
        let dir = tempdir().unwrap();
        let path = write_csv(dir.path(), "rules", &rules(1)).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
    }

    #[test]
    fn test_empty_set_writes_placeholder_row() {
        let dir = tempdir().unwrap();
        let path = write_csv(dir.path(), "rules", &rules(0)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains(EMPTY_PLACEHOLDER));
    }
}
