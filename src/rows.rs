use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::FacilityRow;

/// Read facility records from a newline-delimited JSON file. Blank lines
/// are skipped; a line that fails to parse aborts the read with its line
/// number, since a half-read dataset would silently drop rows downstream.
pub(crate) fn read_rows(path: &Path) -> Result<Vec<FacilityRow>, Box<dyn std::error::Error>> {
    let file = File::open(path).map_err(|err| format!("open {}: {err}", path.display()))?;
    let reader = BufReader::new(file);
    let mut rows = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row: FacilityRow = serde_json::from_str(&line)
            .map_err(|err| format!("{} line {}: {err}", path.display(), lineno + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

pub(crate) fn write_rows(
    path: &Path,
    rows: &[FacilityRow],
) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(path).map_err(|err| format!("create {}: {err}", path.display()))?;
    let mut out = BufWriter::new(file);
    for row in rows {
        let json = serde_json::to_string(row)?;
        writeln!(out, "{json}")?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("rcra_enrich_test");
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(format!("rows_{}_{name}.ndjson", std::process::id()))
    }

    #[test]
    fn test_roundtrip_preserves_order_and_fields() {
        let path = temp_path("roundtrip");
        let rows = vec![
            FacilityRow {
                handler_id: Some("TX2".to_string()),
                area_name: Some("Unit 1".to_string()),
                ..FacilityRow::default()
            },
            FacilityRow {
                handler_id: Some("TX1".to_string()),
                site_area_acreage: Some(4.5),
                ..FacilityRow::default()
            },
        ];
        write_rows(&path, &rows).unwrap();
        let back = read_rows(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].handler_id.as_deref(), Some("TX2"));
        assert_eq!(back[0].area_name.as_deref(), Some("Unit 1"));
        assert_eq!(back[1].handler_id.as_deref(), Some("TX1"));
        assert_eq!(back[1].site_area_acreage, Some(4.5));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_blank_lines_are_skipped_and_bad_lines_name_their_number() {
        let path = temp_path("bad_line");
        std::fs::write(
            &path,
            "{\"HANDLER_ID\":\"TX1\"}\n\n{not valid json}\n",
        )
        .unwrap();
        let err = read_rows(&path).unwrap_err().to_string();
        assert!(err.contains("line 3"), "unexpected error: {err}");
        std::fs::remove_file(&path).ok();
    }
}
