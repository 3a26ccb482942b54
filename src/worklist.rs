// Work-list parsing: one CSV row per conversion job

use crate::models::WorkItem;
use crate::utils::ResultExt;
use std::path::Path;

/// Required and optional header names of a work-list file.
pub const COLUMN_SOURCE: &str = "원본파일경로";
pub const COLUMN_KEYWORD: &str = "키워드";
pub const COLUMN_PRESET: &str = "프리셋파일";

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Split one CSV line into fields, honoring double-quoted fields with
/// embedded commas and `""` escapes. The work-list format is simple enough
/// that this small state machine covers everything operators produce.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Quote a field for CSV output when it needs it.
pub fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Parse a work-list file into work items.
///
/// A leading UTF-8 byte-order mark is tolerated. Rows missing a required
/// field, and rows whose source file does not exist, are skipped with a
/// warning rather than failing the whole list. A missing required *column*
/// is fatal.
pub fn parse_work_list(path: &Path) -> Result<Vec<WorkItem>, String> {
    let raw = std::fs::read(path)
        .with_context(&format!("Failed to read work list '{}'", path.display()))?;
    let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(&raw);
    let content = std::str::from_utf8(raw)
        .with_context(&format!("Work list '{}' is not valid UTF-8", path.display()))?;

    let mut lines = content.lines();
    let header_line = lines
        .next()
        .ok_or_else(|| format!("Work list '{}' is empty", path.display()))?;
    let header = split_csv_line(header_line);

    let source_col = header
        .iter()
        .position(|h| h == COLUMN_SOURCE)
        .ok_or_else(|| format!("Work list is missing the '{}' column", COLUMN_SOURCE))?;
    let keyword_col = header
        .iter()
        .position(|h| h == COLUMN_KEYWORD)
        .ok_or_else(|| format!("Work list is missing the '{}' column", COLUMN_KEYWORD))?;
    let preset_col = header.iter().position(|h| h == COLUMN_PRESET);

    let mut items = Vec::new();
    for (index, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_csv_line(line);
        let source = fields.get(source_col).map(String::as_str).unwrap_or("");
        let keyword = fields.get(keyword_col).map(String::as_str).unwrap_or("");

        if source.is_empty() || keyword.is_empty() {
            log::warn!(
                "[WorkList] row {} skipped: missing source path or keyword",
                index + 1
            );
            continue;
        }
        if !Path::new(source).exists() {
            log::warn!(
                "[WorkList] row {} skipped: source file does not exist - {}",
                index + 1,
                source
            );
            continue;
        }

        let mut item = WorkItem::new(index, source, keyword);
        if let Some(col) = preset_col {
            if let Some(preset) = fields.get(col) {
                item = item.with_preset_ref(preset.clone());
            }
        }
        items.push(item);
    }

    log::info!(
        "[WorkList] loaded {} item(s) from '{}'",
        items.len(),
        path.display()
    );
    Ok(items)
}
