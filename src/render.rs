//! Result set formatting
//!
//! Cells are formatted once (null token, temporal clean-up) and the formatted
//! grid is then laid out either as a padded text table or as an HTML table.

use crate::value::{ColumnInfo, Value};

/// Default display of NULL cells
pub const DEFAULT_NULL_REP: &str = "[null]";

/// Format one cell for display
///
/// Temporal values lose an all-zero fractional-seconds suffix, so
/// `2024-01-02 03:04:05.000` displays as `2024-01-02 03:04:05`.
pub fn format_cell(value: &Value, column: &ColumnInfo, null_rep: &str) -> String {
    let Some(text) = value.as_display() else {
        return null_rep.to_string();
    };
    if column.kind.is_temporal() {
        return strip_zero_fraction(&text).to_string();
    }
    text
}

fn strip_zero_fraction(text: &str) -> &str {
    match text.rfind('.') {
        Some(dot) if dot + 1 < text.len() && text[dot + 1..].bytes().all(|b| b == b'0') => {
            &text[..dot]
        }
        _ => text,
    }
}

/// Lay out a padded text table: header, dashed divider, rows
///
/// Columns are separated by two spaces; numeric columns are right-justified.
/// No line carries trailing whitespace.
pub fn text_table(columns: &[&ColumnInfo], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.label.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&layout_line(
        columns,
        &widths,
        columns.iter().map(|c| c.label.as_str()),
    ));
    out.push('\n');
    let divider: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&divider.join("  "));
    out.push('\n');
    for row in rows {
        out.push_str(&layout_line(columns, &widths, row.iter().map(String::as_str)));
        out.push('\n');
    }
    out
}

fn layout_line<'a>(
    columns: &[&ColumnInfo],
    widths: &[usize],
    cells: impl Iterator<Item = &'a str>,
) -> String {
    let mut line = String::new();
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        let pad = widths[i].saturating_sub(cell.chars().count());
        if columns[i].kind.right_justified() {
            line.push_str(&" ".repeat(pad));
            line.push_str(cell);
        } else {
            line.push_str(cell);
            line.push_str(&" ".repeat(pad));
        }
    }
    line.trim_end().to_string()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Lay out an HTML table
pub fn html_table(columns: &[&ColumnInfo], rows: &[Vec<String>]) -> String {
    let mut out = String::from("<table border=\"1\">\n  <tr>");
    for column in columns {
        out.push_str(&format!("<th>{}</th>", escape_html(&column.label)));
    }
    out.push_str("</tr>\n");
    for row in rows {
        out.push_str("  <tr>");
        for (i, cell) in row.iter().enumerate() {
            let align = if columns[i].kind.right_justified() {
                " align=\"right\""
            } else {
                ""
            };
            out.push_str(&format!("<td{}>{}</td>", align, escape_html(cell)));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<ColumnInfo> {
        vec![
            ColumnInfo::new("id", Some("INTEGER")),
            ColumnInfo::new("name", Some("VARCHAR(20)")),
        ]
    }

    #[test]
    fn test_text_table_layout() {
        let cols = columns();
        let refs: Vec<&ColumnInfo> = cols.iter().collect();
        let rows = vec![
            vec!["1".to_string(), "apple".to_string()],
            vec!["100".to_string(), "fig".to_string()],
        ];
        assert_eq!(
            text_table(&refs, &rows),
            " id  name\n---  -----\n  1  apple\n100  fig\n"
        );
    }

    #[test]
    fn test_html_escapes_cells() {
        let cols = columns();
        let refs: Vec<&ColumnInfo> = cols.iter().collect();
        let html = html_table(&refs, &[vec!["1".to_string(), "a<b".to_string()]]);
        assert!(html.contains("<th>id</th><th>name</th>"));
        assert!(html.contains("<td>a&lt;b</td>"));
        assert!(html.contains("<td align=\"right\">1</td>"));
    }

    #[test]
    fn test_format_cell() {
        let ts = ColumnInfo::new("at", Some("TIMESTAMP"));
        let text = ColumnInfo::new("t", Some("TEXT"));
        assert_eq!(
            format_cell(&Value::from("2024-01-02 03:04:05.000"), &ts, "[null]"),
            "2024-01-02 03:04:05"
        );
        assert_eq!(
            format_cell(&Value::from("2024-01-02 03:04:05.120"), &ts, "[null]"),
            "2024-01-02 03:04:05.120"
        );
        assert_eq!(format_cell(&Value::from("1.000"), &text, "[null]"), "1.000");
        assert_eq!(format_cell(&Value::Null, &text, "-"), "-");
    }
}
