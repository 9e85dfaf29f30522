//! Output helpers shared by commands

/// Calculate column widths for a table from headers and row data.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.len());
        }
    }
    widths
}

/// Render a left-aligned table: header row, dashed separator, data rows.
/// Columns are separated by two spaces.
pub(crate) fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths = calculate_column_widths(headers, rows);
    let render = |cells: &[&str]| -> String {
        let parts: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
            .collect();
        parts.join("  ").trim_end().to_string()
    };

    let dashes: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    let dashes: Vec<&str> = dashes.iter().map(String::as_str).collect();

    let mut lines = vec![render(headers), render(&dashes)];
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        lines.push(render(&cells));
    }
    lines.join("\n")
}

/// Print a formatted table to stdout.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    println!("{}", format_table(headers, rows));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_column_widths() {
        let rows = vec![vec!["001_create_users.sql".to_string(), "applied".to_string()]];
        assert_eq!(calculate_column_widths(&["FILENAME", "STATE"], &rows), vec![20, 7]);
    }

    #[test]
    fn test_format_table() {
        let rows = vec![
            vec!["001_a.sql".to_string(), "applied".to_string()],
            vec!["002_b.sql".to_string(), "pending".to_string()],
        ];
        let table = format_table(&["FILENAME", "STATE"], &rows);
        assert_eq!(
            table,
            "FILENAME   STATE\n---------  -------\n001_a.sql  applied\n002_b.sql  pending"
        );
    }

    #[test]
    fn test_format_table_no_rows() {
        assert_eq!(format_table(&["A", "BB"], &[]), "A  BB\n-  --");
    }
}
