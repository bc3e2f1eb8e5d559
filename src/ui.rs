use colored::Colorize;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim hint to stderr
pub fn hint(msg: &str) {
    eprintln!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a line diff between two texts. Returns whether anything differed.
pub fn print_diff(old: &str, new: &str) -> bool {
    let diff = similar::TextDiff::from_lines(old, new);
    let mut has_changes = false;

    for change in diff.iter_all_changes() {
        match change.tag() {
            similar::ChangeTag::Delete => {
                has_changes = true;
                print!("{}", format!("- {change}").red());
            }
            similar::ChangeTag::Insert => {
                has_changes = true;
                print!("{}", format!("+ {change}").green());
            }
            similar::ChangeTag::Equal => {
                print!("{}", format!("  {change}").dimmed());
            }
        }
    }

    has_changes
}

/// Lay out rows as left-aligned, space-padded columns
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = row_line(headers.iter().copied(), &widths);
    out.push('\n');
    for row in rows {
        out.push_str(&row_line(row.iter().map(String::as_str), &widths));
        out.push('\n');
    }
    out
}

fn row_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let line: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    line.join("   ").trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_alignment() {
        let out = table(
            &["NAME", "CREATED"],
            &[
                vec!["demo".to_string(), "2024-05-01 10:20:30".to_string()],
                vec!["a-much-longer-name".to_string(), String::new()],
            ],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "NAME                 CREATED");
        assert_eq!(lines[1], "demo                 2024-05-01 10:20:30");
        assert_eq!(lines[2], "a-much-longer-name");
    }

    #[test]
    fn test_table_empty_rows() {
        assert_eq!(table(&["A", "B"], &[]), "A   B\n");
    }

    #[test]
    fn test_print_diff_reports_changes() {
        assert!(print_diff("a\nb\n", "a\nc\n"));
        assert!(!print_diff("same\n", "same\n"));
    }
}
