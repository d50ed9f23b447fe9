//! Terminal summary of the hottest entries.
//!
//! Rows are tinted with the same theme color the SVG uses for the category,
//! so the terminal and the graph agree at a glance.

use super::color::{color_for, Rgb, Theme};
use crate::aggregator::{calculate_hot_entries, percentage_of, AggregateTable};
use crate::parser::schema::TimeUnit;

const RESET: &str = "\x1b[0m";
const LABEL_WIDTH: usize = 42;

fn ansi(color: Rgb) -> String {
    format!("\x1b[38;2;{};{};{}m", color.r, color.g, color.b)
}

/// Keep the tail of a long label, which is the part that differs
fn truncate_front(label: &str, width: usize) -> String {
    let chars: Vec<char> = label.chars().collect();
    if chars.len() <= width {
        return label.to_string();
    }
    let tail: String = chars[chars.len() - (width - 3)..].iter().collect();
    format!("...{}", tail)
}

/// Create a text summary with a hot entry table and a bar chart per owner
///
/// **Public** - printed by `generate --summary`
pub fn generate_text_summary(
    table: &AggregateTable,
    unit: TimeUnit,
    theme: Theme,
    max_lines: usize,
) -> String {
    let total = table.total_cost();
    let hot = calculate_hot_entries(table, total, max_lines);
    let mut lines = Vec::new();

    lines.push("  HOT ENTRIES".to_string());
    lines.push(format!(
        "  ┏{}┳{}┳{}┳{}┓",
        "━".repeat(LABEL_WIDTH + 2),
        "━".repeat(16),
        "━".repeat(10),
        "━".repeat(9)
    ));
    lines.push(format!(
        "  ┃ {:<w$} ┃ {:^14} ┃ {:^8} ┃ {:^7} ┃",
        "Owner / Category (Hottest First)",
        unit.label(),
        "COUNT",
        "%",
        w = LABEL_WIDTH
    ));
    lines.push(format!(
        "  ┣{}╋{}╋{}╋{}┫",
        "━".repeat(LABEL_WIDTH + 2),
        "━".repeat(16),
        "━".repeat(10),
        "━".repeat(9)
    ));

    for entry in &hot {
        let label = truncate_front(&format!("{} / {}", entry.owner, entry.category), LABEL_WIDTH);
        lines.push(format!(
            "  ┃ {}{:<w$}{} ┃ {:>14.2} ┃ {:>8} ┃ {:>6.1}% ┃",
            ansi(color_for(&entry.category, theme)),
            label,
            RESET,
            entry.cost,
            entry.count,
            entry.percentage,
            w = LABEL_WIDTH
        ));
    }

    lines.push(format!(
        "  ┗{}┻{}┻{}┻{}┛",
        "━".repeat(LABEL_WIDTH + 2),
        "━".repeat(16),
        "━".repeat(10),
        "━".repeat(9)
    ));

    lines.push(String::new());
    lines.push("  OWNERS".to_string());
    lines.push(format!("  all {} 100%", "█".repeat(50)));

    for (owner, entries) in table.by_owner() {
        let cost: f64 = entries.iter().map(|e| e.cost).sum();
        let percentage = percentage_of(cost, total);
        let bar = "█".repeat((percentage / 2.0) as usize);
        let color = ansi(color_for(owner, theme));

        lines.push(format!(
            "  └─ {}{:<20}{} {}{:50}{} {:>5.1}%",
            color,
            truncate_front(owner, 20),
            RESET,
            color,
            bar,
            RESET,
            percentage
        ));
    }

    if table.len() > max_lines {
        lines.push(String::new());
        lines.push(format!(
            "   (Showing top {} of {} entries)",
            max_lines,
            table.len()
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::aggregate;
    use crate::parser::Record;

    #[test]
    fn test_summary_lists_hottest_first() {
        let table = aggregate(&[
            Record::new("n1", "bulk", 10.0),
            Record::new("n1", "search", 70.0),
            Record::new("n2", "refresh", 20.0),
        ]);
        let summary = generate_text_summary(&table, TimeUnit::Millis, Theme::Hot, 2);

        let search = summary.find("n1 / search").unwrap();
        let refresh = summary.find("n2 / refresh").unwrap();
        assert!(search < refresh);
        assert!(!summary.contains("n1 / bulk"));
        assert!(summary.contains("70.0%"));
        assert!(summary.contains("Showing top 2 of 3 entries"));
    }

    #[test]
    fn test_truncate_front_keeps_tail() {
        assert_eq!(truncate_front("short", 10), "short");
        assert_eq!(truncate_front("abcdefghijkl", 8), "...hijkl");
    }
}
