//! Table output formatting

use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Rows},
};

/// Format rows as a rounded table with centered headers
pub fn format_table<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return "Nothing to show.".to_string();
    }

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelDisplay, ResolutionDisplay};
    use crate::playlist::Channel;

    #[test]
    fn test_format_table_empty() {
        let rows: Vec<ResolutionDisplay> = Vec::new();
        assert_eq!(format_table(&rows), "Nothing to show.");
    }

    #[test]
    fn test_format_table_channels() {
        let channel = Channel {
            id: "http://tv.example/1".to_string(),
            name: "Channel One".to_string(),
            url: "http://tv.example/1".to_string(),
            logo: String::new(),
            group: "News".to_string(),
        };
        let rows = vec![ChannelDisplay::from(&channel)];

        let result = format_table(&rows);

        assert!(result.contains("NAME"));
        assert!(result.contains("GROUP"));
        assert!(result.contains("Channel One"));
        assert!(result.contains("http://tv.example/1"));
    }

    #[test]
    fn test_format_table_skips_hidden_columns() {
        let rows = vec![ResolutionDisplay::new("http://x/a.m3u8", None)];

        let result = format_table(&rows);

        assert!(result.contains("unknown"));
        assert_eq!(result.matches("RESOLUTION").count(), 1);
    }
}
