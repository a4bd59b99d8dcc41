use chrono::NaiveDateTime;

/// Truncate to at most `max_len` characters, adding an ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Short timestamp for chat lines, e.g. "May 01 10:00"
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%b %d %H:%M").to_string()
}

/// "Page 2" / "Page 2 (last)" for the books pager. Pages are zero-based.
pub fn page_label(page: usize, has_next: bool) -> String {
    if has_next {
        format!("Page {}", page + 1)
    } else {
        format!("Page {} (last)", page + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
        assert_eq!(truncate("Hello", 2), "He");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("Ça va très bien", 8), "Ça va...");
        assert_eq!(truncate("日本語の本", 5), "日本語の本");
    }

    #[test]
    fn test_format_timestamp() {
        let ts = NaiveDateTime::parse_from_str("2024-05-01 10:07:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(format_timestamp(&ts), "May 01 10:07");
    }

    #[test]
    fn test_page_label() {
        assert_eq!(page_label(0, true), "Page 1");
        assert_eq!(page_label(2, false), "Page 3 (last)");
    }
}
