use serde::Serialize;

pub trait OutputFormatter {
    fn format_text(&self) -> String;
    fn format_json(&self, pretty: bool) -> crate::Result<String>;
}

pub fn print_output<T: OutputFormatter>(
    data: &T,
    as_json: bool,
    json_pretty: bool,
) -> crate::Result<()> {
    let output = if as_json {
        data.format_json(json_pretty)?
    } else {
        data.format_text()
    };

    println!("{}", output);
    Ok(())
}

pub fn to_json<T: Serialize>(data: &T, pretty: bool) -> crate::Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(data)?)
    } else {
        Ok(serde_json::to_string(data)?)
    }
}

pub mod text {
    use colored::Colorize;

    pub fn success(msg: &str) -> String {
        format!("{} {}", "✓".green().bold(), msg)
    }

    pub fn error(msg: &str) -> String {
        format!("{} {}", "✗".red().bold(), msg)
    }

    pub fn warning(msg: &str) -> String {
        format!("{} {}", "⚠".yellow().bold(), msg)
    }

    pub fn info(msg: &str) -> String {
        format!("{} {}", "ℹ".blue().bold(), msg)
    }

    pub fn bullet(msg: &str) -> String {
        format!("  • {}", msg)
    }

    pub fn section(title: &str) -> String {
        format!("\n{}\n{}", title.bold(), "─".repeat(title.len()))
    }

    pub fn subsection(title: &str) -> String {
        format!("\n{}", title.bold())
    }

    pub fn key_value(key: &str, value: &str) -> String {
        format!("  {}: {}", key.bold(), value)
    }

    /// Char-aware, so multi-byte transcript text never splits mid-character.
    pub fn truncate(s: &str, max_chars: usize) -> String {
        if s.chars().count() <= max_chars {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
            format!("{}...", kept)
        }
    }

    pub fn format_duration_ms(ms: u64) -> String {
        if ms >= 1000 {
            format!("{:.2}s", ms as f64 / 1000.0)
        } else {
            format!("{}ms", ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(text::truncate("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        let result = text::truncate("hello world this is a long string", 15);
        assert_eq!(result.chars().count(), 15);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_truncate_multibyte() {
        let result = text::truncate("これは長い字幕のテキストです", 8);
        assert_eq!(result, "これは長い...");
    }

    #[test]
    fn test_format_duration_ms() {
        assert_eq!(text::format_duration_ms(500), "500ms");
    }

    #[test]
    fn test_format_duration_seconds() {
        assert_eq!(text::format_duration_ms(2500), "2.50s");
    }

    #[test]
    fn test_to_json_not_pretty() {
        #[derive(Serialize)]
        struct Segment {
            timestamp: String,
        }
        let data = Segment {
            timestamp: "0:00".to_string(),
        };
        let json = to_json(&data, false).unwrap();
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&vec![("0:00", "hi")], true).unwrap();
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_success_message() {
        let msg = text::success("Transcript saved");
        assert!(msg.contains("Transcript saved"));
    }

    #[test]
    fn test_error_message() {
        let msg = text::error("Video not accessible");
        assert!(msg.contains("Video not accessible"));
    }

    #[test]
    fn test_key_value() {
        let msg = text::key_value("Segments", "42");
        assert!(msg.contains("Segments"));
        assert!(msg.contains("42"));
    }
}
