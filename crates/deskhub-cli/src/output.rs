//! Output formatting for the CLI.

use clap::ValueEnum;
use deskhub_auth::Notice;
use serde::Serialize;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to encode output: {}", e),
    }
}

/// Print a success message.
pub fn print_success(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", message),
        OutputFormat::Json => {
            print_json(&serde_json::json!({ "status": "success", "message": message }));
        }
    }
}

/// Print an error message.
pub fn print_error(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {}", message),
        OutputFormat::Json => {
            eprintln!(
                "{}",
                serde_json::json!({ "status": "error", "message": message })
            );
        }
    }
}

/// Print a non-blocking notice on stderr. Stdout stays clean for JSON.
pub fn print_notice(notice: &Notice, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("{}: {}", notice.title, notice.description),
        OutputFormat::Json => eprintln!(
            "{}",
            serde_json::json!({ "status": "notice", "title": notice.title, "description": notice.description })
        ),
    }
}

/// Print a table row.
pub fn print_row(label: &str, value: &str) {
    println!("  {:<16} {}", format!("{}:", label), value);
}

/// Print a row only when the value is present.
pub fn print_opt_row(label: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        print_row(label, value);
    }
}

/// Print a divider line.
pub fn print_divider() {
    println!("{}", "-".repeat(50));
}

/// Print a heading.
pub fn print_heading(text: &str) {
    println!("\n{}", text);
    print_divider();
}

/// Trim a cell to `width` characters, marking the cut.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Footer for paginated lists.
pub fn print_page_footer(current: Option<u64>, last: Option<u64>, total: Option<u64>) {
    if let (Some(current), Some(last)) = (current, last) {
        match total {
            Some(total) => println!("\nPage {} of {} ({} total)", current, last, total),
            None => println!("\nPage {} of {}", current, last),
        }
        if current < last {
            println!("Use --page {} for more.", current + 1);
        }
    }
}
