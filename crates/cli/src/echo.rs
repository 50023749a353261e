use owo_colors::OwoColorize;
use sift_core::PipelineResult;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "Sift".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Extract main content with quality-gated fallbacks\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print timing information with color coding
pub fn print_timing(label: &str, duration: std::time::Duration) {
    let ms = duration.as_secs_f64() * 1000.0;
    let label = format!("{}:", label);
    if ms < 50.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "fast".dimmed());
    } else if ms < 100.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "moderate".bright_yellow());
    } else {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "slow".bright_red());
    }
}

/// Print which stage won and what was tried before it
pub fn print_extraction_details(result: &PipelineResult) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Extraction Details".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    eprintln!("  {} {}", "Stage:".dimmed(), result.stage.to_string().bright_white());
    eprintln!("  {} {}", "Score:".dimmed(), format!("{}/100", result.quality_score).bright_white());
    if result.fallbacks_used.is_empty() {
        eprintln!("  {} {}", "Fallbacks:".dimmed(), "none".dimmed());
    } else {
        eprintln!("  {} {}", "Fallbacks:".dimmed(), result.fallbacks_used.join(", ").bright_yellow());
    }
    if let Some(site) = &result.metadata.site {
        eprintln!(
            "  {} {} (shadow depth {}, confidence {})",
            "Site:".dimmed(),
            site.strategy.bright_white(),
            site.shadow_depth,
            site.quality_score
        );
    }
    print_timing("Pipeline", result.elapsed);
    eprintln!();
}

/// Print the quality report of the winning stage
pub fn print_report(result: &PipelineResult) {
    eprintln!("{}", "═".repeat(60).dimmed());
    eprint!("{}", result.quality_report);
    eprintln!("{}", "═".repeat(60).dimmed());
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
