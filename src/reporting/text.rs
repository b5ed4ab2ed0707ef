use crate::reporting::model::{Finding, Severity};
use std::fmt::Write;
use unicode_width::UnicodeWidthStr;

// ==============================
// BOX CONFIGURATION
// ==============================

const BOX_WIDTH: usize = 70;
const INNER_WIDTH: usize = BOX_WIDTH - 2;

/// Longest evidence excerpt shown per finding
const MAX_EXCERPT: usize = 200;

// ==============================
// BOX RENDERING HELPERS
// ==============================

fn visual_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

fn top_border() -> String {
    format!("╔{}╗", "═".repeat(INNER_WIDTH))
}

fn middle_border() -> String {
    format!("╠{}╣", "═".repeat(INNER_WIDTH))
}

fn bottom_border() -> String {
    format!("╚{}╝", "═".repeat(INNER_WIDTH))
}

/// Left-aligned box line (emoji-safe)
fn box_line(content: &str) -> String {
    let safe_content = format!(" {} ", content);
    let width = visual_width(&safe_content);

    let padding = INNER_WIDTH.saturating_sub(width);
    format!("║{}{}║", safe_content, " ".repeat(padding))
}

/// Centered box line (emoji-safe)
fn box_line_centered(content: &str) -> String {
    let safe_content = format!(" {} ", content);
    let width = visual_width(&safe_content);

    if width >= INNER_WIDTH {
        return box_line(content);
    }

    let remaining = INNER_WIDTH - width;
    let left = remaining / 2;
    let right = remaining - left;

    format!(
        "║{}{}{}║",
        " ".repeat(left),
        safe_content,
        " ".repeat(right)
    )
}

fn excerpt(s: &str) -> &str {
    if s.len() <= MAX_EXCERPT {
        return s;
    }
    let mut cut = MAX_EXCERPT;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    &s[..cut]
}

// ==============================
// MAIN REPORT RENDERER
// ==============================

pub fn render(findings: &[Finding]) -> String {
    let mut out = String::new();

    if findings.is_empty() {
        let _ = writeln!(out, "{}", top_border());
        let _ = writeln!(out, "{}", box_line_centered("SCAN COMPLETE"));
        let _ = writeln!(out, "{}", middle_border());
        let _ = writeln!(out, "{}", box_line("✅ No injection signals detected"));
        let _ = writeln!(out, "{}", bottom_border());
        return out;
    }

    let count = |sev: Severity| findings.iter().filter(|f| f.severity == sev).count();

    let _ = writeln!(out, "{}", top_border());
    let _ = writeln!(out, "{}", box_line_centered("INJECTION SIGNALS DETECTED"));
    let _ = writeln!(out, "{}", middle_border());
    let _ = writeln!(out, "{}", box_line(&format!("Total Findings: {}", findings.len())));
    for sev in [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ] {
        let n = count(sev);
        if n > 0 {
            let _ = writeln!(out, "{}", box_line(&format!("{}: {}", sev, n)));
        }
    }
    let _ = writeln!(out, "{}", bottom_border());

    for (idx, f) in findings.iter().enumerate() {
        let _ = writeln!(out, "\n{}", "═".repeat(80));
        let _ = writeln!(
            out,
            "FINDING #{}: {} [{}]",
            idx + 1,
            f.channel.vuln_type(),
            f.severity
        );
        let _ = writeln!(out, "{}", "═".repeat(80));

        let _ = writeln!(out, "   Channel:    {}", f.channel);
        let _ = writeln!(out, "   CWE:        {}", f.cwe);
        let _ = writeln!(out, "   Confidence: {:.0}%", f.confidence * 100.0);
        let _ = writeln!(out, "   Endpoint:   {} {}", f.http_method, f.url);
        let _ = writeln!(out, "   Parameter:  {}", f.parameter);
        if f.dynamic_parameter {
            let _ = writeln!(out, "               (dynamic parameter)");
        }
        if let Some(engine) = &f.engine {
            let _ = writeln!(out, "   Database:   {}", engine);
        }
        let _ = writeln!(out, "   Payload:    {}", f.payload);
        if !f.evidence.is_empty() {
            let _ = writeln!(out, "   Evidence:   {}", excerpt(&f.evidence));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::model::Channel;

    #[test]
    fn test_box_lines_have_fixed_width() {
        for line in [box_line("plain"), box_line_centered("🎉 emoji")] {
            assert_eq!(visual_width(&line), BOX_WIDTH);
        }
    }

    #[test]
    fn test_render_lists_findings() {
        let finding = Finding::new(Channel::ErrorBased, "t", "http://t/?id=1", "id", "1'")
            .with_engine("MySQL");
        let text = render(&[finding]);
        assert!(text.contains("Total Findings: 1"));
        assert!(text.contains("Database:   MySQL"));
        assert!(text.contains("error-based"));
    }

    #[test]
    fn test_render_empty() {
        assert!(render(&[]).contains("No injection signals detected"));
    }
}
