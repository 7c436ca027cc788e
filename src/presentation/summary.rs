// Human-readable build report
use crate::domain::model::BuildSummary;
use colored::Colorize;
use std::fmt::Write;
use std::path::Path;

/// Terminal report printed after a build. Failed names are listed so the
/// user can fix typos or pin coordinates without digging through logs.
pub fn format_summary(summary: &BuildSummary, flush_warning: bool, output_file: &Path) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", "Build Summary".green().bold());
    let _ = writeln!(out, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    let _ = writeln!(
        out,
        "Markers: {} placed in {} groups",
        summary.markers_placed, summary.groups_formed
    );
    let _ = writeln!(
        out,
        "Resolved: {} from cache, {} fresh, {} explicit",
        summary.from_cache, summary.freshly_resolved, summary.explicit
    );
    if summary.offscreen_groups > 0 {
        let _ = writeln!(
            out,
            "Off-screen: {} groups outside the initial view",
            summary.offscreen_groups
        );
    }

    if summary.failed > 0 {
        let _ = writeln!(
            out,
            "{}",
            format!("Failed lookups: {}", summary.failed).yellow()
        );
        for name in &summary.failed_queries {
            let _ = writeln!(out, "  - {}", name);
        }
    }

    if flush_warning {
        let _ = writeln!(
            out,
            "{}",
            "Warning: cache not saved; fresh lookups will repeat next run".yellow()
        );
    }

    let _ = writeln!(out, "Output: {}", output_file.display().to_string().cyan());

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_colors() {
        colored::control::set_override(false);
    }

    fn sample_summary() -> BuildSummary {
        BuildSummary {
            from_cache: 5,
            freshly_resolved: 2,
            explicit: 1,
            failed: 0,
            markers_placed: 8,
            groups_formed: 6,
            offscreen_groups: 0,
            failed_queries: Vec::new(),
        }
    }

    #[test]
    fn clean_build_omits_failure_lines() {
        quiet_colors();
        let text = format_summary(&sample_summary(), false, Path::new("output/index.html"));
        assert!(text.contains("Markers: 8 placed in 6 groups"));
        assert!(text.contains("Resolved: 5 from cache, 2 fresh, 1 explicit"));
        assert!(text.contains("Output: output/index.html"));
        assert!(!text.contains("Failed lookups"));
        assert!(!text.contains("Warning"));
        assert!(!text.contains("Off-screen"));
    }

    #[test]
    fn failed_names_are_listed() {
        quiet_colors();
        let mut summary = sample_summary();
        summary.failed = 2;
        summary.failed_queries = vec!["Atlantis".to_string(), "Middle Earth".to_string()];
        let text = format_summary(&summary, false, Path::new("output/index.html"));
        assert!(text.contains("Failed lookups: 2"));
        assert!(text.contains("  - Atlantis"));
        assert!(text.contains("  - Middle Earth"));
    }

    #[test]
    fn flush_warning_is_surfaced() {
        quiet_colors();
        let text = format_summary(&sample_summary(), true, Path::new("out/index.html"));
        assert!(text.contains("cache not saved"));
    }

    #[test]
    fn offscreen_groups_appear_when_present() {
        quiet_colors();
        let mut summary = sample_summary();
        summary.offscreen_groups = 3;
        let text = format_summary(&summary, false, Path::new("out/index.html"));
        assert!(text.contains("Off-screen: 3 groups"));
    }
}
