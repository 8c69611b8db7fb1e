use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use crate::sweep::RegionReport;

#[allow(clippy::cast_precision_loss)]
fn share(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

pub fn generate_console_report(
    writer: &mut dyn Write,
    reports: &[RegionReport],
    total_duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Encounter Sweep Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "==========================".cyan())?;

    let total_regions = reports.len();
    let passed_regions = reports.iter().filter(|r| r.passed()).count();
    let failed_regions = total_regions - passed_regions;

    writeln!(writer, "Total regions: {total_regions}")?;
    writeln!(writer, "Passed: {}", passed_regions.to_string().green())?;
    writeln!(writer, "Failed: {}", failed_regions.to_string().red())?;
    writeln!(writer, "Total time: {total_duration:?}")?;
    writeln!(writer)?;

    for report in reports {
        let status = if report.passed() {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(writer, "{status} {}", report.region.bold())?;
        writeln!(
            writer,
            "   Seeds: {} x {} ticks, {} boss kills, {:?}",
            report.seeds.len(),
            report.ticks,
            report.boss_kills,
            report.duration
        )?;
        let total = report.total_encounters();
        for (kind, count) in &report.histogram {
            writeln!(
                writer,
                "   {kind:15} {count:6} ({:.1}%)",
                share(*count, total)
            )?;
        }
        if !report.violations.is_empty() {
            writeln!(writer, "   Violations:")?;
            for violation in &report.violations {
                writeln!(writer, "     • {}", violation.red())?;
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

pub fn generate_json_report(writer: &mut dyn Write, reports: &[RegionReport]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(reports)?;
    writeln!(writer, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(writer: &mut dyn Write, reports: &[RegionReport]) -> Result<()> {
    writeln!(writer, "# Wasteland Encounter Sweep\n")?;

    let passed = reports.iter().filter(|r| r.passed()).count();
    writeln!(writer, "## Summary\n")?;
    writeln!(writer, "- **Regions**: {}", reports.len())?;
    writeln!(writer, "- **Passed**: {passed}")?;
    writeln!(writer, "- **Failed**: {}\n", reports.len() - passed)?;

    writeln!(writer, "## Regions\n")?;
    for report in reports {
        let status = if report.passed() { "✅" } else { "❌" };
        writeln!(writer, "### {status} {}\n", report.region)?;
        writeln!(writer, "| Encounter | Count | Share |")?;
        writeln!(writer, "|---|---:|---:|")?;
        let total = report.total_encounters();
        for (kind, count) in &report.histogram {
            writeln!(writer, "| {kind} | {count} | {:.1}% |", share(*count, total))?;
        }
        writeln!(writer)?;
        if !report.violations.is_empty() {
            writeln!(writer, "- **Violations**:")?;
            for violation in &report.violations {
                writeln!(writer, "  - {violation}")?;
            }
            writeln!(writer)?;
        }
    }
    Ok(())
}
