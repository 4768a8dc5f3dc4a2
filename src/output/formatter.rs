//! Output formatters for probe results
//!
//! Provides table, JSON, CSV and summary output formats.

use serde::Serialize;
use std::collections::HashMap;

use crate::models::{ProbeResult, ProbeStatus, ProbeSummary};
use crate::probes::ProbeAggregate;

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    JsonPretty,
    Csv,
    Summary,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "json" => Some(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Some(OutputFormat::JsonPretty),
            "csv" => Some(OutputFormat::Csv),
            "summary" => Some(OutputFormat::Summary),
            _ => None,
        }
    }

    fn to_json<T: Serialize>(self, value: &T) -> String {
        let json = if self == OutputFormat::JsonPretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        json.unwrap_or_default()
    }
}

/// Probe result formatter
pub struct ResultFormatter {
    format: OutputFormat,
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            colorize: true,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    /// Format a single probe result
    pub fn format_result(&self, result: &ProbeResult) -> String {
        match self.format {
            OutputFormat::Table => self.format_result_table(result),
            OutputFormat::Json | OutputFormat::JsonPretty => self.format.to_json(result),
            OutputFormat::Csv => self.format_result_csv(result),
            OutputFormat::Summary => self.format_result_summary(result),
        }
    }

    fn status_label(&self, status: ProbeStatus) -> &'static str {
        match (status, self.colorize) {
            (ProbeStatus::Pass, true) => "\x1b[32m✓ PASS\x1b[0m",
            (ProbeStatus::Fail, true) => "\x1b[31m✗ FAIL\x1b[0m",
            (ProbeStatus::Skip, true) => "\x1b[33m○ SKIP\x1b[0m",
            (ProbeStatus::Pass, false) => "✓ PASS",
            (ProbeStatus::Fail, false) => "✗ FAIL",
            (ProbeStatus::Skip, false) => "○ SKIP",
        }
    }

    fn format_result_table(&self, result: &ProbeResult) -> String {
        format!(
            "{:2}. {:20} {} [{:>6}ms]",
            result.probe.number(),
            result.probe.name(),
            self.status_label(result.status),
            result.duration_ms
        )
    }

    fn format_result_csv(&self, result: &ProbeResult) -> String {
        format!(
            "{},{},{},{},\"{}\"",
            result.probe.number(),
            result.probe.name(),
            result.status,
            result.duration_ms,
            result.message.as_deref().unwrap_or("").replace('"', "\"\"")
        )
    }

    fn format_result_summary(&self, result: &ProbeResult) -> String {
        format!(
            "{} {} ({}ms)",
            result.status.symbol(),
            result.probe.name(),
            result.duration_ms
        )
    }

    /// Format a probe round summary
    pub fn format_summary(&self, summary: &ProbeSummary) -> String {
        match self.format {
            OutputFormat::Table => self.format_summary_table(summary),
            OutputFormat::Json | OutputFormat::JsonPretty => self.format.to_json(summary),
            OutputFormat::Csv => self.format_summary_csv(summary),
            OutputFormat::Summary => self.format_summary_brief(summary),
        }
    }

    fn format_summary_table(&self, summary: &ProbeSummary) -> String {
        let mut output = String::new();

        output.push_str("\n╔══════════════════════════════════════════════════════════════╗\n");
        output.push_str(&format!(
            "║  Round {:3} - {:46} ║\n",
            summary.round,
            format!("{} loop", summary.flavor)
        ));
        output.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        for result in &summary.results {
            output.push_str(&format!("║  {}\n", self.format_result_table(result)));
            if result.status == ProbeStatus::Fail {
                if let Some(message) = &result.message {
                    output.push_str(&format!("║      {message}\n"));
                }
            }
        }

        output.push_str("╠══════════════════════════════════════════════════════════════╣\n");

        let fail_str = if self.colorize && summary.failed > 0 {
            format!("\x1b[31m{}\x1b[0m", summary.failed)
        } else {
            summary.failed.to_string()
        };

        output.push_str(&format!(
            "║  Total: {:2} | Pass: {:2} | Fail: {} | Skip: {:2}\n",
            summary.total, summary.passed, fail_str, summary.skipped
        ));
        output.push_str(&format!(
            "║  Pass Rate: {:5.1}% | Duration: {:6}ms\n",
            summary.pass_rate(),
            summary.total_duration_ms
        ));
        output.push_str("╚══════════════════════════════════════════════════════════════╝\n");

        output
    }

    fn format_summary_csv(&self, summary: &ProbeSummary) -> String {
        let mut output = String::new();
        output.push_str("probe_num,probe_name,status,duration_ms,message\n");
        for result in &summary.results {
            output.push_str(&self.format_result_csv(result));
            output.push('\n');
        }
        output
    }

    fn format_summary_brief(&self, summary: &ProbeSummary) -> String {
        format!(
            "{} loop - Round {}: {}/{} passed, {} skipped ({:.1}%) in {}ms",
            summary.flavor,
            summary.round,
            summary.passed,
            summary.total,
            summary.skipped,
            summary.pass_rate(),
            summary.total_duration_ms
        )
    }

    /// Format results aggregated over several rounds
    pub fn format_aggregate(&self, aggregate: &ProbeAggregate, flavor: &str) -> String {
        match self.format {
            OutputFormat::Json | OutputFormat::JsonPretty => {
                #[derive(Serialize)]
                struct AggregateJson<'a> {
                    flavor: &'a str,
                    total_rounds: u32,
                    probe_pass_rates: HashMap<&'static str, f64>,
                }

                let json = AggregateJson {
                    flavor,
                    total_rounds: aggregate.total_rounds,
                    probe_pass_rates: aggregate
                        .stats
                        .iter()
                        .filter(|(_, s)| s.passes + s.failures > 0)
                        .map(|(probe, s)| (probe.name(), s.pass_rate()))
                        .collect(),
                };
                self.format.to_json(&json)
            }
            _ => self.format_aggregate_table(aggregate, flavor),
        }
    }

    fn format_aggregate_table(&self, aggregate: &ProbeAggregate, flavor: &str) -> String {
        let mut output = String::new();

        output.push_str("\n═══════════════════════════════════════════════════════════════\n");
        output.push_str(&format!(
            " Aggregate Results: {} loop ({} rounds)\n",
            flavor, aggregate.total_rounds
        ));
        output.push_str("═══════════════════════════════════════════════════════════════\n");
        output.push_str(" Probe Pass Rates:\n");
        output.push_str(" ───────────────────────────────────────────────────────────\n");

        let mut probes: Vec<_> = aggregate.stats.iter().collect();
        probes.sort_by_key(|(probe, _)| probe.number());

        for (probe, stats) in probes {
            if stats.passes + stats.failures == 0 {
                output.push_str(&format!(
                    " {:2}. {:20} skipped\n",
                    probe.number(),
                    probe.name()
                ));
                continue;
            }

            let rate = stats.pass_rate();
            let bar_len = ((rate / 5.0) as usize).min(20);
            let rate_str = if self.colorize && rate < 100.0 {
                format!("\x1b[31m{rate:5.1}%\x1b[0m")
            } else {
                format!("{rate:5.1}%")
            };

            output.push_str(&format!(
                " {:2}. {:20} {}{} {}\n",
                probe.number(),
                probe.name(),
                "█".repeat(bar_len),
                "░".repeat(20 - bar_len),
                rate_str
            ));
        }

        output.push_str(" ───────────────────────────────────────────────────────────\n");

        let flaky = aggregate.flaky_probes();
        if !flaky.is_empty() {
            output.push_str("\n Flaky Probes (< 100% pass rate):\n");
            for (probe, rate) in &flaky {
                output.push_str(&format!("   - {} ({:.1}%)\n", probe.name(), rate));
            }
        }

        output
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(OutputFormat::Table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProbeCase;
    use chrono::Utc;

    fn sample_summary() -> ProbeSummary {
        ProbeSummary::new(
            1,
            "current-thread",
            Utc::now(),
            vec![
                ProbeResult::pass(ProbeCase::ImmediateValue, 1),
                ProbeResult::fail(ProbeCase::SlowInvocation, 300, "run took \"300ms\""),
            ],
        )
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("TABLE"), Some(OutputFormat::Table));
        assert_eq!(OutputFormat::from_str("unknown"), None);
    }

    #[test]
    fn test_format_result_summary() {
        let result = ProbeResult::pass(ProbeCase::NestedChildren, 4);
        let formatter = ResultFormatter::new(OutputFormat::Summary);
        assert_eq!(formatter.format_result(&result), "✓ Nested Children (4ms)");
    }

    #[test]
    fn test_format_summary_csv_escapes_quotes() {
        let formatter = ResultFormatter::new(OutputFormat::Csv);
        let output = formatter.format_summary(&sample_summary());

        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines[0], "probe_num,probe_name,status,duration_ms,message");
        assert_eq!(lines[2], "3,Slow Invocation,FAIL,300,\"run took \"\"300ms\"\"\"");
    }

    #[test]
    fn test_format_summary_json() {
        let formatter = ResultFormatter::new(OutputFormat::Json);
        let output = formatter.format_summary(&sample_summary());

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["flavor"], "current-thread");
        assert_eq!(value["results"][1]["status"], "fail");
        assert_eq!(value["results"][0]["probe"], "immediate_value");
    }

    #[test]
    fn test_format_table_shows_failure_reason() {
        let formatter = ResultFormatter::new(OutputFormat::Table).no_color();
        let output = formatter.format_summary(&sample_summary());
        assert!(output.contains("✗ FAIL"));
        assert!(output.contains("run took \"300ms\""));
    }

    #[test]
    fn test_format_aggregate_lists_flaky() {
        let summaries = vec![
            sample_summary(),
            ProbeSummary::new(
                2,
                "current-thread",
                Utc::now(),
                vec![ProbeResult::pass(ProbeCase::SlowInvocation, 12)],
            ),
        ];
        let aggregate = ProbeAggregate::from_summaries(&summaries);

        let formatter = ResultFormatter::new(OutputFormat::Table).no_color();
        let output = formatter.format_aggregate(&aggregate, "current-thread");
        assert!(output.contains("Flaky Probes"));
        assert!(output.contains("Slow Invocation (50.0%)"));
    }
}
