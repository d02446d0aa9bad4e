use crate::error::{CliError, Result};
use chrono::Local;
use console::{style, Style};
use indicatif::{ProgressBar, ProgressStyle};
use pulse_monitor::{Alert, AlertLevel, MonitorConfig, PerformanceStats, Trend};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

pub struct OutputManager {
    format: OutputFormat,
    colored: bool,
}

impl OutputManager {
    pub fn new(format: OutputFormat, colored: bool) -> Self {
        Self { format, colored }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn print_stats(&self, stats: &BTreeMap<String, PerformanceStats>) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.print_json(stats),
            OutputFormat::Table => {
                self.print_stats_table(stats);
                Ok(())
            }
        }
    }

    pub fn print_alerts(&self, alerts: &[Alert]) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.print_json(&alerts),
            OutputFormat::Table => {
                if alerts.is_empty() {
                    self.print_info("No alerts raised");
                }
                for alert in alerts {
                    self.print_alert(alert)?;
                }
                Ok(())
            }
        }
    }

    /// Print one alert as it arrives; JSON mode emits one object per line
    pub fn print_alert(&self, alert: &Alert) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(alert)?);
            }
            OutputFormat::Table => {
                let time = Local::now().format("%H:%M:%S");
                let line = format!("{} {} = {}", alert.metric_name, alert.level, format_value(alert.value));
                if self.colored {
                    let level_style = match alert.level {
                        AlertLevel::Critical => Style::new().red().bold(),
                        AlertLevel::Warning => Style::new().yellow().bold(),
                    };
                    println!("{} {} {}", style(time).dim(), level_style.apply_to("●"), line);
                } else {
                    println!("{} {}", time, line);
                }
            }
        }
        Ok(())
    }

    pub fn print_config(&self, config: &MonitorConfig) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.print_json(config),
            OutputFormat::Table => {
                if self.colored {
                    println!("{}", style("Configuration").bold().underlined());
                } else {
                    println!("Configuration");
                }
                print!("{}", toml::to_string_pretty(config)?);
                Ok(())
            }
        }
    }

    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn print_success(&self, message: &str) {
        if self.colored {
            println!("{} {}", style("✓").green().bold(), message);
        } else {
            println!("✓ {}", message);
        }
    }

    pub fn print_warning(&self, message: &str) {
        if self.colored {
            eprintln!("{} {}", style("⚠").yellow().bold(), message);
        } else {
            eprintln!("⚠ {}", message);
        }
    }

    pub fn print_info(&self, message: &str) {
        if self.colored {
            println!("{} {}", style("ℹ").blue().bold(), message);
        } else {
            println!("ℹ {}", message);
        }
    }

    pub fn create_progress_bar(&self, total: u64, message: &str) -> Result<ProgressBar> {
        if !self.colored {
            return Ok(ProgressBar::hidden());
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}/{len:3} {msg}")
                .map_err(|e| CliError::Output(e.to_string()))?
                .progress_chars("#>-"),
        );
        pb.set_message(message.to_string());
        Ok(pb)
    }

    fn print_stats_table(&self, stats: &BTreeMap<String, PerformanceStats>) {
        if stats.is_empty() {
            self.print_info("No metrics recorded");
            return;
        }

        if self.colored {
            println!("{}", style("Performance Summary").bold().underlined());
        }

        println!(
            "{:<32} {:>10} {:>10} {:>10} {:>10} {:>7}  {}",
            "Metric", "Current", "Average", "Min", "Max", "Count", "Trend"
        );
        println!("{:-<32} {:->10} {:->10} {:->10} {:->10} {:->7}  {:-<10}", "", "", "", "", "", "", "");

        for (name, s) in stats {
            let trend = trend_label(s.trend);
            let row = format!(
                "{:<32} {:>10} {:>10} {:>10} {:>10} {:>7}",
                name,
                format_value(s.current),
                format_value(s.average),
                format_value(s.minimum),
                format_value(s.maximum),
                s.count,
            );

            if self.colored {
                let trend_style = match s.trend {
                    Trend::Increasing => Style::new().red(),
                    Trend::Decreasing => Style::new().green(),
                    Trend::Stable => Style::new().white(),
                };
                println!("{}  {}", row, trend_style.apply_to(trend));
            } else {
                println!("{}  {}", row, trend);
            }
        }
    }
}

fn trend_label(trend: Trend) -> &'static str {
    match trend {
        Trend::Increasing => "↑ increasing",
        Trend::Decreasing => "↓ decreasing",
        Trend::Stable => "→ stable",
    }
}

fn format_value(value: f64) -> String {
    if !value.is_finite() {
        value.to_string()
    } else if value.abs() >= 100.0 {
        format!("{:.1}", value)
    } else {
        format!("{:.3}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(45.0), "45.000");
        assert_eq!(format_value(1234.56), "1234.6");
        assert_eq!(format_value(f64::NAN), "NaN");
    }

    #[test]
    fn test_hidden_progress_bar_without_color() {
        let output = OutputManager::new(OutputFormat::Table, false);
        let pb = output.create_progress_bar(3, "sampling").unwrap();
        assert!(pb.is_hidden());
    }
}
