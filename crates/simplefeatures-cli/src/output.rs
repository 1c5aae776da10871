use console::style;
use serde::Serialize;
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};

/// Output format mode
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Human,
    Json,
}

pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self {
            format: if json {
                OutputFormat::Json
            } else {
                OutputFormat::Human
            },
        }
    }

    pub fn success(&self, message: impl Display) {
        match self.format {
            OutputFormat::Human => {
                println!("{} {}", style("✓").green().bold(), message);
            }
            OutputFormat::Json => {
                print_json(&serde_json::json!({
                    "status": "success",
                    "message": message.to_string(),
                }));
            }
        }
    }

    pub fn info(&self, message: impl Display) {
        match self.format {
            OutputFormat::Human => {
                println!("{} {}", style("ℹ").blue().bold(), message);
            }
            OutputFormat::Json => {
                print_json(&serde_json::json!({
                    "status": "info",
                    "message": message.to_string(),
                }));
            }
        }
    }

    pub fn warning(&self, message: impl Display) {
        match self.format {
            OutputFormat::Human => {
                eprintln!("{} {}", style("⚠").yellow().bold(), message);
            }
            OutputFormat::Json => {
                if let Ok(text) = serde_json::to_string_pretty(&serde_json::json!({
                    "status": "warning",
                    "message": message.to_string(),
                })) {
                    eprintln!("{}", text);
                }
            }
        }
    }

    /// Print rows as a table; under `--json` nothing is printed, callers
    /// emit a structured result instead
    pub fn table<T: Tabled>(&self, data: Vec<T>) {
        if let OutputFormat::Human = self.format {
            if data.is_empty() {
                println!("{}", style("(no rows)").dim());
            } else {
                let mut table = Table::new(data);
                table.with(Style::rounded());
                println!("{}", table);
            }
        }
    }

    pub fn result<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        let json = match self.format {
            OutputFormat::Human => serde_json::to_value(&data)?,
            OutputFormat::Json => serde_json::json!({
                "status": "success",
                "data": data,
            }),
        };
        println!("{}", serde_json::to_string_pretty(&json)?);
        Ok(())
    }

    pub fn kv(&self, key: impl Display, value: impl Display) {
        if let OutputFormat::Human = self.format {
            println!("{}: {}", style(key).bold(), value);
        }
    }

    pub fn section(&self, title: impl Display) {
        if let OutputFormat::Human = self.format {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}

fn print_json(value: &serde_json::Value) {
    if let Ok(text) = serde_json::to_string_pretty(value) {
        println!("{}", text);
    }
}
