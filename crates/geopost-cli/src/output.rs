use console::style;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Writes command results either for people or as JSON envelopes
pub struct OutputWriter {
    format: OutputFormat,
}

fn print_json(value: &Value) {
    // Serializing a Value cannot fail
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self { format: if json { OutputFormat::Json } else { OutputFormat::Human } }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    pub fn success(&self, message: impl Display) {
        match self.format {
            OutputFormat::Human => println!("{} {}", style("✓").green().bold(), message),
            OutputFormat::Json => {
                print_json(&json!({ "status": "success", "message": message.to_string() }))
            }
        }
    }

    pub fn info(&self, message: impl Display) {
        // Informational lines would corrupt a JSON document on stdout
        if self.format == OutputFormat::Human {
            println!("{} {}", style("ℹ").blue().bold(), message);
        }
    }

    pub fn warning(&self, message: impl Display) {
        eprintln!("{} {}", style("⚠").yellow().bold(), message);
    }

    pub fn section(&self, title: impl Display) {
        if self.format == OutputFormat::Human {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    pub fn kv(&self, key: impl Display, value: impl Display) {
        if self.format == OutputFormat::Human {
            println!("{}: {}", style(key).bold(), value);
        }
    }

    pub fn table<T: Tabled>(&self, rows: Vec<T>) {
        if self.format != OutputFormat::Human {
            return;
        }
        if rows.is_empty() {
            println!("{}", style("(no results)").dim());
        } else {
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{}", table);
        }
    }

    /// Emit the machine-readable result; in human mode callers render it themselves
    pub fn result<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.format == OutputFormat::Json {
            print_json(&json!({ "status": "success", "data": serde_json::to_value(data)? }));
        }
        Ok(())
    }
}
