//! Rendering for the two output modes: a JSON envelope for machines and a
//! styled text layout for people.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;

use crate::catalog::Subject;
use crate::error::Result;

#[derive(Debug, Serialize)]
pub struct RobotResponse<T> {
    pub status: RobotStatus,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    pub data: T,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotStatus {
    Ok,
}

pub fn robot_ok<T: Serialize>(data: T) -> RobotResponse<T> {
    RobotResponse {
        status: RobotStatus::Ok,
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION"),
        data,
    }
}

/// Failure payload printed on stdout in robot mode.
#[derive(Debug, Serialize)]
pub struct RobotError<'a> {
    pub error: bool,
    pub code: &'a str,
    pub message: String,
}

pub fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value)?;
    println!("{payload}");
    Ok(())
}

/// Either the robot envelope around `data` or the human layout built by
/// `render`.
pub fn emit<T, F>(robot: bool, data: &T, render: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce(&T, &mut HumanLayout),
{
    if robot {
        return emit_json(&robot_ok(data));
    }
    let mut layout = HumanLayout::new();
    render(data, &mut layout);
    println!("{}", layout.build());
    Ok(())
}

pub struct HumanLayout {
    lines: Vec<String>,
    key_width: usize,
}

impl Default for HumanLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl HumanLayout {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            key_width: 16,
        }
    }

    pub fn title(&mut self, text: &str) -> &mut Self {
        self.lines.push(style(text).bold().to_string());
        self.lines.push(String::new());
        self
    }

    pub fn section(&mut self, text: &str) -> &mut Self {
        if self.lines.last().is_some_and(|line| !line.is_empty()) {
            self.lines.push(String::new());
        }
        self.lines.push(style(text).bold().underlined().to_string());
        self
    }

    pub fn kv(&mut self, key: &str, value: impl Display) -> &mut Self {
        self.lines.push(format!(
            "  {} {value}",
            style(format!("{key:width$}", width = self.key_width)).dim()
        ));
        self
    }

    pub fn bullet(&mut self, text: impl Display) -> &mut Self {
        self.lines.push(format!("  - {text}"));
        self
    }

    pub fn push_line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    /// One numbered line per subject: name, id, category and difficulty,
    /// followed by `extra` when present.
    pub fn subject_line(&mut self, rank: usize, subject: &Subject, extra: Option<String>) -> &mut Self {
        let mut line = format!(
            "{:>3}. {} {} {}",
            rank,
            style(&subject.name).cyan().bold(),
            style(format!("({})", subject.id)).dim(),
            style(format!("[{} / {}]", subject.category, subject.difficulty)).yellow(),
        );
        if let Some(extra) = extra {
            line.push_str("  ");
            line.push_str(&extra);
        }
        self.lines.push(line);
        self
    }

    #[must_use]
    pub fn build(self) -> String {
        self.lines.join("\n")
    }
}

/// `4.35 (12 ratings)`, or `unrated`.
#[must_use]
pub fn rating_label(subject: &Subject) -> String {
    if subject.is_rated() {
        format!("{:.2} ({} ratings)", subject.rating.average, subject.rating.count)
    } else {
        "unrated".to_string()
    }
}
