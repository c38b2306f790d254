use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Color tag attached to a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    #[default]
    Default,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

impl Color {
    pub const ALL: [Color; 7] = [
        Color::Default,
        Color::Red,
        Color::Orange,
        Color::Yellow,
        Color::Green,
        Color::Blue,
        Color::Purple,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Default => "default",
            Color::Red => "red",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Purple => "purple",
        }
    }

    /// Lenient parse: anything outside the palette becomes `Default`.
    pub fn parse_or_default(s: Option<&str>) -> Self {
        s.and_then(|s| Color::try_from(s.trim()).ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Color {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Color::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Invalid color: {s}"))
    }
}

/// Direction of a pairwise move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Direction {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            _ => Err(format!("Invalid direction: {s}")),
        }
    }
}

/// A task in the list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub content: String,
    pub position: i64,
    pub color: Color,
    pub label: Option<String>,
    pub due_date: Option<String>,
    pub completion_note: Option<String>,
    pub requires_id: Option<i64>,
    pub context: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.completed_at.is_none()
    }
}

/// New task input, as submitted (unnormalized)
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub content: String,
    pub color: Option<String>,
    pub label: Option<String>,
    pub due_date: Option<String>,
    pub context: Option<String>,
}

/// Full-replacement edit input, as submitted (unnormalized)
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub content: Option<String>,
    pub color: Option<String>,
    pub label: Option<String>,
    pub due_date: Option<String>,
    pub requires_id: Option<String>,
    pub context: Option<String>,
    pub completion_note: Option<String>,
}

/// Everything the list page needs
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskListing {
    /// Active tasks, ascending by position
    pub active: Vec<Task>,
    /// Completed tasks, most recently completed first
    pub completed: Vec<Task>,
    /// Distinct non-empty labels across all tasks, sorted
    pub labels: Vec<String>,
    /// Completion state of every task, unfiltered
    pub status_map: HashMap<i64, bool>,
}

impl TaskListing {
    /// Active tasks followed by completed ones
    pub fn display_order(&self) -> impl Iterator<Item = &Task> {
        self.active.iter().chain(self.completed.iter())
    }

    /// Whether the task's requirement (if any) is already completed
    pub fn requirement_met(&self, task: &Task) -> Option<bool> {
        task.requires_id
            .map(|id| self.status_map.get(&id).copied().unwrap_or(false))
    }
}
