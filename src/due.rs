use chrono::{Local, NaiveDate};

/// Human-readable countdown for a due date relative to `today`.
///
/// `due_date` must be `YYYY-MM-DD`; anything else yields `None`.
pub fn time_display(due_date: Option<&str>, today: NaiveDate) -> Option<String> {
    let due = NaiveDate::parse_from_str(due_date?.trim(), "%Y-%m-%d").ok()?;
    let delta = (due - today).num_days();

    let text = match delta {
        0 => "Due today".to_string(),
        1 => "1 day left".to_string(),
        -1 => "1 day overdue".to_string(),
        d if d > 1 => format!("{d} days left"),
        d => format!("{} days overdue", d.abs()),
    };
    Some(text)
}

/// Same as [`time_display`] against the local calendar date.
pub fn time_display_now(due_date: Option<&str>) -> Option<String> {
    time_display(due_date, Local::now().date_naive())
}
