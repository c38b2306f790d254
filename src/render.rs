//! Server-side HTML for the list and edit pages.

use crate::due::time_display;
use crate::models::{Color, Task, TaskListing};
use chrono::NaiveDate;
use std::fmt::Write;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 44rem; margin: 2rem auto; padding: 0 1rem; }
ul.tasks { list-style: none; padding: 0; }
li.task { display: flex; gap: .5rem; align-items: baseline; padding: .4rem; border-left: 4px solid #ccc; margin-bottom: .3rem; }
li.task.done .content { text-decoration: line-through; color: #888; }
li.task[draggable=true] { cursor: grab; }
.label { font-size: .75rem; background: #eee; border-radius: 3px; padding: 0 .3rem; }
.due, .needs, .note { font-size: .8rem; color: #555; }
.needs.unmet { color: #b00; }
.actions { margin-left: auto; font-size: .8rem; }
.color-red { border-color: #e53935; } .color-orange { border-color: #fb8c00; }
.color-yellow { border-color: #fdd835; } .color-green { border-color: #43a047; }
.color-blue { border-color: #1e88e5; } .color-purple { border-color: #8e24aa; }
"#;

// Drag-to-reorder: on drop, post the full active order.
const REORDER_SCRIPT: &str = r#"
(function () {
  const list = document.getElementById('active');
  if (!list) return;
  let dragged = null;
  list.addEventListener('dragstart', e => { dragged = e.target.closest('li'); });
  list.addEventListener('dragover', e => {
    e.preventDefault();
    const over = e.target.closest('li');
    if (!dragged || !over || over === dragged) return;
    const rect = over.getBoundingClientRect();
    const after = e.clientY > rect.top + rect.height / 2;
    list.insertBefore(dragged, after ? over.nextSibling : over);
  });
  list.addEventListener('drop', e => {
    e.preventDefault();
    const order = [...list.querySelectorAll('li[data-id]')].map(li => Number(li.dataset.id));
    fetch('reorder', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ order })
    });
  });
})();
"#;

/// Escape text for HTML element content and quoted attributes
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
        escape(title)
    )
}

fn color_options(selected: Color) -> String {
    let mut out = String::new();
    for color in Color::ALL {
        let _ = write!(
            out,
            "<option value=\"{c}\"{sel}>{c}</option>",
            c = color.as_str(),
            sel = if color == selected { " selected" } else { "" }
        );
    }
    out
}

/// The main list page
pub fn index_page(listing: &TaskListing, active_filter: Option<&str>, today: NaiveDate) -> String {
    let mut body = String::new();
    body.push_str("<h1>Tasks</h1>\n");

    let _ = write!(
        body,
        "<form method=\"post\" action=\"add\" class=\"add\">\
         <input name=\"content\" placeholder=\"New task\" required autofocus> \
         <select name=\"color\">{}</select> \
         <input name=\"label\" placeholder=\"Label\" list=\"labels\"> \
         <input name=\"due_date\" type=\"date\"> \
         <input name=\"context\" placeholder=\"Details\"> \
         <button type=\"submit\">Add</button></form>\n",
        color_options(Color::Default)
    );

    body.push_str("<datalist id=\"labels\">");
    for label in &listing.labels {
        let _ = write!(body, "<option value=\"{}\">", escape(label));
    }
    body.push_str("</datalist>\n");

    if !listing.labels.is_empty() {
        body.push_str("<nav class=\"filters\"><a href=\"./\">All</a>");
        for label in &listing.labels {
            let current = active_filter == Some(label.as_str());
            let _ = write!(
                body,
                " <a href=\"?label={}\"{}>{}</a>",
                escape(&urlencoding::encode(label)),
                if current { " class=\"current\"" } else { "" },
                escape(label)
            );
        }
        body.push_str("</nav>\n");
    }

    body.push_str("<ul class=\"tasks\" id=\"active\">\n");
    for task in &listing.active {
        task_item(&mut body, task, listing, today);
    }
    body.push_str("</ul>\n");

    if !listing.completed.is_empty() {
        body.push_str("<h2>Completed</h2>\n<ul class=\"tasks\" id=\"completed\">\n");
        for task in &listing.completed {
            task_item(&mut body, task, listing, today);
        }
        body.push_str("</ul>\n<p><a href=\"sweep\">Clear completed</a></p>\n");
    }

    let _ = write!(body, "<script>{REORDER_SCRIPT}</script>\n");
    page("Tasks", &body)
}

fn task_item(out: &mut String, task: &Task, listing: &TaskListing, today: NaiveDate) {
    let done = task.is_completed();
    let _ = write!(
        out,
        "<li class=\"task color-{color}{done}\" data-id=\"{id}\"{drag}>",
        color = task.color.as_str(),
        done = if done { " done" } else { "" },
        id = task.id,
        drag = if done { "" } else { " draggable=\"true\"" },
    );
    let _ = write!(
        out,
        "<a class=\"toggle\" href=\"toggle/{}\">{}</a> <span class=\"content\">{}</span>",
        task.id,
        if done { "&#9745;" } else { "&#9744;" },
        escape(&task.content)
    );

    if let Some(label) = &task.label {
        let _ = write!(out, " <span class=\"label\">{}</span>", escape(label));
    }
    if !done {
        if let Some(due) = time_display(task.due_date.as_deref(), today) {
            let _ = write!(out, " <span class=\"due\">{}</span>", escape(&due));
        }
    }
    if let (Some(required), Some(met)) = (task.requires_id, listing.requirement_met(task)) {
        let _ = write!(
            out,
            " <span class=\"needs{}\">needs #{}</span>",
            if met { "" } else { " unmet" },
            required
        );
    }
    if let Some(context) = &task.context {
        let _ = write!(out, " <span class=\"context\">{}</span>", escape(context));
    }
    if let Some(note) = task.completion_note.as_ref().filter(|_| done) {
        let _ = write!(out, " <span class=\"note\">{}</span>", escape(note));
    }

    out.push_str("<span class=\"actions\">");
    if !done {
        let _ = write!(
            out,
            "<a href=\"move/{id}/up\">&uarr;</a> <a href=\"move/{id}/down\">&darr;</a> ",
            id = task.id
        );
    }
    let _ = write!(
        out,
        "<a href=\"edit/{id}\">edit</a> <a href=\"delete/{id}\">delete</a></span></li>\n",
        id = task.id
    );
}

/// The edit form for one task
pub fn edit_page(task: &Task) -> String {
    let mut body = String::new();
    let _ = write!(body, "<h1>Edit task #{}</h1>\n", task.id);
    let _ = write!(
        body,
        "<form method=\"post\" action=\"{id}\">\n\
         <p><textarea name=\"content\" required>{content}</textarea></p>\n\
         <p><select name=\"color\">{colors}</select></p>\n\
         <p><input name=\"label\" placeholder=\"Label\" value=\"{label}\"></p>\n\
         <p><input name=\"due_date\" type=\"date\" value=\"{due}\"></p>\n\
         <p><input name=\"requires_id\" placeholder=\"Requires task #\" value=\"{requires}\"></p>\n\
         <p><textarea name=\"context\" placeholder=\"Details\">{context}</textarea></p>\n",
        id = task.id,
        content = escape(&task.content),
        colors = color_options(task.color),
        label = escape(task.label.as_deref().unwrap_or("")),
        due = escape(task.due_date.as_deref().unwrap_or("")),
        requires = task.requires_id.map(|id| id.to_string()).unwrap_or_default(),
        context = escape(task.context.as_deref().unwrap_or("")),
    );
    if task.is_completed() {
        let _ = write!(
            body,
            "<p><textarea name=\"completion_note\" placeholder=\"Completion note\">{}</textarea></p>\n",
            escape(task.completion_note.as_deref().unwrap_or(""))
        );
    }
    body.push_str("<p><button type=\"submit\">Save</button> <a href=\"../\">Cancel</a></p>\n</form>\n");
    page(&format!("Edit #{}", task.id), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;

    fn task(id: i64, content: &str) -> Task {
        Task {
            id,
            content: content.to_string(),
            position: 0,
            color: Color::Default,
            label: None,
            due_date: None,
            completion_note: None,
            requires_id: None,
            context: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("<b>\"Tom\" & 'Jerry'</b>"),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_label_filter_links_are_encoded() {
        let mut t = task(1, "Budget");
        t.label = Some("R&D".to_string());
        let listing = TaskListing {
            active: vec![t],
            completed: vec![],
            labels: vec!["R&D".to_string(), "Home Office".to_string()],
            status_map: HashMap::from([(1, false)]),
        };
        let html = index_page(&listing, Some("R&D"), today());

        assert!(html.contains("href=\"?label=R%26D\" class=\"current\">R&amp;D</a>"));
        assert!(html.contains("href=\"?label=Home%20Office\">Home Office</a>"));
    }

    #[test]
    fn test_index_page_lists_active_then_completed() {
        let mut first = task(1, "Write <tests>");
        first.label = Some("Work".to_string());
        first.due_date = Some("2024-03-11".to_string());
        let mut second = task(2, "Ship it");
        second.requires_id = Some(1);
        let mut old = task(3, "Old news");
        old.completed_at = Some(Utc::now());
        old.completion_note = Some("all good".to_string());

        let listing = TaskListing {
            active: vec![first, second],
            completed: vec![old],
            labels: vec!["Work".to_string()],
            status_map: HashMap::from([(1, false), (2, false), (3, true)]),
        };
        let html = index_page(&listing, None, today());

        assert!(html.contains("Write &lt;tests&gt;"));
        assert!(html.contains("1 day left"));
        assert!(html.contains("needs unmet\">needs #1"));
        assert!(html.contains("all good"));
        assert!(html.contains("href=\"sweep\""));
        let first_pos = html.find("data-id=\"1\"").unwrap();
        let second_pos = html.find("data-id=\"2\"").unwrap();
        let old_pos = html.find("data-id=\"3\"").unwrap();
        assert!(first_pos < second_pos && second_pos < old_pos);
    }

    #[test]
    fn test_edit_page_shows_note_only_when_completed() {
        let mut t = task(5, "Draft");
        assert!(!edit_page(&t).contains("completion_note"));
        t.completed_at = Some(Utc::now());
        assert!(edit_page(&t).contains("completion_note"));
    }
}
