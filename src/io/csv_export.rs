use std::io::Write;
use std::path::Path;

use crate::error::FileError;
use crate::model::Task;

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Escape a name for the `|`-separated "Depends On" cell.
fn escape_link(name: &str) -> String {
    name.replace('\\', "\\\\").replace('|', "\\|")
}

/// Export tasks to a semicolon-delimited CSV matching the import format.
///
/// Prerequisites are written by name, so a file exported here imports back
/// with its links intact. Returns the number of tasks written.
pub fn export_csv(tasks: &[Task], path: &Path) -> Result<usize, FileError> {
    let file = std::fs::File::create(path)?;
    let count = write_csv(tasks, file)?;
    log::info!("exported {} tasks to {}", count, path.display());
    Ok(count)
}

pub fn write_csv<W: Write>(tasks: &[Task], out: W) -> Result<usize, FileError> {
    let mut wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(out);

    wtr.write_record([
        "Task",
        "Start Date",
        "End Date",
        "Status",
        "Depends On",
        "Total Volume",
        "Completed Volume",
        "Unit",
        "Value",
        "Description",
    ])?;

    for task in tasks {
        let depends_on = task
            .depends_on
            .iter()
            .filter_map(|id| tasks.iter().find(|t| t.id == *id))
            .map(|t| escape_link(&t.name))
            .collect::<Vec<_>>()
            .join("|");
        let start = task.start_date.format("%Y-%m-%d").to_string();
        let end = task.end_date.format("%Y-%m-%d").to_string();
        let total = number(task.total_volume);
        let done = number(task.completed_volume);
        let value = number(task.total_value);
        wtr.write_record([
            task.name.as_str(),
            start.as_str(),
            end.as_str(),
            task.status.label(),
            depends_on.as_str(),
            total.as_str(),
            done.as_str(),
            task.volume_unit.as_deref().unwrap_or(""),
            value.as_str(),
            task.description.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(tasks.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::csv_import::import_csv_str;
    use crate::model::TaskStatus;
    use chrono::NaiveDate;

    #[test]
    fn exported_links_survive_reimport() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 8, day).unwrap();
        let mut a = Task::new("Site clearing", d(1), d(3));
        a.status = TaskStatus::Completed;
        a.total_value = Some(1500.5);
        let mut b = Task::new("Grading", d(3), d(6));
        b.depends_on = vec![a.id];
        b.volume_unit = Some("m2".into());

        let mut buf = Vec::new();
        assert_eq!(write_csv(&[a, b], &mut buf).unwrap(), 2);
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Task;Start Date;End Date;Status;Depends On"));
        assert!(text.contains("Grading;2024-08-03;2024-08-06;Not started;Site clearing;"));

        let (tasks, skipped) = import_csv_str(&text, d(10)).unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(tasks[0].status, TaskStatus::Completed);
        assert_eq!(tasks[0].total_value, Some(1500.5));
        assert_eq!(tasks[1].depends_on, vec![tasks[0].id]);
        assert_eq!(tasks[1].volume_unit.as_deref(), Some("m2"));
    }

    #[test]
    fn names_with_separator_survive_reimport() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 8, day).unwrap();
        let a = Task::new("Level 1|2 slab", d(1), d(3));
        let b = Task::new("Roof", d(1), d(2));
        let mut c = Task::new("Cladding", d(4), d(6));
        c.depends_on = vec![a.id, b.id];

        let mut buf = Vec::new();
        write_csv(&[a, b, c], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains(r"Level 1\|2 slab|Roof"));

        let (tasks, _) = import_csv_str(&text, d(10)).unwrap();
        assert_eq!(tasks[0].name, "Level 1|2 slab");
        assert_eq!(tasks[2].depends_on, vec![tasks[0].id, tasks[1].id]);
    }
}
