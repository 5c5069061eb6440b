use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::FileError;
use crate::model::{Task, TaskStatus, TaskStore};

/// Try parsing a date string with several common formats.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for fmt in &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

/// Numbers may use a decimal comma.
fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.replace(',', ".").parse().ok()
}

/// Detect delimiter by checking the first line for common separators.
fn detect_delimiter(first_line: &str) -> u8 {
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    let tabs = first_line.matches('\t').count();

    if semicolons >= commas && semicolons >= tabs {
        b';'
    } else if tabs >= commas {
        b'\t'
    } else {
        b','
    }
}

/// Split a "Depends On" cell on `|`. A backslash escapes the next
/// character, so `\|` stays part of the name.
fn split_links(cell: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = String::new();
    let mut chars = cell.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => current.extend(chars.next()),
            '|' => names.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    names.push(current);
    names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

/// Normalize a header string to a canonical column key.
fn normalize_header(h: &str) -> String {
    h.trim().to_lowercase().replace([' ', '-', '_'], "")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Name,
    Start,
    End,
    Status,
    Description,
    DependsOn,
    TotalVolume,
    CompletedVolume,
    Unit,
    Value,
}

fn header_to_column(normalized: &str) -> Option<Column> {
    match normalized {
        "name" | "task" | "tasklabel" | "taskname" | "label" | "title" | "activity"
        | "tarea" | "nombre" => Some(Column::Name),
        "start" | "startdate" | "from" | "begin" | "inicio" | "fechainicio" => Some(Column::Start),
        "end" | "enddate" | "to" | "finish" | "finishdate" | "due" | "fin" | "fechafin" => {
            Some(Column::End)
        }
        "status" | "state" | "stage" | "estado" => Some(Column::Status),
        "description" | "notes" | "note" | "details" | "descripcion" => Some(Column::Description),
        "dependson" | "depends" | "predecessors" | "prerequisites" | "after" | "dependencias" => {
            Some(Column::DependsOn)
        }
        "totalvolume" | "volume" | "quantity" | "volumen" => Some(Column::TotalVolume),
        "completedvolume" | "done" | "completed" | "avance" => Some(Column::CompletedVolume),
        "unit" | "volumeunit" | "unidad" => Some(Column::Unit),
        "value" | "totalvalue" | "cost" | "budget" | "valor" => Some(Column::Value),
        _ => None,
    }
}

/// Import tasks from a CSV file.
///
/// Auto-detects delimiter (comma, semicolon, tab) and matches headers
/// flexibly. Prerequisites are listed by task name in a "Depends On"
/// column, separated by `|`. Links that name an unknown task, would form a
/// cycle, or contradict the imported dates are dropped with a warning.
/// Returns `(tasks, skipped_rows)` on success.
pub fn import_csv(path: &Path, today: NaiveDate) -> Result<(Vec<Task>, usize), FileError> {
    let content = std::fs::read_to_string(path)?;
    import_csv_str(&content, today)
}

pub fn import_csv_str(content: &str, today: NaiveDate) -> Result<(Vec<Task>, usize), FileError> {
    let first_line = content.lines().next().unwrap_or("");
    let delimiter = detect_delimiter(first_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let columns: Vec<Option<Column>> = headers
        .iter()
        .map(|h| header_to_column(&normalize_header(h)))
        .collect();

    let has = |c| columns.contains(&Some(c));
    if !has(Column::Name) || !has(Column::Start) || !has(Column::End) {
        return Err(FileError::MissingColumns(
            headers.iter().map(str::to_string).collect(),
        ));
    }

    // Tasks are collected without links first; names resolve in a second pass.
    let mut tasks: Vec<Task> = Vec::new();
    let mut wanted: Vec<Vec<String>> = Vec::new();
    let mut skipped = 0usize;

    for (i, result) in reader.records().enumerate() {
        let row = i + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                log::warn!("skipping CSV row {}: {}", row, e);
                skipped += 1;
                continue;
            }
        };

        let mut fields: HashMap<Column, &str> = HashMap::new();
        for (field, column) in record.iter().zip(&columns) {
            if let Some(column) = column {
                fields.insert(*column, field);
            }
        }
        let get = |c: Column| fields.get(&c).copied().unwrap_or("");

        let name = get(Column::Name);
        if name.is_empty() {
            skipped += 1;
            continue;
        }
        let (Some(start), Some(end)) = (parse_date(get(Column::Start)), parse_date(get(Column::End)))
        else {
            log::warn!(
                "skipping row {}: invalid dates '{}' / '{}'",
                row,
                get(Column::Start),
                get(Column::End)
            );
            skipped += 1;
            continue;
        };

        let mut task = Task::new(name, start, end);
        task.description = get(Column::Description).to_string();
        task.status = TaskStatus::parse(get(Column::Status)).unwrap_or_default();
        task.total_volume = parse_number(get(Column::TotalVolume));
        task.completed_volume = parse_number(get(Column::CompletedVolume));
        task.volume_unit = Some(get(Column::Unit).to_string()).filter(|u| !u.is_empty());
        task.total_value = parse_number(get(Column::Value));
        task.derive_status(today);

        wanted.push(split_links(get(Column::DependsOn)));
        tasks.push(task);
    }

    if tasks.is_empty() {
        return Err(FileError::NoTasks { skipped });
    }

    // Names match case-insensitively; the first row with a name owns it.
    let mut by_name: HashMap<String, Uuid> = HashMap::new();
    for task in &tasks {
        let key = task.name.to_lowercase();
        if by_name.contains_key(&key) {
            log::warn!("duplicate task name '{}'; links resolve to the first row", task.name);
            continue;
        }
        by_name.insert(key, task.id);
    }
    let ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
    let mut store = TaskStore::from_tasks(tasks);

    for (id, names) in ids.into_iter().zip(wanted) {
        for pre_name in names {
            let Some(&pre) = by_name.get(&pre_name.to_lowercase()) else {
                log::warn!("prerequisite '{}' not found in CSV", pre_name);
                continue;
            };
            if let Err(e) = store.add_dependency(id, pre) {
                log::warn!("dropping link to '{}': {}", pre_name, e);
            }
        }
    }

    Ok((store.list(), skipped))
}
