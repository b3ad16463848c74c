use serde::Serialize;
use serde_json::{Map, Value};

use crate::cli::OutputFormat;
use crate::ui;

pub mod table;

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => render_table(value),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

fn options() -> table::TableOptions {
    let prefs = ui::prefs();
    table::TableOptions {
        max_width: prefs.term_width,
        color: prefs.table_color,
    }
}

/// Objects render as a key/value table of their scalar fields, followed by
/// one titled table per array-of-objects field (categories, transactions).
fn render_table<T: Serialize>(value: &T) -> anyhow::Result<String> {
    let options = options();
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(render_object(map, options)),
        Value::Array(items) => Ok(render_rows(&items, options)),
        scalar => Ok(table::render(&["value"], &[vec![cell(&scalar)]], options)),
    }
}

fn render_object(map: Map<String, Value>, options: table::TableOptions) -> String {
    let mut scalars = Vec::new();
    let mut sections = Vec::new();
    for (key, value) in map {
        match value {
            Value::Array(items) if items.iter().all(Value::is_object) && !items.is_empty() => {
                sections.push((key, items));
            }
            other => scalars.push(vec![key, cell(&other)]),
        }
    }

    let mut out = table::render(&["key", "value"], &scalars, options);
    for (title, items) in sections {
        out.push_str("\n\n");
        out.push_str(&title);
        out.push('\n');
        out.push_str(&render_rows(&items, options));
    }
    out
}

fn render_rows(items: &[Value], options: table::TableOptions) -> String {
    if items.is_empty() {
        return String::from("(no rows)");
    }

    // Columns in order of first appearance across rows.
    let headers = items
        .iter()
        .filter_map(Value::as_object)
        .flat_map(|map| map.keys().cloned())
        .fold(Vec::<String>::new(), |mut acc, key| {
            if !acc.contains(&key) {
                acc.push(key);
            }
            acc
        });

    if headers.is_empty() {
        let rows = items.iter().map(|item| vec![cell(item)]).collect::<Vec<_>>();
        return table::render(&["value"], &rows, options);
    }

    let header_refs = headers.iter().map(String::as_str).collect::<Vec<_>>();
    let rows = items
        .iter()
        .filter_map(Value::as_object)
        .map(|map| {
            headers
                .iter()
                .map(|header| map.get(header).map_or_else(|| String::from("-"), cell))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    table::render(&header_refs, &rows, options)
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| String::from("<invalid-json>")),
    }
}
