//! Seed-data shape checks.
//!
//! Any widget needs seed text that parses as JSON. Built-in widgets also
//! constrain the layout their behavior reads.

use interplay_artifact::resolve_seed;
use interplay_core::fragments::FragmentSet;
use interplay_core::widget::WidgetKind;
use serde_json::Value;

/// Seed the harness validates against: live content if supplied, else the
/// fragment set's sample text.
pub fn parse_seed(fragments: &FragmentSet, live: Option<&Value>) -> Result<Value, String> {
    resolve_seed(fragments.seed_data(), live).map_err(|e| e.to_string())
}

pub fn check_shape(kind: &WidgetKind, seed: &Value) -> Result<(), String> {
    match kind {
        WidgetKind::TrueFalse => check_true_false(seed),
        WidgetKind::MultipleChoice => check_multiple_choice(seed),
        WidgetKind::Custom(_) => Ok(()),
    }
}

fn root_object(seed: &Value) -> Result<&serde_json::Map<String, Value>, String> {
    seed.as_object()
        .ok_or_else(|| format!("seed data must be a JSON object, got {}", type_name(seed)))
}

fn non_empty_list<'a>(
    root: &'a serde_json::Map<String, Value>,
    key: &str,
) -> Result<&'a Vec<Value>, String> {
    match root.get(key) {
        Some(Value::Array(items)) if !items.is_empty() => Ok(items),
        Some(Value::Array(_)) => Err(format!("`{}` must be a non-empty ordered list", key)),
        Some(other) => Err(format!(
            "`{}` must be a non-empty ordered list, got {}",
            key,
            type_name(other)
        )),
        None => Err(format!("missing ordered list `{}`", key)),
    }
}

fn check_item(
    list: &str,
    index: usize,
    item: &Value,
    text_key: &str,
    flag_key: &str,
) -> Result<(), String> {
    let Some(item) = item.as_object() else {
        return Err(format!("{}[{}]: expected an object", list, index));
    };
    match item.get(text_key) {
        Some(Value::String(_)) => {}
        Some(other) => {
            return Err(format!(
                "{}[{}]: `{}` must be a string, got {}",
                list,
                index,
                text_key,
                type_name(other)
            ))
        }
        None => return Err(format!("{}[{}]: missing string `{}`", list, index, text_key)),
    }
    match item.get(flag_key) {
        Some(Value::Bool(_)) => Ok(()),
        Some(other) => Err(format!(
            "{}[{}]: missing boolean flag `{}` (found {})",
            list,
            index,
            flag_key,
            type_name(other)
        )),
        None => Err(format!(
            "{}[{}]: missing boolean flag `{}`",
            list, index, flag_key
        )),
    }
}

fn check_true_false(seed: &Value) -> Result<(), String> {
    let root = root_object(seed)?;
    let fragments = non_empty_list(root, "fragments")?;
    for (i, item) in fragments.iter().enumerate() {
        check_item("fragments", i, item, "text", "isTrueInContext")?;
    }
    Ok(())
}

fn check_multiple_choice(seed: &Value) -> Result<(), String> {
    let root = root_object(seed)?;
    match root.get("question") {
        Some(Value::String(q)) if !q.trim().is_empty() => {}
        _ => return Err("missing non-empty string `question`".to_string()),
    }
    let options = non_empty_list(root, "options")?;
    for (i, item) in options.iter().enumerate() {
        check_item("options", i, item, "text", "isCorrect")?;
    }
    if !options
        .iter()
        .any(|o| o.get("isCorrect").and_then(Value::as_bool) == Some(true))
    {
        return Err("`options` has no entry with `isCorrect: true`".to_string());
    }
    Ok(())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
