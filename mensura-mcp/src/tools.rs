//! Tool handlers and per-session state

use crate::protocol::McpError;
use mensura::{ConversionRequest, ConversionResult, Converter, History};
use mensura_catalog::{format_unit_name, UnitKind};
use mensura_core::{ConversionError, RawValue};
use serde_json::{json, Value as JsonValue};

/// State for one stdio client
///
/// The converter is shared and read-only; history belongs to the session.
#[derive(Debug)]
pub struct Session {
    pub converter: Converter,
    pub history: History,
}

impl Session {
    pub fn new(converter: Converter) -> Self {
        Self {
            converter,
            history: History::new(),
        }
    }
}

pub fn tools_list() -> JsonValue {
    json!({
        "tools": [
            {
                "name": "convert",
                "description": "Convert a value between two units of the same category. Results are rounded up to 4 decimals.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "category": {
                            "type": "string",
                            "description": "Category name, e.g. length, temperature"
                        },
                        "from_unit": {
                            "type": "string",
                            "description": "Unit to convert from"
                        },
                        "to_unit": {
                            "type": "string",
                            "description": "Unit to convert to"
                        },
                        "value": {
                            "type": ["string", "number"],
                            "description": "Value to convert"
                        }
                    },
                    "required": ["category", "from_unit", "to_unit", "value"]
                }
            },
            {
                "name": "list_categories",
                "description": "List the categories in the loaded catalog.",
                "inputSchema": {
                    "type": "object",
                    "properties": {}
                }
            },
            {
                "name": "list_units",
                "description": "List the units of one category.",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "category": {
                            "type": "string",
                            "description": "Category name"
                        }
                    },
                    "required": ["category"]
                }
            },
            {
                "name": "history",
                "description": "Show the most recent conversions in this session, newest first.",
                "inputSchema": {
                    "type": "object",
                    "properties": {}
                }
            },
            {
                "name": "clear_history",
                "description": "Forget the conversions recorded in this session.",
                "inputSchema": {
                    "type": "object",
                    "properties": {}
                }
            }
        ]
    })
}

pub fn call_tool(session: &mut Session, params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
    let params = params
        .as_ref()
        .ok_or_else(|| McpError::invalid_params("Missing params"))?;

    let name = params
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| McpError::invalid_params("Missing tool name"))?;

    let args = params.get("arguments").cloned().unwrap_or(json!({}));

    match name {
        "convert" => Ok(tool_convert(session, &args)),
        "list_categories" => Ok(tool_list_categories(session)),
        "list_units" => Ok(tool_list_units(session, &args)),
        "history" => Ok(tool_history(session)),
        "clear_history" => Ok(tool_clear_history(session)),
        _ => Err(McpError::invalid_params(format!("Unknown tool: {}", name))),
    }
}

fn str_arg<'a>(args: &'a JsonValue, key: &str) -> &'a str {
    args.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

/// Absent or non-scalar values become empty text and fail validation
fn raw_value_arg(args: &JsonValue) -> RawValue {
    match args.get("value") {
        Some(JsonValue::Number(n)) => n
            .as_f64()
            .map(RawValue::Number)
            .unwrap_or_else(|| RawValue::Text(n.to_string())),
        Some(JsonValue::String(s)) => RawValue::Text(s.clone()),
        _ => RawValue::Text(String::new()),
    }
}

fn tool_error(err: &ConversionError) -> JsonValue {
    json!({
        "content": [{ "type": "text", "text": err.to_string() }],
        "error": err,
        "isError": true
    })
}

/// `5 meter = 16.4042 foot`
pub fn describe_result(result: &ConversionResult) -> String {
    format!(
        "{} {} = {} {}",
        result.input_value,
        format_unit_name(&result.from_unit),
        result.output_value,
        format_unit_name(&result.to_unit)
    )
}

fn tool_convert(session: &mut Session, args: &JsonValue) -> JsonValue {
    let raw = raw_value_arg(args);
    let request = ConversionRequest::new(
        str_arg(args, "category"),
        str_arg(args, "from_unit"),
        str_arg(args, "to_unit"),
        raw.clone(),
    );

    match session.converter.convert_request(&request) {
        Ok(result) => {
            tracing::debug!(
                category = %result.category,
                strategy = result.strategy.as_str(),
                "conversion succeeded"
            );
            let text = describe_result(&result);
            let entry = session.history.record(result, &raw);
            json!({
                "content": [{ "type": "text", "text": text }],
                "result": entry.result,
                "history_id": entry.id,
                "isError": false
            })
        }
        Err(err) => {
            if err.kind.is_data_fault() {
                tracing::warn!(code = %err.code, "catalog data fault: {}", err.message);
            } else {
                tracing::debug!(code = %err.code, "conversion rejected: {}", err.message);
            }
            tool_error(&err)
        }
    }
}

fn tool_list_categories(session: &Session) -> JsonValue {
    let names = session.converter.catalog().list_categories();
    let text = names
        .iter()
        .map(|n| format!("- {}", format_unit_name(n)))
        .collect::<Vec<_>>()
        .join("\n");

    json!({
        "content": [{ "type": "text", "text": text }],
        "categories": names
    })
}

fn tool_list_units(session: &Session, args: &JsonValue) -> JsonValue {
    let category = str_arg(args, "category");
    let catalog = session.converter.catalog();
    let cat = match catalog.category(category) {
        Ok(cat) => cat,
        Err(err) => return tool_error(&err),
    };

    let units: Vec<JsonValue> = cat
        .units()
        .iter()
        .map(|u| match &u.kind {
            UnitKind::Ratio(r) => json!({ "name": u.name, "label": format_unit_name(&u.name), "ratio": r }),
            UnitKind::FormulaRole(tag) => json!({ "name": u.name, "label": format_unit_name(&u.name), "role": tag }),
        })
        .collect();

    let text = cat
        .units()
        .iter()
        .map(|u| format!("- {} ({})", format_unit_name(&u.name), u.name))
        .collect::<Vec<_>>()
        .join("\n");

    json!({
        "content": [{ "type": "text", "text": text }],
        "category": cat.name(),
        "units": units
    })
}

fn tool_history(session: &Session) -> JsonValue {
    let text = if session.history.is_empty() {
        "No conversions yet".to_string()
    } else {
        session
            .history
            .entries()
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{}. {}", i + 1, describe_result(&e.result)))
            .collect::<Vec<_>>()
            .join("\n")
    };

    json!({
        "content": [{ "type": "text", "text": text }],
        "entries": session.history.entries()
    })
}

fn tool_clear_history(session: &mut Session) -> JsonValue {
    let cleared = session.history.len();
    session.history.clear();
    json!({
        "content": [{ "type": "text", "text": format!("Cleared {} entries", cleared) }],
        "cleared": cleared
    })
}
