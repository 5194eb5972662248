//! Mensura MCP Server
//!
//! MCP Server (protocol revision 2025-11-25) over line-delimited stdio
//!
//! Tools:
//! - convert: Convert a value between two units of one category
//! - list_categories: List catalog categories
//! - list_units: List the units of a category
//! - history: Recent conversions in this session
//! - clear_history: Forget recent conversions
//!
//! Resources:
//! - mensura://catalog - The loaded catalog document
//! - mensura://catalog/{category} - One category

mod config;
mod protocol;
mod tools;

use config::{ServerConfig, DEFAULT_LOG_FILTER};
use mensura::Converter;
use mensura_catalog::{category_to_json, Catalog};
use protocol::{McpError, McpRequest, McpResponse};
use serde_json::{json, Value as JsonValue};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;
use tools::Session;
use tracing_subscriber::EnvFilter;

const PROTOCOL_VERSION: &str = "2025-11-25";
const SERVER_NAME: &str = "mensura";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const CATALOG_URI: &str = "mensura://catalog";
const CATEGORY_URI_PREFIX: &str = "mensura://catalog/";

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

/// Read, parse and lint the catalog document
fn load_catalog(path: &Path) -> Result<Catalog, String> {
    let source = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read catalog '{}': {}", path.display(), e))?;
    let catalog = Catalog::from_json_str(&source)
        .map_err(|e| format!("Invalid catalog '{}': {}", path.display(), e))?;

    for warning in catalog.lint() {
        tracing::warn!(
            category = %warning.category,
            formula_key = %warning.formula_key,
            "{}",
            warning.message
        );
    }

    Ok(catalog)
}

fn main() -> ExitCode {
    init_logging();

    let config = ServerConfig::from_env();

    tracing::info!("Mensura MCP Server v{} started", SERVER_VERSION);
    tracing::info!("Protocol: {}", PROTOCOL_VERSION);
    tracing::info!("Catalog path: {}", config.catalog_path.display());

    let catalog = match load_catalog(&config.catalog_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    tracing::info!("Loaded {} categories: {}", catalog.len(), catalog.list_categories().join(", "));

    let converter = match Converter::new(catalog) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Invalid catalog '{}': {}", config.catalog_path.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let mut session = Session::new(converter);

    let stdin = io::stdin();
    let stdout = io::stdout();
    tracing::info!("Server ready, waiting for requests...");

    match serve(&mut session, stdin.lock(), stdout.lock()) {
        Ok(()) => {
            tracing::info!("Server shutting down");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("I/O error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Answer one request per line until EOF
fn serve<R: BufRead, W: Write>(session: &mut Session, mut reader: R, mut writer: W) -> io::Result<()> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            tracing::info!("Client disconnected (EOF)");
            return Ok(());
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        tracing::debug!("Received: {} bytes", trimmed.len());

        let request: McpRequest = match serde_json::from_str(trimmed) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Error parsing request: {}", e);
                write_response(&mut writer, &McpResponse::failure(None, McpError::parse_error(e)))?;
                continue;
            }
        };

        tracing::debug!("Processing: {}", request.method);
        let response = handle_request(session, &request);

        if request.is_notification() {
            tracing::debug!("Notification processed (no response): {}", request.method);
            continue;
        }

        write_response(&mut writer, &response)?;
        tracing::debug!("Sent response for: {}", request.method);
    }
}

fn write_response<W: Write>(writer: &mut W, response: &McpResponse) -> io::Result<()> {
    let text = serde_json::to_string(response)?;
    writeln!(writer, "{}", text)?;
    writer.flush()
}

fn handle_request(session: &mut Session, request: &McpRequest) -> McpResponse {
    let result = match request.method.as_str() {
        // Lifecycle
        "initialize" => handle_initialize(&request.params),
        "initialized" | "notifications/initialized" => Ok(json!({})),
        "ping" => Ok(json!({})),

        // Tools
        "tools/list" => Ok(tools::tools_list()),
        "tools/call" => tools::call_tool(session, &request.params),

        // Resources
        "resources/list" => Ok(handle_resources_list(session.converter.catalog())),
        "resources/read" => handle_resources_read(session.converter.catalog(), &request.params),

        _ => Err(McpError::method_not_found(&request.method)),
    };

    if let Err(e) = &result {
        tracing::debug!(code = e.code, "{} failed: {}", request.method, e.message);
    }

    McpResponse::from_result(request.id.clone(), result)
}

fn handle_initialize(params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
    let client_info = params
        .as_ref()
        .and_then(|p| p.get("clientInfo"))
        .and_then(|c| c.get("name"))
        .and_then(|n| n.as_str())
        .unwrap_or("unknown");

    // Echo the client's protocol version for compatibility
    let client_protocol = params
        .as_ref()
        .and_then(|p| p.get("protocolVersion"))
        .and_then(|v| v.as_str())
        .unwrap_or(PROTOCOL_VERSION);

    tracing::info!("Client connected: {} (protocol: {})", client_info, client_protocol);

    Ok(json!({
        "protocolVersion": client_protocol,
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION,
            "description": "Catalog-driven unit conversion"
        },
        "capabilities": {
            "tools": {
                "listChanged": false
            },
            "resources": {
                "subscribe": false,
                "listChanged": false
            }
        },
        "instructions": "Mensura converts values between units of one category (length, mass, temperature, ...). Use 'list_categories' and 'list_units' to discover names, then 'convert'. Results are rounded up to 4 decimal places."
    }))
}

fn handle_resources_list(catalog: &Catalog) -> JsonValue {
    let mut resources = vec![json!({
        "uri": CATALOG_URI,
        "name": "catalog",
        "description": format!("Unit catalog ({} categories)", catalog.len()),
        "mimeType": "application/json"
    })];

    resources.extend(catalog.categories().iter().map(|cat| {
        json!({
            "uri": format!("{}{}", CATEGORY_URI_PREFIX, cat.name()),
            "name": cat.name(),
            "description": format!("{} units in {}", cat.units().len(), cat.name()),
            "mimeType": "application/json"
        })
    }));

    json!({ "resources": resources })
}

fn handle_resources_read(catalog: &Catalog, params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
    let uri = params
        .as_ref()
        .and_then(|p| p.get("uri"))
        .and_then(|u| u.as_str())
        .ok_or_else(|| McpError::invalid_params("Missing uri parameter"))?;

    let document = if uri == CATALOG_URI {
        catalog.to_json()
    } else {
        let name = uri.strip_prefix(CATEGORY_URI_PREFIX).ok_or_else(|| {
            McpError::invalid_params(format!(
                "Invalid URI: {}. Expected {} or {}{{category}}",
                uri, CATALOG_URI, CATEGORY_URI_PREFIX
            ))
        })?;
        let cat = catalog.category(name).map_err(|e| {
            let data = json!({ "available": catalog.list_categories() });
            McpError::invalid_params(e.to_string()).with_data(data)
        })?;
        category_to_json(cat)
    };

    let text = serde_json::to_string_pretty(&document)
        .map_err(|e| McpError::internal(format!("Failed to serialize {}: {}", uri, e)))?;

    Ok(json!({
        "contents": [{
            "uri": uri,
            "mimeType": "application/json",
            "text": text
        }]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        let catalog = Catalog::from_json_str(include_str!("../../data/formula.json")).unwrap();
        Session::new(Converter::new(catalog).unwrap())
    }

    fn request(method: &str, params: JsonValue) -> McpRequest {
        McpRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: method.to_string(),
            params: Some(params),
        }
    }

    fn run(session: &mut Session, input: &str) -> Vec<JsonValue> {
        let mut out = Vec::new();
        serve(session, input.as_bytes(), &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_initialize_echoes_protocol() {
        let mut s = session();
        let resp = handle_request(
            &mut s,
            &request("initialize", json!({ "protocolVersion": "2024-11-05", "clientInfo": { "name": "t" } })),
        );
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], json!("2024-11-05"));
        assert_eq!(result["serverInfo"]["name"], json!("mensura"));
    }

    #[test]
    fn test_unknown_method() {
        let mut s = session();
        let resp = handle_request(&mut s, &request("prompts/list", json!({})));
        assert_eq!(resp.error.unwrap().code, protocol::METHOD_NOT_FOUND);
    }

    #[test]
    fn test_tools_list_names() {
        let mut s = session();
        let result = handle_request(&mut s, &request("tools/list", json!({}))).result.unwrap();
        let names: Vec<&str> = result["tools"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|t| t["name"].as_str())
            .collect();
        assert_eq!(names, vec!["convert", "list_categories", "list_units", "history", "clear_history"]);
    }

    #[test]
    fn test_resources_list_has_catalog_and_categories() {
        let mut s = session();
        let result = handle_request(&mut s, &request("resources/list", json!({}))).result.unwrap();
        let resources = result["resources"].as_array().unwrap();
        assert_eq!(resources.len(), 11);
        assert_eq!(resources[0]["uri"], json!("mensura://catalog"));
        assert_eq!(resources[1]["uri"], json!("mensura://catalog/length"));
    }

    #[test]
    fn test_read_whole_catalog() {
        let mut s = session();
        let result = handle_request(&mut s, &request("resources/read", json!({ "uri": "mensura://catalog" })))
            .result
            .unwrap();
        let text = result["contents"][0]["text"].as_str().unwrap();
        let reloaded = Catalog::from_json_str(text).unwrap();
        assert_eq!(reloaded.list_categories(), s.converter.catalog().list_categories());
    }

    #[test]
    fn test_read_one_category() {
        let mut s = session();
        let result = handle_request(
            &mut s,
            &request("resources/read", json!({ "uri": "mensura://catalog/temperature" })),
        )
        .result
        .unwrap();
        let doc: JsonValue = serde_json::from_str(result["contents"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(doc["units"]["kelvin"], json!("kelvin"));
        assert_eq!(doc["formula"]["celsius_to_kelvin"], json!("value + 273.15"));
    }

    #[test]
    fn test_read_bad_uris() {
        let mut s = session();
        let resp = handle_request(&mut s, &request("resources/read", json!({ "uri": "file:///tmp/units.json" })));
        assert_eq!(resp.error.unwrap().code, protocol::INVALID_PARAMS);

        let resp = handle_request(&mut s, &request("resources/read", json!({ "uri": "mensura://catalog/luminosity" })));
        let err = resp.error.unwrap();
        assert_eq!(err.code, protocol::INVALID_PARAMS);
        assert!(err.data.is_some());
    }

    #[test]
    fn test_serve_loop() {
        let mut s = session();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            "not json\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"convert","arguments":{"category":"temperature","from_unit":"fahrenheit","to_unit":"celsius","value":"212"}}}"#,
            "\n",
        );
        let responses = run(&mut s, input);
        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0]["id"], json!(1));
        assert_eq!(responses[1]["error"]["code"], json!(protocol::PARSE_ERROR));
        assert_eq!(responses[2]["result"]["result"]["output_value"], json!(100.0));
        assert_eq!(s.history.len(), 1);
    }
}
