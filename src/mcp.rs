//! Purpose: Transport-agnostic MCP JSON-RPC core for the movie query tools.
//! Key exports: `McpDispatcher`, `McpHandler`, request/response envelopes.
//! Role: Protocol adapter between a line transport and the tool catalog.
//! Invariants: Requests without an `id` are notifications and never get a response.
//! Invariants: Unknown methods and malformed request shapes map to protocol errors.
//! Invariants: Tool execution failures are successful responses with `result.isError`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

const JSON_RPC_VERSION: &str = "2.0";
const MCP_PROTOCOL_VERSION: &str = "2025-06-18";
pub const PARSE_ERROR_CODE: i32 = -32700;
pub const INVALID_REQUEST_CODE: i32 = -32600;
pub const METHOD_NOT_FOUND_CODE: i32 = -32601;
pub const INVALID_PARAMS_CODE: i32 = -32602;
pub const INTERNAL_ERROR_CODE: i32 = -32603;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonRpcId {
    String(String),
    Number(i64),
    Null,
}

#[derive(Clone, Debug, PartialEq)]
pub struct JsonRpcRequest {
    pub id: Option<JsonRpcId>,
    pub method: String,
    pub params: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: JsonRpcId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    fn new(id: JsonRpcId, outcome: Result<Value, JsonRpcError>) -> Self {
        let (result, error) = match outcome {
            Ok(result) => (Some(result), None),
            Err(error) => (None, Some(error)),
        };
        Self {
            jsonrpc: JSON_RPC_VERSION.to_string(),
            id,
            result,
            error,
        }
    }

    pub fn failure(id: JsonRpcId, error: JsonRpcError) -> Self {
        Self::new(id, Err(error))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(PARSE_ERROR_CODE, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST_CODE, message)
    }

    pub fn method_not_found(message: impl Into<String>) -> Self {
        Self::new(METHOD_NOT_FOUND_CODE, message)
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS_CODE, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR_CODE, message)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DispatchOutcome {
    Response(JsonRpcResponse),
    NoResponse,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerMetadata {
    pub name: String,
    pub version: String,
    pub protocol_version: String,
    pub instructions: Option<String>,
}

impl Default for ServerMetadata {
    fn default() -> Self {
        Self {
            name: "cinedex".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            instructions: Some(
                "Read-only queries over a movie dataset loaded at startup.".to_string(),
            ),
        }
    }
}

#[derive(Serialize)]
struct InitializeResult<'a> {
    #[serde(rename = "protocolVersion")]
    protocol_version: &'a str,
    capabilities: Value,
    #[serde(rename = "serverInfo")]
    server_info: ServerInfo<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<&'a str>,
}

#[derive(Serialize)]
struct ServerInfo<'a> {
    name: &'a str,
    version: &'a str,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct McpTool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolCallRequest {
    pub name: String,
    pub arguments: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub content: Vec<Value>,
    #[serde(rename = "isError", default, skip_serializing_if = "is_false")]
    pub is_error: bool,
    #[serde(rename = "structuredContent", skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
}

impl ToolCallResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![text_content(text)],
            is_error: false,
            structured_content: None,
        }
    }

    /// Pretty-printed text; objects are also attached as structured content.
    pub fn json(value: Value) -> Result<Self, JsonRpcError> {
        let text = serde_json::to_string_pretty(&value)
            .map_err(|_| JsonRpcError::internal_error("failed to encode tool result"))?;
        // structuredContent must be an object.
        let structured_content = value.is_object().then_some(value);
        Ok(Self {
            content: vec![text_content(text)],
            is_error: false,
            structured_content,
        })
    }

    pub fn execution_error_text(message: impl Into<String>) -> Self {
        Self {
            content: vec![text_content(message)],
            is_error: true,
            structured_content: None,
        }
    }

    pub fn first_text(&self) -> Option<&str> {
        self.content
            .first()
            .and_then(|item| item.get("text"))
            .and_then(Value::as_str)
    }
}

fn text_content(text: impl Into<String>) -> Value {
    json!({
        "type": "text",
        "text": text.into(),
    })
}

pub trait McpHandler {
    fn list_tools(&mut self) -> Result<Vec<McpTool>, JsonRpcError>;
    fn call_tool(&mut self, request: ToolCallRequest) -> Result<ToolCallResult, JsonRpcError>;
}

pub struct McpDispatcher<H> {
    metadata: ServerMetadata,
    handler: H,
}

impl<H: McpHandler> McpDispatcher<H> {
    pub fn new(handler: H) -> Self {
        Self::with_metadata(handler, ServerMetadata::default())
    }

    pub fn with_metadata(handler: H, metadata: ServerMetadata) -> Self {
        Self { metadata, handler }
    }

    pub fn metadata(&self) -> &ServerMetadata {
        &self.metadata
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn dispatch_value(&mut self, value: Value) -> DispatchOutcome {
        match parse_jsonrpc_request(value) {
            Ok(request) => self.dispatch_request(request),
            Err(response) => DispatchOutcome::Response(response),
        }
    }

    pub fn dispatch_request(&mut self, request: JsonRpcRequest) -> DispatchOutcome {
        let method = request.method.clone();
        let id = request.id.clone();
        let outcome = self.route_method(request);
        if let Err(error) = &outcome {
            tracing::debug!(method = %method, code = error.code, "request failed");
        }
        match id {
            Some(id) => DispatchOutcome::Response(JsonRpcResponse::new(id, outcome)),
            None => DispatchOutcome::NoResponse,
        }
    }

    fn route_method(&mut self, request: JsonRpcRequest) -> Result<Value, JsonRpcError> {
        let params = request.params.as_ref();
        match request.method.as_str() {
            "initialize" => {
                ensure_object_or_absent(params)?;
                to_value(self.initialize_result())
            }
            "notifications/initialized" | "notifications/cancelled" | "ping" => {
                ensure_object_or_absent(params)?;
                Ok(json!({}))
            }
            "tools/list" => {
                ensure_object_or_absent(params)?;
                let tools = self.handler.list_tools()?;
                Ok(json!({ "tools": tools }))
            }
            "tools/call" => {
                let tool_request = parse_tool_call_params(params)?;
                tracing::debug!(tool = %tool_request.name, "tool call");
                let result = self.handler.call_tool(tool_request)?;
                to_value(result)
            }
            other => Err(JsonRpcError::method_not_found(format!(
                "method not found: {other}"
            ))),
        }
    }

    fn initialize_result(&self) -> InitializeResult<'_> {
        InitializeResult {
            protocol_version: &self.metadata.protocol_version,
            capabilities: json!({ "tools": { "listChanged": false } }),
            server_info: ServerInfo {
                name: &self.metadata.name,
                version: &self.metadata.version,
            },
            instructions: self.metadata.instructions.as_deref(),
        }
    }
}

pub fn parse_jsonrpc_line(line: &str) -> Result<Value, JsonRpcError> {
    serde_json::from_str::<Value>(line).map_err(|_| JsonRpcError::parse_error("invalid JSON"))
}

fn parse_jsonrpc_request(value: Value) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let Value::Object(mut object) = value else {
        return Err(JsonRpcResponse::failure(
            JsonRpcId::Null,
            JsonRpcError::invalid_request("request must be a JSON object"),
        ));
    };

    let id = object
        .remove("id")
        .map(parse_jsonrpc_id)
        .transpose()
        .map_err(|error| JsonRpcResponse::failure(JsonRpcId::Null, error))?;
    let reject = |message: &str| {
        JsonRpcResponse::failure(
            id.clone().unwrap_or(JsonRpcId::Null),
            JsonRpcError::invalid_request(message),
        )
    };

    match object.remove("jsonrpc") {
        Some(Value::String(version)) if version == JSON_RPC_VERSION => {}
        Some(_) => return Err(reject("jsonrpc must be \"2.0\"")),
        None => return Err(reject("missing jsonrpc field")),
    }

    let method = match object.remove("method") {
        Some(Value::String(method)) => method,
        _ => return Err(reject("missing method field")),
    };

    Ok(JsonRpcRequest {
        id,
        method,
        params: object.remove("params"),
    })
}

fn parse_jsonrpc_id(value: Value) -> Result<JsonRpcId, JsonRpcError> {
    match value {
        Value::String(value) => Ok(JsonRpcId::String(value)),
        Value::Number(value) => value
            .as_i64()
            .map(JsonRpcId::Number)
            .ok_or_else(|| JsonRpcError::invalid_request("id must be an integer number")),
        Value::Null => Ok(JsonRpcId::Null),
        _ => Err(JsonRpcError::invalid_request(
            "id must be a string, integer number, or null",
        )),
    }
}

fn ensure_object_or_absent(params: Option<&Value>) -> Result<(), JsonRpcError> {
    match params {
        None | Some(Value::Null) | Some(Value::Object(_)) => Ok(()),
        _ => Err(JsonRpcError::invalid_params(
            "params must be an object when provided",
        )),
    }
}

fn parse_tool_call_params(params: Option<&Value>) -> Result<ToolCallRequest, JsonRpcError> {
    let Some(Value::Object(params)) = params else {
        return Err(JsonRpcError::invalid_params(
            "tools/call requires object params",
        ));
    };

    let name = params
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| JsonRpcError::invalid_params("tools/call requires string param `name`"))?
        .to_string();

    let arguments = match params.get("arguments") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(arguments)) => arguments.clone(),
        Some(_) => {
            return Err(JsonRpcError::invalid_params(
                "tools/call `arguments` must be an object",
            ));
        }
    };

    Ok(ToolCallRequest { name, arguments })
}

fn to_value<T: Serialize>(value: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|_| JsonRpcError::internal_error("failed to encode result"))
}

fn is_false(value: &bool) -> bool {
    !*value
}
