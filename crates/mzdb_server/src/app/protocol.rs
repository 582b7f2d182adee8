use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct ToolRequest {
    #[serde(default)]
    pub(crate) id: Value,
    pub(crate) tool: String,
    #[serde(default = "empty_args")]
    pub(crate) args: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ToolResponse {
    pub(crate) id: Value,
    pub(crate) ok: bool,
    pub(crate) message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) data: Option<Value>,
}

impl ToolResponse {
    pub(crate) fn success(id: Value, message: impl Into<String>, data: Value) -> Self {
        Self {
            id,
            ok: true,
            message: message.into(),
            data: if data.is_null() { None } else { Some(data) },
        }
    }

    pub(crate) fn failure(id: Value, message: impl Into<String>) -> Self {
        Self {
            id,
            ok: false,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum WireLine {
    Blank,
    Request(ToolRequest),
    Malformed { id: Value, reason: String },
}

fn empty_args() -> Value {
    Value::Object(Default::default())
}

pub(crate) fn parse_wire_line(raw: &str) -> WireLine {
    let trimmed = raw.trim_end_matches(['\r', '\n']).trim();
    if trimmed.is_empty() {
        return WireLine::Blank;
    }
    let value = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => value,
        Err(error) => {
            return WireLine::Malformed {
                id: Value::Null,
                reason: format!("request is not valid json: {error}"),
            }
        }
    };
    // Echo the id back even when the rest of the envelope is wrong.
    let id = value.get("id").cloned().unwrap_or(Value::Null);
    match serde_json::from_value::<ToolRequest>(value) {
        Ok(request) if request.args.is_object() => WireLine::Request(request),
        Ok(_) => WireLine::Malformed {
            id,
            reason: "request args must be a json object".to_string(),
        },
        Err(error) => WireLine::Malformed {
            id,
            reason: format!("invalid request envelope: {error}"),
        },
    }
}

pub(crate) fn encode_response(response: &ToolResponse) -> String {
    serde_json::to_string(response).unwrap_or_else(|error| {
        format!(
            "{{\"id\":null,\"ok\":false,\"message\":\"failed to encode response: {}\"}}",
            error.to_string().replace('"', "'")
        )
    })
}
