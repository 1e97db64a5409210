//! Intake parser for frame messages.
//!
//! Tolerant reader: unknown fields are ignored. Anything the broker must not
//! answer comes back as a [`DropReason`].

use serde_json::Value;

use super::types::{Call, DropReason, Envelope, Unsubscribe};

/// Parse a raw frame message addressed to `broker_id`.
pub fn parse_envelope(raw: &Value, broker_id: &str) -> Result<Envelope, DropReason> {
    let obj = match raw.as_object() {
        Some(obj) if !obj.is_empty() => obj,
        _ => return Err(DropReason::Empty),
    };

    let to = obj.get("to").and_then(Value::as_str);
    if to != Some(broker_id) {
        return Err(DropReason::NotAddressed(to.map(String::from)));
    }

    let from = match obj.get("from").and_then(Value::as_str) {
        Some(from) if !from.is_empty() => from,
        _ => return Err(DropReason::MissingSender),
    };
    if from == broker_id {
        return Err(DropReason::SelfAddressed);
    }

    let token = optional_str(obj.get("token"), "token")?;
    let method = optional_str(obj.get("method"), "method")?;
    let sub_id = optional_str(obj.get("subId"), "subId")?;
    let params = parse_params(obj.get("params"))?;
    let api = obj.get("api").filter(|v| !v.is_null());

    let call = if let Some(api) = api {
        Call::Subscribe {
            api: api.clone(),
            params,
        }
    } else if let Some(sub_id) = &sub_id {
        Call::Unsubscribe(Unsubscribe::from_sub_id(sub_id))
    } else if let Some(method) = &method {
        Call::Method {
            method: method.clone(),
            params,
        }
    } else {
        return Err(DropReason::NoCall);
    };

    Ok(Envelope {
        id: obj.get("id").cloned().unwrap_or(Value::Null),
        from: from.to_string(),
        to: broker_id.to_string(),
        token,
        method,
        call,
    })
}

/// Read an optional string field; empty strings count as absent.
fn optional_str(value: Option<&Value>, field: &'static str) -> Result<Option<String>, DropReason> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(DropReason::Malformed(field)),
    }
}

fn parse_params(value: Option<&Value>) -> Result<Vec<Value>, DropReason> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(_) => Err(DropReason::Malformed("params")),
    }
}
