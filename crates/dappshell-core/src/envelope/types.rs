//! Envelope and reply types for the frame protocol.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Bootstrap method every dapp may call without a token.
pub const REQUEST_NEW_TOKEN: &str = "shell_requestNewToken";

/// `subId` value that releases every subscription.
pub const UNSUBSCRIBE_ALL: &str = "*";

/// Which subscriptions an unsubscribe call releases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsubscribe {
    One(String),
    All,
}

impl Unsubscribe {
    /// Resolve the wire `subId`, mapping the wildcard to [`Unsubscribe::All`].
    pub fn from_sub_id(sub_id: &str) -> Self {
        if sub_id == UNSUBSCRIBE_ALL {
            Self::All
        } else {
            Self::One(sub_id.to_string())
        }
    }

    pub fn sub_id(&self) -> &str {
        match self {
            Self::One(id) => id,
            Self::All => UNSUBSCRIBE_ALL,
        }
    }
}

/// The operation an envelope asks for, resolved once at intake.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// Plain method call, either shell-intrinsic or forwarded to the provider.
    Method { method: String, params: Vec<Value> },
    /// Pub/sub subscription; `params[0]` names the subscribed method.
    Subscribe { api: Value, params: Vec<Value> },
    Unsubscribe(Unsubscribe),
}

impl Call {
    /// Method name that permissions and sections are checked against.
    pub fn permission_key(&self) -> Option<&str> {
        match self {
            Self::Method { method, .. } => Some(method),
            Self::Subscribe { params, .. } => params.first().and_then(Value::as_str),
            Self::Unsubscribe(_) => None,
        }
    }

    pub fn params(&self) -> &[Value] {
        match self {
            Self::Method { params, .. } | Self::Subscribe { params, .. } => params,
            Self::Unsubscribe(_) => &[],
        }
    }
}

/// A validated inbound message addressed to the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Request id assigned by the dapp; echoed back untouched.
    pub id: Value,
    pub from: String,
    pub to: String,
    /// Session token; `None` when absent or empty.
    pub token: Option<String>,
    /// Raw `method` field as sent, kept for token bootstrap and error text.
    pub method: Option<String>,
    pub call: Call,
}

impl Envelope {
    /// Name used in error replies and logs.
    pub fn method_label(&self) -> &str {
        self.method
            .as_deref()
            .or_else(|| self.call.permission_key())
            .unwrap_or("unsubscribe")
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Build the reply for this envelope from an execution outcome.
    pub fn reply(&self, broker_id: &str, outcome: Result<Value, String>) -> Reply {
        let (result, error) = match outcome {
            Ok(value) => (value, None),
            Err(message) => (Value::Null, Some(message)),
        };
        Reply {
            id: self.id.clone(),
            from: broker_id.to_string(),
            to: self.from.clone(),
            token: self.token.clone(),
            result,
            error,
        }
    }

    /// Reply refusing the call outright.
    pub fn rejection(&self, broker_id: &str) -> Reply {
        self.reply(
            broker_id,
            Err(format!("Method {} not allowed", self.method_label())),
        )
    }

    /// Re-encode in wire form, e.g. for listing pending requests.
    pub fn to_wire(&self) -> Value {
        let mut wire = json!({
            "id": self.id,
            "from": self.from,
            "to": self.to,
            "token": self.token,
        });
        if let Some(method) = &self.method {
            wire["method"] = json!(method);
        }
        match &self.call {
            Call::Method { params, .. } => wire["params"] = json!(params),
            Call::Subscribe { api, params } => {
                wire["api"] = api.clone();
                wire["params"] = json!(params);
            }
            Call::Unsubscribe(target) => wire["subId"] = json!(target.sub_id()),
        }
        wire
    }
}

/// Reply posted back to the originating frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: Value,
    pub from: String,
    pub to: String,
    pub token: Option<String>,
    pub result: Value,
    /// `None` on success, a short human-readable message otherwise.
    pub error: Option<String>,
}

impl Reply {
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Why an inbound message was dropped without a reply.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DropReason {
    #[error("empty message")]
    Empty,

    #[error("not addressed to the broker (to: {0:?})")]
    NotAddressed(Option<String>),

    #[error("missing sender")]
    MissingSender,

    #[error("self-addressed message")]
    SelfAddressed,

    #[error("malformed '{0}' field")]
    Malformed(&'static str),

    #[error("no method, api or subId")]
    NoCall,
}
