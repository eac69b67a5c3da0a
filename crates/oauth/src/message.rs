//! Cross-window wire format:
//! `{ type: "<PROVIDER>_AUTH_SUCCESS" | "<PROVIDER>_AUTH_ERROR", code?, state?, error? }`.

use crate::provider::ProviderMeta;
use aptwise_api::Provider;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const INVALID_CALLBACK_PARAMETERS: &str = "Invalid callback parameters";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackMessage {
    Success {
        provider: Provider,
        code: String,
        state: String,
    },
    Error {
        provider: Provider,
        error: Option<String>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl CallbackMessage {
    pub fn provider(&self) -> Provider {
        match self {
            CallbackMessage::Success { provider, .. } | CallbackMessage::Error { provider, .. } => {
                *provider
            }
        }
    }

    pub fn to_wire(&self) -> Value {
        let wire = match self {
            CallbackMessage::Success {
                provider,
                code,
                state,
            } => WireMessage {
                kind: ProviderMeta::of(*provider).success_type(),
                code: Some(code.clone()),
                state: Some(state.clone()),
                error: None,
            },
            CallbackMessage::Error { provider, error } => WireMessage {
                kind: ProviderMeta::of(*provider).error_type(),
                code: None,
                state: None,
                error: error.clone(),
            },
        };
        serde_json::to_value(wire).unwrap_or(Value::Null)
    }

    /// Decodes a posted message. Returns `None` for anything that is not an OAuth callback, since
    /// the opener window receives unrelated messages too.
    pub fn from_wire(data: &Value) -> Option<Self> {
        let wire: WireMessage = serde_json::from_value(data.clone()).ok()?;
        if let Some(prefix) = wire.kind.strip_suffix("_AUTH_SUCCESS") {
            let provider = ProviderMeta::from_prefix(prefix)?.provider;
            return Some(match (wire.code, wire.state) {
                (Some(code), Some(state)) if !code.is_empty() && !state.is_empty() => {
                    CallbackMessage::Success {
                        provider,
                        code,
                        state,
                    }
                }
                _ => CallbackMessage::Error {
                    provider,
                    error: Some(INVALID_CALLBACK_PARAMETERS.to_string()),
                },
            });
        }
        if let Some(prefix) = wire.kind.strip_suffix("_AUTH_ERROR") {
            let provider = ProviderMeta::from_prefix(prefix)?.provider;
            return Some(CallbackMessage::Error {
                provider,
                error: wire.error.filter(|e| !e.is_empty()),
            });
        }
        None
    }
}
