use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Provider error codes defined by EIP-1193 and EIP-3085.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorCode {
    UserRejected,
    Unauthorized,
    UnsupportedMethod,
    Disconnected,
    ChainDisconnected,
    UnrecognizedChain,
    Other(i64),
}

impl From<i64> for ProviderErrorCode {
    fn from(code: i64) -> Self {
        match code {
            4001 => Self::UserRejected,
            4100 => Self::Unauthorized,
            4200 => Self::UnsupportedMethod,
            4900 => Self::Disconnected,
            4901 => Self::ChainDisconnected,
            4902 => Self::UnrecognizedChain,
            other => Self::Other(other),
        }
    }
}

impl From<ProviderErrorCode> for i64 {
    fn from(code: ProviderErrorCode) -> Self {
        match code {
            ProviderErrorCode::UserRejected => 4001,
            ProviderErrorCode::Unauthorized => 4100,
            ProviderErrorCode::UnsupportedMethod => 4200,
            ProviderErrorCode::Disconnected => 4900,
            ProviderErrorCode::ChainDisconnected => 4901,
            ProviderErrorCode::UnrecognizedChain => 4902,
            ProviderErrorCode::Other(other) => other,
        }
    }
}

/// The `error` member of a JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("{message} (code {code})")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },
    #[error("wallet transport failed: {0}")]
    Transport(String),
    #[error("malformed wallet response: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn rpc(code: impl Into<i64>, message: impl Into<String>) -> Self {
        Self::Rpc {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }

    pub fn user_rejected(message: impl Into<String>) -> Self {
        Self::rpc(ProviderErrorCode::UserRejected, message)
    }

    pub fn decode(err: impl ToString) -> Self {
        Self::Decode(err.to_string())
    }

    pub fn code(&self) -> Option<ProviderErrorCode> {
        match self {
            Self::Rpc { code, .. } => Some(ProviderErrorCode::from(*code)),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code() == Some(ProviderErrorCode::UserRejected)
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.code() == Some(ProviderErrorCode::UnrecognizedChain)
    }

    /// The human-readable part, without the code suffix.
    pub fn message(&self) -> String {
        match self {
            Self::Rpc { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<RpcErrorObject> for ProviderError {
    fn from(value: RpcErrorObject) -> Self {
        Self::Rpc {
            code: value.code,
            message: value.message,
            data: value.data,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("contract address '{value}' is malformed: {reason}")]
    InvalidContractAddress { value: String, reason: String },
    #[error("'{0}' is not a valid hex or decimal chain id")]
    InvalidChainId(String),
    #[error("{field} entry '{value}' is not a valid url: {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("network '{0}' lists no rpc endpoints")]
    MissingRpcEndpoint(String),
    #[error("missing required setting {0}")]
    MissingField(&'static str),
}
