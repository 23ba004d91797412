//! Say-hello command.

use serde::{Deserialize, Serialize};
use unary_rpc::{Operation, RpcMessage};

/// Request to greet someone.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HelloRequest {
    /// Who to greet.
    pub name: String,
}

/// The greeting.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HelloResponse {
    /// Greeting text.
    pub message: String,
}

impl RpcMessage for HelloRequest {
    type Response = HelloResponse;

    const OPERATION: Operation = "HelloService.SayHello";
}
