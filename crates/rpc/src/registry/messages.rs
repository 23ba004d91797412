//! Wire messages spoken by the registry service.

use crate::endpoint::Endpoint;
use crate::protocol::{Operation, RpcMessage};
use serde::{Deserialize, Serialize};

/// Bind a name to an endpoint, replacing any existing binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindRequest {
    /// Service name.
    pub name: String,
    /// Where the service is served.
    pub endpoint: Endpoint,
}

/// Reply to [`BindRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindResponse {
    /// The endpoint the name was bound to before, if any.
    pub previous: Option<Endpoint>,
}

impl RpcMessage for BindRequest {
    type Response = BindResponse;

    const OPERATION: Operation = "Registry.Bind";
}

/// Look up the endpoint bound to a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveRequest {
    /// Service name.
    pub name: String,
}

impl RpcMessage for ResolveRequest {
    type Response = Endpoint;

    const OPERATION: Operation = "Registry.Resolve";
}

/// Remove the binding for a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbindRequest {
    /// Service name.
    pub name: String,
}

impl RpcMessage for UnbindRequest {
    type Response = Option<Endpoint>;

    const OPERATION: Operation = "Registry.Unbind";
}

/// List all bound names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRequest;

impl RpcMessage for ListRequest {
    type Response = Vec<String>;

    const OPERATION: Operation = "Registry.List";
}
