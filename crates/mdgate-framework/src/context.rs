//! Invocation context.
//!
//! Handlers receive an [`InvocationContext`] next to the envelope. It carries
//! what the hosting runtime knows about the running function, when it knows
//! anything; tests and local runs pass [`InvocationContext::default`].

use serde::{Deserialize, Serialize};

/// Metadata about the function serving the invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub version: String,
    /// Configured memory in megabytes.
    pub memory_limit: u32,
    pub request_id: String,
}

/// Per-invocation data handed to handlers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationContext {
    function: Option<FunctionInfo>,
}

impl InvocationContext {
    /// A context without function metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context describing the running function.
    pub fn with_function(function: FunctionInfo) -> Self {
        Self {
            function: Some(function),
        }
    }

    pub fn function(&self) -> Option<&FunctionInfo> {
        self.function.as_ref()
    }

    /// Request id of the invocation, if known.
    pub fn request_id(&self) -> Option<&str> {
        self.function.as_ref().map(|f| f.request_id.as_str())
    }
}
