use async_trait::async_trait;

use busgate_common::{
    value::{BusValue, MessageBuilder},
    Result,
};

/// One outgoing bus method call.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    pub destination: String,
    pub path: String,
    pub interface: String,
    pub member: String,
    pub args: Vec<BusValue>,
}

impl MethodCall {
    /// Starts a call with no arguments.
    pub fn new(destination: &str, path: &str, interface: &str, member: &str) -> Self {
        Self {
            destination: destination.to_owned(),
            path: path.to_owned(),
            interface: interface.to_owned(),
            member: member.to_owned(),
            args: Vec::new(),
        }
    }

    /// Appends one pre-built argument.
    pub fn arg(mut self, value: BusValue) -> Self {
        self.args.push(value);
        self
    }

    /// Attaches the arguments collected by `builder`.
    pub fn with_args(mut self, builder: MessageBuilder) -> Result<Self> {
        self.args = builder.finish()?;
        Ok(self)
    }
}

/// Asynchronous access to the system bus.
///
/// The transport is provided by the embedding application. The bridge
/// only needs typed method calls with typed replies; per-call timeouts
/// are whatever the transport defaults to.
#[async_trait]
pub trait BusClient: Send + Sync {
    async fn method_call(&self, call: MethodCall) -> Result<Vec<BusValue>>;
}
