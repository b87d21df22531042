use std::sync::Arc;

use log::{debug, error};
use serde_json::Value;

use busgate_common::{
    codec,
    introspect::{self, Direction},
    value::MessageBuilder,
};

use crate::{
    client::{BusClient, MethodCall},
    http::{Response, ResponseHandle, Status},
    mapper::Mapper,
    transaction::Transaction,
};

/// `POST <path>/action/<method>`: invoke a method on every owning
/// connection that declares it. The body is the JSON argument array.
pub async fn handle_action(
    bus: Arc<dyn BusClient>,
    response: ResponseHandle,
    path: &str,
    method_name: &str,
    body: &[u8],
) {
    let arguments: Value = match serde_json::from_slice(body) {
        Ok(arguments) => arguments,
        Err(_) => {
            response.send(Response::status(Status::BadRequest));
            return;
        }
    };

    let Some(arguments) = arguments.as_array().cloned() else {
        response.send(Response::status(Status::BadRequest));
        return;
    };

    let mapper = Mapper::new(bus.clone());
    let owners = match mapper.get_object(path).await {
        Ok(owners) if !owners.is_empty() => owners,
        Ok(_) => {
            response.send(Response::status(Status::InternalError));
            return;
        }
        Err(e) => {
            error!("GetObject failed for {path}: {e}");
            response.send(Response::status(Status::InternalError));
            return;
        }
    };

    debug!("GetObject returned {} owners for {path}", owners.len());

    let transaction = Transaction::begin(response, Value::Null, Response::ok);

    for (connection, _) in owners {
        spawn_find_action(
            bus.clone(),
            connection,
            path.to_owned(),
            method_name.to_owned(),
            arguments.clone(),
            transaction.clone(),
        );
    }
}

fn spawn_find_action(
    bus: Arc<dyn BusClient>,
    connection: String,
    path: String,
    method_name: String,
    arguments: Vec<Value>,
    transaction: Arc<Transaction>,
) {
    tokio::spawn(async move {
        debug!("Looking for action {method_name} on {connection}");

        let xml = match super::introspect_connection(&bus, &connection, &path).await {
            Ok(xml) => xml,
            Err(e) => {
                error!("Introspect call failed on {connection} {path}: {e}");
                return;
            }
        };

        let node = match introspect::parse(&xml) {
            Ok(node) => node,
            Err(e) => {
                error!("Introspection of {connection} {path} did not parse: {e}");
                return;
            }
        };

        // Every interface declaring the method dispatches; there is no
        // deduplication across interfaces or connections
        for interface in &node.interfaces {
            let Some(method) = interface
                .methods
                .iter()
                .find(|method| method.name == method_name)
            else {
                continue;
            };
            debug!("Found method: {} on {}", method.name, interface.name);

            let in_args: Vec<_> = method
                .args
                .iter()
                .filter(|arg| arg.direction == Direction::In)
                .collect();

            if in_args.len() != arguments.len() {
                error!(
                    "Method {method_name} takes {} arguments, got {}",
                    in_args.len(),
                    arguments.len()
                );
                transaction.set_error();
                return;
            }

            let mut builder = MessageBuilder::new();
            for (arg, value) in in_args.iter().zip(&arguments) {
                if let Err(e) = codec::encode(&mut builder, &arg.signature, value) {
                    error!("Failed to encode {value} as \"{}\": {e}", arg.signature);
                    transaction.set_error();
                    return;
                }
            }

            let call = match MethodCall::new(&connection, &path, &interface.name, &method_name)
                .with_args(builder)
            {
                Ok(call) => call,
                Err(e) => {
                    error!("Failed to build {method_name} call: {e}");
                    transaction.set_error();
                    return;
                }
            };

            match bus.method_call(call).await {
                Ok(_) => transaction.update(|document| {
                    *document = super::ok_envelope(Value::Null);
                }),
                Err(e) => {
                    error!("Action {method_name} failed on {connection}: {e}");
                    transaction.set_error();
                }
            }
        }
    });
}
