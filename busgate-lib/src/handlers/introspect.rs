use std::sync::Arc;

use log::error;
use serde_json::{json, Value};

use busgate_common::{
    introspect, value::BusValue, DBUS_INTERFACE, DBUS_PATH, DBUS_SERVICE,
};

use crate::{
    client::{BusClient, MethodCall},
    http::{Response, ResponseHandle, Status},
    transaction::Transaction,
};

/// `GET /bus/`: the fixed single-bus index.
pub fn handle_bus_index(response: ResponseHandle) {
    response.send(Response::ok(json!({
        "busses": [{"name": "system"}],
        "status": "ok",
    })));
}

/// `GET /bus/system/`: every name on the bus, sorted.
pub async fn handle_bus_names(bus: Arc<dyn BusClient>, response: ResponseHandle) {
    let call = MethodCall::new(DBUS_SERVICE, DBUS_PATH, DBUS_INTERFACE, "ListNames");

    let reply = match bus.method_call(call).await {
        Ok(reply) => reply,
        Err(e) => {
            error!("ListNames failed: {e}");
            response.send(Response::status(Status::InternalError));
            return;
        }
    };

    let names = reply.first().and_then(|value| match value {
        BusValue::Array { items, .. } => items
            .iter()
            .map(BusValue::as_str)
            .collect::<Option<Vec<_>>>(),
        _ => None,
    });

    match names {
        Some(mut names) => {
            names.sort_unstable();
            let objects: Vec<Value> = names.iter().map(|name| json!({"name": name})).collect();
            response.send(Response::ok(json!({"status": "ok", "objects": objects})));
        }
        None => {
            error!("Unexpected ListNames reply shape");
            response.send(Response::status(Status::InternalError));
        }
    }
}

/// `GET /bus/system/<connection>/`: walk the whole introspection tree of
/// one connection, collecting every reachable object path.
pub fn handle_introspect_walk(
    bus: Arc<dyn BusClient>,
    response: ResponseHandle,
    connection: &str,
    root: &str,
) {
    let bus_name = connection.to_owned();
    let transaction = Transaction::begin(response, json!([]), move |objects| {
        Response::ok(json!({
            "status": "ok",
            "bus_name": bus_name,
            "objects": objects,
        }))
    });

    spawn_introspect_node(bus, connection.to_owned(), root.to_owned(), transaction);
}

fn spawn_introspect_node(
    bus: Arc<dyn BusClient>,
    connection: String,
    path: String,
    transaction: Arc<Transaction>,
) {
    tokio::spawn(async move {
        let xml = match super::introspect_connection(&bus, &connection, &path).await {
            Ok(xml) => xml,
            Err(e) => {
                error!("Introspect call failed with error: {e} on process: {connection} path: {path}");
                return;
            }
        };

        transaction.update(|objects| {
            if let Some(objects) = objects.as_array_mut() {
                objects.push(json!({"path": path}));
            }
        });

        // A node that fails to parse prunes the walk below it
        let node = match introspect::parse(&xml) {
            Ok(node) => node,
            Err(e) => {
                error!("XML document failed to parse {connection} {path}: {e}");
                return;
            }
        };

        for child in &node.children {
            spawn_introspect_node(
                bus.clone(),
                connection.clone(),
                super::child_path(&path, &child.name),
                transaction.clone(),
            );
        }
    });
}

/// `GET /bus/system/<connection>/<path>[/<interface>]`: the interface
/// list of one object, or the method and signal descriptions of one of
/// its interfaces.
pub async fn handle_bus_object(
    bus: Arc<dyn BusClient>,
    response: ResponseHandle,
    connection: &str,
    path: &str,
    interface_name: Option<&str>,
) {
    let xml = match super::introspect_connection(&bus, &connection, &path).await {
        Ok(xml) => xml,
        Err(e) => {
            error!("Introspect call failed with error: {e} on process: {connection} path: {path}");
            response.send(Response::status(Status::InternalError));
            return;
        }
    };

    let node = match introspect::parse(&xml) {
        Ok(node) => node,
        Err(e) => {
            error!("XML document failed to parse {connection} {path}: {e}");
            response.send(Response::with_body(
                Status::InternalError,
                json!({"status": "XML parse error"}),
            ));
            return;
        }
    };

    let Some(interface_name) = interface_name else {
        let interfaces: Vec<Value> = node
            .interfaces
            .iter()
            .map(|interface| json!({"name": interface.name}))
            .collect();

        response.send(Response::ok(json!({
            "status": "ok",
            "bus_name": connection,
            "interfaces": interfaces,
            "object_path": path,
        })));
        return;
    };

    let Some(interface) = node
        .interfaces
        .iter()
        .find(|interface| interface.name == interface_name)
    else {
        response.send(Response::status(Status::NotFound));
        return;
    };

    let methods: Vec<Value> = interface
        .methods
        .iter()
        .map(|method| {
            json!({
                "name": method.name,
                "uri": format!(
                    "/bus/system/{connection}{path}/{interface_name}/{}",
                    method.name
                ),
                "args": method
                    .args
                    .iter()
                    .map(|arg| {
                        json!({
                            "name": arg.name,
                            "type": arg.signature,
                            "direction": arg.direction.as_str(),
                        })
                    })
                    .collect::<Vec<Value>>(),
            })
        })
        .collect();

    let signals: Vec<Value> = interface
        .signals
        .iter()
        .map(|signal| {
            json!({
                "name": signal.name,
                "args": signal
                    .args
                    .iter()
                    .map(|arg| json!({"name": arg.name, "type": arg.signature}))
                    .collect::<Vec<Value>>(),
            })
        })
        .collect();

    response.send(Response::ok(json!({
        "status": "ok",
        "bus_name": connection,
        "interface": interface_name,
        "methods": methods,
        "object_path": path,
        "properties": {},
        "signals": signals,
    })));
}
