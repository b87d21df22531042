use std::sync::Arc;

use log::{debug, error};
use serde_json::{json, Value};

use busgate_common::{
    codec, introspect,
    value::{BusValue, MessageBuilder},
    Result, PROPERTIES_INTERFACE,
};

use crate::{
    client::{BusClient, MethodCall},
    http::{Response, ResponseHandle, Status},
    mapper::Mapper,
    transaction::Transaction,
};

/// `GET <path>` and `GET <path>/attr/<name>`.
///
/// An empty `property_name` fills the document with every property of
/// every owner; a named property is returned as a bare scalar.
pub async fn handle_get(
    bus: Arc<dyn BusClient>,
    response: ResponseHandle,
    path: &str,
    property_name: &str,
) {
    let mapper = Mapper::new(bus.clone());

    let owners = match mapper.get_object(path).await {
        Ok(owners) if !owners.is_empty() => owners,
        Ok(_) => {
            response.send(Response::status(Status::NotFound));
            return;
        }
        Err(e) => {
            debug!("GetObject failed for {path}: {e}");
            response.send(Response::status(Status::NotFound));
            return;
        }
    };

    // The mapper should never return an owner without interfaces, but
    // check anyway
    if owners.iter().any(|(_, interfaces)| interfaces.is_empty()) {
        response.send(Response::status(Status::NotFound));
        return;
    }

    let transaction = Transaction::begin(response, json!({}), |data| {
        Response::ok(super::ok_envelope(data))
    });

    for (connection, interfaces) in owners {
        for interface in interfaces {
            spawn_get_all(
                bus.clone(),
                connection.clone(),
                path.to_owned(),
                interface,
                property_name.to_owned(),
                transaction.clone(),
            );
        }
    }
}

fn spawn_get_all(
    bus: Arc<dyn BusClient>,
    connection: String,
    path: String,
    interface: String,
    property_name: String,
    transaction: Arc<Transaction>,
) {
    tokio::spawn(async move {
        let call = MethodCall::new(&connection, &path, PROPERTIES_INTERFACE, "GetAll")
            .arg(BusValue::Str(interface.clone()));

        let reply = match bus.method_call(call).await {
            Ok(reply) => reply,
            Err(e) => {
                // Partial failures leave the aggregate intact
                error!("GetAll failed on {connection} {interface}: {e}");
                return;
            }
        };

        let Some(BusValue::Array { items, .. }) = reply.first() else {
            error!("Unexpected GetAll reply shape from {connection}");
            return;
        };

        transaction.update(|document| {
            for item in items {
                let BusValue::DictEntry(name, value) = item else {
                    continue;
                };
                let Some(name) = name.as_str() else {
                    continue;
                };

                if property_name.is_empty() {
                    document[name] = codec::decode(value);
                } else if name == property_name {
                    *document = codec::decode(value);
                }
            }
        });
    });
}

/// `PUT <path>` and `PUT <path>/attr/<name>`: write one property on
/// every connection exposing it. The body must be `{"data": <value>}`.
pub async fn handle_put(
    bus: Arc<dyn BusClient>,
    response: ResponseHandle,
    path: &str,
    property_name: &str,
    body: &[u8],
) {
    let body: Value = match serde_json::from_slice(body) {
        Ok(body) => body,
        Err(_) => {
            response.send(Response::status(Status::BadRequest));
            return;
        }
    };

    let Some(value) = body.get("data") else {
        response.send(Response::status(Status::BadRequest));
        return;
    };

    let mapper = Mapper::new(bus.clone());
    let owners = match mapper.get_object(path).await {
        Ok(owners) if !owners.is_empty() => owners,
        Ok(_) => {
            response.send(Response::status(Status::NotFound));
            return;
        }
        Err(e) => {
            error!("GetObject failed for {path}: {e}");
            response.send(Response::status(Status::InternalError));
            return;
        }
    };

    let forbidden_name = property_name.to_owned();
    let transaction = Transaction::begin(response, Value::Null, move |data| {
        if data.is_null() {
            // No interface exposed the property
            Response::with_body(
                Status::Forbidden,
                json!({
                    "status": "error",
                    "message": "403 Forbidden",
                    "data": {
                        "message": format!(
                            "The specified property cannot be created: {forbidden_name}"
                        ),
                    },
                }),
            )
        } else {
            Response::ok(data)
        }
    });

    for (connection, _) in owners {
        spawn_set_property(
            bus.clone(),
            connection,
            path.to_owned(),
            property_name.to_owned(),
            value.clone(),
            transaction.clone(),
        );
    }
}

fn spawn_set_property(
    bus: Arc<dyn BusClient>,
    connection: String,
    path: String,
    property_name: String,
    value: Value,
    transaction: Arc<Transaction>,
) {
    tokio::spawn(async move {
        let xml = match super::introspect_connection(&bus, &connection, &path).await {
            Ok(xml) => xml,
            Err(e) => {
                error!("Introspect call failed on {connection} {path}: {e}");
                transaction.set_error();
                return;
            }
        };

        let node = match introspect::parse(&xml) {
            Ok(node) => node,
            Err(e) => {
                error!("Introspection of {connection} {path} did not parse: {e}");
                transaction.set_error();
                return;
            }
        };

        for interface in &node.interfaces {
            let Some(property) = interface
                .properties
                .iter()
                .find(|property| property.name == property_name)
            else {
                continue;
            };
            debug!(
                "Found property {property_name} on {} with type {}",
                interface.name, property.signature
            );

            let call = match set_property_call(
                &connection,
                &path,
                &interface.name,
                &property_name,
                &property.signature,
                &value,
            ) {
                Ok(call) => call,
                Err(e) => {
                    error!("Failed to encode {value} as \"{}\": {e}", property.signature);
                    transaction.set_error();
                    return;
                }
            };

            match bus.method_call(call).await {
                Ok(_) => transaction.update(|document| {
                    *document = super::ok_envelope(Value::Null);
                }),
                // The bus error text travels inside the envelope; the
                // status line stays 200
                Err(e) => transaction.update(|document| {
                    *document = json!({"status": "error", "message": e.to_string()});
                }),
            }
        }
    });
}

fn set_property_call(
    connection: &str,
    path: &str,
    interface: &str,
    property_name: &str,
    signature: &str,
    value: &Value,
) -> Result<MethodCall> {
    let mut builder = MessageBuilder::new();
    builder.append_str(interface)?;
    builder.append_str(property_name)?;
    builder.open_variant(signature)?;
    codec::encode(&mut builder, signature, value)?;
    builder.close()?;

    MethodCall::new(connection, path, PROPERTIES_INTERFACE, "Set").with_args(builder)
}
