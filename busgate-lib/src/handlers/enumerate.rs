use std::{collections::BTreeSet, sync::Arc};

use log::{debug, error};
use serde_json::json;

use busgate_common::{codec, value::BusValue, LIST_SUBTREE_DEPTH, OBJECT_MANAGER_INTERFACE};

use crate::{
    client::{BusClient, MethodCall},
    http::{Response, ResponseHandle, Status},
    mapper::Mapper,
    transaction::Transaction,
};

/// `GET <path>/list`: every object path below `path`.
pub async fn handle_list(bus: Arc<dyn BusClient>, response: ResponseHandle, path: &str) {
    let mapper = Mapper::new(bus);

    match mapper.get_sub_tree_paths(path, LIST_SUBTREE_DEPTH).await {
        Ok(paths) => response.send(Response::ok(super::ok_envelope(json!(paths)))),
        Err(e) => {
            error!("GetSubTreePaths failed for {path}: {e}");
            response.send(Response::status(Status::InternalError));
        }
    }
}

/// `GET <path>/enumerate`: the managed objects of every connection with
/// an object below `path`, merged into one document keyed by object path.
pub async fn handle_enumerate(bus: Arc<dyn BusClient>, response: ResponseHandle, path: &str) {
    let mapper = Mapper::new(bus.clone());

    let sub_tree = match mapper.get_sub_tree(path, 0).await {
        Ok(sub_tree) => sub_tree,
        Err(e) => {
            // Unknown paths surface as mapper errors. Report an empty set
            debug!("GetSubTree failed for {path}: {e}");
            response.send(Response::ok(super::ok_envelope(json!({}))));
            return;
        }
    };

    let mut connections = BTreeSet::new();
    for (_, owners) in &sub_tree {
        for (connection, _) in owners {
            connections.insert(connection.clone());
        }
    }

    if connections.is_empty() {
        if sub_tree.is_empty() {
            response.send(Response::ok(super::ok_envelope(json!({}))));
        } else {
            response.send(Response::status(Status::NotFound));
        }
        return;
    }

    let transaction = Transaction::begin(response, json!({}), |data| {
        Response::ok(super::ok_envelope(data))
    });

    for connection in connections {
        spawn_get_managed_objects(bus.clone(), connection, path.to_owned(), transaction.clone());
    }
}

fn spawn_get_managed_objects(
    bus: Arc<dyn BusClient>,
    connection: String,
    path: String,
    transaction: Arc<Transaction>,
) {
    tokio::spawn(async move {
        let call = MethodCall::new(&connection, &path, OBJECT_MANAGER_INTERFACE, "GetManagedObjects");

        match bus.method_call(call).await {
            Ok(reply) => merge_managed_objects(&reply, &transaction),
            // Partial failures leave the aggregate intact
            Err(e) => error!("GetManagedObjects failed on {connection}: {e}"),
        }
    });
}

/// Folds one `GetManagedObjects` reply into the shared document. The
/// interface boundary is flattened: every property lands directly under
/// its object path, last writer winning on duplicate names.
fn merge_managed_objects(reply: &[BusValue], transaction: &Arc<Transaction>) {
    let Some(BusValue::Array { items, .. }) = reply.first() else {
        error!("Unexpected GetManagedObjects reply shape");
        return;
    };

    transaction.update(|document| {
        let Some(root) = document.as_object_mut() else {
            return;
        };

        for item in items {
            let BusValue::DictEntry(object_path, interfaces) = item else {
                continue;
            };
            let Some(object_path) = object_path.as_str() else {
                continue;
            };
            debug!("Reading object {object_path}");

            let object = root
                .entry(object_path.to_owned())
                .or_insert_with(|| json!({}));
            let Some(object) = object.as_object_mut() else {
                continue;
            };

            let BusValue::Array {
                items: interfaces, ..
            } = interfaces.as_ref()
            else {
                continue;
            };

            for interface in interfaces {
                let BusValue::DictEntry(_, properties) = interface else {
                    continue;
                };
                let BusValue::Array {
                    items: properties, ..
                } = properties.as_ref()
                else {
                    continue;
                };

                for property in properties {
                    let BusValue::DictEntry(name, value) = property else {
                        continue;
                    };
                    let Some(name) = name.as_str() else {
                        continue;
                    };

                    object.insert(name.to_owned(), codec::decode(value));
                }
            }
        }
    });
}
