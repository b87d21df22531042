use std::sync::Arc;

use serde_json::{json, Value};

use busgate_common::{value::BusValue, Error, Result, INTROSPECTABLE_INTERFACE};

use crate::client::{BusClient, MethodCall};

pub mod actions;
pub mod enumerate;
pub mod introspect;
pub mod properties;

pub use actions::handle_action;
pub use enumerate::{handle_enumerate, handle_list};
pub use introspect::{
    handle_bus_index, handle_bus_names, handle_bus_object, handle_introspect_walk,
};
pub use properties::{handle_get, handle_put};

/// The success envelope every object-namespace operation shares.
pub(crate) fn ok_envelope(data: Value) -> Value {
    json!({
        "status": "ok",
        "message": "200 OK",
        "data": data,
    })
}

/// Joins an object path and a child node name.
pub(crate) fn child_path(parent: &str, child: &str) -> String {
    if parent == "/" {
        format!("/{child}")
    } else {
        format!("{parent}/{child}")
    }
}

/// Fetches the introspection document of `connection` at `path`.
pub(crate) async fn introspect_connection(
    bus: &Arc<dyn BusClient>,
    connection: &str,
    path: &str,
) -> Result<String> {
    let call = MethodCall::new(connection, path, INTROSPECTABLE_INTERFACE, "Introspect");
    let reply = bus.method_call(call).await?;

    match reply.first().and_then(BusValue::as_str) {
        Some(xml) => Ok(xml.to_owned()),
        None => Err(Error::Bus("Introspect reply is not a string".into())),
    }
}
