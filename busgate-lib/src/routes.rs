use std::sync::Arc;

use log::debug;

use crate::{
    client::BusClient,
    handlers,
    http::{Method, Request, Response, ResponseHandle, Status},
};

/// Routes one request to its handler.
///
/// The HTTP frontend calls this once per request. The response arrives
/// through `response` once the last outstanding bus callback completes,
/// which may be well after this function returns.
pub async fn route(bus: Arc<dyn BusClient>, request: Request, response: ResponseHandle) {
    debug!("{:?} {}", request.method, request.path);

    let path = request.path.as_str();

    if path == "/bus" || path == "/bus/" {
        if request.method != Method::Get {
            response.send(Response::status(Status::MethodNotAllowed));
            return;
        }
        handlers::handle_bus_index(response);
        return;
    }

    if path == "/bus/system" || path == "/bus/system/" {
        if request.method != Method::Get {
            response.send(Response::status(Status::MethodNotAllowed));
            return;
        }
        handlers::handle_bus_names(bus, response).await;
        return;
    }

    if let Some(rest) = path.strip_prefix("/bus/system/") {
        if request.method != Method::Get {
            response.send(Response::status(Status::MethodNotAllowed));
            return;
        }
        route_bus_object(bus, rest, response).await;
        return;
    }

    // No other buses exist
    if path.starts_with("/bus/") {
        response.send(Response::status(Status::NotFound));
        return;
    }

    if path == "/list" || path == "/list/" {
        if request.method != Method::Get {
            response.send(Response::status(Status::MethodNotAllowed));
            return;
        }
        handlers::handle_list(bus, response, "/").await;
        return;
    }

    route_object(bus, request, response).await;
}

/// `/bus/system/<connection>[/<path>[/<interface>[/<method>]]]`.
///
/// Everything up to the first dotted segment is the object path; a
/// dotted segment names the interface.
async fn route_bus_object(bus: Arc<dyn BusClient>, rest: &str, response: ResponseHandle) {
    let (connection, remainder) = match rest.split_once('/') {
        Some(parts) => parts,
        None => (rest, ""),
    };

    if connection.is_empty() {
        response.send(Response::status(Status::NotFound));
        return;
    }

    if remainder.is_empty() {
        // A bare connection walks its whole object tree
        handlers::handle_introspect_walk(bus, response, connection, "/");
        return;
    }

    let mut object_path = String::new();
    let mut interface_name = None;
    let mut method_name = None;

    let mut segments = remainder.split('/');
    for segment in segments.by_ref() {
        if segment.contains('.') {
            interface_name = Some(segment.to_owned());
            break;
        }
        // Trailing slashes produce empty segments
        if !segment.is_empty() {
            object_path.push('/');
            object_path.push_str(segment);
        }
    }

    if interface_name.is_some() {
        for segment in segments {
            if segment.is_empty() {
                continue;
            }
            if method_name.is_some() {
                // More levels past the method name never resolve
                response.send(Response::status(Status::NotFound));
                return;
            }
            method_name = Some(segment.to_owned());
        }
    }

    if object_path.is_empty() {
        object_path.push('/');
    }

    handlers::handle_bus_object(
        bus,
        response,
        connection,
        &object_path,
        interface_name.as_deref(),
    )
    .await;
}

/// Object-namespace requests: the suffix picks the operation.
async fn route_object(bus: Arc<dyn BusClient>, request: Request, response: ResponseHandle) {
    let mut object_path = request.path.trim_end_matches('/').to_owned();
    if object_path.is_empty() {
        object_path.push('/');
    }

    match request.method {
        Method::Get => {
            if let Some(path) = object_path.strip_suffix("/enumerate") {
                handlers::handle_enumerate(bus, response, path).await;
            } else if let Some(path) = object_path.strip_suffix("/list") {
                handlers::handle_list(bus, response, path).await;
            } else if let Some((path, property)) = split_suffix(&object_path, "/attr/") {
                handlers::handle_get(bus, response, &path, &property).await;
            } else {
                handlers::handle_get(bus, response, &object_path, "").await;
            }
        }
        Method::Put => {
            if let Some((path, property)) = split_suffix(&object_path, "/attr/") {
                handlers::handle_put(bus, response, &path, &property, &request.body).await;
            } else {
                handlers::handle_put(bus, response, &object_path, "", &request.body).await;
            }
        }
        Method::Post => {
            // POST only makes sense on an action URL
            if let Some((path, method_name)) = split_suffix(&object_path, "/action/") {
                handlers::handle_action(bus, response, &path, &method_name, &request.body).await;
            } else {
                response.send(Response::status(Status::MethodNotAllowed));
            }
        }
        _ => response.send(Response::status(Status::MethodNotAllowed)),
    }
}

/// Splits at the last occurrence of `separator`.
fn split_suffix(path: &str, separator: &str) -> Option<(String, String)> {
    path.rfind(separator).map(|position| {
        (
            path[..position].to_owned(),
            path[position + separator.len()..].to_owned(),
        )
    })
}

