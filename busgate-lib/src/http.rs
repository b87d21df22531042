use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

/// HTTP verb of an incoming request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
    Head,
    Patch,
}

/// An incoming request as handed over by the HTTP frontend.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: Bytes,
}

impl Request {
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_owned(),
            body: Bytes::new(),
        }
    }

    pub fn with_body(method: Method, path: &str, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            path: path.to_owned(),
            body: body.into(),
        }
    }
}

/// Status line values the bridge produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    BadRequest,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    InternalError,
}

impl Status {
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::Forbidden => 403,
            Status::NotFound => 404,
            Status::MethodNotAllowed => 405,
            Status::InternalError => 500,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Status::Ok => "200 OK",
            Status::BadRequest => "400 Bad Request",
            Status::Forbidden => "403 Forbidden",
            Status::NotFound => "404 Not Found",
            Status::MethodNotAllowed => "405 Method Not Allowed",
            Status::InternalError => "500 Internal Server Error",
        }
    }
}

/// The finished response the HTTP frontend writes out.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: Status,
    pub body: Option<Value>,
}

impl Response {
    pub fn ok(body: Value) -> Self {
        Self {
            status: Status::Ok,
            body: Some(body),
        }
    }

    pub fn status(status: Status) -> Self {
        Self { status, body: None }
    }

    pub fn with_body(status: Status, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }
}

/// Write end of one in-flight request.
///
/// The first send wins. Later sends, and sends after the client went
/// away, turn into no-ops so outstanding bus callbacks can drain.
pub struct ResponseHandle {
    sender: Mutex<Option<oneshot::Sender<Response>>>,
}

impl ResponseHandle {
    pub fn channel() -> (Self, oneshot::Receiver<Response>) {
        let (sender, receiver) = oneshot::channel();

        (
            Self {
                sender: Mutex::new(Some(sender)),
            },
            receiver,
        )
    }

    pub fn send(&self, response: Response) {
        if let Some(sender) = self.sender.lock().take() {
            // The receiver is gone if the client disconnected
            let _ = sender.send(response);
        }
    }
}
