use std::{mem, sync::Arc};

use parking_lot::Mutex;
use serde_json::Value;

use crate::http::{Response, ResponseHandle, Status};

type Finalizer = Box<dyn FnOnce(Value) -> Response + Send>;

struct State {
    document: Value,
    error: bool,
    finalize: Option<Finalizer>,
}

/// Shared state of one fan-out request.
///
/// Every spawned bus callback holds a clone of the `Arc`; dropping the
/// last clone renders and sends the response, so exactly one response
/// leaves per request however the callbacks interleave. An error flag
/// set anywhere discards the accumulated document and turns the
/// response into a 500.
pub struct Transaction {
    response: ResponseHandle,
    state: Mutex<State>,
}

impl Transaction {
    /// Opens a transaction seeded with `document`. `finalize` renders
    /// the success response from whatever the callbacks accumulated.
    pub fn begin<F>(response: ResponseHandle, document: Value, finalize: F) -> Arc<Self>
    where
        F: FnOnce(Value) -> Response + Send + 'static,
    {
        Arc::new(Self {
            response,
            state: Mutex::new(State {
                document,
                error: false,
                finalize: Some(Box::new(finalize)),
            }),
        })
    }

    /// Marks the whole request failed. Finalization turns into a 500.
    pub fn set_error(&self) {
        self.state.lock().error = true;
    }

    /// Mutates the working document under the lock.
    pub fn update<R>(&self, mutate: impl FnOnce(&mut Value) -> R) -> R {
        mutate(&mut self.state.lock().document)
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        let state = self.state.get_mut();

        if state.error {
            self.response.send(Response::status(Status::InternalError));
            return;
        }

        let document = mem::take(&mut state.document);
        match state.finalize.take() {
            Some(finalize) => self.response.send(finalize(document)),
            None => self.response.send(Response::status(Status::InternalError)),
        }
    }
}

