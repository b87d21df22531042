//! ## Busgate lib
//!
//! The bridging engine of busgate: exposes a D-Bus-compatible system bus
//! as navigable JSON resources over HTTP verbs.
//!
//! The engine is transport-agnostic on both sides. The HTTP frontend
//! hands a [Request] and a [ResponseHandle] to [routes::route] and writes
//! out whatever arrives on the response channel; the bus side is any
//! [BusClient] implementation.
//!
//! A request flows as: dispatch ([routes]) → handler ([handlers]) → owner
//! discovery through the object mapper ([mapper]) → per-connection bus
//! calls whose replies are folded through the type codec into a shared
//! document ([Transaction]) → exactly one response when the last
//! outstanding callback completes.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use busgate_common::{value::BusValue, Error, Result};
//! use busgate_lib::{
//!     http::{Method, Request, ResponseHandle},
//!     routes, BusClient, MethodCall,
//! };
//!
//! struct NoBus;
//!
//! #[async_trait]
//! impl BusClient for NoBus {
//!     async fn method_call(&self, _call: MethodCall) -> Result<Vec<BusValue>> {
//!         Err(Error::Bus("no transport attached".into()))
//!     }
//! }
//!
//! async fn example() {
//!     let (response, receiver) = ResponseHandle::channel();
//!     routes::route(Arc::new(NoBus), Request::new(Method::Get, "/list/"), response).await;
//!
//!     println!("{:?}", receiver.await);
//! }
//! ```

pub mod client;
pub mod handlers;
pub mod http;
pub mod mapper;
pub mod routes;
pub mod transaction;

pub use busgate_common::{Error, Result};

pub use client::{BusClient, MethodCall};
pub use http::{Request, Response, ResponseHandle};
pub use routes::route;
pub use transaction::Transaction;
