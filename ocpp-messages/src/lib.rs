//! # OCPP Messages
//!
//! Concrete OCPP 2.1 request/response pairs built on the `ocpp-core`
//! envelopes, the complex types they share, and an action-keyed dispatcher.
//!
//! ## Example
//!
//! ```
//! use ocpp_core::{NetworkingNodeId, OcppRequest, ParseOptions, RequestContext, RequestId, ToJson};
//! use ocpp_messages::AuthorizeRequest;
//! use serde_json::json;
//!
//! let ctx = RequestContext::new(
//!     RequestId::try_parse("19223201").unwrap(),
//!     NetworkingNodeId::try_parse("CS001").unwrap(),
//! );
//! let json = json!({ "idToken": { "idToken": "04E1FA41B8D480", "type": "ISO14443" } });
//!
//! let request = AuthorizeRequest::try_parse(&json, &ctx, &ParseOptions::default()).unwrap();
//! assert!(request.certificate().is_none());
//! assert_eq!(request.to_json(), json);
//! ```

pub mod action;
pub mod messages;
pub mod types;

#[cfg(test)]
mod testing;

pub use action::{Action, AnyRequest};
pub use messages::*;
pub use types::*;
