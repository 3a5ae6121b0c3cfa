//! # OCPP Core
//!
//! Request/response envelopes and the JSON (de)serialization discipline shared
//! by every OCPP 2.1 message.
//!
//! ## Architecture
//!
//! ```text
//!  transport (WebSocket, out of scope)
//!       │ JSON body + RequestContext / ResponseContext
//!       ▼
//! ┌──────────────────────────────────────────────┐
//! │  OcppRequest::try_parse / OcppResponse::...  │
//! │   JsonReader ── mandatory fields first       │
//! │              ── optional fields              │
//! │   RequestEnvelope / ResponseEnvelope         │
//! │              ── signatures, customData       │
//! │   CustomParsers ── applied last              │
//! └──────────────────────────────────────────────┘
//!       │ typed, immutable message
//!       ▼
//!  business logic (out of scope)
//! ```
//!
//! Outbound, `ToJson::to_json_with` composes a message's own fields with the
//! envelope's shared fields through a `JsonWriter` and hands the result to the
//! registered `CustomSerializers` hook.
//!
//! A parse failure is always a `ParseError` naming the field; the transport
//! turns it into an RPC error answer with `RpcError::from(&error)`.

pub mod config;
pub mod custom;
pub mod custom_data;
pub mod error;
pub mod ids;
pub mod json;
pub mod request;
pub mod response;
pub mod result;
pub mod rpc;
pub mod signature;

#[cfg(test)]
mod testing;

pub use config::{ParseOptions, ParserConfig};
pub use custom::{CustomParsers, CustomSerializers};
pub use custom_data::CustomData;
pub use error::{ConstructionError, OcppError, ParseError, SignatureError};
pub use ids::{ConnectorId, EventTrackingId, EvseId, NetworkPath, NetworkingNodeId, RequestId, VendorId};
pub use json::{FromJson, JsonObject, JsonReader, JsonWriter, ToJson};
pub use request::{OcppRequest, RequestContext, RequestEnvelope};
pub use response::{OcppResponse, ResponseContext, ResponseEnvelope};
pub use result::{OcppResult, ResultCode};
pub use rpc::{RpcError, RpcErrorCode};
pub use signature::{MessageSigner, SignInfo, Signature, SignatureVerifier};
