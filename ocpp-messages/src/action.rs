//! Action catalog and action-keyed request dispatch
//!
//! A transport knows the action name of an incoming CALL before it knows the
//! payload type. [`AnyRequest`] turns that name plus the payload into the
//! matching typed request.

use std::fmt;
use std::str::FromStr;

use ocpp_core::{
    CustomSerializers, OcppError, OcppRequest, ParseError, ParseOptions, RequestContext, RequestEnvelope, ToJson,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::messages::{
    AuthorizeRequest, BootNotificationRequest, ClearCacheRequest, DataTransferRequest,
    FirmwareStatusNotificationRequest, HeartbeatRequest, ResetRequest, StatusNotificationRequest,
};

/// OCPP action names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    // CS -> CSMS
    Authorize,
    BootNotification,
    FirmwareStatusNotification,
    Heartbeat,
    StatusNotification,

    // CSMS -> CS
    ClearCache,
    Reset,

    // Bidirectional
    DataTransfer,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::Authorize,
        Action::BootNotification,
        Action::FirmwareStatusNotification,
        Action::Heartbeat,
        Action::StatusNotification,
        Action::ClearCache,
        Action::Reset,
        Action::DataTransfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Authorize => AuthorizeRequest::ACTION,
            Action::BootNotification => BootNotificationRequest::ACTION,
            Action::FirmwareStatusNotification => FirmwareStatusNotificationRequest::ACTION,
            Action::Heartbeat => HeartbeatRequest::ACTION,
            Action::StatusNotification => StatusNotificationRequest::ACTION,
            Action::ClearCache => ClearCacheRequest::ACTION,
            Action::Reset => ResetRequest::ACTION,
            Action::DataTransfer => DataTransferRequest::ACTION,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = OcppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .iter()
            .copied()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| OcppError::UnknownAction(s.to_string()))
    }
}

/// A parsed request of any action in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnyRequest {
    Authorize(AuthorizeRequest),
    BootNotification(BootNotificationRequest),
    FirmwareStatusNotification(FirmwareStatusNotificationRequest),
    Heartbeat(HeartbeatRequest),
    StatusNotification(StatusNotificationRequest),
    ClearCache(ClearCacheRequest),
    Reset(ResetRequest),
    DataTransfer(DataTransferRequest),
}

impl AnyRequest {
    /// Parse `json` as the request type registered for `action`
    pub fn try_parse(
        action: Action,
        json: &Value,
        ctx: &RequestContext,
        options: &ParseOptions,
    ) -> Result<Self, ParseError> {
        let request = match action {
            Action::Authorize => AnyRequest::Authorize(AuthorizeRequest::try_parse(json, ctx, options)?),
            Action::BootNotification => {
                AnyRequest::BootNotification(BootNotificationRequest::try_parse(json, ctx, options)?)
            }
            Action::FirmwareStatusNotification => AnyRequest::FirmwareStatusNotification(
                FirmwareStatusNotificationRequest::try_parse(json, ctx, options)?,
            ),
            Action::Heartbeat => AnyRequest::Heartbeat(HeartbeatRequest::try_parse(json, ctx, options)?),
            Action::StatusNotification => {
                AnyRequest::StatusNotification(StatusNotificationRequest::try_parse(json, ctx, options)?)
            }
            Action::ClearCache => AnyRequest::ClearCache(ClearCacheRequest::try_parse(json, ctx, options)?),
            Action::Reset => AnyRequest::Reset(ResetRequest::try_parse(json, ctx, options)?),
            Action::DataTransfer => AnyRequest::DataTransfer(DataTransferRequest::try_parse(json, ctx, options)?),
        };
        Ok(request)
    }

    /// Resolve the action name and parse, reporting failures with the action as
    /// context
    pub fn parse(action: &str, json: &Value, ctx: &RequestContext, options: &ParseOptions) -> Result<Self, OcppError> {
        let action: Action = action.parse()?;
        Self::try_parse(action, json, ctx, options).map_err(|e| {
            debug!("Failed to parse {} request {}: {}", action, ctx.request_id, e);
            OcppError::parse(action.as_str(), e)
        })
    }

    /// Parse raw payload text; unparseable text is a `MalformedJson` error
    pub fn parse_text(
        action: Action,
        text: &str,
        ctx: &RequestContext,
        options: &ParseOptions,
    ) -> Result<Self, ParseError> {
        let json: Value = serde_json::from_str(text).map_err(|e| ParseError::MalformedJson(e.to_string()))?;
        Self::try_parse(action, &json, ctx, options)
    }

    pub fn action(&self) -> Action {
        match self {
            AnyRequest::Authorize(_) => Action::Authorize,
            AnyRequest::BootNotification(_) => Action::BootNotification,
            AnyRequest::FirmwareStatusNotification(_) => Action::FirmwareStatusNotification,
            AnyRequest::Heartbeat(_) => Action::Heartbeat,
            AnyRequest::StatusNotification(_) => Action::StatusNotification,
            AnyRequest::ClearCache(_) => Action::ClearCache,
            AnyRequest::Reset(_) => Action::Reset,
            AnyRequest::DataTransfer(_) => Action::DataTransfer,
        }
    }

    pub fn envelope(&self) -> &RequestEnvelope {
        match self {
            AnyRequest::Authorize(r) => r.envelope(),
            AnyRequest::BootNotification(r) => r.envelope(),
            AnyRequest::FirmwareStatusNotification(r) => r.envelope(),
            AnyRequest::Heartbeat(r) => r.envelope(),
            AnyRequest::StatusNotification(r) => r.envelope(),
            AnyRequest::ClearCache(r) => r.envelope(),
            AnyRequest::Reset(r) => r.envelope(),
            AnyRequest::DataTransfer(r) => r.envelope(),
        }
    }
}

impl fmt::Display for AnyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnyRequest::Authorize(r) => fmt::Display::fmt(r, f),
            AnyRequest::BootNotification(r) => fmt::Display::fmt(r, f),
            AnyRequest::FirmwareStatusNotification(r) => fmt::Display::fmt(r, f),
            AnyRequest::Heartbeat(r) => fmt::Display::fmt(r, f),
            AnyRequest::StatusNotification(r) => fmt::Display::fmt(r, f),
            AnyRequest::ClearCache(r) => fmt::Display::fmt(r, f),
            AnyRequest::Reset(r) => fmt::Display::fmt(r, f),
            AnyRequest::DataTransfer(r) => fmt::Display::fmt(r, f),
        }
    }
}

impl ToJson for AnyRequest {
    fn to_json_with(&self, serializers: &CustomSerializers) -> Value {
        match self {
            AnyRequest::Authorize(r) => r.to_json_with(serializers),
            AnyRequest::BootNotification(r) => r.to_json_with(serializers),
            AnyRequest::FirmwareStatusNotification(r) => r.to_json_with(serializers),
            AnyRequest::Heartbeat(r) => r.to_json_with(serializers),
            AnyRequest::StatusNotification(r) => r.to_json_with(serializers),
            AnyRequest::ClearCache(r) => r.to_json_with(serializers),
            AnyRequest::Reset(r) => r.to_json_with(serializers),
            AnyRequest::DataTransfer(r) => r.to_json_with(serializers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, options};
    use serde_json::json;

    #[test]
    fn test_action_names_round_trip() {
        for action in Action::ALL {
            assert_eq!(action.to_string().parse::<Action>().unwrap(), action);
        }
        assert_eq!(Action::FirmwareStatusNotification.to_string(), "FirmwareStatusNotification");
    }

    #[test]
    fn test_unknown_action() {
        let err = "MeterValues".parse::<Action>().unwrap_err();
        assert!(matches!(err, OcppError::UnknownAction(name) if name == "MeterValues"));
    }

    #[test]
    fn test_dispatch_by_action() {
        let json = json!({ "idToken": { "idToken": "04E1FA41B8D480", "type": "ISO14443" } });
        let request = AnyRequest::parse("Authorize", &json, &context(), &options()).unwrap();

        assert_eq!(request.action(), Action::Authorize);
        assert_eq!(request.envelope().action(), "Authorize");
        assert!(matches!(request, AnyRequest::Authorize(_)));
        assert_eq!(request.to_json(), json);
    }

    #[test]
    fn test_dispatch_error_names_action() {
        let err = AnyRequest::parse("Reset", &json!({}), &context(), &options()).unwrap_err();
        assert!(matches!(&err, OcppError::Parse { type_name: "Reset", .. }));
        assert!(err.to_string().contains("type"));
    }

    #[test]
    fn test_malformed_text() {
        let err = AnyRequest::parse_text(Action::Heartbeat, "{not json", &context(), &options()).unwrap_err();
        assert!(matches!(err, ParseError::MalformedJson(_)));

        let request = AnyRequest::parse_text(Action::Heartbeat, "{}", &context(), &options()).unwrap();
        assert_eq!(request.to_json(), json!({}));
    }
}
