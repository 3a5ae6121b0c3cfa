//! OCPP Inspect - CLI for the OCPP message layer
//!
//! Parses a JSON payload as the request for a given action, then prints either
//! the canonical re-serialized JSON or the RPC error a CSMS would answer with.
//!
//! # Usage
//!
//! ```bash
//! # Validate a payload from a file
//! ocpp-inspect --action Authorize --file authorize.json
//!
//! # Read from stdin, pretty print
//! echo '{"reason":"PowerUp","chargingStation":{"model":"EK3","vendorName":"EK"}}' \
//!     | ocpp-inspect --action BootNotification --pretty
//!
//! # Ignore the in-body chargingStationId
//! ocpp-inspect --action Heartbeat --file hb.json --no-sender-override
//! ```
//!
//! Exit status is 0 for a valid payload, 1 when it was rejected.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use ocpp_core::config::DEFAULT_MAX_SIGNATURES;
use ocpp_core::{
    NetworkingNodeId, OcppError, ParseOptions, ParserConfig, RequestContext, RequestId, RpcError, RpcErrorCode,
    ToJson,
};
use ocpp_messages::{Action, AnyRequest};
use serde_json::{json, Value};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// OCPP 2.1 request payload inspector
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// OCPP action name (e.g. Authorize, BootNotification)
    #[arg(short, long)]
    action: String,

    /// Payload file; stdin when omitted
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Networking node the payload arrived from
    #[arg(long, default_value = "CS001")]
    origin: String,

    /// Request id of the CALL; random when omitted
    #[arg(long)]
    request_id: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Maximum signatures accepted per message
    #[arg(long, default_value_t = DEFAULT_MAX_SIGNATURES)]
    max_signatures: usize,

    /// Ignore an in-body chargingStationId
    #[arg(long)]
    no_sender_override: bool,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
}

impl Args {
    fn parser_config(&self) -> ParserConfig {
        let mut config = ParserConfig::default().with_max_signatures(self.max_signatures);
        if let Some(secs) = self.timeout {
            config = config.with_request_timeout(Duration::from_secs(secs));
        }
        if self.no_sender_override {
            config = config.without_sender_override();
        }
        config
    }

    fn context(&self) -> Result<RequestContext, OcppError> {
        let origin = NetworkingNodeId::parse(&self.origin)?;
        let request_id = match &self.request_id {
            Some(id) => RequestId::parse(id)?,
            None => RequestId::new_random(),
        };
        let mut ctx = RequestContext::new(request_id, origin);
        if let Some(secs) = self.timeout {
            ctx = ctx.with_timeout(Duration::from_secs(secs));
        }
        Ok(ctx)
    }
}

/// Outcome of inspecting one payload
#[derive(Debug)]
enum Report {
    Accepted(AnyRequest),
    Rejected(RpcError),
}

impl Report {
    fn to_json(&self) -> Value {
        match self {
            Report::Accepted(request) => request.to_json(),
            Report::Rejected(error) => json!({
                "errorCode": error.code,
                "errorDescription": error.description,
                "errorDetails": error.details,
            }),
        }
    }
}

fn read_payload(file: Option<&Path>) -> io::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn inspect(args: &Args, text: &str) -> Result<Report, OcppError> {
    let action: Action = match args.action.parse() {
        Ok(action) => action,
        Err(e) => {
            let known: Vec<&str> = Action::ALL.iter().map(|a| a.as_str()).collect();
            warn!("{} (known actions: {})", e, known.join(", "));
            return Ok(Report::Rejected(RpcError::new(RpcErrorCode::NotImplemented, e.to_string())));
        }
    };

    let ctx = args.context()?;
    let options = ParseOptions::new(args.parser_config());
    debug!("Parsing {} request {} from {}", action, ctx.request_id, ctx.origin);

    match AnyRequest::parse_text(action, text, &ctx, &options) {
        Ok(request) => {
            info!("Accepted {}", request);
            Ok(Report::Accepted(request))
        }
        Err(e) => {
            info!("Rejected {} request: {}", action, e);
            Ok(Report::Rejected(RpcError::from(&e)))
        }
    }
}

fn render(value: &Value, pretty: bool) -> Result<String, OcppError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Setup logging
    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let text = read_payload(args.file.as_deref())?;
    let report = inspect(&args, &text)?;
    println!("{}", render(&report.to_json(), args.pretty)?);

    match report {
        Report::Accepted(_) => Ok(ExitCode::SUCCESS),
        Report::Rejected(_) => Ok(ExitCode::FAILURE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(action: &str, extra: &[&str]) -> Args {
        let mut argv = vec!["ocpp-inspect", "--action", action, "--request-id", "cli-1"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_accepts_valid_payload_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"idToken":{{"idToken":"04E1FA41B8D480","type":"ISO14443"}},"certificate":null}}"#).unwrap();

        let args = args("Authorize", &[]);
        let text = read_payload(Some(file.path())).unwrap();
        let report = inspect(&args, &text).unwrap();

        assert!(matches!(report, Report::Accepted(AnyRequest::Authorize(_))));
        assert_eq!(
            report.to_json(),
            json!({ "idToken": { "idToken": "04E1FA41B8D480", "type": "ISO14443" } })
        );
    }

    #[test]
    fn test_missing_field_becomes_rpc_error() {
        let report = inspect(&args("Authorize", &[]), "{}").unwrap();

        let json = report.to_json();
        assert_eq!(json["errorCode"], json!("OccurrenceConstraintViolation"));
        assert_eq!(json["errorDetails"], json!({ "field": "idToken" }));
        assert!(json["errorDescription"].as_str().unwrap().contains("idToken"));
    }

    #[test]
    fn test_malformed_json() {
        let report = inspect(&args("Heartbeat", &[]), "{oops").unwrap();
        assert_eq!(report.to_json()["errorCode"], json!("FormatViolation"));
    }

    #[test]
    fn test_unknown_action() {
        let report = inspect(&args("MeterValues", &[]), "{}").unwrap();
        assert_eq!(report.to_json()["errorCode"], json!("NotImplemented"));
    }

    #[test]
    fn test_sender_override_flag() {
        let payload = r#"{"chargingStationId":"CS-REAL"}"#;

        let report = inspect(&args("Heartbeat", &[]), payload).unwrap();
        let Report::Accepted(request) = report else { panic!("expected acceptance") };
        assert_eq!(request.envelope().origin().as_str(), "CS-REAL");

        let report = inspect(&args("Heartbeat", &["--no-sender-override"]), payload).unwrap();
        let Report::Accepted(request) = report else { panic!("expected acceptance") };
        assert_eq!(request.envelope().origin().as_str(), "CS001");
    }

    #[test]
    fn test_signature_limit_flag() {
        let payload = r#"{"signatures":[{"keyId":"a","value":"00"},{"keyId":"b","value":"00"}]}"#;
        let report = inspect(&args("ClearCache", &["--max-signatures", "1"]), payload).unwrap();
        assert_eq!(report.to_json()["errorCode"], json!("OccurrenceConstraintViolation"));
    }

    #[test]
    fn test_invalid_origin_is_an_error() {
        let err = inspect(&args("Heartbeat", &["--origin", "  "]), "{}").unwrap_err();
        assert!(matches!(err, OcppError::Parse { .. }));
    }

    #[test]
    fn test_render_compact_and_pretty() {
        let value = json!({ "a": 1 });
        assert_eq!(render(&value, false).unwrap(), r#"{"a":1}"#);
        assert!(render(&value, true).unwrap().contains('\n'));
    }
}
