//! Request/response pairs

pub mod authorize;
pub mod boot_notification;
pub mod clear_cache;
pub mod data_transfer;
pub mod firmware_status_notification;
pub mod heartbeat;
pub mod reset;
pub mod status_notification;

pub use authorize::{AuthorizeRequest, AuthorizeResponse};
pub use boot_notification::{BootNotificationRequest, BootNotificationResponse};
pub use clear_cache::{ClearCacheRequest, ClearCacheResponse};
pub use data_transfer::{DataTransferRequest, DataTransferResponse};
pub use firmware_status_notification::{FirmwareStatusNotificationRequest, FirmwareStatusNotificationResponse};
pub use heartbeat::{HeartbeatRequest, HeartbeatResponse};
pub use reset::{ResetRequest, ResetResponse};
pub use status_notification::{StatusNotificationRequest, StatusNotificationResponse};
