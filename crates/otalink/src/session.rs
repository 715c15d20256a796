use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::json::{invalid_reply, parse_object, required_object, required_str};

/// An authenticated device/backend pairing, obtained from
/// [`authenticate`](crate::Client::authenticate).
///
/// All three fields must be non-empty for the session to be usable by
/// check-for-updates or report. The caller owns its lifetime: this layer
/// does not cache it, so persist or discard it between calls as needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Device GUID assigned by the backend.
    pub device_guid: String,
    /// Product GUID assigned by the backend.
    pub product_guid: String,
    /// Bearer token for the session.
    pub token: String,
}

impl Session {
    /// Creates a [`Session`] from its three parts.
    pub fn new(
        device_guid: impl Into<String>,
        product_guid: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            device_guid: device_guid.into(),
            product_guid: product_guid.into(),
            token: token.into(),
        }
    }

    pub(crate) fn is_complete(&self) -> bool {
        !self.device_guid.is_empty() && !self.product_guid.is_empty() && !self.token.is_empty()
    }
}

/// Device credentials and poll interval returned by
/// [`register`](crate::Client::register).
///
/// The credentials should be persisted for the lifetime of the device and
/// later fed to [`authenticate`](crate::Client::authenticate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Device access key.
    pub device_access: String,
    /// Device secret key.
    pub device_secret: String,
    /// Suggested update poll interval, in seconds.
    pub poll_interval_seconds: u64,
}

/// Decodes a register response body.
pub(crate) fn parse_registration(raw: &str) -> Result<Registration> {
    let root = parse_object(raw)?;

    // A zero interval is treated the same as a missing one.
    let poll_interval_seconds = match root.get("pollIntervalSeconds").and_then(Value::as_u64) {
        Some(seconds) if seconds > 0 => seconds,
        _ => {
            return Err(invalid_reply(
                "Server reply invalid: required \"pollIntervalSeconds\" missing in object".into(),
            ));
        }
    };

    let device = required_object(&root, "deviceAuthParameters")?;

    Ok(Registration {
        device_access: required_str(device, "accessKey")?,
        device_secret: required_str(device, "secretKey")?,
        poll_interval_seconds,
    })
}

/// Decodes an authenticate response body.
pub(crate) fn parse_session(raw: &str) -> Result<Session> {
    let root = parse_object(raw)?;

    Ok(Session {
        device_guid: required_str(&root, "deviceGUID")?,
        product_guid: required_str(&root, "productGUID")?,
        token: required_str(&root, "token")?,
    })
}
