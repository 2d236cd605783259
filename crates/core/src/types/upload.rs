//! Credentials for the hosted image-upload widget.

use serde::{Deserialize, Serialize};

/// Signature triple the upload widget needs before it accepts a file.
///
/// Issued by the marketplace API; the upload itself happens outside this
/// client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadAuth {
    pub signature: String,
    /// Unix timestamp (seconds) after which the signature is rejected.
    pub expire: i64,
    pub token: String,
}

impl UploadAuth {
    /// Whether the signature has expired at `now` (Unix seconds).
    #[must_use]
    pub const fn is_expired_at(&self, now: i64) -> bool {
        now >= self.expire
    }
}
