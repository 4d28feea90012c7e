//! Pending OTP codes, for support staff reading codes back to users who
//! cannot receive SMS. Codes expire quickly, so reads always hit the
//! server and a watcher task keeps a live view.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::ApiResult;
use crate::http::HttpTransport;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOtp {
    pub phone_number: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
struct GetOtpsResponse {
    otps: Vec<PendingOtp>,
}

/// Client for `/otps`.
#[derive(Clone)]
pub struct Otps {
    transport: Arc<HttpTransport>,
    poll_interval: Duration,
}

impl Otps {
    pub(crate) fn new(transport: Arc<HttpTransport>, poll_interval: Duration) -> Self {
        Self {
            transport,
            poll_interval,
        }
    }

    /// Fetches the currently pending codes. Never cached.
    pub async fn list(&self) -> ApiResult<Vec<PendingOtp>> {
        let response: GetOtpsResponse = self.transport.get("/otps").await?;
        Ok(response.otps)
    }

    /// Starts a background task that refreshes the pending codes on the
    /// configured interval. The watcher stops when dropped.
    pub fn watch(&self) -> OtpWatcher {
        let (tx, rx) = watch::channel(Vec::new());
        let client = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(client.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match client.list().await {
                    Ok(otps) => {
                        debug!(count = otps.len(), "refreshed pending OTP codes");
                        if tx.send(otps).is_err() {
                            break;
                        }
                    }
                    // Keep the last good view; the next tick retries.
                    Err(e) => warn!(error = %e, "failed to refresh pending OTP codes"),
                }
            }
        });
        OtpWatcher {
            receiver: rx,
            handle,
        }
    }
}

/// Live view of the pending OTP codes, backed by a polling task.
#[derive(Debug)]
pub struct OtpWatcher {
    receiver: watch::Receiver<Vec<PendingOtp>>,
    handle: JoinHandle<()>,
}

impl OtpWatcher {
    /// The most recently fetched codes. Empty until the first poll lands.
    pub fn current(&self) -> Vec<PendingOtp> {
        self.receiver.borrow().clone()
    }

    /// Waits for the next refresh and returns the new snapshot.
    pub async fn changed(&mut self) -> ApiResult<Vec<PendingOtp>> {
        self.receiver
            .changed()
            .await
            .map_err(|_| crate::error::ApiError::Internal {
                source: anyhow::anyhow!("OTP watcher task stopped"),
            })?;
        Ok(self.receiver.borrow_and_update().clone())
    }
}

impl Drop for OtpWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiSettings;
    use crate::http::MemoryTokenStore;

    #[test]
    fn test_otp_wire_shape() {
        let json = serde_json::json!({
            "otps": [
                { "phoneNumber": "+212612345678", "code": "483920" }
            ]
        });
        let response: GetOtpsResponse = serde_json::from_value(json).unwrap();
        assert_eq!(response.otps[0].code, "483920");
    }

    #[tokio::test]
    async fn test_watcher_starts_empty_and_stops_on_drop() {
        let tokens = Arc::new(MemoryTokenStore::new());
        let transport = Arc::new(HttpTransport::new(&ApiSettings::default(), tokens).unwrap());
        let otps = Otps::new(transport, Duration::from_secs(3600));

        let watcher = otps.watch();
        assert!(watcher.current().is_empty());
        drop(watcher);
    }
}
