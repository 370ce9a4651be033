use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::{clock::TimeSource, settings::TimeConfig};

use super::{client::validate, NtpClient, NtpError};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// User-facing message raised once when network time cannot be established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncNotice {
    pub title: String,
    pub message: String,
}

impl SyncNotice {
    fn first_failure(config: &TimeConfig, err: &NtpError) -> Self {
        Self {
            title: "Network time unavailable".into(),
            message: format!(
                "Could not get the time from {}:{} ({err}).\n\n\
                 Network time has been disabled for this session and the system clock will be used.",
                config.address, config.port
            ),
        }
    }
}

/// Owns the background task that keeps the [`TimeSource`] reference fresh.
pub struct NtpSync {
    client: NtpClient,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl NtpSync {
    pub fn new(client: NtpClient) -> Self {
        Self {
            client,
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn start(
        &mut self,
        config: TimeConfig,
        source: TimeSource,
        notices: mpsc::UnboundedSender<SyncNotice>,
    ) -> Result<()> {
        if self.is_running() {
            bail!("network time sync already active");
        }
        if !config.is_network() {
            bail!("time source is not set to network");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sync_loop(
            config,
            source,
            self.client,
            notices,
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("network time sync task failed to join")
        } else {
            Ok(())
        }
    }
}

impl Default for NtpSync {
    fn default() -> Self {
        Self::new(NtpClient::default())
    }
}

/// Periodic sync.
///
/// A failure before the first successful exchange disables network time for
/// the rest of the run and ends the loop. Later failures are skipped and the
/// last reference keeps being extrapolated.
pub async fn sync_loop(
    config: TimeConfig,
    source: TimeSource,
    client: NtpClient,
    notices: mpsc::UnboundedSender<SyncNotice>,
    cancel_token: CancellationToken,
) {
    if let Err(err) = validate(&config) {
        disable_after_first_failure(&config, &source, &notices, err);
        return;
    }

    source.enable_network();
    log_info!(
        "network time sync started for {}:{} every {} ms",
        config.address,
        config.port,
        config.sync_interval_ms
    );

    let period = Duration::from_millis(config.sync_interval_ms);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut synced_once = false;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let result = tokio::select! {
                    result = client.query(&config) => result,
                    _ = cancel_token.cancelled() => break,
                };

                match result {
                    Ok(epoch_seconds) => {
                        source.publish(epoch_seconds);
                        synced_once = true;
                        log_debug!("network time synced: {} (unix seconds)", epoch_seconds);
                    }
                    Err(err) if !synced_once => {
                        disable_after_first_failure(&config, &source, &notices, err);
                        return;
                    }
                    Err(err) => {
                        log_warn!("network time sync skipped, keeping previous reference: {err}");
                    }
                }
            }
            _ = cancel_token.cancelled() => break,
        }
    }

    log_info!("network time sync shutting down");
}

fn disable_after_first_failure(
    config: &TimeConfig,
    source: &TimeSource,
    notices: &mpsc::UnboundedSender<SyncNotice>,
    err: NtpError,
) {
    source.disable_network();
    log_error!(
        "initial network time sync with {}:{} failed, using system time: {err}",
        config.address,
        config.port
    );
    let _ = notices.send(SyncNotice::first_failure(config, &err));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::ntp::packet::reply_with_transmit;
    use chrono::NaiveDate;
    use std::sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    };
    use tokio::net::UdpSocket;

    fn manual_source() -> TimeSource {
        let local = NaiveDate::from_ymd_opt(2025, 4, 5)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        TimeSource::new(Arc::new(ManualClock::new(local)))
    }

    /// Replies with `seconds` while `online` is set and counts every request.
    async fn fake_server(
        seconds: i64,
        online: Arc<AtomicBool>,
        requests: Arc<AtomicUsize>,
    ) -> u16 {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = socket.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut buf = [0u8; 128];
            while let Ok((_, peer)) = socket.recv_from(&mut buf).await {
                requests.fetch_add(1, Ordering::SeqCst);
                if online.load(Ordering::SeqCst) {
                    let _ = socket.send_to(&reply_with_transmit(seconds), peer).await;
                }
            }
        });
        port
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test]
    async fn first_success_publishes_reference() {
        let online = Arc::new(AtomicBool::new(true));
        let requests = Arc::new(AtomicUsize::new(0));
        let port = fake_server(1_700_000_000, online, requests).await;

        let source = manual_source();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sync = NtpSync::new(NtpClient::with_timeout(Duration::from_millis(500)));
        sync.start(
            TimeConfig::network("127.0.0.1", port as u32, 60_000),
            source.clone(),
            tx,
        )
        .unwrap();

        wait_until(|| source.reference().initialized).await;
        assert_eq!(source.adjusted_epoch_seconds(), Some(1_700_000_000));
        assert!(source.is_network_enabled());

        sync.stop().await.unwrap();
        assert!(!sync.is_running());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn first_failure_disables_network_for_the_run() {
        let online = Arc::new(AtomicBool::new(false));
        let requests = Arc::new(AtomicUsize::new(0));
        let port = fake_server(1_700_000_000, online, requests.clone()).await;

        let source = manual_source();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sync = NtpSync::new(NtpClient::with_timeout(Duration::from_millis(50)));
        sync.start(
            TimeConfig::network("127.0.0.1", port as u32, 20),
            source.clone(),
            tx,
        )
        .unwrap();

        let notice = rx.recv().await.expect("failure notice");
        assert_eq!(notice.title, "Network time unavailable");
        assert!(!source.is_network_enabled());
        assert_eq!(source.now(), manual_source().now());

        // No further attempts after the loop gives up.
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(requests.load(Ordering::SeqCst), 1);
        assert!(!sync.is_running());
        sync.stop().await.unwrap();
    }

    #[tokio::test]
    async fn invalid_config_is_a_first_failure() {
        let source = manual_source();
        source.enable_network();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sync = NtpSync::default();
        sync.start(TimeConfig::network("", 123, 1_000), source.clone(), tx)
            .unwrap();

        assert!(rx.recv().await.is_some());
        assert!(!source.is_network_enabled());
        sync.stop().await.unwrap();
    }

    #[tokio::test]
    async fn zero_interval_never_queries_the_server() {
        let online = Arc::new(AtomicBool::new(true));
        let requests = Arc::new(AtomicUsize::new(0));
        let port = fake_server(1_700_000_000, online, requests.clone()).await;

        let source = manual_source();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sync = NtpSync::default();
        sync.start(
            TimeConfig::network("127.0.0.1", port as u32, 0),
            source.clone(),
            tx,
        )
        .unwrap();

        let notice = rx.recv().await.expect("failure notice");
        assert!(notice.message.contains("sync interval"));
        assert!(!source.is_network_enabled());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(requests.load(Ordering::SeqCst), 0);
        sync.stop().await.unwrap();
    }

    #[tokio::test]
    async fn later_failures_keep_stale_reference() {
        let online = Arc::new(AtomicBool::new(true));
        let requests = Arc::new(AtomicUsize::new(0));
        let port = fake_server(1_000_000, online.clone(), requests.clone()).await;

        let source = manual_source();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sync = NtpSync::new(NtpClient::with_timeout(Duration::from_millis(30)));
        sync.start(
            TimeConfig::network("127.0.0.1", port as u32, 40),
            source.clone(),
            tx,
        )
        .unwrap();

        wait_until(|| source.reference().initialized).await;
        online.store(false, Ordering::SeqCst);
        let seen = requests.load(Ordering::SeqCst);
        wait_until(|| requests.load(Ordering::SeqCst) >= seen + 2).await;

        assert!(source.is_network_enabled());
        assert_eq!(source.reference().synced_epoch_seconds, 1_000_000);
        assert!(rx.try_recv().is_err());
        assert!(sync.is_running());

        sync.stop().await.unwrap();
    }

    #[tokio::test]
    async fn start_requires_network_source() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut sync = NtpSync::default();
        assert!(sync
            .start(TimeConfig::default(), manual_source(), tx)
            .is_err());
    }
}
