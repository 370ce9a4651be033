use std::sync::Arc;

use anyhow::{bail, Context, Result};
use log::{error, info, warn};
use tokio::sync::{mpsc, Mutex};

use crate::{
    clock::{zones, Clock, TimeSource},
    display::DisplayFormat,
    ntp::{NtpClient, NtpSync, ProbeOutcome, SyncNotice},
    render::{ColorPolicy, Frame, FrameSink, RenderState, RenderTicker},
    settings::{ClockSettings, RenderFlags, SettingsStore, TimeConfig},
};

/// Context object tying settings, time source, sync task and render tick
/// together. Front ends call the command methods; nothing here is global.
pub struct ClockApp {
    settings: Arc<SettingsStore>,
    time: TimeSource,
    client: NtpClient,
    sync: Mutex<NtpSync>,
    ticker: RenderTicker,
    notices: mpsc::UnboundedSender<SyncNotice>,
}

impl ClockApp {
    pub fn new(
        settings: SettingsStore,
        clock: Arc<dyn Clock>,
        client: NtpClient,
        sink: Arc<dyn FrameSink>,
    ) -> (Self, mpsc::UnboundedReceiver<SyncNotice>) {
        let snapshot = settings.snapshot();
        let time = TimeSource::new(clock);
        time.set_zone(
            snapshot
                .time_zone
                .unwrap_or_else(zones::system_zone_index),
        );

        let colors = ColorPolicy::load(
            snapshot.flags.gradient,
            snapshot.flags.custom_color,
            &settings.color_file(),
        );
        let render = RenderState::new(
            time.clone(),
            snapshot.display_format,
            snapshot.flags.dvd_logo,
            colors,
        );
        let ticker = RenderTicker::new(Arc::new(Mutex::new(render)), sink);
        let (notices, notices_rx) = mpsc::unbounded_channel();

        log_settings(&snapshot);

        let app = Self {
            settings: Arc::new(settings),
            time,
            client,
            sync: Mutex::new(NtpSync::new(client)),
            ticker,
            notices,
        };
        (app, notices_rx)
    }

    /// Starts the render tick and, in network mode, the sync task.
    pub async fn start(&self) -> Result<()> {
        let config = self.settings.time_config();
        if config.is_network() {
            info!("Starting network time sync with {}", config.address);
            self.sync
                .lock()
                .await
                .start(config, self.time.clone(), self.notices.clone())?;
        }
        self.ticker.start().await;
        Ok(())
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.ticker.stop().await?;
        self.sync.lock().await.stop().await?;
        info!("Clock stopped");
        Ok(())
    }

    pub fn time_source(&self) -> &TimeSource {
        &self.time
    }

    pub fn settings(&self) -> ClockSettings {
        self.settings.snapshot()
    }

    pub async fn current_frame(&self) -> Frame {
        self.ticker.state().lock().await.current_frame().clone()
    }

    pub async fn toggle_show_date(&self) -> Option<DisplayFormat> {
        let next = self.ticker.state().lock().await.toggle_show_date();
        self.save_display_format(next)
    }

    pub async fn toggle_hour_format(&self) -> Option<DisplayFormat> {
        let next = self.ticker.state().lock().await.toggle_hour_format();
        self.save_display_format(next)
    }

    /// Applies new bounce/gradient/custom color flags and persists them.
    pub async fn set_render_flags(&self, flags: RenderFlags) -> Result<()> {
        let colors = ColorPolicy::load(
            flags.gradient,
            flags.custom_color,
            &self.settings.color_file(),
        );
        {
            let state = self.ticker.state();
            let mut guard = state.lock().await;
            guard.set_logo_mode(flags.dvd_logo);
            guard.set_colors(colors);
        }
        self.settings.update_flags(flags)
    }

    /// Validates and commits a new time source.
    ///
    /// Network settings are probed first and rejected, unsaved, unless the
    /// request could be sent. Committing restarts the sync task.
    pub async fn set_time_source(
        &self,
        config: TimeConfig,
        time_zone: Option<usize>,
    ) -> Result<ProbeOutcome> {
        let outcome = if config.is_network() {
            let outcome = self.client.probe(&config).await;
            if !outcome.is_usable() {
                warn!(
                    "Rejected time configuration {}:{} ({:?})",
                    config.address, config.port, outcome
                );
                bail!(
                    "cannot reach {}:{} ({outcome:?}); check the address and your connection",
                    config.address,
                    config.port
                );
            }
            outcome
        } else {
            ProbeOutcome::Sent
        };

        self.settings
            .update_time(config.clone(), time_zone)
            .context("failed to save time configuration")?;

        let mut sync = self.sync.lock().await;
        sync.stop().await?;
        self.time
            .set_zone(time_zone.unwrap_or_else(zones::system_zone_index));

        if config.is_network() {
            sync.start(config, self.time.clone(), self.notices.clone())?;
        } else {
            self.time.disable_network();
        }
        Ok(outcome)
    }

    fn save_display_format(&self, next: Option<DisplayFormat>) -> Option<DisplayFormat> {
        let format = next?;
        info!("Display format changed to {:?}", format);
        if let Err(err) = self.settings.update_display_format(format.as_raw()) {
            error!("Failed to save display format: {err:#}");
        }
        Some(format)
    }
}

fn log_settings(settings: &ClockSettings) {
    info!(
        "Settings: display_format={} dvd_logo={} gradient={} custom_color={} time_source={:?} time_zone={:?}",
        settings.display_format,
        settings.flags.dvd_logo,
        settings.flags.gradient,
        settings.flags.custom_color,
        settings.time.source,
        settings.time_zone
    );
}
