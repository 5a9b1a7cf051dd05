//! Timer-driven poll loop.
//!
//! One cycle = resolve organization id (cache or bootstrap) -> fetch usage ->
//! render. Any failure renders the error state and ends the cycle; the next
//! tick simply tries again. Cycles never overlap: the loop awaits each one
//! before selecting on the next tick or command.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::display::{show_error, show_usage, StatusSurface};
use crate::render::{IconStyle, UsageColor};
use crate::settings::AppSettings;
use crate::usage::{OrgCache, PollError, UsageApi, UsageSnapshot};

/// Requests sent to the poll loop from the tray menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollCommand {
    /// Run a cycle now
    Refresh,
    /// Drop the cached organization id, then run a cycle
    ForgetOrganization,
    /// Session key was stored or removed; treat like ForgetOrganization
    SessionChanged,
}

/// Sender type for poll commands
pub type PollCommandSender = mpsc::Sender<PollCommand>;

/// Receiver type for poll commands
pub type PollCommandReceiver = mpsc::Receiver<PollCommand>;

pub fn create_command_channel() -> (PollCommandSender, PollCommandReceiver) {
    mpsc::channel(8)
}

async fn fetch_snapshot<A: UsageApi>(
    api: &A,
    cache: &mut OrgCache,
) -> Result<UsageSnapshot, PollError> {
    let org_id = match cache.get().map(str::to_string) {
        Some(id) => id,
        None => {
            let id = api.fetch_org_id().await?;
            log::info!("Poller: resolved organization id from bootstrap");
            cache.set(id.clone());
            id
        }
    };

    let response = api.fetch_usage(&org_id).await?;
    UsageSnapshot::from_response(response)
}

/// Run one poll cycle and push the result (or the error state) to `surface`.
///
/// The returned error is informational; it has already been rendered.
pub async fn run_cycle<A, S>(
    api: &A,
    cache: &mut OrgCache,
    surface: &S,
    style: IconStyle,
) -> Result<UsageSnapshot, PollError>
where
    A: UsageApi,
    S: StatusSurface + ?Sized,
{
    let cycle_id = Uuid::new_v4();
    log::debug!("Poller: cycle {} started", cycle_id);

    match fetch_snapshot(api, cache).await {
        Ok(snapshot) => {
            let percent = snapshot.five_hour.percent;
            log::info!(
                "Poller: cycle {} - 5-hour usage {:.1}% ({})",
                cycle_id,
                percent,
                UsageColor::for_percent(percent).as_str()
            );
            show_usage(surface, &snapshot, style, Utc::now());
            Ok(snapshot)
        }
        Err(e) => {
            if e.is_unresolved() {
                log::warn!("Poller: cycle {} - organization unresolved: {}", cycle_id, e);
            } else {
                log::warn!("Poller: cycle {} failed: {}", cycle_id, e);
            }
            show_error(surface, &e);
            Err(e)
        }
    }
}

/// Owns everything a cycle needs and drives cycles on a fixed interval.
pub struct Poller<A, S> {
    api: A,
    cache: OrgCache,
    surface: S,
    style: IconStyle,
    poll_interval: Duration,
}

impl<A, S> Poller<A, S>
where
    A: UsageApi,
    S: StatusSurface,
{
    pub fn new(api: A, cache: OrgCache, surface: S, settings: &AppSettings) -> Self {
        Self {
            api,
            cache,
            surface,
            style: settings.icon_style,
            poll_interval: settings.poll_interval(),
        }
    }

    pub async fn poll_once(&mut self) -> Result<UsageSnapshot, PollError> {
        run_cycle(&self.api, &mut self.cache, &self.surface, self.style).await
    }

    fn handle_command(&mut self, command: PollCommand) {
        log::debug!("Poller: received {:?}", command);
        match command {
            PollCommand::Refresh => {}
            PollCommand::ForgetOrganization | PollCommand::SessionChanged => self.cache.clear(),
        }
    }

    /// Poll immediately, then every interval, until `cancel` fires.
    ///
    /// A command runs a cycle right away and restarts the interval.
    pub async fn run(mut self, mut commands: PollCommandReceiver, cancel: CancellationToken) {
        let mut tick = interval(self.poll_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        log::info!(
            "Poller: started (interval {}s, style {:?})",
            self.poll_interval.as_secs(),
            self.style
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    log::debug!("Poller: received stop signal");
                    break;
                }
                _ = tick.tick() => {
                    let _ = self.poll_once().await;
                }
                Some(command) = commands.recv() => {
                    self.handle_command(command);
                    let _ = self.poll_once().await;
                    tick.reset();
                }
            }
        }

        log::info!("Poller: stopped");
    }
}
