//! Playback notification over `org.freedesktop.Notifications`.
//!
//! One notification is kept on screen and replaced in place. Button presses
//! come back as `ActionInvoked` signals and are forwarded as [`ControlCmd`]s.
//! Dismissing the notification by hand stops playback.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use async_io::block_on;
use futures_util::{StreamExt, stream};
use tracing::{debug, info, warn};
use zbus::{Connection, proxy};
use zvariant::Value;

use crate::config::NotificationSettings;
use crate::mpris::ControlCmd;
use crate::session::{NotificationAction, NotificationContent, Notifier};

const APP_NAME: &str = "simplay";

/// `NotificationClosed` reason for a notification the user dismissed.
const DISMISSED_BY_USER: u32 = 2;

#[proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
trait Notifications {
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: &[&str],
        hints: HashMap<&str, Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;

    fn close_notification(&self, id: u32) -> zbus::Result<()>;

    #[zbus(signal)]
    fn action_invoked(&self, id: u32, action_key: String) -> zbus::Result<()>;

    #[zbus(signal)]
    fn notification_closed(&self, id: u32, reason: u32) -> zbus::Result<()>;
}

#[derive(Debug)]
enum NotifyCmd {
    Show(NotificationContent),
    Hide,
}

/// Id of the notification currently on screen, shared with the action listener.
type CurrentId = Arc<Mutex<Option<u32>>>;

/// Signals from the notification daemon that concern our notification.
#[derive(Debug, Clone, PartialEq)]
enum DaemonSignal {
    Action { id: u32, key: String },
    Closed { id: u32, reason: u32 },
}

/// Command a notification button maps to.
pub fn action_command(action: NotificationAction) -> ControlCmd {
    match action {
        NotificationAction::PlayPause => ControlCmd::PlayPause,
        NotificationAction::Next => ControlCmd::Next,
        NotificationAction::Stop => ControlCmd::Stop,
    }
}

/// Command for a closed notification: only a user dismissal stops playback.
pub fn closed_command(reason: u32) -> Option<ControlCmd> {
    (reason == DISMISSED_BY_USER).then_some(ControlCmd::Stop)
}

/// Flatten actions into the `[key, label, key, label, ...]` list the daemon expects.
fn action_list(content: &NotificationContent) -> Vec<&'static str> {
    content
        .actions()
        .into_iter()
        .flat_map(|(action, label)| [action.key(), label])
        .collect()
}

/// Handle to the notification thread.
pub struct DesktopNotifier {
    tx: Sender<NotifyCmd>,
    /// Last content sent; repeated identical updates are dropped.
    last: Option<NotificationContent>,
}

impl DesktopNotifier {
    pub fn spawn(control_tx: Sender<ControlCmd>, settings: &NotificationSettings) -> Self {
        let (tx, rx) = mpsc::channel::<NotifyCmd>();
        let settings = settings.clone();
        thread::spawn(move || run(rx, control_tx, settings));
        Self { tx, last: None }
    }

    fn send(&self, cmd: NotifyCmd) {
        if self.tx.send(cmd).is_err() {
            debug!("notification thread gone");
        }
    }
}

impl Notifier for DesktopNotifier {
    fn show(&mut self, content: &NotificationContent) {
        if self.last.as_ref() == Some(content) {
            return;
        }
        self.last = Some(content.clone());
        self.send(NotifyCmd::Show(content.clone()));
    }

    fn hide(&mut self) {
        if self.last.take().is_some() {
            self.send(NotifyCmd::Hide);
        }
    }
}

fn run(rx: Receiver<NotifyCmd>, control_tx: Sender<ControlCmd>, settings: NotificationSettings) {
    let proxy = match block_on(connect()) {
        Ok(p) => p,
        Err(e) => {
            warn!("notifications unavailable: {e}");
            return;
        }
    };
    info!("notifications: connected");

    let current: CurrentId = Arc::new(Mutex::new(None));

    let listener_proxy = proxy.clone();
    let listener_current = current.clone();
    thread::spawn(move || {
        block_on(async move {
            if let Err(e) = listen(listener_proxy, listener_current, control_tx).await {
                warn!("notification signals stopped: {e}");
            }
        });
    });

    for cmd in rx {
        let result = block_on(apply(&proxy, &current, &settings, cmd));
        if let Err(e) = result {
            warn!("notification update failed: {e}");
        }
    }

    // The session dropped its notifier; take the notification down with it.
    let _ = block_on(apply(&proxy, &current, &settings, NotifyCmd::Hide));
}

async fn connect() -> zbus::Result<NotificationsProxy<'static>> {
    let connection = Connection::session().await?;
    NotificationsProxy::new(&connection).await
}

async fn apply(
    proxy: &NotificationsProxy<'_>,
    current: &CurrentId,
    settings: &NotificationSettings,
    cmd: NotifyCmd,
) -> zbus::Result<()> {
    let replaces = current.lock().ok().and_then(|id| *id);
    match cmd {
        NotifyCmd::Show(content) => {
            let body = content.body();
            let actions = action_list(&content);
            let mut hints = HashMap::new();
            hints.insert("resident", Value::from(true));
            hints.insert("category", Value::from("x-gnome.music"));

            let id = proxy
                .notify(
                    APP_NAME,
                    replaces.unwrap_or(0),
                    "audio-x-generic",
                    &settings.summary,
                    &body,
                    &actions,
                    hints,
                    settings.expire_timeout_ms,
                )
                .await?;
            if let Ok(mut cur) = current.lock() {
                *cur = Some(id);
            }
        }
        NotifyCmd::Hide => {
            if let Some(id) = replaces {
                if let Ok(mut cur) = current.lock() {
                    *cur = None;
                }
                proxy.close_notification(id).await?;
            }
        }
    }
    Ok(())
}

/// Map a daemon signal to a command, ignoring notifications that are not ours.
///
/// A close of our notification forgets its id so the next show starts fresh.
fn signal_command(signal: DaemonSignal, current: &CurrentId) -> Option<ControlCmd> {
    let ours = |id: u32| current.lock().ok().and_then(|cur| *cur) == Some(id);
    match signal {
        DaemonSignal::Action { id, key } => {
            if !ours(id) {
                return None;
            }
            let action = NotificationAction::from_key(&key);
            if action.is_none() {
                debug!(%key, "unknown notification action");
            }
            action.map(action_command)
        }
        DaemonSignal::Closed { id, reason } => {
            if !ours(id) {
                return None;
            }
            if let Ok(mut cur) = current.lock() {
                *cur = None;
            }
            debug!(reason, "notification closed");
            closed_command(reason)
        }
    }
}

async fn listen(
    proxy: NotificationsProxy<'static>,
    current: CurrentId,
    control_tx: Sender<ControlCmd>,
) -> zbus::Result<()> {
    let actions = proxy.receive_action_invoked().await?.filter_map(|signal| async move {
        let args = signal.args().ok()?;
        Some(DaemonSignal::Action {
            id: args.id,
            key: args.action_key.clone(),
        })
    });
    let closed = proxy
        .receive_notification_closed()
        .await?
        .filter_map(|signal| async move {
            let args = signal.args().ok()?;
            Some(DaemonSignal::Closed {
                id: args.id,
                reason: args.reason,
            })
        });

    let mut signals = std::pin::pin!(stream::select(actions, closed));
    while let Some(signal) = signals.next().await {
        let Some(cmd) = signal_command(signal, &current) else {
            continue;
        };
        debug!(?cmd, "notification command");
        if control_tx.send(cmd).is_err() {
            break;
        }
    }
    Ok(())
}
