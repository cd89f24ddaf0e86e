use tokio::sync::broadcast;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Terminal outcome reported to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    /// Number of SIMs affected, for successful applies.
    pub affected: Option<u32>,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
            affected: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            affected: None,
        }
    }

    pub fn with_affected(mut self, affected: u32) -> Self {
        self.affected = Some(affected);
        self
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Fans notices out to any number of subscribers.
pub struct BroadcastNotifier {
    tx: broadcast::Sender<Notice>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, notice: Notice) {
        // No subscribers is fine: nobody is watching.
        let _ = self.tx.send(notice);
    }
}

pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => {
                info!(affected = ?notice.affected, "{}", notice.message)
            }
            NoticeLevel::Error => warn!("{}", notice.message),
        }
    }
}
