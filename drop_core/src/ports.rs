//! Outbound collaborators the service talks to.

use crate::types::LootSource;

/// Server-wide chat channel
#[cfg_attr(test, mockall::automock)]
pub trait Broadcaster: Send + Sync {
    fn send_server_message(&self, text: &str);
}

/// Entity and template name lookup
#[cfg_attr(test, mockall::automock)]
pub trait NameResolver: Send + Sync {
    /// Name of the live creature or object a loot came from
    fn source_name(&self, source: LootSource) -> Option<String>;

    /// Name from the creature template table
    fn creature_template_name(&self, entry: u32) -> Option<String>;
}

#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    fn now_epoch_seconds(&self) -> u64;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> u64 {
        u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
    }
}
