use crate::ports::Broadcaster;
use std::sync::Arc;

/// Shown when the looter has no name
pub const UNKNOWN_LOOTER: &str = "Someone";

/// Build the server-wide loot message
pub fn format_announcement(looter: &str, item_name: &str, source_name: &str) -> String {
    let who = if looter.is_empty() {
        UNKNOWN_LOOTER
    } else {
        looter
    };
    format!(
        "{} has looted the legendary {} from {}!",
        who, item_name, source_name
    )
}

/// Sends loot announcements to every connected player
pub struct Announcer {
    broadcaster: Arc<dyn Broadcaster>,
}

impl Announcer {
    pub fn new(broadcaster: Arc<dyn Broadcaster>) -> Self {
        Announcer { broadcaster }
    }

    /// Format and broadcast; returns the text that was sent
    pub fn announce(&self, looter: &str, item_name: &str, source_name: &str) -> String {
        let message = format_announcement(looter, item_name, source_name);
        tracing::info!(looter, source = source_name, "Announcing reward loot");
        self.broadcaster.send_server_message(&message);
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockBroadcaster;

    #[test]
    fn test_format() {
        assert_eq!(
            format_announcement("Alice", "Talisman of Binding Shard", "Baron Geddon"),
            "Alice has looted the legendary Talisman of Binding Shard from Baron Geddon!"
        );
    }

    #[test]
    fn test_format_unnamed_looter() {
        assert_eq!(
            format_announcement("", "Thunderfury", "their foe"),
            "Someone has looted the legendary Thunderfury from their foe!"
        );
    }

    #[test]
    fn test_announce_broadcasts_once() {
        let mut broadcaster = MockBroadcaster::new();
        broadcaster
            .expect_send_server_message()
            .withf(|text| text == "Bob has looted the legendary Shard from Geddon!")
            .times(1)
            .return_const(());

        let announcer = Announcer::new(Arc::new(broadcaster));
        let sent = announcer.announce("Bob", "Shard", "Geddon");
        assert_eq!(sent, "Bob has looted the legendary Shard from Geddon!");
    }
}
