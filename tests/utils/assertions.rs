//! Test assertion helpers for presence pushes
#![allow(dead_code)] // Test utilities may not all be used in every test

use super::viewer::Viewer;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct PresenceAssertion<'a> {
    viewers: Vec<&'a mut Viewer>,
}

impl<'a> PresenceAssertion<'a> {
    pub fn for_viewers(viewers: Vec<&'a mut Viewer>) -> Self {
        Self { viewers }
    }

    /// Assert that every viewer received the same count for the room (consumes one message each)
    pub async fn received_count(self, room_id: &str, expected_count: usize) -> u64 {
        let mut ticks = vec![];

        for (i, viewer) in self.viewers.into_iter().enumerate() {
            let message = viewer.next_message().await;
            let payload = message
                .count_payload()
                .expect("message should carry a presence count");

            assert_eq!(payload.room_id, room_id, "viewer {} got the wrong room", i);
            assert_eq!(
                payload.count, expected_count,
                "viewer {} got the wrong count",
                i
            );
            ticks.push(message.meta.expect("presence messages carry meta").tick);
        }

        // Everyone in the room is served from the same tick
        assert!(
            ticks.windows(2).all(|pair| pair[0] == pair[1]),
            "viewers saw different ticks: {:?}",
            ticks
        );

        ticks.first().copied().unwrap_or_default()
    }
}
