//! Positional role assignment for the upstream's alternating-turn protocol.

use crate::log::Message;
use crate::{Role, Turn};

/// Role of the entry at `position` in a snapshot.
///
/// Position 0 is the context turn; after that odd positions are requester
/// turns and even positions are responder turns. The stored message index is
/// deliberately ignored, so after eviction the new head becomes the context.
#[must_use]
pub const fn role_at(position: usize) -> Role {
    if position == 0 {
        Role::Context
    } else if position % 2 == 1 {
        Role::Requester
    } else {
        Role::Responder
    }
}

/// Encode a log snapshot into protocol turns, preserving order.
#[must_use]
pub fn encode(snapshot: &[Message]) -> Vec<Turn> {
    snapshot
        .iter()
        .enumerate()
        .map(|(position, message)| Turn {
            role: role_at(position),
            content: message.text.clone(),
        })
        .collect()
}
