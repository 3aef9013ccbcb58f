//! crates/rag_client_core/src/stores/mod.rs
//!
//! The state-holding stores. Each store owns its aggregate state inside a
//! `watch` channel: mutations happen in short synchronous `send_modify`
//! sections, never across an `.await`, and observers read snapshots or
//! subscribe to changes.

pub mod conversation;
pub mod documents;

pub use conversation::{ConversationState, ConversationStore};
pub use documents::{DocumentStore, InventoryState};

use chrono::Utc;
use tokio::sync::watch;

/// Aggregate state whose `loading` flag is driven by a count of outstanding
/// operations.
pub(crate) trait Pending {
    fn in_flight_mut(&mut self) -> &mut usize;
    fn set_loading(&mut self, loading: bool);
    /// Called when the last outstanding operation settles.
    fn on_idle(&mut self) {}
}

/// One outstanding operation. Holding the guard keeps `loading` set; dropping
/// it (on success, failure, or cancellation of the owning future) releases
/// the slot.
pub(crate) struct InFlight<'a, S: Pending> {
    state: &'a watch::Sender<S>,
}

impl<'a, S: Pending> InFlight<'a, S> {
    pub(crate) fn enter(state: &'a watch::Sender<S>) -> Self {
        state.send_modify(|s| {
            *s.in_flight_mut() += 1;
            s.set_loading(true);
        });
        Self { state }
    }
}

impl<S: Pending> Drop for InFlight<'_, S> {
    fn drop(&mut self) {
        self.state.send_modify(|s| {
            let slots = s.in_flight_mut();
            *slots = slots.saturating_sub(1);
            if *slots == 0 {
                s.set_loading(false);
                s.on_idle();
            }
        });
    }
}

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
