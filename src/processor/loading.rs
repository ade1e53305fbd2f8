//! Loading status rotation shown while an analysis is in flight

use crate::processor::ticker::{PeriodicTask, TickControl};
use crate::session::{AppEvent, SharedAppState};
use crossbeam_channel::Sender;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Status lines cycled under the loading headline
pub const STATUS_MESSAGES: [&str; 4] = [
    "Analyzing your musical choices...",
    "Judging your taste...",
    "Claude is thinking deeply...",
    "Almost done...",
];

/// Status line for a rotation index
pub fn status_message(index: usize) -> &'static str {
    STATUS_MESSAGES[index % STATUS_MESSAGES.len()]
}

/// Rotation bound to one analysis request
///
/// Each tick advances the status only while the loading view for the same
/// request still exists; otherwise the task stops itself.
pub struct LoadingRotation {
    request_id: Uuid,
    task: PeriodicTask,
}

impl LoadingRotation {
    pub fn start(
        state: SharedAppState,
        request_id: Uuid,
        interval: Duration,
        event_tx: Sender<AppEvent>,
    ) -> Self {
        let task = PeriodicTask::spawn("loading-rotation", interval, move || {
            let message = {
                let mut s = state.write();
                match s.loading.as_mut() {
                    Some(loading) if loading.request_id == request_id => {
                        loading.status_index = (loading.status_index + 1) % STATUS_MESSAGES.len();
                        status_message(loading.status_index)
                    }
                    _ => {
                        debug!("Loading view for {} is gone, stopping rotation", request_id);
                        return TickControl::Stop;
                    }
                }
            };
            let _ = event_tx.try_send(AppEvent::LoadingStatus(message.to_string()));
            TickControl::Continue
        });

        Self { request_id, task }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn cancel(&mut self) {
        self.task.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.task.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::LoadingState;
    use crossbeam_channel::unbounded;

    fn loading(state: &SharedAppState) -> Uuid {
        let request_id = Uuid::new_v4();
        state.write().loading = Some(LoadingState {
            request_id,
            headline: "Analyzing your taste...",
            status_index: 0,
        });
        request_id
    }

    #[test]
    fn test_messages_cycle() {
        assert_eq!(status_message(0), "Analyzing your musical choices...");
        assert_eq!(status_message(3), "Almost done...");
        assert_eq!(status_message(4), status_message(0));
    }

    #[test]
    fn test_rotation_advances_and_emits() {
        let state = SharedAppState::new();
        let request_id = loading(&state);
        let (tx, rx) = unbounded();

        let mut rotation =
            LoadingRotation::start(state.clone(), request_id, Duration::from_millis(5), tx);
        let event = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        rotation.cancel();

        assert_eq!(
            event,
            AppEvent::LoadingStatus("Judging your taste...".to_string())
        );
        assert!(state.read().loading.as_ref().unwrap().status_index >= 1);
    }

    #[test]
    fn test_rotation_stops_when_loading_is_gone() {
        let state = SharedAppState::new();
        let request_id = loading(&state);
        state.write().loading = None;
        let (tx, rx) = unbounded();

        let _rotation =
            LoadingRotation::start(state.clone(), request_id, Duration::from_millis(5), tx);
        std::thread::sleep(Duration::from_millis(40));
        assert!(rx.try_recv().is_err());
        assert!(state.read().loading.is_none());
    }

    #[test]
    fn test_rotation_ignores_other_request() {
        let state = SharedAppState::new();
        let _current = loading(&state);
        let (tx, rx) = unbounded();

        let _rotation =
            LoadingRotation::start(state.clone(), Uuid::new_v4(), Duration::from_millis(5), tx);
        std::thread::sleep(Duration::from_millis(40));
        assert!(rx.try_recv().is_err());
        assert_eq!(state.read().loading.as_ref().unwrap().status_index, 0);
    }
}
