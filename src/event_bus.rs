use tokio::sync::broadcast;

use crate::AppEvent;

#[derive(Clone, Copy, Debug)]
pub enum EventPriority {
    Realtime,
    Background,
}

/// Broadcast channels connecting the UI task and the gateway worker.
///
/// Realtime events update the draw loop; background events carry work for the
/// gateway manager. Sends never block and drop silently when nobody listens,
/// which is what lets a late network result land harmlessly after the user
/// has moved on.
#[derive(Debug)]
pub struct EventBus {
    pub realtime_tx: broadcast::Sender<AppEvent>,
    pub background_tx: broadcast::Sender<AppEvent>,
}

/// Convenience struct to help with the initialization of EventBus
#[derive(Clone, Copy)]
pub struct EventBusCaps {
    realtime_cap: usize,
    background_cap: usize,
}

impl Default for EventBusCaps {
    fn default() -> Self {
        Self {
            realtime_cap: 100,
            background_cap: 1000,
        }
    }
}

impl EventBus {
    pub fn new(b: EventBusCaps) -> Self {
        Self {
            realtime_tx: broadcast::channel(b.realtime_cap).0,
            background_tx: broadcast::channel(b.background_cap).0,
        }
    }

    pub fn send(&self, event: AppEvent) {
        let priority = event.priority();
        tracing::debug!("event_priority: {:?}", priority);
        let tx = match priority {
            EventPriority::Realtime => &self.realtime_tx,
            EventPriority::Background => &self.background_tx,
        };
        let _ = tx.send(event); // Ignore receiver count
    }

    pub fn subscribe(&self, priority: EventPriority) -> broadcast::Receiver<AppEvent> {
        match priority {
            EventPriority::Realtime => self.realtime_tx.subscribe(),
            EventPriority::Background => self.background_tx.subscribe(),
        }
    }
}
