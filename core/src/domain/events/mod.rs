//! Typed in-process messaging between the pipeline stages.
//!
//! Every subscriber owns an unbounded channel, so a slow handler never causes another
//! handler to miss events. Delivery is at-least-once; handlers key their work by the
//! identifiers carried in the events and ignore repeats.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{
    feedback::entities::Feedback,
    meal::entities::MealRecord,
    preference::entities::TrainingKind,
    recognition::entities::BackendId,
    validation::entities::Correction,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MealwiseEvent {
    /// All backends answered (or failed) and the regions went through the gate.
    RecognitionCompleted {
        request_id: Uuid,
        user_id: Uuid,
        region_ids: Vec<Uuid>,
        dropped_fragments: usize,
        timestamp: DateTime<Utc>,
    },

    BackendFailed {
        request_id: Uuid,
        backend: BackendId,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    RegionRejected {
        region_id: Uuid,
        user_id: Uuid,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    MealRecorded { record: MealRecord },

    CorrectionSubmitted { correction: Correction },

    FeedbackRecorded { feedback: Feedback },

    ModelPublished {
        user_id: Uuid,
        version: u64,
        kind: TrainingKind,
        timestamp: DateTime<Utc>,
    },

    TrainingFailed {
        user_id: Uuid,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    RecognitionCompleted,
    BackendFailed,
    RegionRejected,
    MealRecorded,
    CorrectionSubmitted,
    FeedbackRecorded,
    ModelPublished,
    TrainingFailed,
}

impl MealwiseEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            MealwiseEvent::RecognitionCompleted { .. } => EventKind::RecognitionCompleted,
            MealwiseEvent::BackendFailed { .. } => EventKind::BackendFailed,
            MealwiseEvent::RegionRejected { .. } => EventKind::RegionRejected,
            MealwiseEvent::MealRecorded { .. } => EventKind::MealRecorded,
            MealwiseEvent::CorrectionSubmitted { .. } => EventKind::CorrectionSubmitted,
            MealwiseEvent::FeedbackRecorded { .. } => EventKind::FeedbackRecorded,
            MealwiseEvent::ModelPublished { .. } => EventKind::ModelPublished,
            MealwiseEvent::TrainingFailed { .. } => EventKind::TrainingFailed,
        }
    }
}

#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<EventKind, Vec<mpsc::UnboundedSender<MealwiseEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receiver for every future event of the given kinds.
    pub fn subscribe(&self, kinds: &[EventKind]) -> mpsc::UnboundedReceiver<MealwiseEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        for kind in kinds {
            subscribers.entry(*kind).or_default().push(tx.clone());
        }
        rx
    }

    /// Delivers the event to current subscribers of its kind and returns how many received it.
    /// Closed receivers are pruned.
    pub fn publish(&self, event: MealwiseEvent) -> usize {
        let kind = event.kind();
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let Some(senders) = subscribers.get_mut(&kind) else {
            debug!(?kind, "event published without subscribers");
            return 0;
        };

        senders.retain(|tx| !tx.is_closed());
        let mut delivered = 0;
        for tx in senders.iter() {
            if tx.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                warn!(?kind, "subscriber went away during publish");
            }
        }
        delivered
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map(|s| s.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}
