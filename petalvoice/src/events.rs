//! Event types for PetalVoice

use crate::sound_event::DropReason;
use crate::voice::VoiceId;
use crossbeam_channel::{Sender, TrySendError};

/// Notifications emitted by a [`PetalVoiceWorld`](crate::PetalVoiceWorld).
///
/// Drained with [`PetalVoiceWorld::poll_events`](crate::PetalVoiceWorld::poll_events).
#[derive(Debug, Clone, PartialEq)]
pub enum PetalVoiceEvent {
    VoiceStarted {
        voice: VoiceId,
        event_name: Option<String>,
        clip: String,
    },
    /// A busy voice was taken over by a request of equal or higher priority.
    VoicePreempted {
        voice: VoiceId,
        event_name: Option<String>,
        evicted_priority: i32,
        priority: i32,
    },
    /// The voice's clip ended on its own and the voice went back to the pool.
    VoiceFinished {
        voice: VoiceId,
        event_name: Option<String>,
    },
    VoiceStopped {
        voice: VoiceId,
        event_name: Option<String>,
    },
    PlayDropped {
        event_name: String,
        reason: DropReason,
    },
    Initialized {
        max_voices: usize,
    },
    ShutDown,
}

impl PetalVoiceEvent {
    pub fn voice(&self) -> Option<VoiceId> {
        match self {
            Self::VoiceStarted { voice, .. }
            | Self::VoicePreempted { voice, .. }
            | Self::VoiceFinished { voice, .. }
            | Self::VoiceStopped { voice, .. } => Some(*voice),
            _ => None,
        }
    }

    pub fn event_name(&self) -> Option<&str> {
        match self {
            Self::VoiceStarted { event_name, .. }
            | Self::VoicePreempted { event_name, .. }
            | Self::VoiceFinished { event_name, .. }
            | Self::VoiceStopped { event_name, .. } => event_name.as_deref(),
            Self::PlayDropped { event_name, .. } => Some(event_name),
            _ => None,
        }
    }

    /// Whether a voice stopped sounding, for whatever reason.
    pub fn is_voice_end(&self) -> bool {
        matches!(
            self,
            Self::VoicePreempted { .. } | Self::VoiceFinished { .. } | Self::VoiceStopped { .. }
        )
    }
}

/// Queues a notification. A full queue drops it, so a host that never polls stays bounded.
pub(crate) fn deliver(sender: &Sender<PetalVoiceEvent>, event: PetalVoiceEvent) {
    if let Err(TrySendError::Full(event)) = sender.try_send(event) {
        log::debug!("Notification queue full, dropping {:?}", event);
    }
}
