use crate::error::{PetalVoiceError, Result};
use crate::sound_event::SoundEvent;
use std::collections::HashMap;

/// Stable handle to an event in a loaded bank.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EventId(usize);

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EventId({})", self.0)
    }
}

/// Something that names an event: its name or an [`EventId`].
pub trait EventKey {
    fn resolve(&self, bank: &EventBank) -> Option<EventId>;
    fn describe(&self) -> String;
}

impl EventKey for EventId {
    fn resolve(&self, bank: &EventBank) -> Option<EventId> {
        bank.get(*self).map(|_| *self)
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl EventKey for &str {
    fn resolve(&self, bank: &EventBank) -> Option<EventId> {
        bank.find(self)
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl EventKey for String {
    fn resolve(&self, bank: &EventBank) -> Option<EventId> {
        bank.find(self)
    }

    fn describe(&self) -> String {
        self.clone()
    }
}

/// Anything that can enumerate event definitions. Consumed exactly once, at load time.
pub trait EventSource {
    fn load_events(self) -> Result<Vec<SoundEvent>>;
}

impl EventSource for Vec<SoundEvent> {
    fn load_events(self) -> Result<Vec<SoundEvent>> {
        Ok(self)
    }
}

impl<const N: usize> EventSource for [SoundEvent; N] {
    fn load_events(self) -> Result<Vec<SoundEvent>> {
        Ok(self.into())
    }
}

/// Name-indexed directory of event definitions. Filled once, read many times.
#[derive(Debug, Default)]
pub struct EventBank {
    events: Vec<SoundEvent>,
    by_name: HashMap<String, EventId>,
    loaded: bool,
}

impl EventBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every event from `source`. A bank only loads once.
    ///
    /// Events with an empty name are rejected. When two events share a name the first one wins.
    pub fn load(&mut self, source: impl EventSource) -> Result<usize> {
        if self.loaded {
            return Err(PetalVoiceError::BankAlreadyLoaded);
        }
        let events = source.load_events()?;
        if let Some(index) = events.iter().position(|event| event.name.is_empty()) {
            return Err(PetalVoiceError::EventSource(format!(
                "event #{index} has no name"
            )));
        }

        for event in events {
            if self.by_name.contains_key(&event.name) {
                log::warn!("Duplicate event \"{}\" ignored", event.name);
                continue;
            }
            let id = EventId(self.events.len());
            self.by_name.insert(event.name.clone(), id);
            self.events.push(event);
        }
        self.loaded = true;

        if self.events.is_empty() {
            log::warn!("Event bank loaded without any events");
        } else {
            log::info!("Event bank loaded: {} events", self.events.len());
        }
        Ok(self.events.len())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<EventId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: EventId) -> Option<&SoundEvent> {
        self.events.get(id.0)
    }

    pub fn get_mut(&mut self, id: EventId) -> Option<&mut SoundEvent> {
        self.events.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EventId, &SoundEvent)> {
        self.events
            .iter()
            .enumerate()
            .map(|(index, event)| (EventId(index), event))
    }
}
