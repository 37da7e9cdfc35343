use crate::config::PetalVoiceWorldDesc;
use crate::device::{AudioClip, DeviceFactory, VoiceSpawn};
use crate::error::Result;
use crate::events::{self, PetalVoiceEvent};
use crate::math::Vec3;
use crate::voice::{Voice, VoiceId};
use crossbeam_channel::Sender;

/// Fixed-size set of voices with priority-based allocation.
///
/// Allocation is two-phase: the first free voice in pool order wins; failing that, the busy
/// voice with the lowest priority not above the request is interrupted. Ties go to the voice
/// that comes first in the pool.
pub struct VoicePool {
    voices: Vec<Voice>,
    equal_priority_preempts: bool,
    notifier: Option<Sender<PetalVoiceEvent>>,
}

impl VoicePool {
    /// Spawns `desc.max_voices` voices, asking the factory for one device each.
    pub fn new(desc: &PetalVoiceWorldDesc, factory: &mut DeviceFactory<'_>) -> Result<Self> {
        desc.validate()?;

        let mut voices = Vec::with_capacity(desc.max_voices);
        for index in 0..desc.max_voices {
            let spawn = VoiceSpawn {
                index,
                label: format!("Voice {}", index + 1),
                hidden: desc.hide_voices,
            };
            let device = factory(&spawn)?;
            voices.push(Voice::new(VoiceId(index), spawn.label, device));
        }
        log::info!(
            "Voice pool ready: {} voices (equal priority preempts: {})",
            voices.len(),
            desc.equal_priority_preempts
        );

        Ok(Self {
            voices,
            equal_priority_preempts: desc.equal_priority_preempts,
            notifier: None,
        })
    }

    pub(crate) fn with_notifier(mut self, sender: Sender<PetalVoiceEvent>) -> Self {
        self.notifier = Some(sender);
        self
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.get(id.0)
    }

    pub fn voice_mut(&mut self, id: VoiceId) -> Option<&mut Voice> {
        self.voices.get_mut(id.0)
    }

    /// Number of voices that are reserved or active.
    pub fn busy_count(&self) -> usize {
        self.voices.iter().filter(|voice| !voice.is_free()).count()
    }

    /// Reserves one voice for a request of the given priority.
    ///
    /// Returns `None` when every voice is reserved or held at a higher priority. With
    /// `equal_priority_preempts` disabled, voices held at exactly `priority` are not taken
    /// either.
    pub fn request_voice(&mut self, priority: i32) -> Option<VoiceId> {
        if let Some(voice) = self
            .voices
            .iter_mut()
            .find(|voice| !voice.is_active() && !voice.is_requested())
        {
            voice.request(priority);
            log::debug!("{} reserved at priority {}", voice.label(), priority);
            return Some(voice.id());
        }

        let strict = !self.equal_priority_preempts;
        let victim = self
            .voices
            .iter()
            .filter(|voice| !voice.is_requested())
            .filter(|voice| {
                if strict {
                    voice.active_priority() < priority
                } else {
                    voice.active_priority() <= priority
                }
            })
            .min_by_key(|voice| voice.active_priority())
            .map(Voice::id);

        let Some(id) = victim else {
            log::debug!("No voice available at priority {}", priority);
            return None;
        };

        let voice = &mut self.voices[id.0];
        let evicted_priority = voice.active_priority();
        let event_name = voice.current_event_name().map(str::to_string);
        log::debug!(
            "{} preempted: {:?} (priority {}) interrupted by priority {}",
            voice.label(),
            event_name,
            evicted_priority,
            priority
        );
        voice.stop();
        voice.request(priority);
        self.notify(PetalVoiceEvent::VoicePreempted {
            voice: id,
            event_name,
            evicted_priority,
            priority,
        });
        Some(id)
    }

    /// Calls [`request_voice`](Self::request_voice) `count` times. Slots that could not be
    /// filled are `None`; the rest stay reserved.
    pub fn request_voices(&mut self, count: usize, priority: i32) -> Vec<Option<VoiceId>> {
        (0..count).map(|_| self.request_voice(priority)).collect()
    }

    /// Starts a clip on a voice and reports it.
    pub fn play_clip(&mut self, id: VoiceId, clip: &AudioClip, looping: bool) -> bool {
        let Some(voice) = self.voices.get_mut(id.0) else {
            return false;
        };
        voice.play_clip(clip, looping);
        let event = PetalVoiceEvent::VoiceStarted {
            voice: id,
            event_name: voice.current_event_name().map(str::to_string),
            clip: clip.name().to_string(),
        };
        self.notify(event);
        true
    }

    /// Stops one voice. Returns true if it was sounding or reserved.
    pub fn stop_voice(&mut self, id: VoiceId) -> bool {
        let Some(voice) = self.voices.get_mut(id.0) else {
            return false;
        };
        if voice.is_free() {
            return false;
        }
        let was_active = voice.is_active();
        let event_name = voice.current_event_name().map(str::to_string);
        voice.stop();
        if was_active {
            self.notify(PetalVoiceEvent::VoiceStopped {
                voice: id,
                event_name,
            });
        }
        true
    }

    /// Stops every active voice playing `event_name`, except the listed voices.
    /// Returns how many voices were stopped.
    pub fn stop_event(&mut self, event_name: &str, except: &[VoiceId]) -> usize {
        let targets: Vec<VoiceId> = self
            .voices
            .iter()
            .filter(|voice| voice.current_event_name() == Some(event_name))
            .map(Voice::id)
            .filter(|id| !except.contains(id))
            .collect();
        for id in &targets {
            self.stop_voice(*id);
        }
        if !targets.is_empty() {
            log::debug!("Stopped {} voice(s) of {}", targets.len(), event_name);
        }
        targets.len()
    }

    /// Stops every active voice, skipping those playing one of `except_events` and the listed
    /// voices. Returns how many voices were stopped.
    pub fn stop_all<S: AsRef<str>>(
        &mut self,
        except_events: &[S],
        except_voices: &[VoiceId],
    ) -> usize {
        let targets: Vec<VoiceId> = self
            .voices
            .iter()
            .filter(|voice| voice.is_active())
            .filter(|voice| {
                voice.current_event_name().is_none_or(|name| {
                    !except_events.iter().any(|except| except.as_ref() == name)
                })
            })
            .map(Voice::id)
            .filter(|id| !except_voices.contains(id))
            .collect();
        for id in &targets {
            self.stop_voice(*id);
        }
        if !targets.is_empty() {
            log::debug!("Stopped {} voice(s) globally", targets.len());
        }
        targets.len()
    }

    /// Active voices currently playing `event_name`, in pool order.
    pub fn find_active(&self, event_name: &str) -> Vec<VoiceId> {
        self.voices
            .iter()
            .filter(|voice| voice.current_event_name() == Some(event_name))
            .map(Voice::id)
            .collect()
    }

    /// Returns reserved voices that were never started to the pool.
    pub(crate) fn release_unactivated(&mut self, ids: &[Option<VoiceId>]) {
        for id in ids.iter().flatten() {
            let Some(voice) = self.voices.get_mut(id.0) else {
                continue;
            };
            if voice.is_requested() && !voice.is_active() {
                log::debug!("{} was reserved but never started, releasing", voice.label());
                voice.release();
            }
        }
    }

    /// Expiry bookkeeping: frees voices whose device stopped on its own.
    pub fn fixed_tick(&mut self) -> Vec<VoiceId> {
        let mut finished = Vec::new();
        for voice in &mut self.voices {
            let event_name = voice.current_event_name().map(str::to_string);
            if voice.update_expiry() {
                log::debug!("{} finished {:?}", voice.label(), event_name);
                finished.push((voice.id(), event_name));
            }
        }
        finished
            .into_iter()
            .map(|(voice, event_name)| {
                self.notify(PetalVoiceEvent::VoiceFinished { voice, event_name });
                voice
            })
            .collect()
    }

    /// Attachment follow-up and distance curves against this frame's listener.
    pub fn late_tick(&mut self, listener: Option<Vec3>) {
        for voice in &mut self.voices {
            voice.follow_and_attenuate(listener);
        }
    }

    /// Stops every voice. Used on shutdown and re-initialization.
    pub(crate) fn stop_everything(&mut self) {
        for voice in &mut self.voices {
            voice.stop();
        }
    }

    fn notify(&self, event: PetalVoiceEvent) {
        if let Some(sender) = &self.notifier {
            events::deliver(sender, event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{PlaybackDevice, SimulatedDevice, SimulatedDeviceHandle};
    use crate::voice::FREE_PRIORITY;
    use std::time::Duration;

    fn pool_with(desc: PetalVoiceWorldDesc) -> (VoicePool, Vec<SimulatedDeviceHandle>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut handles = Vec::new();
        let mut factory = |_: &VoiceSpawn| -> Result<Box<dyn PlaybackDevice>> {
            let (device, handle) = SimulatedDevice::new();
            handles.push(handle);
            Ok(Box::new(device))
        };
        let pool = VoicePool::new(&desc, &mut factory).unwrap();
        (pool, handles)
    }

    fn make_pool(size: usize) -> (VoicePool, Vec<SimulatedDeviceHandle>) {
        pool_with(PetalVoiceWorldDesc::default().max_voices(size))
    }

    fn clip() -> AudioClip {
        AudioClip::new("hit", Duration::from_millis(100))
    }

    fn occupy(pool: &mut VoicePool, priority: i32, name: &str) -> VoiceId {
        let id = pool.request_voice(priority).unwrap();
        pool.voice_mut(id).unwrap().set_event_name(name);
        pool.play_clip(id, &clip(), true);
        id
    }

    #[test]
    fn test_zero_voices_is_rejected() {
        let mut factory = |_: &VoiceSpawn| -> Result<Box<dyn PlaybackDevice>> {
            Ok(Box::new(SimulatedDevice::new().0))
        };
        let desc = PetalVoiceWorldDesc::default().max_voices(0);
        assert!(VoicePool::new(&desc, &mut factory).is_err());
    }

    #[test]
    fn test_factory_sees_labels_and_visibility() {
        let mut spawns = Vec::new();
        let mut factory = |spawn: &VoiceSpawn| -> Result<Box<dyn PlaybackDevice>> {
            spawns.push(spawn.clone());
            Ok(Box::new(SimulatedDevice::new().0))
        };
        let desc = PetalVoiceWorldDesc::default().max_voices(2).hide_voices(false);
        VoicePool::new(&desc, &mut factory).unwrap();

        assert_eq!(spawns.len(), 2);
        assert_eq!(spawns[1].label, "Voice 2");
        assert!(!spawns[0].hidden);
    }

    #[test]
    fn test_free_voices_are_taken_in_order() {
        let (mut pool, _) = make_pool(3);
        assert_eq!(pool.request_voice(1), Some(VoiceId(0)));
        assert_eq!(pool.request_voice(1), Some(VoiceId(1)));
        assert_eq!(pool.request_voice(1), Some(VoiceId(2)));
        assert_eq!(pool.busy_count(), 3);
    }

    #[test]
    fn test_increasing_priorities_never_exceed_pool() {
        for size in 1..=4 {
            let (mut pool, _) = make_pool(size);
            for priority in 0..(size as i32 * 3) {
                assert!(pool.request_voice(priority).is_some());
                let id = VoiceId(pool.voices().iter().position(|v| v.is_requested()).unwrap());
                pool.play_clip(id, &clip(), true);
                assert!(pool.busy_count() <= size);
            }
            assert_eq!(pool.busy_count(), size);
        }
    }

    #[test]
    fn test_preempts_lowest_priority_first_on_tie() {
        let (mut pool, handles) = make_pool(3);
        occupy(&mut pool, 4, "A");
        occupy(&mut pool, 2, "B");
        occupy(&mut pool, 2, "C");

        let id = pool.request_voice(3).unwrap();
        assert_eq!(id, VoiceId(1));
        assert_eq!(handles[1].state().stops, 1);
        assert!(!handles[1].is_playing());
        assert!(handles[2].is_playing());
    }

    #[test]
    fn test_higher_priority_occupants_are_safe() {
        let (mut pool, handles) = make_pool(2);
        occupy(&mut pool, 5, "A");
        occupy(&mut pool, 6, "B");

        assert_eq!(pool.request_voice(4), None);
        assert!(handles.iter().all(SimulatedDeviceHandle::is_playing));
    }

    #[test]
    fn test_equal_priority_preemption_is_configurable() {
        let (mut pool, _) = make_pool(1);
        occupy(&mut pool, 1, "A");
        assert_eq!(pool.request_voice(1), Some(VoiceId(0)));

        let (mut pool, handles) = pool_with(
            PetalVoiceWorldDesc::default()
                .max_voices(1)
                .equal_priority_preempts(false),
        );
        occupy(&mut pool, 1, "A");
        assert_eq!(pool.request_voice(1), None);
        assert!(handles[0].is_playing());
        assert_eq!(pool.request_voice(2), Some(VoiceId(0)));
        assert!(!handles[0].is_playing());
    }

    #[test]
    fn test_reserved_voices_are_not_preempted() {
        let (mut pool, _) = make_pool(2);
        let slots = pool.request_voices(3, 1);
        assert_eq!(slots, vec![Some(VoiceId(0)), Some(VoiceId(1)), None]);
    }

    #[test]
    fn test_preemption_is_reported() {
        let (mut pool, _) = make_pool(1);
        let (tx, rx) = crossbeam_channel::unbounded();
        pool = pool.with_notifier(tx);
        occupy(&mut pool, 1, "Ambience");
        pool.request_voice(3);

        let events: Vec<_> = rx.try_iter().collect();
        assert!(events.contains(&PetalVoiceEvent::VoicePreempted {
            voice: VoiceId(0),
            event_name: Some("Ambience".to_string()),
            evicted_priority: 1,
            priority: 3,
        }));
    }

    #[test]
    fn test_stop_event_only_touches_matching_voices() {
        let (mut pool, handles) = make_pool(3);
        occupy(&mut pool, 1, "Rain");
        occupy(&mut pool, 1, "Wind");
        occupy(&mut pool, 1, "Rain");

        assert_eq!(pool.stop_event("Rain", &[]), 2);
        assert!(!handles[0].is_playing());
        assert!(handles[1].is_playing());
        assert!(!handles[2].is_playing());
        assert_eq!(pool.find_active("Wind"), vec![VoiceId(1)]);
        assert!(pool.find_active("Rain").is_empty());
    }

    #[test]
    fn test_stop_all_honours_exceptions() {
        let (mut pool, handles) = make_pool(3);
        occupy(&mut pool, 1, "Music");
        occupy(&mut pool, 1, "Gunshot");
        let kept = occupy(&mut pool, 1, "Gunshot");

        assert_eq!(pool.stop_all(&["Music"], &[kept]), 1);
        assert!(handles[0].is_playing());
        assert!(!handles[1].is_playing());
        assert!(handles[2].is_playing());
    }

    #[test]
    fn test_fixed_tick_frees_finished_voices() {
        let (mut pool, handles) = make_pool(2);
        let id = pool.request_voice(2).unwrap();
        pool.voice_mut(id).unwrap().set_event_name("Blip");
        pool.play_clip(id, &clip(), false);

        assert!(pool.fixed_tick().is_empty());
        handles[0].advance(Duration::from_millis(150));
        assert_eq!(pool.fixed_tick(), vec![id]);

        let voice = pool.voice(id).unwrap();
        assert!(voice.is_free());
        assert_eq!(voice.active_priority(), FREE_PRIORITY);
        assert_eq!(voice.current_event_name(), None);
    }

    #[test]
    fn test_release_unactivated() {
        let (mut pool, _) = make_pool(2);
        let slots = pool.request_voices(2, 1);
        pool.play_clip(VoiceId(0), &clip(), false);
        pool.release_unactivated(&slots);

        assert!(pool.voice(VoiceId(0)).unwrap().is_active());
        assert!(pool.voice(VoiceId(1)).unwrap().is_free());
    }
}
