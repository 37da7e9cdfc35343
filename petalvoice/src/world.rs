use crate::action::SequenceReport;
use crate::bank::{EventBank, EventId, EventKey, EventSource};
use crate::config::PetalVoiceWorldDesc;
use crate::device::{PlaybackDevice, VoiceSpawn};
use crate::error::Result;
use crate::events::{self, PetalVoiceEvent};
use crate::math::{Pose, Vec3};
use crate::pool::VoicePool;
use crate::sound_event::{DropReason, PlayMode, PlayOutcome, SoundEvent};
use crate::spatial::{Anchor, ListenerProvider};
use crate::voice::{Voice, VoiceId};
use crossbeam_channel::{Receiver, Sender};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Notifications kept for [`PetalVoiceWorld::poll_events`]. Newer ones are dropped while the
/// queue is full.
pub const MAX_PENDING_EVENTS: usize = 1024;

/// Main world object that owns the voice pool, the event bank and the listener.
///
/// `PetalVoiceWorld` is the central API for PetalVoice. Everything happens on the thread that
/// owns it, driven by two ticks per frame:
///
/// - [`fixed_tick`](Self::fixed_tick): returns voices whose clip ended to the pool
/// - [`late_tick`](Self::late_tick): moves attached voices and re-evaluates distance curves
///   against the listener of the current frame
///
/// Play requests never fail. A request that cannot sound is reported as
/// [`PlayOutcome::Dropped`], logged, and announced as [`PetalVoiceEvent::PlayDropped`].
///
/// # Example
///
/// ```
/// use petalvoice::*;
/// use std::time::Duration;
///
/// let mut world = PetalVoiceWorld::new();
/// world
///     .initialize(PetalVoiceWorldDesc::default().max_voices(2), |_spawn| {
///         let (device, _handle) = SimulatedDevice::new();
///         Ok(Box::new(device) as Box<dyn PlaybackDevice>)
///     })
///     .unwrap();
///
/// let step = AudioClip::new("step", Duration::from_millis(120));
/// world
///     .load_events(vec![SoundEvent::new("Footstep").with_action(Action::play(step))])
///     .unwrap();
///
/// let outcome = world.play_event_at_position("Footstep", Vec3::new(1.0, 0.0, 0.0));
/// assert!(outcome.is_played());
/// ```
pub struct PetalVoiceWorld {
    desc: PetalVoiceWorldDesc,
    pool: Option<VoicePool>,
    bank: EventBank,
    listener: Option<PetalVoiceAudioListener>,
    rng: StdRng,
    event_sender: Sender<PetalVoiceEvent>,
    event_receiver: Receiver<PetalVoiceEvent>,
}

impl Default for PetalVoiceWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PetalVoiceWorld {
    /// Creates an uninitialized world. Play requests are dropped until
    /// [`initialize`](Self::initialize) succeeds.
    pub fn new() -> Self {
        let (event_sender, event_receiver) = crossbeam_channel::bounded(MAX_PENDING_EVENTS);
        Self {
            desc: PetalVoiceWorldDesc::default(),
            pool: None,
            bank: EventBank::new(),
            listener: None,
            rng: StdRng::from_os_rng(),
            event_sender,
            event_receiver,
        }
    }

    /// Builds the voice pool, one device per voice from `factory`.
    ///
    /// Calling this again discards every voice (stopping whatever they play) and creates new
    /// ones from the new descriptor. On error the world is left uninitialized.
    pub fn initialize<F>(&mut self, desc: PetalVoiceWorldDesc, mut factory: F) -> Result<()>
    where
        F: FnMut(&VoiceSpawn) -> Result<Box<dyn PlaybackDevice>>,
    {
        if let Some(mut old) = self.pool.take() {
            log::info!("Re-initializing: discarding {} voices", old.len());
            old.stop_everything();
        }

        let pool = VoicePool::new(&desc, &mut factory)?.with_notifier(self.event_sender.clone());
        if let Some(seed) = desc.random_seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        let max_voices = pool.len();
        self.pool = Some(pool);
        self.desc = desc;

        log::info!("PetalVoice initialized with {} voices", max_voices);
        self.notify(PetalVoiceEvent::Initialized { max_voices });
        Ok(())
    }

    /// Stops every voice and drops the pool. The bank stays loaded.
    pub fn shutdown(&mut self) {
        let Some(mut pool) = self.pool.take() else {
            return;
        };
        pool.stop_everything();
        log::info!("PetalVoice shut down");
        self.notify(PetalVoiceEvent::ShutDown);
    }

    pub fn is_initialized(&self) -> bool {
        self.pool.is_some()
    }

    pub fn desc(&self) -> &PetalVoiceWorldDesc {
        &self.desc
    }

    pub fn pool(&self) -> Option<&VoicePool> {
        self.pool.as_ref()
    }

    /// Loads the event bank. Allowed once per world.
    pub fn load_events(&mut self, source: impl EventSource) -> Result<usize> {
        self.bank.load(source)
    }

    pub fn bank(&self) -> &EventBank {
        &self.bank
    }

    pub fn find_event(&self, name: &str) -> Option<EventId> {
        self.bank.find(name)
    }

    pub fn event(&self, id: EventId) -> Option<&SoundEvent> {
        self.bank.get(id)
    }

    pub fn play_event_2d(&mut self, event: impl EventKey) -> PlayOutcome {
        self.play(event, PlayMode::TwoD, 1.0)
    }

    pub fn play_event_2d_with_volume(&mut self, event: impl EventKey, volume: f32) -> PlayOutcome {
        self.play(event, PlayMode::TwoD, volume)
    }

    pub fn play_event_at_position(&mut self, event: impl EventKey, position: Vec3) -> PlayOutcome {
        self.play(event, PlayMode::AtPosition(position), 1.0)
    }

    pub fn play_event_at_position_with_volume(
        &mut self,
        event: impl EventKey,
        position: Vec3,
        volume: f32,
    ) -> PlayOutcome {
        self.play(event, PlayMode::AtPosition(position), volume)
    }

    pub fn play_event_attached(&mut self, event: impl EventKey, anchor: &Anchor) -> PlayOutcome {
        self.play(event, PlayMode::Attached(anchor.downgrade()), 1.0)
    }

    pub fn play_event_attached_with_volume(
        &mut self,
        event: impl EventKey,
        anchor: &Anchor,
        volume: f32,
    ) -> PlayOutcome {
        self.play(event, PlayMode::Attached(anchor.downgrade()), volume)
    }

    /// Plays an event by name or id. `volume` scales the event's own volume.
    pub fn play(&mut self, event: impl EventKey, mode: PlayMode, volume: f32) -> PlayOutcome {
        let Some(pool) = self.pool.as_mut() else {
            return self.drop_play(event.describe(), DropReason::NotInitialized);
        };
        let Some(sound) = event
            .resolve(&self.bank)
            .and_then(|id| self.bank.get_mut(id))
        else {
            return self.drop_play(event.describe(), DropReason::EventNotFound);
        };

        let listener = self.listener.as_ref().map(PetalVoiceAudioListener::position);
        let outcome = sound.play(pool, &mode, volume, listener, &mut self.rng);
        if let PlayOutcome::Dropped(reason) = outcome {
            let name = sound.name.clone();
            self.notify(PetalVoiceEvent::PlayDropped {
                event_name: name,
                reason,
            });
        }
        outcome
    }

    /// Auditions an event on a device outside the pool. Works without initialization.
    pub fn preview(
        &mut self,
        event: impl EventKey,
        device: &mut dyn PlaybackDevice,
        volume: f32,
    ) -> Option<SequenceReport> {
        let Some(sound) = event
            .resolve(&self.bank)
            .and_then(|id| self.bank.get_mut(id))
        else {
            log::warn!("Cannot preview \"{}\": event not found", event.describe());
            return None;
        };
        Some(sound.preview(device, volume, &mut self.rng))
    }

    /// Stops every voice playing `event_name`, except the listed voices.
    pub fn stop_event(&mut self, event_name: &str, except_voices: &[VoiceId]) -> usize {
        match self.pool.as_mut() {
            Some(pool) => pool.stop_event(event_name, except_voices),
            None => 0,
        }
    }

    /// Stops every voice except those playing one of `except_events`.
    pub fn stop_all_events(&mut self, except_events: &[&str]) -> usize {
        match self.pool.as_mut() {
            Some(pool) => pool.stop_all(except_events, &[]),
            None => 0,
        }
    }

    pub fn stop_voice(&mut self, id: VoiceId) -> bool {
        self.pool
            .as_mut()
            .is_some_and(|pool| pool.stop_voice(id))
    }

    pub fn find_active_voices(&self, event_name: &str) -> Vec<VoiceId> {
        self.pool
            .as_ref()
            .map(|pool| pool.find_active(event_name))
            .unwrap_or_default()
    }

    pub fn set_voice_volume(&mut self, voices: &[VoiceId], volume: f32) {
        for id in voices {
            if let Some(voice) = self.voice_mut(*id) {
                voice.set_volume(volume);
            }
        }
    }

    /// Sets the pitch offset, in cents of a semitone, of every listed voice.
    pub fn set_voice_pitch(&mut self, voices: &[VoiceId], cents: f32) {
        for id in voices {
            if let Some(voice) = self.voice_mut(*id) {
                voice.set_pitch(cents);
            }
        }
    }

    pub fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.pool.as_ref().and_then(|pool| pool.voice(id))
    }

    /// Direct access for pause/unpause/mute/unmute and the other per-voice controls.
    pub fn voice_mut(&mut self, id: VoiceId) -> Option<&mut Voice> {
        self.pool.as_mut().and_then(|pool| pool.voice_mut(id))
    }

    /// Expiry bookkeeping. Returns the voices that finished this tick.
    pub fn fixed_tick(&mut self) -> Vec<VoiceId> {
        self.pool
            .as_mut()
            .map(VoicePool::fixed_tick)
            .unwrap_or_default()
    }

    /// Attachment follow-up and distance curves against the world's listener.
    pub fn late_tick(&mut self) {
        let listener = self.listener.as_ref().map(PetalVoiceAudioListener::position);
        if let Some(pool) = self.pool.as_mut() {
            pool.late_tick(listener);
        }
    }

    /// Like [`late_tick`](Self::late_tick) with a listener owned by the host.
    pub fn late_tick_with(&mut self, listener: &dyn ListenerProvider) {
        if let Some(pool) = self.pool.as_mut() {
            pool.late_tick(listener.listener_position());
        }
    }

    /// Sets the listener pose (position and orientation), registering a listener if none was.
    pub fn set_listener_pose(&mut self, pose: Pose) {
        match self.listener.as_mut() {
            Some(listener) => listener.pose = pose,
            None => self.listener = Some(PetalVoiceAudioListener::new(pose)),
        }
    }

    /// Unregisters the listener. Distance curves stop updating until a new one is set.
    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    pub fn listener(&self) -> Option<&PetalVoiceAudioListener> {
        self.listener.as_ref()
    }

    /// Drains pending notifications.
    pub fn poll_events(&self) -> Vec<PetalVoiceEvent> {
        self.event_receiver.try_iter().collect()
    }

    /// Receiver side of the notification channel, for hosts that forward notifications
    /// elsewhere.
    pub fn event_receiver(&self) -> &Receiver<PetalVoiceEvent> {
        &self.event_receiver
    }

    fn drop_play(&self, event_name: String, reason: DropReason) -> PlayOutcome {
        log::warn!("Play of \"{}\" dropped: {}", event_name, reason);
        self.notify(PetalVoiceEvent::PlayDropped { event_name, reason });
        PlayOutcome::Dropped(reason)
    }

    fn notify(&self, event: PetalVoiceEvent) {
        events::deliver(&self.event_sender, event);
    }
}

/// The listener (the "ears") of the world.
///
/// Its position drives distance curves and is where 2D voices sit. Update it every frame with
/// [`PetalVoiceWorld::set_listener_pose`] as the camera or player moves.
#[derive(Debug, Clone, Default)]
pub struct PetalVoiceAudioListener {
    pub(crate) pose: Pose,
}

impl PetalVoiceAudioListener {
    pub fn new(pose: Pose) -> Self {
        Self { pose }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn position(&self) -> Vec3 {
        self.pose.position
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }
}

impl ListenerProvider for PetalVoiceAudioListener {
    fn listener_position(&self) -> Option<Vec3> {
        Some(self.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::config::AttenuationSettings;
    use crate::device::{AudioClip, SimulatedDevice, SimulatedDeviceHandle};
    use std::time::Duration;

    fn clip(name: &str, ms: u64) -> AudioClip {
        AudioClip::new(name, Duration::from_millis(ms))
    }

    fn world(desc: PetalVoiceWorldDesc) -> (PetalVoiceWorld, Vec<SimulatedDeviceHandle>) {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut world = PetalVoiceWorld::new();
        let mut handles = Vec::new();
        world
            .initialize(desc.random_seed(17), |_| {
                let (device, handle) = SimulatedDevice::new();
                handles.push(handle);
                Ok(Box::new(device) as Box<dyn PlaybackDevice>)
            })
            .unwrap();
        (world, handles)
    }

    fn one_shot(name: &str, priority: i32) -> SoundEvent {
        SoundEvent::new(name)
            .with_priority(priority)
            .with_action(Action::play_looped(clip(name, 500)))
    }

    #[test]
    fn test_play_before_initialize_is_dropped() {
        let mut world = PetalVoiceWorld::new();
        world.load_events(vec![one_shot("A", 1)]).unwrap();

        let outcome = world.play_event_2d("A");
        assert_eq!(outcome.drop_reason(), Some(DropReason::NotInitialized));
        assert_eq!(
            world.poll_events(),
            vec![PetalVoiceEvent::PlayDropped {
                event_name: "A".to_string(),
                reason: DropReason::NotInitialized,
            }]
        );
    }

    #[test]
    fn test_unknown_event_is_dropped() {
        let (mut world, handles) = world(PetalVoiceWorldDesc::default());
        world.load_events(vec![one_shot("A", 1)]).unwrap();

        let outcome = world.play_event_2d("Missing");
        assert_eq!(outcome.drop_reason(), Some(DropReason::EventNotFound));
        assert!(handles.iter().all(|h| !h.is_playing()));
    }

    #[test]
    fn test_equal_priority_scenario() {
        let (mut world, handles) =
            world(PetalVoiceWorldDesc::default().max_voices(1).equal_priority_preempts(false));
        world
            .load_events(vec![one_shot("A", 1), one_shot("B", 1), one_shot("C", 2)])
            .unwrap();

        assert!(world.play_event_2d("A").is_played());
        assert_eq!(
            world.play_event_2d("B").drop_reason(),
            Some(DropReason::PoolExhausted)
        );
        assert_eq!(handles[0].clip_name().as_deref(), Some("A"));

        assert!(world.play_event_2d("C").is_played());
        assert_eq!(handles[0].state().stops, 1);
        assert_eq!(handles[0].clip_name().as_deref(), Some("C"));
        assert!(world.find_active_voices("A").is_empty());
        assert_eq!(world.find_active_voices("C"), vec![VoiceId(0)]);

        let events = world.poll_events();
        assert!(events.contains(&PetalVoiceEvent::VoicePreempted {
            voice: VoiceId(0),
            event_name: Some("A".to_string()),
            evicted_priority: 1,
            priority: 2,
        }));
    }

    #[test]
    fn test_equal_priority_preempts_by_default() {
        let (mut world, handles) = world(PetalVoiceWorldDesc::default().max_voices(1));
        world
            .load_events(vec![one_shot("A", 1), one_shot("B", 1)])
            .unwrap();

        world.play_event_2d("A");
        assert!(world.play_event_2d("B").is_played());
        assert_eq!(handles[0].clip_name().as_deref(), Some("B"));
    }

    #[test]
    fn test_play_by_reference() {
        let (mut world, handles) = world(PetalVoiceWorldDesc::default());
        world.load_events(vec![one_shot("A", 1)]).unwrap();
        let id = world.find_event("A").unwrap();

        let outcome = world.play_event_at_position_with_volume(id, Vec3::ONE, 0.5);
        assert_eq!(outcome.voices(), &[VoiceId(0)]);
        assert_eq!(handles[0].state().volume, 0.5);
        assert_eq!(handles[0].state().position, Vec3::ONE);
    }

    #[test]
    fn test_natural_completion_returns_voice() {
        let (mut world, handles) = world(PetalVoiceWorldDesc::default());
        let blip = SoundEvent::new("Blip").with_action(Action::play(clip("blip", 100)));
        world.load_events(vec![blip]).unwrap();

        world.play_event_2d("Blip");
        assert!(world.fixed_tick().is_empty());

        handles[0].advance(Duration::from_millis(120));
        assert_eq!(world.fixed_tick(), vec![VoiceId(0)]);

        let voice = world.voice(VoiceId(0)).unwrap();
        assert!(!voice.is_active());
        assert!(!voice.is_requested());
        assert_eq!(voice.active_priority(), -1);
        assert_eq!(voice.current_event_name(), None);
        let notifications = world.poll_events();
        assert!(notifications.contains(&PetalVoiceEvent::VoiceFinished {
            voice: VoiceId(0),
            event_name: Some("Blip".to_string()),
        }));
        assert_eq!(
            notifications.iter().filter(|event| event.is_voice_end()).count(),
            1
        );
    }

    #[test]
    fn test_unpolled_notifications_stay_bounded() {
        let (mut world, handles) = world(PetalVoiceWorldDesc::default().max_voices(1));
        let step = SoundEvent::new("Step").with_action(Action::play(clip("step", 10)));
        world.load_events(vec![step]).unwrap();

        for _ in 0..5000 {
            world.play_event_2d("Step");
            handles[0].finish();
            world.fixed_tick();
        }
        assert_eq!(world.event_receiver().len(), MAX_PENDING_EVENTS);

        world.poll_events();
        world.play_event_2d("Step");
        assert_eq!(
            world.poll_events(),
            vec![PetalVoiceEvent::VoiceStarted {
                voice: VoiceId(0),
                event_name: Some("Step".to_string()),
                clip: "step".to_string(),
            }]
        );
    }

    #[test]
    fn test_extreme_pitch_plays_and_ends() {
        let (mut world, handles) = world(PetalVoiceWorldDesc::default());
        let chirp = SoundEvent::new("Chirp")
            .with_pitch_cents(300_000.0)
            .with_action(Action::play(clip("chirp", 100)));
        world.load_events(vec![chirp]).unwrap();

        assert!(world.play_event_2d("Chirp").is_played());
        assert!(handles[0].state().pitch.is_finite());

        handles[0].advance(Duration::from_millis(16));
        assert_eq!(world.fixed_tick(), vec![VoiceId(0)]);
    }

    #[test]
    fn test_global_stop_by_name() {
        let (mut world, handles) = world(PetalVoiceWorldDesc::default());
        world
            .load_events(vec![
                one_shot("Rain", 1),
                one_shot("Wind", 1),
                SoundEvent::new("Calm").with_action(Action::global_stop(["Rain"])),
            ])
            .unwrap();

        world.play_event_2d("Rain");
        world.play_event_2d("Wind");
        world.play_event_2d("Calm");

        assert!(!handles[0].is_playing());
        assert!(handles[1].is_playing());
        assert_eq!(world.find_active_voices("Wind"), vec![VoiceId(1)]);
    }

    #[test]
    fn test_stop_all_with_exceptions() {
        let (mut world, handles) = world(PetalVoiceWorldDesc::default());
        world
            .load_events(vec![one_shot("Music", 1), one_shot("Sfx", 1)])
            .unwrap();
        world.play_event_2d("Music");
        world.play_event_2d("Sfx");

        assert_eq!(world.stop_all_events(&["Music"]), 1);
        assert!(handles[0].is_playing());
        assert!(!handles[1].is_playing());
    }

    #[test]
    fn test_volume_by_distance_follows_listener() {
        let (mut world, handles) = world(PetalVoiceWorldDesc::default());
        let siren = SoundEvent::new("Siren")
            .with_attenuation(AttenuationSettings::spatial(1.0, 50.0))
            .with_action(Action::play_looped(clip("siren", 1000)))
            .with_action(Action::volume_by_distance(0.0, 10.0));
        world.load_events(vec![siren]).unwrap();

        world.play_event_at_position("Siren", Vec3::ZERO);
        world.late_tick();
        assert_eq!(handles[0].state().volume, 1.0);

        world.set_listener_pose(Pose::from_position(Vec3::new(5.0, 0.0, 0.0)));
        world.late_tick();
        assert!((handles[0].state().volume - 0.5).abs() < 1e-6);

        world.late_tick_with(&Vec3::new(20.0, 0.0, 0.0));
        assert_eq!(handles[0].state().volume, 0.0);
    }

    #[test]
    fn test_attached_voice_keeps_last_position_when_anchor_drops() {
        let (mut world, handles) = world(PetalVoiceWorldDesc::default());
        world.load_events(vec![one_shot("Car", 1)]).unwrap();

        let car = Anchor::at(Vec3::new(1.0, 0.0, 0.0));
        world.play_event_attached("Car", &car);
        car.set_position(Vec3::new(3.0, 0.0, 0.0));
        world.late_tick();
        drop(car);
        world.late_tick();

        assert_eq!(handles[0].state().position, Vec3::new(3.0, 0.0, 0.0));
        assert!(!world.voice(VoiceId(0)).unwrap().is_attached());
    }

    #[test]
    fn test_set_voice_volume_and_pitch() {
        let (mut world, handles) = world(PetalVoiceWorldDesc::default());
        world.load_events(vec![one_shot("Hum", 1)]).unwrap();
        let voices = world.play_event_2d("Hum").voices().to_vec();

        world.set_voice_volume(&voices, 0.25);
        world.set_voice_pitch(&voices, 2400.0);
        assert_eq!(handles[0].state().volume, 0.25);
        assert!((handles[0].state().pitch - 2.427114).abs() < 1e-4);
    }

    #[test]
    fn test_reinitialize_recreates_voices() {
        let (mut world, handles) = world(PetalVoiceWorldDesc::default());
        world.load_events(vec![one_shot("Hum", 1)]).unwrap();
        world.play_event_2d("Hum");

        let mut fresh = Vec::new();
        world
            .initialize(PetalVoiceWorldDesc::default().max_voices(5), |_| {
                let (device, handle) = SimulatedDevice::new();
                fresh.push(handle);
                Ok(Box::new(device) as Box<dyn PlaybackDevice>)
            })
            .unwrap();

        assert!(!handles[0].is_playing());
        assert_eq!(world.pool().unwrap().len(), 5);
        assert_eq!(world.pool().unwrap().busy_count(), 0);
        assert_eq!(fresh.len(), 5);
    }

    #[test]
    fn test_shutdown_stops_everything() {
        let (mut world, handles) = world(PetalVoiceWorldDesc::default());
        world.load_events(vec![one_shot("Hum", 1)]).unwrap();
        world.play_event_2d("Hum");
        world.poll_events();

        world.shutdown();
        assert!(!world.is_initialized());
        assert!(!handles[0].is_playing());
        assert_eq!(world.poll_events(), vec![PetalVoiceEvent::ShutDown]);
        assert_eq!(
            world.play_event_2d("Hum").drop_reason(),
            Some(DropReason::NotInitialized)
        );
    }

    #[test]
    fn test_preview_without_pool() {
        let mut world = PetalVoiceWorld::new();
        world.load_events(vec![one_shot("Hum", 1)]).unwrap();
        let (mut device, handle) = SimulatedDevice::new();

        let report = world.preview("Hum", &mut device, 1.0).unwrap();
        assert_eq!(report.applied, 1);
        assert!(handle.is_playing());
        assert!(world.preview("Nope", &mut device, 1.0).is_none());
    }
}
