use super::{Action, ActionContext};
use crate::device::PlaybackDevice;
use crate::voice::VoiceId;
use rand::RngCore;

/// Ordered actions of one event.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ActionSequence {
    actions: Vec<Action>,
}

/// Outcome of running a sequence once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceReport {
    /// Actions that ran.
    pub applied: usize,
    /// Actions skipped because their slot got no voice.
    pub skipped: usize,
    /// Actions that failed on their own payload.
    pub failed: usize,
}

impl ActionSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Number of voices one play of this sequence reserves.
    pub fn voice_count(&self) -> usize {
        self.actions.iter().filter(|action| action.needs_voice()).count()
    }

    /// Runs every action in order against the reserved voices.
    ///
    /// `voices` has one entry per slot, [`voice_count`](Self::voice_count) long. Slot-consuming
    /// actions advance to the next entry before running; the others see the entry of the last
    /// slot taken. A `None` entry makes the actions bound to it no-ops, and a failing action
    /// is logged and skipped without stopping the rest.
    pub(crate) fn apply(
        &mut self,
        voices: &[Option<VoiceId>],
        ctx: &mut ActionContext<'_>,
    ) -> SequenceReport {
        let mut report = SequenceReport::default();
        let mut slot: Option<usize> = None;

        for action in &mut self.actions {
            if action.needs_voice() {
                slot = Some(slot.map_or(0, |index| index + 1));
            }
            let target = slot.and_then(|index| voices.get(index).copied().flatten());

            if action.targets_voice() && target.is_none() {
                log::debug!("{} skipped: slot {:?} has no voice", action.name(), slot);
                report.skipped += 1;
                continue;
            }

            match action.apply(ctx, target) {
                Ok(()) => report.applied += 1,
                Err(e) => {
                    log::warn!("{} failed: {}", action.name(), e);
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Runs every action against one device, bypassing the pool.
    pub(crate) fn apply_to_device(
        &mut self,
        device: &mut dyn PlaybackDevice,
        rng: &mut dyn RngCore,
    ) -> SequenceReport {
        let mut report = SequenceReport::default();
        for action in &mut self.actions {
            match action.apply_to_device(device, rng) {
                Ok(()) => report.applied += 1,
                Err(e) => {
                    log::warn!("{} failed while previewing: {}", action.name(), e);
                    report.failed += 1;
                }
            }
        }
        report
    }
}

impl From<Vec<Action>> for ActionSequence {
    fn from(actions: Vec<Action>) -> Self {
        Self { actions }
    }
}

impl FromIterator<Action> for ActionSequence {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self {
            actions: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PetalVoiceWorldDesc;
    use crate::device::{AudioClip, SimulatedDevice, SimulatedDeviceHandle, VoiceSpawn};
    use crate::error::Result;
    use crate::events::PetalVoiceEvent;
    use crate::pool::VoicePool;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::time::Duration;

    fn clip(name: &str) -> AudioClip {
        AudioClip::new(name, Duration::from_millis(100))
    }

    fn make_pool(size: usize) -> (VoicePool, Vec<SimulatedDeviceHandle>) {
        let mut handles = Vec::new();
        let mut factory = |_: &VoiceSpawn| -> Result<Box<dyn PlaybackDevice>> {
            let (device, handle) = SimulatedDevice::new();
            handles.push(handle);
            Ok(Box::new(device))
        };
        let pool = VoicePool::new(
            &PetalVoiceWorldDesc::default().max_voices(size),
            &mut factory,
        )
        .unwrap();
        (pool, handles)
    }

    fn run(
        sequence: &mut ActionSequence,
        pool: &mut VoicePool,
        voices: &[Option<VoiceId>],
    ) -> SequenceReport {
        let mut rng = StdRng::seed_from_u64(1);
        let reserved: Vec<VoiceId> = voices.iter().flatten().copied().collect();
        let mut ctx = ActionContext {
            pool,
            rng: &mut rng,
            reserved: &reserved,
        };
        sequence.apply(voices, &mut ctx)
    }

    #[test]
    fn test_voice_count_matches_slot_actions() {
        let sequence = ActionSequence::new()
            .with(Action::play(clip("a")))
            .with(Action::global_stop_all())
            .with(Action::high_pass(1000.0, 1.0));
        assert_eq!(sequence.voice_count(), 2);
    }

    #[test]
    fn test_filter_gets_second_slot() {
        let (mut pool, handles) = make_pool(2);
        let mut sequence = ActionSequence::new()
            .with(Action::play(clip("a")))
            .with(Action::global_stop_all())
            .with(Action::high_pass(1000.0, 2.0));
        let voices = pool.request_voices(sequence.voice_count(), 1);

        let report = run(&mut sequence, &mut pool, &voices);
        assert_eq!(report.applied, 3);
        assert!(handles[0].is_playing());
        assert!(!handles[0].state().high_pass.enabled);
        assert!(handles[1].state().high_pass.enabled);
        assert_eq!(handles[1].state().high_pass.cutoff_frequency, 1000.0);
    }

    #[test]
    fn test_missing_slot_only_skips_its_actions() {
        let (mut pool, handles) = make_pool(2);
        let mut sequence = ActionSequence::new()
            .with(Action::play(clip("a")))
            .with(Action::volume_by_distance(1.0, 10.0))
            .with(Action::play(clip("b")));
        let voices = vec![None, Some(VoiceId(1))];
        pool.request_voice(1);
        pool.request_voice(1);

        let report = run(&mut sequence, &mut pool, &voices);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.applied, 1);
        assert!(!handles[0].is_playing());
        assert_eq!(handles[1].clip_name().as_deref(), Some("b"));
    }

    #[test]
    fn test_distance_action_uses_latest_slot() {
        let (mut pool, _) = make_pool(2);
        let mut sequence = ActionSequence::new()
            .with(Action::play(clip("a")))
            .with(Action::play(clip("b")))
            .with(Action::spatial_blend_by_distance(2.0, 8.0));
        let voices = pool.request_voices(2, 1);

        run(&mut sequence, &mut pool, &voices);
        assert!(pool.voice(VoiceId(0)).unwrap().spatial_curve().is_none());
        assert!(pool.voice(VoiceId(1)).unwrap().spatial_curve().is_some());
    }

    #[test]
    fn test_malformed_action_does_not_abort() {
        let (mut pool, handles) = make_pool(3);
        let mut sequence = ActionSequence::new()
            .with(Action::play_random(Vec::new()))
            .with(Action::low_pass(50000.0, 1.0))
            .with(Action::play(clip("c")));
        let voices = pool.request_voices(3, 1);

        let report = run(&mut sequence, &mut pool, &voices);
        assert_eq!(report.failed, 2);
        assert_eq!(report.applied, 1);
        assert!(!handles[0].is_playing());
        assert!(handles[2].is_playing());
    }

    #[test]
    fn test_global_stop_spares_own_voices() {
        let (mut pool, handles) = make_pool(2);
        let other = pool.request_voice(1).unwrap();
        pool.play_clip(other, &clip("music"), true);

        let mut sequence = ActionSequence::new()
            .with(Action::play(clip("a")))
            .with(Action::global_stop_all());
        let voices = pool.request_voices(1, 1);
        run(&mut sequence, &mut pool, &voices);

        assert!(!handles[0].is_playing());
        assert!(handles[1].is_playing());
    }

    #[test]
    fn test_preview_drives_single_device() {
        let (mut device, handle) = SimulatedDevice::new();
        let mut rng = StdRng::seed_from_u64(9);
        let mut sequence = ActionSequence::new()
            .with(Action::play_looped(clip("loop")))
            .with(Action::low_pass(700.0, 1.5))
            .with(Action::volume_by_distance(1.0, 5.0));

        let report = sequence.apply_to_device(&mut device, &mut rng);
        assert_eq!(report.applied, 3);
        assert!(handle.is_playing());
        assert!(handle.state().looping);
        assert!(handle.state().low_pass.enabled);
    }

    #[test]
    fn test_stop_releases_its_own_slot() {
        for stop in [Action::Stop, Action::StopAllInEvent] {
            let (pool, handles) = make_pool(2);
            let (tx, rx) = crossbeam_channel::unbounded();
            let mut pool = pool.with_notifier(tx);
            let mut sequence = ActionSequence::new()
                .with(Action::play(clip("a")))
                .with(stop);
            let voices = pool.request_voices(sequence.voice_count(), 1);
            assert_eq!(voices, vec![Some(VoiceId(0)), Some(VoiceId(1))]);

            let report = run(&mut sequence, &mut pool, &voices);
            assert_eq!(report.applied, 2);
            assert!(handles[0].is_playing());
            assert!(pool.voice(VoiceId(1)).unwrap().is_free());
            assert_eq!(handles[1].state().stops, 1);

            let notifications: Vec<_> = rx.try_iter().collect();
            assert_eq!(notifications.len(), 1);
            assert!(matches!(
                notifications[0],
                PetalVoiceEvent::VoiceStarted {
                    voice: VoiceId(0),
                    ..
                }
            ));
        }
    }
}
