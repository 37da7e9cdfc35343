use anyhow::{Context, Result, bail};
use petalvoice::{
    Action, Anchor, AttenuationSettings, AudioClip, PetalVoiceWorld, PetalVoiceWorldDesc,
    PlaybackDevice, Pose, SimulatedDevice, SimulatedDeviceHandle, SoundEvent, Vec3,
};
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(16);

const SCENARIOS: &[(&str, fn() -> Result<()>)] = &[
    ("preemption", preemption),
    ("random-set", random_set),
    ("attached", attached),
    ("global-stop", global_stop),
];

pub fn run(requested: &[&str]) -> Result<()> {
    for name in requested {
        if !SCENARIOS.iter().any(|(known, _)| known == name) {
            let known: Vec<&str> = SCENARIOS.iter().map(|(known, _)| *known).collect();
            bail!("unknown scenario \"{}\" (expected one of {:?})", name, known);
        }
    }

    for (name, scenario) in SCENARIOS {
        if !requested.is_empty() && !requested.contains(name) {
            continue;
        }
        log::info!("=== Running {} scenario ===", name);
        scenario().with_context(|| format!("scenario {name} failed"))?;
    }
    Ok(())
}

/// A world backed by simulated devices, plus the handles that drive them.
struct Stage {
    world: PetalVoiceWorld,
    devices: Vec<SimulatedDeviceHandle>,
}

impl Stage {
    fn new(desc: PetalVoiceWorldDesc, events: Vec<SoundEvent>) -> Result<Self> {
        let mut world = PetalVoiceWorld::new();
        let mut devices = Vec::new();
        world.initialize(desc, |spawn| {
            log::debug!("Spawning device for {} (hidden: {})", spawn.label, spawn.hidden);
            let (device, handle) = SimulatedDevice::new();
            devices.push(handle);
            Ok(Box::new(device) as Box<dyn PlaybackDevice>)
        })?;
        world.load_events(events)?;
        Ok(Self { world, devices })
    }

    /// Runs `frames` frames: devices advance, then both ticks.
    fn run_frames(&mut self, frames: u32) {
        for _ in 0..frames {
            for device in &self.devices {
                device.advance(FRAME);
            }
            self.world.fixed_tick();
            self.world.late_tick();
        }
        self.report();
    }

    fn report(&self) {
        for event in self.world.poll_events() {
            log::info!("  {:?}", event);
        }
    }

    fn describe_voices(&self) {
        let Some(pool) = self.world.pool() else {
            return;
        };
        for (voice, device) in pool.voices().iter().zip(&self.devices) {
            let state = device.state();
            log::info!(
                "  {}: event={:?} priority={} clip={:?} playing={} volume={:.2} position={:?}",
                voice.label(),
                voice.current_event_name(),
                voice.active_priority(),
                state.clip.as_ref().map(AudioClip::name),
                state.playing && !state.paused,
                state.volume,
                state.position
            );
        }
    }
}

fn clip(name: &str, millis: u64) -> AudioClip {
    AudioClip::new(name, Duration::from_millis(millis))
}

fn preemption() -> Result<()> {
    let events = vec![
        SoundEvent::new("Ambience").with_action(Action::play_looped(clip("wind-loop", 4000))),
        SoundEvent::new("Gunshot")
            .with_priority(3)
            .with_action(Action::play(clip("gunshot", 250))),
        SoundEvent::new("Dialogue")
            .with_priority(5)
            .with_action(Action::play(clip("line-042", 1200))),
    ];
    let mut stage = Stage::new(
        PetalVoiceWorldDesc::default()
            .max_voices(2)
            .equal_priority_preempts(false),
        events,
    )?;

    stage.world.play_event_2d("Ambience");
    stage.world.play_event_2d("Ambience");
    log::info!("Pool full of ambience; a third ambience request must be refused");
    let refused = stage.world.play_event_2d("Ambience");
    log::info!("  -> {:?}", refused);

    log::info!("Gunshot outranks ambience and takes the first voice");
    stage.world.play_event_2d("Gunshot");
    stage.report();
    stage.describe_voices();

    log::info!("Dialogue outranks both and takes the remaining ambience voice");
    stage.world.play_event_2d("Dialogue");
    stage.run_frames(20);
    stage.describe_voices();
    Ok(())
}

fn random_set() -> Result<()> {
    let steps: Vec<AudioClip> = (1..=3).map(|i| clip(&format!("step-{i}"), 180)).collect();
    let events = vec![
        SoundEvent::new("Footstep")
            .with_volume(0.8)
            .with_pitch_cents(-150.0)
            .with_action(Action::play_random(steps)),
    ];
    let mut stage = Stage::new(
        PetalVoiceWorldDesc::default().max_voices(1).random_seed(2024),
        events,
    )?;

    let mut picks = Vec::new();
    for _ in 0..8 {
        stage.world.play_event_2d("Footstep");
        picks.push(stage.devices[0].clip_name().unwrap_or_default());
        stage.run_frames(12);
    }
    log::info!("Picks: {}", picks.join(", "));
    if picks.windows(2).any(|pair| pair[0] == pair[1]) {
        bail!("random set repeated a pick: {:?}", picks);
    }
    Ok(())
}

fn attached() -> Result<()> {
    let events = vec![
        SoundEvent::new("Engine")
            .with_attenuation(AttenuationSettings::spatial(1.0, 60.0))
            .with_action(Action::play_looped(clip("engine-loop", 2000)))
            .with_action(Action::volume_by_distance(2.0, 40.0))
            .with_action(Action::spatial_blend_by_distance(0.0, 10.0)),
    ];
    let mut stage = Stage::new(PetalVoiceWorldDesc::default(), events)?;
    stage
        .world
        .set_listener_pose(Pose::from_position(Vec3::ZERO));

    let car = Anchor::at(Vec3::new(0.0, 0.0, -2.0));
    stage.world.play_event_attached("Engine", &car);

    for step in 1..=5 {
        car.set_position(Vec3::new(0.0, 0.0, -2.0 - 8.0 * step as f32));
        stage.run_frames(1);
        stage.describe_voices();
    }

    log::info!("The car despawns; its engine stays where it was last heard");
    drop(car);
    stage.run_frames(1);
    stage.describe_voices();
    Ok(())
}

fn global_stop() -> Result<()> {
    let events = vec![
        SoundEvent::new("Music").with_action(Action::play_looped(clip("theme", 8000))),
        SoundEvent::new("Rain").with_action(Action::play_looped(clip("rain", 3000))),
        SoundEvent::new("Thunder")
            .with_priority(2)
            .with_action(Action::play(clip("thunder", 900)))
            .with_action(Action::low_pass(1200.0, 1.5)),
        SoundEvent::new("Cutscene")
            .with_priority(10)
            .with_action(Action::global_stop_all_except(["Music"]))
            .with_action(Action::play(clip("cutscene-sting", 1500))),
    ];
    let mut stage = Stage::new(PetalVoiceWorldDesc::default().max_voices(4), events)?;

    stage.world.play_event_2d("Music");
    stage.world.play_event_2d("Rain");
    stage.world.play_event_2d_with_volume("Thunder", 0.7);
    stage.run_frames(1);
    stage.describe_voices();

    log::info!("Cutscene silences everything but the music");
    stage.world.play_event_2d("Cutscene");
    stage.run_frames(1);
    stage.describe_voices();

    let remaining = stage.world.stop_event("Music", &[]);
    log::info!("Stopped {} music voice(s)", remaining);
    stage.run_frames(1);
    Ok(())
}
