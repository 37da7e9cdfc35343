mod attenuation;
mod world_desc;

pub use attenuation::AttenuationSettings;
pub use world_desc::PetalVoiceWorldDesc;
