mod atmosphere_lut;
mod camera;
mod noise_volume;
mod raymarch;

pub use atmosphere_lut::AtmosphereLut;
pub use noise_volume::NoiseVolume;
pub use raymarch::Raymarch;
