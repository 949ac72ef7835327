use glam::{uvec2, uvec3, UVec2, UVec3};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use structopt::StructOpt;

/// Side length of the noise volume in x and y.
pub const VOLUME_SIDE: u32 = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scene {
    Lut,
    Raymarch,
    Noise,
}

impl FromStr for Scene {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lut" | "atmosphere" => Ok(Self::Lut),
            "raymarch" => Ok(Self::Raymarch),
            "noise" => Ok(Self::Noise),
            other => Err(format!(
                "unknown scene {other:?} (expected lut, raymarch or noise)"
            )),
        }
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lut => "lut",
            Self::Raymarch => "raymarch",
            Self::Noise => "noise",
        })
    }
}

#[derive(StructOpt, Debug)]
#[structopt(name = "compute-shader-test")]
pub struct Options {
    /// Scene to run: lut, raymarch or noise
    #[structopt(short, long, default_value = "lut")]
    pub scene: Scene,

    /// Directory holding the GLSL compute shaders [default: res/ next to this crate's manifest]
    #[structopt(long = "res", parse(from_os_str))]
    pub res: Option<PathBuf>,

    /// Window and 2D texture width
    #[structopt(long, default_value = "1024")]
    pub width: u32,

    /// Window and 2D texture height
    #[structopt(long, default_value = "1024")]
    pub height: u32,

    /// Depth of the noise volume
    #[structopt(long, default_value = "50")]
    pub depth: u32,

    /// Present without waiting for vertical sync
    #[structopt(long)]
    pub no_vsync: bool,
}

impl Options {
    pub fn resource_dir(&self) -> PathBuf {
        self.res
            .clone()
            .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("res"))
    }

    pub fn lut_size(&self) -> UVec2 {
        uvec2(self.width, self.height).max(UVec2::ONE)
    }

    pub fn volume_size(&self) -> UVec3 {
        uvec3(VOLUME_SIDE, VOLUME_SIDE, self.depth).max(UVec3::ONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Options {
        Options::from_iter_safe(std::iter::once("compute-shader-test").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn defaults_match_the_lut_harness() {
        let options = parse(&[]);
        assert_eq!(options.scene, Scene::Lut);
        assert_eq!(options.lut_size(), uvec2(1024, 1024));
        assert_eq!(options.volume_size(), uvec3(256, 256, 50));
        assert!(!options.no_vsync);
        assert!(options.resource_dir().ends_with("res"));
    }

    #[test]
    fn scene_and_sizes_are_configurable() {
        let options = parse(&[
            "--scene", "noise", "--depth", "64", "--width", "640", "--height", "480", "--res",
            "/tmp/shaders", "--no-vsync",
        ]);
        assert_eq!(options.scene, Scene::Noise);
        assert_eq!(options.volume_size(), uvec3(256, 256, 64));
        assert_eq!(options.lut_size(), uvec2(640, 480));
        assert_eq!(options.resource_dir(), PathBuf::from("/tmp/shaders"));
        assert!(options.no_vsync);
    }

    #[test]
    fn scene_names_round_trip_through_display() {
        for scene in [Scene::Lut, Scene::Raymarch, Scene::Noise] {
            assert_eq!(scene.to_string().parse::<Scene>(), Ok(scene));
        }
        assert_eq!("Atmosphere".parse::<Scene>(), Ok(Scene::Lut));
    }

    #[test]
    fn unknown_scene_is_rejected() {
        assert!("voxels".parse::<Scene>().is_err());
        let args = ["compute-shader-test", "--scene", "voxels"];
        assert!(Options::from_iter_safe(args).is_err());
    }

    #[test]
    fn oversized_volume_is_reported_instead_of_allocated() {
        use compute_shader_harness::{wgpu, HarnessError, TextureSpec};

        let options = parse(&["--scene", "noise", "--depth", "5000"]);
        let spec = TextureSpec::volume(
            "noise volume",
            options.volume_size(),
            wgpu::TextureFormat::Rgba8Unorm,
        );
        assert!(matches!(
            spec.check_limits(&wgpu::Limits::default()),
            Err(HarnessError::TextureSize { .. })
        ));
    }

    #[test]
    fn zero_sizes_are_clamped() {
        let options = parse(&["--width", "0", "--depth", "0"]);
        assert_eq!(options.lut_size(), uvec2(1, 1024));
        assert_eq!(options.volume_size(), uvec3(256, 256, 1));
    }
}
