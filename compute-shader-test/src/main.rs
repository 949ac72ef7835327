use compute_shader_harness::{HarnessError, HarnessOptions};
use controller::{AtmosphereLut, NoiseVolume, Raymarch};
use options::{Options, Scene};
use structopt::StructOpt;

mod controller;
mod options;

fn main() {
    compute_shader_harness::setup_logging();
    let options = Options::from_args();
    if let Err(error) = run(&options) {
        log::error!("{error}");
        std::process::exit(1);
    }
}

fn run(options: &Options) -> Result<(), HarnessError> {
    let harness = HarnessOptions {
        title: format!("{} ({})", compute_shader_harness::TITLE, options.scene),
        width: options.width,
        height: options.height,
        vsync: !options.no_vsync,
        resource_dir: options.resource_dir(),
    };
    log::info!(
        "running {} scene with shaders from {}",
        options.scene,
        harness.resource_dir.display()
    );
    match options.scene {
        Scene::Lut => compute_shader_harness::run(harness, AtmosphereLut::new(options.lut_size())),
        Scene::Raymarch => {
            compute_shader_harness::run(harness, Raymarch::new(options.lut_size()))
        }
        Scene::Noise => compute_shader_harness::run(harness, NoiseVolume::new(options.volume_size())),
    }
}

#[cfg(test)]
mod tests {
    use compute_shader_harness::{FULLSCREEN_VERT, PLANE_FRAG, VOLUME_FRAG};
    use std::path::PathBuf;

    fn resource(name: &str) -> String {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("res").join(name);
        std::fs::read_to_string(&path).unwrap_or_else(|err| panic!("{}: {err}", path.display()))
    }

    #[test]
    fn fullscreen_vertex_passes_tex_coords_through() {
        let source = resource(FULLSCREEN_VERT);
        assert!(source.contains("v_texCoords = a_texCoords;"));
        assert!(!source.contains("1.0 - a_texCoords"));
    }

    #[test]
    fn display_fragments_share_the_display_block() {
        for name in [PLANE_FRAG, VOLUME_FRAG] {
            let source = resource(name);
            assert!(source.starts_with("#version 450"));
            let exposure = source.find("float u_exposure;").unwrap();
            let slice = source.find("float u_slice;").unwrap();
            assert!(exposure < slice);
        }
    }

    #[test]
    fn every_scene_kernel_is_shipped() {
        for name in [
            "hoobler_accum_lut.comp",
            "hoobler_sum_lut.comp",
            "kovalovs_lut.comp",
            "raymarch.comp",
            "noise.comp",
        ] {
            assert!(resource(name).contains("void main()"));
        }
    }
}
