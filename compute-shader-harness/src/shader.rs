use crate::HarnessError;
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Compute,
}

impl ShaderStage {
    /// Infer the stage from the conventional GLSL file extension.
    pub fn from_path(path: &Path) -> Result<Self, HarnessError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("vert") => Ok(Self::Vertex),
            Some("frag") => Ok(Self::Fragment),
            Some("comp") => Ok(Self::Compute),
            _ => Err(HarnessError::UnknownStage(path.to_owned())),
        }
    }

    fn naga(self) -> wgpu::naga::ShaderStage {
        match self {
            Self::Vertex => wgpu::naga::ShaderStage::Vertex,
            Self::Fragment => wgpu::naga::ShaderStage::Fragment,
            Self::Compute => wgpu::naga::ShaderStage::Compute,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "VERTEX",
            Self::Fragment => "FRAGMENT",
            Self::Compute => "COMPUTE",
        })
    }
}

/// Read a whole shader file into memory.
pub fn read_source(path: &Path) -> Result<String, HarnessError> {
    std::fs::read_to_string(path).map_err(|source| {
        log::error!("shader file not successfully read ({})", path.display());
        HarnessError::ShaderRead {
            path: path.to_owned(),
            source,
        }
    })
}

/// Compile GLSL source for a single stage. Validation errors are returned
/// with the compiler log rather than reaching the device's error handler.
pub fn compile(
    device: &wgpu::Device,
    path: &Path,
    source: &str,
    stage: ShaderStage,
) -> Result<wgpu::ShaderModule, HarnessError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&path.display().to_string()),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(source),
            stage: stage.naga(),
            defines: Default::default(),
        },
    });
    if let Some(error) = futures::executor::block_on(device.pop_error_scope()) {
        let error = HarnessError::Compile {
            stage,
            path: path.to_owned(),
            log: error.to_string(),
        };
        log::error!("{error}");
        return Err(error);
    }
    Ok(module)
}

/// Fail unless `path` names a shader of the `expected` stage.
pub fn expect_stage(path: &Path, expected: ShaderStage) -> Result<(), HarnessError> {
    let actual = ShaderStage::from_path(path)?;
    if actual != expected {
        return Err(HarnessError::StageMismatch {
            path: path.to_owned(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Resolves shader paths against a resource directory and compiles them.
#[derive(Clone, Debug)]
pub struct ShaderLoader {
    root: PathBuf,
}

impl ShaderLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_owned()
        } else {
            self.root.join(path)
        }
    }

    /// Read and compile one stage, checking the file is of that stage.
    pub fn load(
        &self,
        device: &wgpu::Device,
        path: impl AsRef<Path>,
        stage: ShaderStage,
    ) -> Result<wgpu::ShaderModule, HarnessError> {
        let path = self.resolve(path);
        expect_stage(&path, stage)?;
        let source = read_source(&path)?;
        compile(device, &path, &source, stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("compute-shader-harness-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn stage_follows_extension() {
        assert_eq!(
            ShaderStage::from_path(Path::new("res/fullscreen.vert")).unwrap(),
            ShaderStage::Vertex
        );
        assert_eq!(
            ShaderStage::from_path(Path::new("a/b.frag")).unwrap(),
            ShaderStage::Fragment
        );
        assert_eq!(
            ShaderStage::from_path(Path::new("kovalovs_lut.comp")).unwrap(),
            ShaderStage::Compute
        );
    }

    #[test]
    fn geometry_and_unknown_extensions_are_rejected() {
        for name in ["lines.geom", "shader.glsl", "noext"] {
            match ShaderStage::from_path(Path::new(name)) {
                Err(HarnessError::UnknownStage(path)) => assert_eq!(path, Path::new(name)),
                other => panic!("unexpected result for {name}: {other:?}"),
            }
        }
    }

    #[test]
    fn stage_names_are_upper_case() {
        assert_eq!(ShaderStage::Vertex.to_string(), "VERTEX");
        assert_eq!(ShaderStage::Fragment.to_string(), "FRAGMENT");
        assert_eq!(ShaderStage::Compute.to_string(), "COMPUTE");
    }

    #[test]
    fn stage_must_match_the_request() {
        assert!(expect_stage(Path::new("res/plane.frag"), ShaderStage::Fragment).is_ok());
        match expect_stage(Path::new("res/fullscreen.vert"), ShaderStage::Compute) {
            Err(HarnessError::StageMismatch {
                path,
                expected,
                actual,
            }) => {
                assert_eq!(path, Path::new("res/fullscreen.vert"));
                assert_eq!(expected, ShaderStage::Compute);
                assert_eq!(actual, ShaderStage::Vertex);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn compile_error_names_stage_and_path() {
        let error = HarnessError::Compile {
            stage: ShaderStage::Fragment,
            path: PathBuf::from("res/plane.frag"),
            log: "unknown identifier".to_owned(),
        };
        assert_eq!(
            error.to_string(),
            "FRAGMENT shader compilation error (res/plane.frag):\nunknown identifier"
        );
    }

    #[test]
    fn reads_whole_file() {
        let source = "#version 450\nvoid main() {}\n";
        let path = scratch_file("reads_whole_file.comp", source);
        assert_eq!(read_source(&path).unwrap(), source);
    }

    #[test]
    fn missing_file_reports_path() {
        let path = Path::new("definitely/not/here.comp");
        match read_source(path) {
            Err(HarnessError::ShaderRead { path: reported, source }) => {
                assert_eq!(reported, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn loader_resolves_relative_paths_against_root() {
        let loader = ShaderLoader::new("res");
        assert_eq!(loader.resolve("noise.comp"), Path::new("res").join("noise.comp"));
        let absolute = std::env::temp_dir().join("abs.comp");
        assert_eq!(loader.resolve(&absolute), absolute);
        assert_eq!(loader.root(), Path::new("res"));
    }
}
