use crate::{GraphicsContext, HarnessError};
use glam::UVec3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dimension {
    D2,
    D3,
}

impl Dimension {
    pub fn texture(self) -> wgpu::TextureDimension {
        match self {
            Self::D2 => wgpu::TextureDimension::D2,
            Self::D3 => wgpu::TextureDimension::D3,
        }
    }

    pub fn view(self) -> wgpu::TextureViewDimension {
        match self {
            Self::D2 => wgpu::TextureViewDimension::D2,
            Self::D3 => wgpu::TextureViewDimension::D3,
        }
    }
}

/// Describes a texture written by compute shaders and sampled for display.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureSpec {
    pub label: &'static str,
    pub size: UVec3,
    pub dimension: Dimension,
    pub format: wgpu::TextureFormat,
}

impl TextureSpec {
    pub fn plane(label: &'static str, width: u32, height: u32, format: wgpu::TextureFormat) -> Self {
        Self {
            label,
            size: UVec3::new(width, height, 1),
            dimension: Dimension::D2,
            format,
        }
    }

    pub fn volume(label: &'static str, size: UVec3, format: wgpu::TextureFormat) -> Self {
        Self {
            label,
            size,
            dimension: Dimension::D3,
            format,
        }
    }

    pub fn descriptor(&self) -> wgpu::TextureDescriptor<'static> {
        wgpu::TextureDescriptor {
            label: Some(self.label),
            size: wgpu::Extent3d {
                width: self.size.x,
                height: self.size.y,
                depth_or_array_layers: self.size.z,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: self.dimension.texture(),
            format: self.format,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        }
    }

    /// Largest extent the device accepts for this dimension.
    pub fn max_extent(&self, limits: &wgpu::Limits) -> UVec3 {
        match self.dimension {
            Dimension::D2 => UVec3::new(
                limits.max_texture_dimension_2d,
                limits.max_texture_dimension_2d,
                1,
            ),
            Dimension::D3 => UVec3::splat(limits.max_texture_dimension_3d),
        }
    }

    pub fn check_limits(&self, limits: &wgpu::Limits) -> Result<(), HarnessError> {
        let max = self.max_extent(limits);
        if self.size.cmpgt(max).any() || self.size.cmpeq(UVec3::ZERO).any() {
            return Err(HarnessError::TextureSize {
                label: self.label.to_owned(),
                size: self.size,
                max,
            });
        }
        Ok(())
    }

    pub fn byte_size(&self) -> u64 {
        let texel = self.format.block_copy_size(None).unwrap_or(0) as u64;
        self.size.as_u64vec3().element_product() * texel
    }
}

pub struct Texture {
    spec: TextureSpec,
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl Texture {
    pub fn new(ctx: &GraphicsContext, spec: TextureSpec) -> Result<Self, HarnessError> {
        if let Err(error) = spec.check_limits(&ctx.device.limits()) {
            log::error!("{error}");
            return Err(error);
        }
        ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let texture = ctx.device.create_texture(&spec.descriptor());
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(spec.label),
            dimension: Some(spec.dimension.view()),
            ..Default::default()
        });
        if let Some(error) = futures::executor::block_on(ctx.device.pop_error_scope()) {
            let error = HarnessError::TextureCreate {
                label: spec.label.to_owned(),
                log: error.to_string(),
            };
            log::error!("{error}");
            return Err(error);
        }
        log::debug!(
            "allocated {} {}x{}x{} {:?} ({} KiB)",
            spec.label,
            spec.size.x,
            spec.size.y,
            spec.size.z,
            spec.format,
            spec.byte_size() / 1024
        );
        Ok(Self {
            spec,
            _texture: texture,
            view,
        })
    }

    pub fn spec(&self) -> &TextureSpec {
        &self.spec
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}

/// Whether linear filtering may be used when sampling `format`.
pub fn is_filterable(format: wgpu::TextureFormat, features: wgpu::Features) -> bool {
    format
        .sample_type(None, Some(features))
        .is_some_and(|sample_type| {
            matches!(sample_type, wgpu::TextureSampleType::Float { filterable: true })
        })
}

pub fn filter_mode(filterable: bool) -> wgpu::FilterMode {
    if filterable {
        wgpu::FilterMode::Linear
    } else {
        wgpu::FilterMode::Nearest
    }
}

pub fn create_sampler(ctx: &GraphicsContext, label: &str, filterable: bool) -> wgpu::Sampler {
    let filter = filter_mode(filterable);
    ctx.device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter,
        min_filter: filter,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat;

    #[test]
    fn plane_descriptor_is_storage_and_sampled() {
        let spec = TextureSpec::plane("hoobler accum", 1024, 1024, TextureFormat::Rgba32Float);
        let descriptor = spec.descriptor();
        assert_eq!(descriptor.size.width, 1024);
        assert_eq!(descriptor.size.depth_or_array_layers, 1);
        assert_eq!(descriptor.dimension, wgpu::TextureDimension::D2);
        assert!(descriptor.usage.contains(wgpu::TextureUsages::STORAGE_BINDING));
        assert!(descriptor.usage.contains(wgpu::TextureUsages::TEXTURE_BINDING));
        assert_eq!(descriptor.mip_level_count, 1);
    }

    #[test]
    fn volume_descriptor_keeps_depth() {
        let spec = TextureSpec::volume("noise", UVec3::new(256, 256, 50), TextureFormat::Rgba8Unorm);
        let descriptor = spec.descriptor();
        assert_eq!(descriptor.size.depth_or_array_layers, 50);
        assert_eq!(descriptor.dimension, wgpu::TextureDimension::D3);
    }

    #[test]
    fn byte_size_counts_every_texel() {
        let rgba = TextureSpec::plane("a", 1024, 1024, TextureFormat::Rgba32Float);
        assert_eq!(rgba.byte_size(), 1024 * 1024 * 16);
        let red = TextureSpec::plane("b", 1024, 1024, TextureFormat::R32Float);
        assert_eq!(red.byte_size(), 1024 * 1024 * 4);
        let volume = TextureSpec::volume("c", UVec3::new(256, 256, 50), TextureFormat::Rgba8Unorm);
        assert_eq!(volume.byte_size(), 256 * 256 * 50 * 4);
    }

    #[test]
    fn float32_needs_feature_to_filter() {
        let none = wgpu::Features::empty();
        assert!(!is_filterable(TextureFormat::Rgba32Float, none));
        assert!(is_filterable(
            TextureFormat::Rgba32Float,
            wgpu::Features::FLOAT32_FILTERABLE
        ));
        assert!(is_filterable(TextureFormat::Rgba8Unorm, none));
    }

    #[test]
    fn oversized_volume_is_rejected_before_allocation() {
        let limits = wgpu::Limits::default();
        let deep = TextureSpec::volume("noise", UVec3::new(256, 256, 5000), TextureFormat::Rgba8Unorm);
        match deep.check_limits(&limits) {
            Err(HarnessError::TextureSize { label, size, max }) => {
                assert_eq!(label, "noise");
                assert_eq!(size.z, 5000);
                assert_eq!(max, UVec3::splat(limits.max_texture_dimension_3d));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        let fits = TextureSpec::volume("noise", UVec3::new(256, 256, 50), TextureFormat::Rgba8Unorm);
        assert!(fits.check_limits(&limits).is_ok());
    }

    #[test]
    fn plane_limit_uses_the_2d_maximum() {
        let limits = wgpu::Limits::default();
        let max = limits.max_texture_dimension_2d;
        let at_limit = TextureSpec::plane("lut", max, max, TextureFormat::R32Float);
        assert!(at_limit.check_limits(&limits).is_ok());
        let wide = TextureSpec::plane("lut", max + 1, 16, TextureFormat::R32Float);
        assert!(matches!(
            wide.check_limits(&limits),
            Err(HarnessError::TextureSize { .. })
        ));
    }

    #[test]
    fn empty_texture_is_rejected() {
        let spec = TextureSpec::plane("empty", 0, 16, TextureFormat::Rgba8Unorm);
        assert!(spec.check_limits(&wgpu::Limits::default()).is_err());
    }

    #[test]
    fn filter_follows_filterability() {
        assert_eq!(filter_mode(true), wgpu::FilterMode::Linear);
        assert_eq!(filter_mode(false), wgpu::FilterMode::Nearest);
    }
}
