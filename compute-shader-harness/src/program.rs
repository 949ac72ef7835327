use crate::{
    texture::{Dimension, Texture},
    uniform::{UniformBlock, UniformLayout},
    GraphicsContext, HarnessError, ShaderLoader, ShaderStage,
};
use glam::UVec3;
use std::path::Path;
use wgpu::util::DeviceExt;

/// Image resources a compute program reads or writes, in binding order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageBinding {
    /// `writeonly uniform image2D/3D` with the given texel format.
    Write {
        format: wgpu::TextureFormat,
        dimension: Dimension,
    },
    /// `uniform texture2D/3D` read with `texelFetch`, followed by a
    /// non-filtering `uniform sampler` in the next slot.
    Read { dimension: Dimension },
}

impl ImageBinding {
    pub const fn write_2d(format: wgpu::TextureFormat) -> Self {
        Self::Write {
            format,
            dimension: Dimension::D2,
        }
    }

    pub const fn write_3d(format: wgpu::TextureFormat) -> Self {
        Self::Write {
            format,
            dimension: Dimension::D3,
        }
    }

    pub const fn read_2d() -> Self {
        Self::Read {
            dimension: Dimension::D2,
        }
    }

    fn slots(self) -> u32 {
        match self {
            Self::Write { .. } => 1,
            Self::Read { .. } => 2,
        }
    }
}

/// Binding slot of every image, after the optional uniform block at 0.
pub fn binding_slots(has_uniforms: bool, images: &[ImageBinding]) -> Vec<u32> {
    let mut next = u32::from(has_uniforms);
    images
        .iter()
        .map(|image| {
            let slot = next;
            next += image.slots();
            slot
        })
        .collect()
}

/// Workgroups needed to cover `extent` with groups of `local_size`.
pub fn workgroup_count(extent: UVec3, local_size: UVec3) -> UVec3 {
    (extent + local_size - UVec3::ONE) / local_size
}

fn layout_entries(has_uniforms: bool, images: &[ImageBinding]) -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = Vec::new();
    if has_uniforms {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        });
    }
    for (image, slot) in images.iter().zip(binding_slots(has_uniforms, images)) {
        match *image {
            ImageBinding::Write { format, dimension } => {
                entries.push(wgpu::BindGroupLayoutEntry {
                    binding: slot,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format,
                        view_dimension: dimension.view(),
                    },
                    count: None,
                });
            }
            ImageBinding::Read { dimension } => {
                entries.push(wgpu::BindGroupLayoutEntry {
                    binding: slot,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: dimension.view(),
                        multisampled: false,
                    },
                    count: None,
                });
                entries.push(wgpu::BindGroupLayoutEntry {
                    binding: slot + 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                });
            }
        }
    }
    entries
}

/// A linked compute program together with its uniform block and bindings.
pub struct ComputeProgram {
    name: String,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,
    images: Vec<ImageBinding>,
    uniforms: Option<(UniformBlock, wgpu::Buffer)>,
    sampler: wgpu::Sampler,
}

impl ComputeProgram {
    pub fn new(
        ctx: &GraphicsContext,
        loader: &ShaderLoader,
        path: impl AsRef<Path>,
        uniforms: Option<UniformLayout>,
        images: &[ImageBinding],
    ) -> Result<Self, HarnessError> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let module = loader.load(&ctx.device, path, ShaderStage::Compute)?;

        let bind_group_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&name),
                entries: &layout_entries(uniforms.is_some(), images),
            });
        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&name),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = ctx
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(&name),
                layout: Some(&pipeline_layout),
                module: &module,
                entry_point: Some("main"),
                compilation_options: Default::default(),
                cache: None,
            });
        if let Some(error) = futures::executor::block_on(ctx.device.pop_error_scope()) {
            let error = HarnessError::Compile {
                stage: ShaderStage::Compute,
                path: loader.resolve(path),
                log: error.to_string(),
            };
            log::error!("{error}");
            return Err(error);
        }
        log::info!("compute shader program compilation complete ({name})");

        let uniforms = uniforms.map(|layout| {
            let block = UniformBlock::new(layout);
            let buffer = ctx
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&name),
                    contents: block.bytes(),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
            (block, buffer)
        });
        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("texel fetch sampler"),
            ..Default::default()
        });

        Ok(Self {
            name,
            pipeline,
            bind_group_layout,
            bind_group: None,
            images: images.to_vec(),
            uniforms,
            sampler,
        })
    }

    pub fn uniforms_mut(&mut self) -> Option<&mut UniformBlock> {
        self.uniforms.as_mut().map(|(block, _)| block)
    }

    /// Attach textures to the image bindings, in declaration order.
    pub fn bind(&mut self, ctx: &GraphicsContext, textures: &[&Texture]) -> Result<(), HarnessError> {
        if textures.len() != self.images.len() {
            return Err(HarnessError::Binding {
                program: self.name.clone(),
                expected: self.images.len(),
                actual: textures.len(),
            });
        }
        let slots = binding_slots(self.uniforms.is_some(), &self.images);
        let mut entries = Vec::with_capacity(slots.len() * 2 + 1);
        if let Some((_, buffer)) = &self.uniforms {
            entries.push(wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            });
        }
        for ((image, texture), slot) in self.images.iter().zip(textures).zip(slots) {
            entries.push(wgpu::BindGroupEntry {
                binding: slot,
                resource: wgpu::BindingResource::TextureView(texture.view()),
            });
            if let ImageBinding::Read { .. } = image {
                entries.push(wgpu::BindGroupEntry {
                    binding: slot + 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                });
            }
        }
        self.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&self.name),
            layout: &self.bind_group_layout,
            entries: &entries,
        }));
        Ok(())
    }

    /// Upload the uniform block and record a dispatch in its own compute pass.
    pub fn dispatch(
        &self,
        ctx: &GraphicsContext,
        encoder: &mut wgpu::CommandEncoder,
        workgroups: UVec3,
    ) {
        let Some(bind_group) = &self.bind_group else {
            log::warn!("{} dispatched before its textures were bound", self.name);
            return;
        };
        if let Some((block, buffer)) = &self.uniforms {
            ctx.queue.write_buffer(buffer, 0, block.bytes());
        }
        let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some(&self.name),
            timestamp_writes: None,
        });
        cpass.set_pipeline(&self.pipeline);
        cpass.set_bind_group(0, bind_group, &[]);
        cpass.dispatch_workgroups(workgroups.x, workgroups.y, workgroups.z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::uvec3;
    use wgpu::TextureFormat;

    #[test]
    fn workgroups_round_up() {
        assert_eq!(
            workgroup_count(uvec3(1024, 1024, 1), uvec3(16, 16, 1)),
            uvec3(64, 64, 1)
        );
        assert_eq!(
            workgroup_count(uvec3(1000, 17, 50), uvec3(16, 16, 4)),
            uvec3(63, 2, 13)
        );
        assert_eq!(workgroup_count(uvec3(1, 1, 1), uvec3(256, 1, 1)), UVec3::ONE);
    }

    #[test]
    fn empty_extent_dispatches_nothing() {
        assert_eq!(workgroup_count(UVec3::ZERO, uvec3(8, 8, 8)), UVec3::ZERO);
    }

    #[test]
    fn images_follow_the_uniform_block() {
        let images = [
            ImageBinding::write_2d(TextureFormat::Rgba32Float),
            ImageBinding::read_2d(),
            ImageBinding::write_2d(TextureFormat::R32Float),
        ];
        assert_eq!(binding_slots(true, &images), [1, 2, 4]);
        assert_eq!(binding_slots(false, &images), [0, 1, 3]);
    }

    #[test]
    fn layout_describes_every_slot() {
        let images = [
            ImageBinding::read_2d(),
            ImageBinding::write_3d(TextureFormat::Rgba8Unorm),
        ];
        let entries = layout_entries(true, &images);
        let bindings: Vec<u32> = entries.iter().map(|entry| entry.binding).collect();
        assert_eq!(bindings, [0, 1, 2, 3]);
        assert!(matches!(
            entries[0].ty,
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                ..
            }
        ));
        assert!(matches!(
            entries[2].ty,
            wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering)
        ));
        assert!(matches!(
            entries[3].ty,
            wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::WriteOnly,
                format: TextureFormat::Rgba8Unorm,
                view_dimension: wgpu::TextureViewDimension::D3,
            }
        ));
    }
}
