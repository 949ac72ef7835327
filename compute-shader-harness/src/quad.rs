use bytemuck::{Pod, Zeroable};
use glam::{vec2, Vec2};
use wgpu::util::DeviceExt;

/// POS2_TEX2 vertex.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct QuadVertex {
    pub position: Vec2,
    pub tex_coords: Vec2,
}

const fn vertex(x: f32, y: f32, u: f32, v: f32) -> QuadVertex {
    QuadVertex {
        position: vec2(x, y),
        tex_coords: vec2(u, v),
    }
}

/// Two triangles covering normalised device coordinates.
pub const FULLSCREEN_QUAD: [QuadVertex; 6] = [
    vertex(-1.0, 1.0, 0.0, 1.0),
    vertex(-1.0, -1.0, 0.0, 0.0),
    vertex(1.0, -1.0, 1.0, 0.0),
    vertex(-1.0, 1.0, 0.0, 1.0),
    vertex(1.0, -1.0, 1.0, 0.0),
    vertex(1.0, 1.0, 1.0, 1.0),
];

const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

impl QuadVertex {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

pub struct FullscreenQuad {
    buffer: wgpu::Buffer,
}

impl FullscreenQuad {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("fullscreen quad"),
            contents: bytemuck::cast_slice(&FULLSCREEN_QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self { buffer }
    }

    pub fn draw(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_vertex_buffer(0, self.buffer.slice(..));
        rpass.draw(0..FULLSCREEN_QUAD.len() as u32, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_four_floats() {
        assert_eq!(std::mem::size_of::<QuadVertex>(), 16);
        let layout = QuadVertex::layout();
        assert_eq!(layout.array_stride, 16);
        assert_eq!(layout.attributes[0].offset, 0);
        assert_eq!(layout.attributes[1].offset, 8);
        assert_eq!(layout.attributes[1].shader_location, 1);
    }

    #[test]
    fn quad_covers_clip_space() {
        for corner in [vec2(-1.0, -1.0), vec2(-1.0, 1.0), vec2(1.0, -1.0), vec2(1.0, 1.0)] {
            assert!(FULLSCREEN_QUAD.iter().any(|v| v.position == corner));
        }
    }

    #[test]
    fn tex_coords_map_ndc_to_unit_square() {
        for v in FULLSCREEN_QUAD {
            assert_eq!(v.tex_coords, (v.position + Vec2::ONE) * 0.5);
        }
    }

    #[test]
    fn texel_row_zero_is_at_the_bottom() {
        // Sampling v = 0 reads row 0, so the bottom edge must carry v = 0.
        for v in FULLSCREEN_QUAD {
            if v.position.y == -1.0 {
                assert_eq!(v.tex_coords.y, 0.0);
            } else {
                assert_eq!(v.tex_coords.y, 1.0);
            }
        }
    }

    #[test]
    fn triangles_share_winding() {
        let area = |t: &[QuadVertex]| {
            let (a, b, c) = (t[0].position, t[1].position, t[2].position);
            (b - a).perp_dot(c - a)
        };
        let first = area(&FULLSCREEN_QUAD[0..3]);
        let second = area(&FULLSCREEN_QUAD[3..6]);
        assert!(first != 0.0);
        assert_eq!(first.signum(), second.signum());
    }
}
