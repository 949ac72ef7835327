//! Named uniform values packed into a std140 uniform block.
//!
//! Shaders declare a single `uniform` block at binding 0 whose members are
//! listed in the same order as the [`UniformLayout`] built on the host.

use glam::{Mat4, Vec2, Vec3, Vec4};
use std::cell::RefCell;
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniformType {
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformType {
    const fn align(self) -> usize {
        match self {
            Self::Int | Self::Float => 4,
            Self::Vec2 => 8,
            Self::Vec3 | Self::Vec4 | Self::Mat4 => 16,
        }
    }

    const fn size(self) -> usize {
        match self {
            Self::Int | Self::Float => 4,
            Self::Vec2 => 8,
            Self::Vec3 => 12,
            Self::Vec4 => 16,
            Self::Mat4 => 64,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UniformField {
    pub name: String,
    pub ty: UniformType,
    pub offset: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UniformLayout {
    fields: Vec<UniformField>,
    size: usize,
}

impl UniformLayout {
    pub fn builder() -> UniformLayoutBuilder {
        UniformLayoutBuilder::default()
    }

    pub fn fields(&self) -> &[UniformField] {
        &self.fields
    }

    /// Block size in bytes, a multiple of 16.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[derive(Default)]
pub struct UniformLayoutBuilder {
    fields: Vec<UniformField>,
    cursor: usize,
}

impl UniformLayoutBuilder {
    fn push(mut self, name: &str, ty: UniformType) -> Self {
        let offset = self.cursor.next_multiple_of(ty.align());
        self.cursor = offset + ty.size();
        self.fields.push(UniformField {
            name: name.to_owned(),
            ty,
            offset,
        });
        self
    }

    pub fn int(self, name: &str) -> Self {
        self.push(name, UniformType::Int)
    }

    pub fn float(self, name: &str) -> Self {
        self.push(name, UniformType::Float)
    }

    pub fn vec2(self, name: &str) -> Self {
        self.push(name, UniformType::Vec2)
    }

    pub fn vec3(self, name: &str) -> Self {
        self.push(name, UniformType::Vec3)
    }

    pub fn vec4(self, name: &str) -> Self {
        self.push(name, UniformType::Vec4)
    }

    pub fn mat4(self, name: &str) -> Self {
        self.push(name, UniformType::Mat4)
    }

    pub fn build(self) -> UniformLayout {
        UniformLayout {
            fields: self.fields,
            size: self.cursor.max(16).next_multiple_of(16),
        }
    }
}

/// Host copy of a uniform block.
///
/// Unknown names and mismatched types are ignored, the same way a GL
/// uniform location of -1 is. Each offending name is logged once.
pub struct UniformBlock {
    layout: UniformLayout,
    data: Vec<u8>,
    reported: RefCell<HashSet<String>>,
}

impl UniformBlock {
    pub fn new(layout: UniformLayout) -> Self {
        Self {
            data: vec![0; layout.size()],
            layout,
            reported: RefCell::default(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn write(&mut self, name: &str, ty: UniformType, bytes: &[u8]) {
        match self.layout.field(name) {
            Some(field) if field.ty == ty => {
                let offset = field.offset;
                self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
            }
            Some(field) => self.report(name, || {
                format!("uniform {name} is {:?}, not {ty:?}; value ignored", field.ty)
            }),
            None => self.report(name, || format!("no active uniform named {name}")),
        }
    }

    fn report(&self, name: &str, message: impl FnOnce() -> String) {
        if self.reported.borrow_mut().insert(name.to_owned()) {
            log::warn!("{}", message());
        }
    }

    pub fn set_bool(&mut self, name: &str, value: bool) {
        self.set_int(name, value.into());
    }

    pub fn set_int(&mut self, name: &str, value: i32) {
        self.write(name, UniformType::Int, bytemuck::bytes_of(&value));
    }

    pub fn set_float(&mut self, name: &str, value: f32) {
        self.write(name, UniformType::Float, bytemuck::bytes_of(&value));
    }

    pub fn set_vec2(&mut self, name: &str, value: Vec2) {
        self.write(name, UniformType::Vec2, bytemuck::bytes_of(&value));
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.write(name, UniformType::Vec3, bytemuck::bytes_of(&value));
    }

    pub fn set_vec4(&mut self, name: &str, value: Vec4) {
        self.write(name, UniformType::Vec4, bytemuck::bytes_of(&value));
    }

    pub fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.write(name, UniformType::Mat4, bytemuck::bytes_of(&value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::*;

    fn offsets(layout: &UniformLayout) -> Vec<usize> {
        layout.fields().iter().map(|field| field.offset).collect()
    }

    fn read_f32(block: &UniformBlock, offset: usize) -> f32 {
        bytemuck::pod_read_unaligned(&block.bytes()[offset..offset + 4])
    }

    #[test]
    fn scalar_packs_into_vec3_tail() {
        let layout = UniformLayout::builder()
            .vec3("u_scatteringCoefficients")
            .float("u_tau")
            .float("u_distance")
            .build();
        assert_eq!(offsets(&layout), [0, 12, 16]);
        assert_eq!(layout.size(), 32);
    }

    #[test]
    fn vec3_after_scalar_is_realigned() {
        let layout = UniformLayout::builder()
            .float("a")
            .vec3("b")
            .vec2("c")
            .vec4("d")
            .build();
        assert_eq!(offsets(&layout), [0, 16, 32, 48]);
        assert_eq!(layout.size(), 64);
    }

    #[test]
    fn mat4_is_sixteen_aligned() {
        let layout = UniformLayout::builder().int("flag").mat4("view").float("t").build();
        assert_eq!(offsets(&layout), [0, 16, 80]);
        assert_eq!(layout.size(), 96);
    }

    #[test]
    fn empty_layout_still_has_a_minimum_size() {
        assert_eq!(UniformLayout::builder().build().size(), 16);
    }

    #[test]
    fn setters_write_at_field_offsets() {
        let layout = UniformLayout::builder()
            .vec3("u_color")
            .float("u_gain")
            .int("u_enabled")
            .vec2("u_resolution")
            .build();
        let mut block = UniformBlock::new(layout);
        block.set_vec3("u_color", vec3(1.0, 2.0, 3.0));
        block.set_float("u_gain", 0.5);
        block.set_bool("u_enabled", true);
        block.set_vec2("u_resolution", vec2(1024.0, 768.0));

        assert_eq!(read_f32(&block, 0), 1.0);
        assert_eq!(read_f32(&block, 8), 3.0);
        assert_eq!(read_f32(&block, 12), 0.5);
        let enabled: i32 = bytemuck::pod_read_unaligned(&block.bytes()[16..20]);
        assert_eq!(enabled, 1);
        assert_eq!(read_f32(&block, 24), 1024.0);
        assert_eq!(read_f32(&block, 28), 768.0);
    }

    #[test]
    fn mat4_is_column_major() {
        let layout = UniformLayout::builder().mat4("u_model").build();
        let mut block = UniformBlock::new(layout);
        block.set_mat4("u_model", Mat4::from_translation(vec3(4.0, 5.0, 6.0)));
        assert_eq!(read_f32(&block, 48), 4.0);
        assert_eq!(read_f32(&block, 52), 5.0);
        assert_eq!(read_f32(&block, 56), 6.0);
        assert_eq!(read_f32(&block, 60), 1.0);
    }

    #[test]
    fn unknown_names_and_wrong_types_are_ignored() {
        let layout = UniformLayout::builder().float("u_tau").build();
        let mut block = UniformBlock::new(layout);
        block.set_float("u_missing", 9.0);
        block.set_vec3("u_tau", Vec3::ONE);
        block.set_int("u_tau", 7);
        assert!(block.bytes().iter().all(|byte| *byte == 0));

        block.set_float("u_tau", 2.0);
        assert_eq!(read_f32(&block, 0), 2.0);
    }
}
