use crate::color::Color;

/// Shading model used by the mesh shader.
///
/// `Phong` is the classic specular model; `Standard` approximates a
/// metallic-roughness response. The fragment shader switches on this per
/// draw call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shading {
    Phong,
    Standard,
}

/// Surface appearance for a mesh: a base color and a shading model.
#[derive(Clone, Copy, Debug)]
pub struct Material {
    pub color: Color,
    pub shading: Shading,
}

impl Material {
    /// A Phong-shaded material with the given base color.
    pub fn phong(color: Color) -> Self {
        Self {
            color,
            shading: Shading::Phong,
        }
    }

    /// A physically-based material with the given base color.
    pub fn standard(color: Color) -> Self {
        Self {
            color,
            shading: Shading::Standard,
        }
    }

    /// Shader-side selector for the shading model.
    pub fn shading_index(&self) -> u32 {
        match self.shading {
            Shading::Phong => 0,
            Shading::Standard => 1,
        }
    }
}
