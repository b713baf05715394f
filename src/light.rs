use glam::Vec3;

use crate::color::Color;

/// A light emitting uniformly from a single point in space.
#[derive(Clone, Copy, Debug)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
    /// Whether this light renders into the shadow map.
    pub cast_shadow: bool,
}

impl PointLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            position: Vec3::ZERO,
            cast_shadow: false,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }
}

/// A light applied evenly to every surface, independent of position.
#[derive(Clone, Copy, Debug)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

impl AmbientLight {
    pub fn new(color: Color, intensity: f32) -> Self {
        Self { color, intensity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_light_defaults() {
        let light = PointLight::new(Color::WHITE, 50.0);
        assert_eq!(light.position, Vec3::ZERO);
        assert!(!light.cast_shadow);
        assert_eq!(light.intensity, 50.0);
    }

    #[test]
    fn point_light_positioning() {
        let light = PointLight::new(Color::WHITE, 1.0).at(Vec3::new(5.0, 5.0, 5.0));
        assert_eq!(light.position, Vec3::new(5.0, 5.0, 5.0));
    }
}
