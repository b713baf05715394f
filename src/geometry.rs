//! CPU-side geometry: mesh primitives and the starfield point cloud.
//!
//! Geometry is described on the CPU first and uploaded by the renderer on
//! demand, so a whole scene can be assembled (and tested) without a GPU
//! device in sight.

use glam::Vec3;

/// A vertex for lit 3D mesh rendering with position, normal, and texture
/// coordinates.
///
/// Uses `#[repr(C)]` for a predictable 32-byte GPU layout and derives
/// [`bytemuck::Pod`] for safe casting to byte slices.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex3d {
    /// Vertex buffer layout: position (loc 0), normal (loc 1), uv (loc 2).
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// A position-only vertex for unlit point primitives (the starfield).
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
}

impl PointVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<PointVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    };
}

/// Mesh geometry held in host memory before GPU upload.
#[derive(Clone, Debug)]
pub struct MeshData {
    pub vertices: Vec<Vertex3d>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// A unit cube centered at the origin, spanning -0.5..0.5 on all axes.
    ///
    /// Each face has its own four vertices so normals stay flat: 24 vertices,
    /// 12 triangles, counter-clockwise winding.
    pub fn cube() -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            // Front face (Z+)
            Vertex3d::new([-0.5, -0.5,  0.5], [ 0.0,  0.0,  1.0], [0.0, 0.0]),
            Vertex3d::new([ 0.5, -0.5,  0.5], [ 0.0,  0.0,  1.0], [1.0, 0.0]),
            Vertex3d::new([ 0.5,  0.5,  0.5], [ 0.0,  0.0,  1.0], [1.0, 1.0]),
            Vertex3d::new([-0.5,  0.5,  0.5], [ 0.0,  0.0,  1.0], [0.0, 1.0]),
            // Back face (Z-)
            Vertex3d::new([ 0.5, -0.5, -0.5], [ 0.0,  0.0, -1.0], [0.0, 0.0]),
            Vertex3d::new([-0.5, -0.5, -0.5], [ 0.0,  0.0, -1.0], [1.0, 0.0]),
            Vertex3d::new([-0.5,  0.5, -0.5], [ 0.0,  0.0, -1.0], [1.0, 1.0]),
            Vertex3d::new([ 0.5,  0.5, -0.5], [ 0.0,  0.0, -1.0], [0.0, 1.0]),
            // Top face (Y+)
            Vertex3d::new([-0.5,  0.5,  0.5], [ 0.0,  1.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([ 0.5,  0.5,  0.5], [ 0.0,  1.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([ 0.5,  0.5, -0.5], [ 0.0,  1.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([-0.5,  0.5, -0.5], [ 0.0,  1.0,  0.0], [0.0, 1.0]),
            // Bottom face (Y-)
            Vertex3d::new([-0.5, -0.5, -0.5], [ 0.0, -1.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([ 0.5, -0.5, -0.5], [ 0.0, -1.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([ 0.5, -0.5,  0.5], [ 0.0, -1.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([-0.5, -0.5,  0.5], [ 0.0, -1.0,  0.0], [0.0, 1.0]),
            // Right face (X+)
            Vertex3d::new([ 0.5, -0.5,  0.5], [ 1.0,  0.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([ 0.5, -0.5, -0.5], [ 1.0,  0.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([ 0.5,  0.5, -0.5], [ 1.0,  0.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([ 0.5,  0.5,  0.5], [ 1.0,  0.0,  0.0], [0.0, 1.0]),
            // Left face (X-)
            Vertex3d::new([-0.5, -0.5, -0.5], [-1.0,  0.0,  0.0], [0.0, 0.0]),
            Vertex3d::new([-0.5, -0.5,  0.5], [-1.0,  0.0,  0.0], [1.0, 0.0]),
            Vertex3d::new([-0.5,  0.5,  0.5], [-1.0,  0.0,  0.0], [1.0, 1.0]),
            Vertex3d::new([-0.5,  0.5, -0.5], [-1.0,  0.0,  0.0], [0.0, 1.0]),
        ];

        #[rustfmt::skip]
        let indices: Vec<u32> = vec![
            0,  1,  2,  2,  3,  0,  // front
            4,  5,  6,  6,  7,  4,  // back
            8,  9,  10, 10, 11, 8,  // top
            12, 13, 14, 14, 15, 12, // bottom
            16, 17, 18, 18, 19, 16, // right
            20, 21, 22, 22, 23, 20, // left
        ];

        Self { vertices, indices }
    }

    /// A UV sphere centered at the origin.
    ///
    /// `segments` is the number of longitudinal divisions, `rings` the number
    /// of latitudinal divisions pole to pole. Produces
    /// `(segments + 1) * (rings + 1)` vertices and `segments * rings * 2`
    /// triangles with an equirectangular UV mapping.
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();

        for ring in 0..=rings {
            let phi = std::f32::consts::PI * ring as f32 / rings as f32;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for seg in 0..=segments {
                let theta = 2.0 * std::f32::consts::PI * seg as f32 / segments as f32;
                let x = ring_radius * theta.cos();
                let z = ring_radius * theta.sin();

                let position = [x * radius, y * radius, z * radius];
                let normal = [x, y, z];
                let uv = [seg as f32 / segments as f32, ring as f32 / rings as f32];

                vertices.push(Vertex3d::new(position, normal, uv));
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let next = current + segments + 1;

                indices.push(current);
                indices.push(next);
                indices.push(current + 1);

                indices.push(current + 1);
                indices.push(next);
                indices.push(next + 1);
            }
        }

        Self { vertices, indices }
    }

    /// Axis-aligned bounding box as `(min, max)` corners.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for v in &self.vertices {
            let p = Vec3::from_array(v.position);
            min = min.min(p);
            max = max.max(p);
        }
        (min, max)
    }
}

/// Generate `count` points with every coordinate drawn uniformly from
/// `[-spread / 2, +spread / 2]`.
///
/// The generator is a plain LCG so a given seed always yields the same
/// field. Good enough for a backdrop; not a statistics-grade source.
pub fn starfield(count: usize, spread: f32, seed: u32) -> Vec<PointVertex> {
    let mut rng = Lcg::new(seed);
    (0..count)
        .map(|_| PointVertex {
            position: [
                (rng.next_f32() - 0.5) * spread,
                (rng.next_f32() - 0.5) * spread,
                (rng.next_f32() - 0.5) * spread,
            ],
        })
        .collect()
}

/// Minimal linear congruential generator (Numerical Recipes constants).
struct Lcg {
    state: u32,
}

impl Lcg {
    fn new(seed: u32) -> Self {
        Self {
            // Avoid the all-zero fixed point of a zero seed.
            state: seed.wrapping_add(0x9e3779b9),
        }
    }

    fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Uniform in [0, 1).
    fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1 << 24) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_is_a_unit_box() {
        let cube = MeshData::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);

        let (min, max) = cube.bounds();
        assert_eq!(min, Vec3::splat(-0.5));
        assert_eq!(max, Vec3::splat(0.5));
    }

    #[test]
    fn sphere_tessellation_counts() {
        let sphere = MeshData::sphere(0.5, 32, 32);
        assert_eq!(sphere.vertices.len(), 33 * 33);
        assert_eq!(sphere.indices.len(), 32 * 32 * 6);
    }

    #[test]
    fn sphere_vertices_lie_on_the_radius() {
        let sphere = MeshData::sphere(0.5, 16, 8);
        for v in &sphere.vertices {
            let len = Vec3::from_array(v.position).length();
            assert!((len - 0.5).abs() < 1e-4, "vertex at distance {len}");
        }
    }

    #[test]
    fn starfield_count_and_bounds() {
        let stars = starfield(10_000, 2000.0, 42);
        assert_eq!(stars.len(), 10_000);
        for star in &stars {
            for coord in star.position {
                assert!(
                    (-1000.0..=1000.0).contains(&coord),
                    "coord {coord} out of range"
                );
            }
        }
    }

    #[test]
    fn starfield_is_deterministic_per_seed() {
        let a = starfield(100, 2000.0, 7);
        let b = starfield(100, 2000.0, 7);
        let c = starfield(100, 2000.0, 8);
        assert_eq!(a[0].position, b[0].position);
        assert_ne!(a[0].position, c[0].position);
    }

    #[test]
    fn starfield_spreads_across_octants() {
        // With 1000 points every octant should receive at least one.
        let stars = starfield(1000, 2000.0, 1);
        let mut octants = [false; 8];
        for star in &stars {
            let [x, y, z] = star.position;
            let idx =
                ((x > 0.0) as usize) | (((y > 0.0) as usize) << 1) | (((z > 0.0) as usize) << 2);
            octants[idx] = true;
        }
        assert!(octants.iter().all(|&o| o));
    }
}
