//! The scene container: a background color and a flat list of children.
//!
//! A [`Scene`] owns everything that renders — meshes, lights, point clouds —
//! by composition. Children are added once during setup and never removed;
//! `add_*` methods hand back an [`ObjectId`] so the frame loop can reach
//! back in and mutate a child (the spinning cube) without holding a borrow
//! across frames. The container is pure host-side data: the renderer uploads
//! GPU copies keyed by child index on first use.

use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::color::Color;
use crate::geometry::{MeshData, PointVertex};
use crate::light::{AmbientLight, PointLight};
use crate::material::Material;

/// Handle to a child of a [`Scene`]. Stable for the scene's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectId(pub(crate) usize);

/// A renderable mesh with its transform and shadow flags.
#[derive(Clone, Debug)]
pub struct MeshObject {
    pub geometry: MeshData,
    pub material: Material,
    pub position: Vec3,
    /// Euler rotation in radians, applied in XYZ order.
    pub rotation: Vec3,
    pub scale: Vec3,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl MeshObject {
    pub fn new(geometry: MeshData, material: Material) -> Self {
        Self {
            geometry,
            material,
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Mark the mesh as both casting and receiving shadows.
    pub fn with_shadows(mut self) -> Self {
        self.cast_shadow = true;
        self.receive_shadow = true;
        self
    }

    /// Object-to-world matrix (scale, then XYZ Euler rotation, then
    /// translation).
    pub fn model_matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

/// A set of unlit points rendered with a single uniform color.
#[derive(Clone, Debug)]
pub struct PointCloud {
    pub points: Vec<PointVertex>,
    pub color: Color,
}

impl PointCloud {
    pub fn new(points: Vec<PointVertex>, color: Color) -> Self {
        Self { points, color }
    }
}

/// A child of the scene.
#[derive(Clone, Debug)]
pub enum Object {
    Mesh(MeshObject),
    PointLight(PointLight),
    AmbientLight(AmbientLight),
    Points(PointCloud),
}

/// Root container for a single frame of rendering.
pub struct Scene {
    /// Clear color for the frame.
    pub background: Color,
    children: Vec<Object>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            background: Color::BLACK,
            children: Vec::new(),
        }
    }

    fn add(&mut self, object: Object) -> ObjectId {
        self.children.push(object);
        ObjectId(self.children.len() - 1)
    }

    pub fn add_mesh(&mut self, mesh: MeshObject) -> ObjectId {
        self.add(Object::Mesh(mesh))
    }

    pub fn add_point_light(&mut self, light: PointLight) -> ObjectId {
        self.add(Object::PointLight(light))
    }

    pub fn add_ambient_light(&mut self, light: AmbientLight) -> ObjectId {
        self.add(Object::AmbientLight(light))
    }

    pub fn add_points(&mut self, cloud: PointCloud) -> ObjectId {
        self.add(Object::Points(cloud))
    }

    /// All children, in insertion order.
    pub fn children(&self) -> &[Object] {
        &self.children
    }

    /// Borrow a mesh child.
    ///
    /// # Panics
    /// Panics if `id` does not refer to a mesh in this scene.
    pub fn mesh(&self, id: ObjectId) -> &MeshObject {
        match &self.children[id.0] {
            Object::Mesh(mesh) => mesh,
            other => panic!("object {} is not a mesh: {other:?}", id.0),
        }
    }

    /// Mutably borrow a mesh child.
    ///
    /// # Panics
    /// Panics if `id` does not refer to a mesh in this scene.
    pub fn mesh_mut(&mut self, id: ObjectId) -> &mut MeshObject {
        match &mut self.children[id.0] {
            Object::Mesh(mesh) => mesh,
            other => panic!("object {} is not a mesh: {other:?}", id.0),
        }
    }

    /// Mesh children with their child indices (upload-cache keys).
    pub fn meshes(&self) -> impl Iterator<Item = (usize, &MeshObject)> {
        self.children.iter().enumerate().filter_map(|(i, o)| match o {
            Object::Mesh(mesh) => Some((i, mesh)),
            _ => None,
        })
    }

    /// Point-cloud children with their child indices.
    pub fn point_clouds(&self) -> impl Iterator<Item = (usize, &PointCloud)> {
        self.children.iter().enumerate().filter_map(|(i, o)| match o {
            Object::Points(cloud) => Some((i, cloud)),
            _ => None,
        })
    }

    /// The first shadow-casting point light, if any. The shadow pass
    /// renders from this light's viewpoint.
    pub fn shadow_light(&self) -> Option<&PointLight> {
        self.point_lights().find(|l| l.cast_shadow)
    }

    pub fn point_lights(&self) -> impl Iterator<Item = &PointLight> {
        self.children.iter().filter_map(|o| match o {
            Object::PointLight(light) => Some(light),
            _ => None,
        })
    }

    pub fn ambient_lights(&self) -> impl Iterator<Item = &AmbientLight> {
        self.children.iter().filter_map(|o| match o {
            Object::AmbientLight(light) => Some(light),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry;

    fn demo_like_scene() -> (Scene, ObjectId) {
        let mut scene = Scene::new();
        scene.background = Color::from_hex(0x2a0d45);
        let cube = scene.add_mesh(
            MeshObject::new(MeshData::cube(), Material::phong(Color::from_hex(0x8b0000)))
                .at(Vec3::new(-1.0, 0.0, 0.0))
                .with_shadows(),
        );
        scene.add_mesh(
            MeshObject::new(
                MeshData::sphere(0.5, 32, 32),
                Material::standard(Color::from_hex(0x00008b)),
            )
            .at(Vec3::new(1.0, 0.0, 0.0))
            .with_shadows(),
        );
        scene.add_point_light({
            let mut light = PointLight::new(Color::WHITE, 50.0).at(Vec3::new(5.0, 5.0, 5.0));
            light.cast_shadow = true;
            light
        });
        scene.add_ambient_light(AmbientLight::new(Color::from_hex(0x404040), 2.0));
        scene.add_points(PointCloud::new(
            geometry::starfield(10_000, 2000.0, 1),
            Color::WHITE,
        ));
        (scene, cube)
    }

    #[test]
    fn child_list_holds_exactly_the_five_objects() {
        let (scene, _) = demo_like_scene();
        assert_eq!(scene.children().len(), 5);
        assert_eq!(scene.meshes().count(), 2);
        assert_eq!(scene.point_lights().count(), 1);
        assert_eq!(scene.ambient_lights().count(), 1);
        assert_eq!(scene.point_clouds().count(), 1);
    }

    #[test]
    fn shadow_light_is_the_casting_point_light() {
        let (scene, _) = demo_like_scene();
        let light = scene.shadow_light().unwrap();
        assert_eq!(light.position, Vec3::new(5.0, 5.0, 5.0));
    }

    #[test]
    fn mesh_handle_reaches_the_right_child() {
        let (mut scene, cube) = demo_like_scene();
        assert_eq!(scene.mesh(cube).position, Vec3::new(-1.0, 0.0, 0.0));
        scene.mesh_mut(cube).rotation.x += 0.5;
        assert_eq!(scene.mesh(cube).rotation.x, 0.5);
    }

    #[test]
    fn rotation_advances_by_the_step_each_tick() {
        let (mut scene, cube) = demo_like_scene();
        let step = 0.01;
        for _ in 0..240 {
            let mesh = scene.mesh_mut(cube);
            mesh.rotation.x += step;
            mesh.rotation.y += step;
        }
        let mesh = scene.mesh(cube);
        assert!((mesh.rotation.x - 240.0 * step).abs() < 1e-4);
        assert!((mesh.rotation.y - 240.0 * step).abs() < 1e-4);
        assert_eq!(mesh.rotation.z, 0.0);
    }

    #[test]
    fn model_matrix_translates_to_position() {
        let mesh = MeshObject::new(MeshData::cube(), Material::phong(Color::WHITE))
            .at(Vec3::new(-1.0, 0.0, 0.0));
        let origin = mesh.model_matrix().transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn euler_rotation_order_is_xyz() {
        let mut mesh = MeshObject::new(MeshData::cube(), Material::phong(Color::WHITE));
        mesh.rotation = Vec3::new(0.3, 0.7, 0.0);
        let expected = Quat::from_euler(EulerRot::XYZ, 0.3, 0.7, 0.0);
        let from_matrix = mesh.model_matrix().transform_vector3(Vec3::X);
        assert!((from_matrix - expected * Vec3::X).length() < 1e-5);
    }
}
