//! An interactive space scene: a spinning red cube and a blue sphere over a
//! dark purple void, lit by a point light and an ambient light, wrapped in a
//! 10,000-star field, under damped orbit controls.

use glam::Vec3;
use orbita::{
    AmbientLight, AppConfig, Color, Material, MeshData, MeshObject, ObjectId, OrbitControls,
    PerspectiveCamera, PointCloud, PointLight, Scene, run, starfield,
};

/// Radians added to the cube's X and Y rotation each frame.
const ROTATION_STEP: f32 = 0.01;

const STAR_COUNT: usize = 10_000;
/// Stars land in [-1000, 1000] on every axis.
const STAR_SPREAD: f32 = 2000.0;
const STAR_SEED: u32 = 42;

/// Build the scene and return the handle of the cube the frame loop spins.
fn populate(scene: &mut Scene) -> ObjectId {
    scene.background = Color::from_hex(0x2a0d45); // darkish purple

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

    let mut sun = PointLight::new(Color::WHITE, 50.0).at(Vec3::new(5.0, 5.0, 5.0));
    sun.cast_shadow = true;
    scene.add_point_light(sun);

    scene.add_ambient_light(AmbientLight::new(Color::from_hex(0x404040), 2.0));

    scene.add_points(PointCloud::new(
        starfield(STAR_COUNT, STAR_SPREAD, STAR_SEED),
        Color::WHITE,
    ));

    cube
}

/// One animation tick: advance the cube's rotation on X and Y.
fn spin(scene: &mut Scene, cube: ObjectId) {
    let mesh = scene.mesh_mut(cube);
    mesh.rotation.x += ROTATION_STEP;
    mesh.rotation.y += ROTATION_STEP;
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    run(AppConfig::new().title("Orbita"), |ctx| {
        let cube = populate(ctx.scene);

        *ctx.camera = PerspectiveCamera::new(75.0, ctx.renderer.viewport().aspect())
            .at(Vec3::new(0.0, 0.0, 3.0))
            .looking_at(Vec3::ZERO);

        ctx.renderer.shadows_enabled = true;

        let mut controls = OrbitControls::new(ctx.camera);
        controls.enable_damping = true;

        log::info!("Esto es una escena 3D interactiva creada con wgpu.");
        log::info!(
            "En el centro de la escena, se encuentran un cubo de color rojo y una esfera de \
             color azul, iluminados por una luz ambiental y una luz puntual. El fondo de la \
             escena simula el universo, con un color púrpura oscuro y numerosas estrellas \
             dispersas. Además, los controles de navegación permiten rotar y acercar la vista \
             de la escena, proporcionando una experiencia inmersiva. Algo curioso es que \
             podemos alejarnos y visualizar el espacio fuera del campo de estrellas."
        );

        move |frame| {
            spin(frame.scene, cube);
            controls.update(frame.camera, frame.input, frame.dt);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbita::Object;

    #[test]
    fn scene_holds_exactly_the_advertised_children() {
        let mut scene = Scene::new();
        populate(&mut scene);

        assert_eq!(scene.children().len(), 5);
        assert!(matches!(scene.children()[0], Object::Mesh(_)));
        assert!(matches!(scene.children()[1], Object::Mesh(_)));
        assert!(matches!(scene.children()[2], Object::PointLight(_)));
        assert!(matches!(scene.children()[3], Object::AmbientLight(_)));
        assert!(matches!(scene.children()[4], Object::Points(_)));
    }

    #[test]
    fn cube_left_sphere_right() {
        let mut scene = Scene::new();
        let cube = populate(&mut scene);

        assert_eq!(scene.mesh(cube).position, Vec3::new(-1.0, 0.0, 0.0));

        let positions: Vec<Vec3> = scene.meshes().map(|(_, m)| m.position).collect();
        assert_eq!(
            positions,
            vec![Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)]
        );
    }

    #[test]
    fn starfield_is_ten_thousand_points_within_bounds() {
        let mut scene = Scene::new();
        populate(&mut scene);

        let (_, cloud) = scene.point_clouds().next().unwrap();
        assert_eq!(cloud.points.len(), STAR_COUNT);
        for point in &cloud.points {
            for coord in point.position {
                assert!((-1000.0..=1000.0).contains(&coord));
            }
        }
    }

    #[test]
    fn n_ticks_advance_rotation_by_n_steps() {
        let mut scene = Scene::new();
        let cube = populate(&mut scene);

        for _ in 0..100 {
            spin(&mut scene, cube);
        }

        let mesh = scene.mesh(cube);
        assert!((mesh.rotation.x - 100.0 * ROTATION_STEP).abs() < 1e-4);
        assert!((mesh.rotation.y - 100.0 * ROTATION_STEP).abs() < 1e-4);
        assert_eq!(mesh.rotation.z, 0.0);
    }

    #[test]
    fn lights_match_the_scene_description() {
        let mut scene = Scene::new();
        populate(&mut scene);

        let point = scene.point_lights().next().unwrap();
        assert_eq!(point.intensity, 50.0);
        assert_eq!(point.position, Vec3::new(5.0, 5.0, 5.0));
        assert!(point.cast_shadow);

        let ambient = scene.ambient_lights().next().unwrap();
        assert_eq!(ambient.intensity, 2.0);
        assert_eq!(ambient.color, Color::from_hex(0x404040));
    }
}
