//! Built-in demo scenes.

use std::sync::Arc;

use clap::ValueEnum;
use lumen_core::{
    Attenuation, Camera, MeshData, Scene, SceneError, SceneLight, SceneMaterial, SceneObject, Sphere,
    Transform,
};
use lumen_math::{Color, Quat, Vec3};

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DemoScene {
    /// Material showcase on a ground plane, lit by point lights
    #[default]
    Spheres,
    /// Closed box lit by a ceiling panel
    Cornell,
    /// Glass ball over a graded floor under a spherical lamp
    Glass,
}

impl DemoScene {
    pub fn name(self) -> &'static str {
        match self {
            DemoScene::Spheres => "spheres",
            DemoScene::Cornell => "cornell",
            DemoScene::Glass => "glass",
        }
    }

    pub fn build(self) -> Result<Scene, SceneError> {
        match self {
            DemoScene::Spheres => spheres(),
            DemoScene::Cornell => cornell(),
            DemoScene::Glass => glass(),
        }
    }
}

fn material(m: SceneMaterial) -> Arc<SceneMaterial> {
    Arc::new(m)
}

fn quad(name: &str, corners: [Vec3; 4], m: SceneMaterial, physical: &str) -> Result<SceneObject, SceneError> {
    let mesh = MeshData::quad(corners).build(material(m))?;
    Ok(SceneObject::new(name, mesh, physical))
}

/// Horizontal square of half-size `size` at height `y`, facing up.
fn ground(y: f32, size: f32) -> [Vec3; 4] {
    [
        Vec3::new(-size, y, -size),
        Vec3::new(-size, y, size),
        Vec3::new(size, y, size),
        Vec3::new(size, y, -size),
    ]
}

/// Unit cube centred on the origin with outward counter-clockwise faces.
fn cube() -> MeshData {
    let positions = (0..8)
        .map(|i| {
            Vec3::new(
                if i & 1 == 0 { -0.5 } else { 0.5 },
                if i & 2 == 0 { -0.5 } else { 0.5 },
                if i & 4 == 0 { -0.5 } else { 0.5 },
            )
        })
        .collect();
    let faces: [[u32; 4]; 6] = [
        [0, 4, 6, 2],
        [1, 3, 7, 5],
        [0, 1, 5, 4],
        [2, 6, 7, 3],
        [0, 2, 3, 1],
        [4, 5, 7, 6],
    ];
    let indices = faces
        .iter()
        .flat_map(|&[a, b, c, d]| [a, b, c, a, c, d])
        .collect();
    MeshData::new(positions, indices)
}

fn spheres() -> Result<Scene, SceneError> {
    let floor = quad(
        "floor",
        ground(0.0, 20.0),
        SceneMaterial::matte(Color::new(0.45, 0.45, 0.42)),
        "matte",
    )?;

    let red = SceneMaterial::matte(Color::new(0.75, 0.15, 0.12));
    let blue = SceneMaterial::matte(Color::new(0.1, 0.25, 0.7)).with_specular(Color::ONE, 60.0);
    let gold = SceneMaterial::matte(Color::new(0.9, 0.7, 0.3));
    let copper = SceneMaterial::matte(Color::new(0.95, 0.55, 0.4))
        .with_roughness(0.25)
        .with_transparency(Color::ZERO, 8.0);
    let chrome = SceneMaterial::matte(Color::splat(0.1))
        .with_specular(Color::splat(0.5), 120.0)
        .with_reflective(Color::splat(0.35));

    Scene::builder()
        .camera(Camera::look_at(Vec3::new(0.0, 2.5, 8.0), Vec3::new(0.0, 0.9, 0.0)).with_fov(40.0))
        .background(Color::new(0.6, 0.75, 0.9))
        .ambient(Color::splat(0.05))
        .object(floor)
        .object(SceneObject::new("red", Sphere::new(Vec3::new(-2.2, 1.0, 0.0), 1.0, material(red)), "matte"))
        .object(SceneObject::new("blue", Sphere::new(Vec3::new(0.0, 1.0, 0.0), 1.0, material(blue)), "plastic"))
        .object(SceneObject::new("gold", Sphere::new(Vec3::new(2.2, 1.0, 0.0), 1.0, material(gold)), "metallic"))
        .object(SceneObject::new(
            "copper",
            Sphere::new(Vec3::new(1.1, 0.5, 1.8), 0.5, material(copper)),
            "rough",
        ))
        .object(SceneObject::new(
            "chrome",
            Sphere::new(Vec3::new(-1.0, 0.45, 2.0), 0.45, material(chrome)),
            "reflective_plastic",
        ))
        .light(SceneLight::point("key", Vec3::new(5.0, 8.0, 6.0), Color::splat(0.9)))
        .light(SceneLight::point("fill", Vec3::new(-6.0, 4.0, 4.0), Color::splat(0.25)))
        .build()
}

fn cornell() -> Result<Scene, SceneError> {
    let white = SceneMaterial::matte(Color::splat(0.73));
    let red = SceneMaterial::matte(Color::new(0.65, 0.05, 0.05));
    let green = SceneMaterial::matte(Color::new(0.12, 0.45, 0.15));
    let (lo, hi) = (-1.0, 1.0);

    // Back wall fades from white at the floor to warm at the top.
    let warm = material(SceneMaterial::matte(Color::new(0.8, 0.65, 0.4)));
    let plain = material(white);
    let back = MeshData::quad([
        Vec3::new(lo, 0.0, lo),
        Vec3::new(hi, 0.0, lo),
        Vec3::new(hi, 2.0, lo),
        Vec3::new(lo, 2.0, lo),
    ])
    .with_vertex_materials(vec![plain.clone(), plain.clone(), warm.clone(), warm])
    .build(plain)?;

    let s = 0.3;
    let panel = quad(
        "panel",
        [
            Vec3::new(-s, 1.99, -s),
            Vec3::new(s, 1.99, -s),
            Vec3::new(s, 1.99, s),
            Vec3::new(-s, 1.99, s),
        ],
        white,
        "matte",
    )?;

    let brushed = SceneMaterial::matte(Color::new(0.7, 0.7, 0.75))
        .with_roughness(0.35)
        .with_transparency(Color::ZERO, 6.0);
    let block = SceneObject::new("block", cube().build(material(brushed))?, "rough")
    .with_transform(
        &Transform::from_translation(Vec3::new(-0.4, 0.6, -0.3))
            .with_rotation(Quat::from_rotation_y(0.5))
            .with_scale(Vec3::new(0.6, 1.2, 0.6)),
    );

    let glass = SceneMaterial::matte(Color::ZERO).with_transparency(Color::new(0.95, 0.97, 1.0), 1.5);

    Scene::builder()
        .camera(Camera::look_at(Vec3::new(0.0, 1.0, 3.6), Vec3::new(0.0, 1.0, 0.0)).with_fov(40.0))
        .object(quad("floor", ground(0.0, 1.0), white, "matte")?)
        .object(quad(
            "ceiling",
            [
                Vec3::new(lo, 2.0, lo),
                Vec3::new(hi, 2.0, lo),
                Vec3::new(hi, 2.0, hi),
                Vec3::new(lo, 2.0, hi),
            ],
            white,
            "matte",
        )?)
        .object(SceneObject::new("back", back, "matte"))
        .object(quad(
            "left",
            [
                Vec3::new(lo, 0.0, lo),
                Vec3::new(lo, 2.0, lo),
                Vec3::new(lo, 2.0, hi),
                Vec3::new(lo, 0.0, hi),
            ],
            red,
            "matte",
        )?)
        .object(quad(
            "right",
            [
                Vec3::new(hi, 0.0, lo),
                Vec3::new(hi, 0.0, hi),
                Vec3::new(hi, 2.0, hi),
                Vec3::new(hi, 2.0, lo),
            ],
            green,
            "matte",
        )?)
        .object(panel)
        .object(block)
        .object(SceneObject::new(
            "ball",
            Sphere::new(Vec3::new(0.45, 0.35, 0.35), 0.35, material(glass)),
            "glass",
        ))
        .area_light("ceiling_light", Color::splat(12.0), Attenuation::default(), &["panel"])
        .build()
}

fn glass() -> Result<Scene, SceneError> {
    let near = material(SceneMaterial::matte(Color::new(0.8, 0.8, 0.75)));
    let far = material(SceneMaterial::matte(Color::new(0.2, 0.3, 0.45)));
    let floor = MeshData::quad(ground(0.0, 8.0))
        .with_vertex_materials(vec![far.clone(), near.clone(), near.clone(), far])
        .build(near)?;

    let lens = SceneMaterial::matte(Color::ZERO).with_transparency(Color::ONE, 1.5);
    let backdrop = SceneMaterial::matte(Color::new(0.8, 0.3, 0.2)).with_specular(Color::splat(0.3), 30.0);

    Scene::builder()
        .camera(Camera::look_at(Vec3::new(0.0, 1.6, 5.0), Vec3::new(0.0, 0.9, 0.0)).with_fov(45.0))
        .background(Color::new(0.05, 0.05, 0.08))
        .ambient(Color::splat(0.02))
        .object(SceneObject::new("floor", floor, "matte"))
        .object(SceneObject::new("lens", Sphere::new(Vec3::new(0.0, 1.0, 0.0), 1.0, material(lens)), "glass"))
        .object(SceneObject::new(
            "backdrop",
            Sphere::new(Vec3::new(0.8, 0.6, -2.5), 0.6, material(backdrop)),
            "plastic",
        ))
        .object(SceneObject::new(
            "lamp",
            Sphere::new(Vec3::new(-2.0, 4.0, 1.0), 0.5, material(SceneMaterial::default())),
            "matte",
        ))
        .area_light("lamp_light", Color::splat(8.0), Attenuation::default(), &["lamp"])
        .light(
            SceneLight::point("rim", Vec3::new(3.0, 3.0, -3.0), Color::splat(5.0))
                .with_attenuation(Attenuation::inverse_square()),
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::LightKind;
    use lumen_renderer::{Integrator, RenderConfig, Renderer};

    #[test]
    fn test_every_scene_builds() {
        for scene in DemoScene::value_variants() {
            let built = scene.build().unwrap();
            assert!(!built.objects().is_empty(), "{}", scene.name());
            assert!(!built.lights().is_empty(), "{}", scene.name());
        }
    }

    #[test]
    fn test_cornell_panel_is_the_area_light() {
        let scene = cornell().unwrap();
        let light = &scene.lights()[0];
        let LightKind::Area { objects } = &light.kind else {
            panic!("expected an area light");
        };
        assert_eq!(objects.len(), 1);
        let panel = &scene.objects()[objects[0]];
        assert_eq!(panel.name, "panel");
        assert!(panel.is_light);
    }

    #[test]
    fn test_cube_faces_point_outward() {
        let mesh = cube().build(material(SceneMaterial::default())).unwrap();
        assert_eq!(mesh.triangle_count(), 12);
        for tri in mesh.triangles() {
            let centroid = tri.vertices().iter().sum::<Vec3>() / 3.0;
            assert!(tri.face_normal().dot(centroid) > 0.0);
        }
    }

    #[test]
    fn test_scenes_render_small() {
        for scene in DemoScene::value_variants() {
            let config = RenderConfig {
                samples_per_pixel: 1,
                threads: 2,
                integrator: Integrator::Whitted,
                ..RenderConfig::default().with_resolution(12, 8)
            };
            let frame = Renderer::new(config)
                .render(Arc::new(scene.build().unwrap()))
                .unwrap();
            assert!(frame.pixels().iter().all(|c| c.is_finite()), "{}", scene.name());
            assert!(frame.average().max_element() > 0.0, "{}", scene.name());
        }
    }
}
