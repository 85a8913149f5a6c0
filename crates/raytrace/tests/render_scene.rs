use glam::Vec3;
use lumen_common::Ray;
use lumen_raytrace::{Environment, RayTracer, RenderOptions, Scene};

#[test]
fn default_scene_renders_sphere_over_sky() {
    let scene = Scene::default_scene();
    let tracer = RayTracer::from_scene(scene, std::path::Path::new(".")).unwrap();
    let fb = tracer.render(33, 33, RenderOptions { background_alpha: true });

    // The red sphere sits in the middle of the frame.
    let centre = fb.pixel(16, 16);
    assert_eq!(centre.w, 1.0);
    assert!(centre.x > centre.y && centre.x > centre.z);

    // The top-centre ray passes over every sphere.
    assert_eq!(fb.pixel(16, 0).w, 0.0);
    // The bottom row lands on the ground sphere.
    assert_eq!(fb.pixel(16, 32).w, 1.0);
}

#[test]
fn cube_map_faces_load_relative_to_scene() {
    let dir = tempfile::tempdir().unwrap();
    let names = ["px.png", "nx.png", "py.png", "ny.png", "pz.png", "nz.png"];
    let colours: [[u8; 4]; 6] = [
        [255, 0, 0, 255],
        [0, 255, 0, 255],
        [0, 0, 255, 255],
        [255, 255, 0, 255],
        [0, 255, 255, 255],
        [255, 0, 255, 255],
    ];
    for (name, colour) in names.iter().zip(colours) {
        image::RgbaImage::from_pixel(2, 2, image::Rgba(colour))
            .save(dir.path().join(name))
            .unwrap();
    }

    let yaml = "\
spheres: []
bounce_limit: 2
environment:
  kind: cube_map
  faces:
    pos_x: px.png
    neg_x: nx.png
    pos_y: py.png
    neg_y: ny.png
    pos_z: pz.png
    neg_z: nz.png
";
    let path = dir.path().join("sky.yaml");
    std::fs::write(&path, yaml).unwrap();

    let scene = Scene::load(&path).unwrap();
    assert!(matches!(scene.environment, Environment::CubeMap { .. }));
    let tracer = RayTracer::from_scene(scene, dir.path()).unwrap();

    // Scene +Z maps to the cube's +Y face.
    let up = tracer.trace(&Ray::new(Vec3::ZERO, Vec3::Z));
    assert!((up.truncate() - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-5);
    // Scene +Y maps to the cube's +Z face.
    let ahead = tracer.trace(&Ray::new(Vec3::ZERO, Vec3::Y));
    assert!((ahead.truncate() - Vec3::new(0.0, 1.0, 1.0)).length() < 1e-5);
}

#[test]
fn missing_cube_face_is_an_error() {
    let mut scene = Scene::default_scene();
    scene.environment = serde_yaml::from_str(
        "kind: cube_map\nfaces: {pos_x: a.png, neg_x: a.png, pos_y: a.png, neg_y: a.png, pos_z: a.png, neg_z: a.png}\n",
    )
    .unwrap();
    let dir = tempfile::tempdir().unwrap();
    assert!(RayTracer::from_scene(scene, dir.path()).is_err());
}
