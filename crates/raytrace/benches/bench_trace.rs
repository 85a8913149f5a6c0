use std::hint::black_box;
use std::path::Path;
use std::time::Instant;

use lumen_raytrace::{RayTracer, RenderOptions, Scene};

fn bench_render(width: u32, height: u32, bounces: u32, iterations: usize) {
    let mut scene = Scene::default_scene();
    scene.bounce_limit = bounces;
    let tracer = match RayTracer::from_scene(scene, Path::new(".")) {
        Ok(t) => t,
        Err(e) => {
            println!("  skipped: {e}");
            return;
        }
    };

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = black_box(tracer.render(
            black_box(width),
            black_box(height),
            RenderOptions::default(),
        ));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    let rays = width as u64 * height as u64;
    println!(
        "  render ({width}x{height}, {bounces} bounces, {iterations} iters): {per_iter:?}/iter, {:.1} Mray/s",
        rays as f64 / per_iter.as_secs_f64().max(1e-9) / 1e6
    );
}

fn main() {
    println!("=== Ray Tracer Benchmarks ===\n");

    println!("Primary rays only:");
    bench_render(128, 128, 0, 20);
    bench_render(512, 512, 0, 5);

    println!("\nWith reflections:");
    bench_render(128, 128, 5, 20);
    bench_render(512, 512, 5, 5);
    bench_render(512, 512, 20, 2);

    println!("\n=== Done ===");
}
