use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use glam::{Vec3, Vec4};
use lumen_mesh::ObjMesh;
use lumen_raytrace::{RayTracer, RenderOptions, Scene};
use lumen_render::{FrameParams, MeshDrawState, OrbitView, Renderer, SoftwareRasterizer, Texture};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lumen-cli", about = "Render OBJ meshes and trace sphere scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Print mesh statistics
    MeshInfo {
        /// Wavefront OBJ file
        obj: PathBuf,
    },
    /// Rasterize a mesh to a PNG
    RenderMesh {
        /// Wavefront OBJ file
        obj: PathBuf,
        /// Output PNG
        #[arg(short, long)]
        output: PathBuf,
        /// Texture image
        #[arg(long)]
        texture: Option<PathBuf>,
        #[arg(long, default_value = "800")]
        width: u32,
        #[arg(long, default_value = "600")]
        height: u32,
        /// Rotation about X in degrees
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        rotate_x: f32,
        /// Rotation about Y in degrees
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        rotate_y: f32,
        /// Distance from the camera to the mesh centre
        #[arg(long, default_value = "3")]
        distance: f32,
        /// Exchange the Y and Z axes of the mesh
        #[arg(long)]
        swap_yz: bool,
        /// Colour by depth even when a texture is given
        #[arg(long)]
        no_texture: bool,
        /// View-space light direction as x,y,z
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        light: Option<Vec<f32>>,
        /// Specular exponent
        #[arg(long, default_value = "50")]
        shininess: f32,
    },
    /// Ray trace a sphere scene to a PNG
    Raytrace {
        /// Scene file (.yaml, .yml or .json); the built-in scene if omitted
        #[arg(short, long)]
        scene: Option<PathBuf>,
        /// Output PNG
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value = "800")]
        width: u32,
        #[arg(long, default_value = "600")]
        height: u32,
        /// Override the scene's bounce limit
        #[arg(long)]
        bounces: Option<u32>,
        /// Leave alpha at 0 where rays miss every sphere
        #[arg(long)]
        background_alpha: bool,
    },
    /// Write the built-in scene to a file
    DefaultScene {
        /// Output file (.yaml, .yml or .json)
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("lumen-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", lumen_common::crate_info());
            println!("mesh: {}", lumen_mesh::crate_info());
            println!("render: {}", lumen_render::crate_info());
            println!("raytrace: {}", lumen_raytrace::crate_info());
        }
        Commands::MeshInfo { obj } => {
            let mesh = ObjMesh::load(&obj)?;
            println!("{}", obj.display());
            println!("  positions:  {}", mesh.positions.len());
            println!("  triangles:  {}", mesh.triangles.len());
            println!("  tex coords: {}", yes_no(mesh.has_tex_coords()));
            println!("  normals:    {}", yes_no(mesh.has_normals()));
            match mesh.bounding_box() {
                Some(aabb) => println!("  bounds:     {} .. {}", aabb.min, aabb.max),
                None => println!("  bounds:     (empty)"),
            }
        }
        Commands::RenderMesh {
            obj,
            output,
            texture,
            width,
            height,
            rotate_x,
            rotate_y,
            distance,
            swap_yz,
            no_texture,
            light,
            shininess,
        } => {
            let mut mesh = ObjMesh::load(&obj)?;
            mesh.normalize_to_unit_box();
            let buffers = mesh.to_buffers();

            let mut rasterizer = SoftwareRasterizer::new();
            if let Some(path) = &texture {
                rasterizer.set_texture(
                    Texture::load(path)
                        .with_context(|| format!("loading texture {}", path.display()))?,
                );
            }

            let light_dir = match light.as_deref() {
                None => Vec3::ONE,
                Some([x, y, z]) => Vec3::new(*x, *y, *z),
                Some(other) => bail!("--light takes three values, got {}", other.len()),
            };

            let view = OrbitView {
                rotation_x: rotate_x.to_radians(),
                rotation_y: rotate_y.to_radians(),
                translation_z: distance,
                ..OrbitView::default()
            };
            let frame = FrameParams {
                width,
                height,
                matrices: view.matrices(width as f32 / height.max(1) as f32),
                state: MeshDrawState {
                    swap_yz,
                    show_texture: !no_texture,
                    light_dir,
                    shininess,
                },
                clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            };

            let image = rasterizer.render(&buffers, &frame)?;
            image.save_png(&output)?;
            println!(
                "Rendered {} triangles to {} ({width}x{height})",
                buffers.triangle_count(),
                output.display()
            );
        }
        Commands::Raytrace {
            scene,
            output,
            width,
            height,
            bounces,
            background_alpha,
        } => {
            let (scene, base_dir) = match &scene {
                Some(path) => (Scene::load(path)?, parent_dir(path)),
                None => (Scene::default_scene(), PathBuf::from(".")),
            };

            let mut tracer = RayTracer::from_scene(scene, &base_dir)?;
            if let Some(limit) = bounces {
                tracer.set_bounce_limit(limit);
            }

            let image = tracer.render(width, height, RenderOptions { background_alpha });
            image.save_png(&output)?;
            println!("Traced {width}x{height} to {}", output.display());
        }
        Commands::DefaultScene { output } => {
            Scene::default_scene().save(&output)?;
            println!("Wrote default scene to {}", output.display());
        }
    }

    Ok(())
}

fn yes_no(b: bool) -> &'static str {
    if b { "yes" } else { "no" }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
