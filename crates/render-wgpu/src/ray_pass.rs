use crate::shaders;
use bytemuck::{Pod, Zeroable};
use lumen_common::{Material, PointLight};
use lumen_raytrace::{Camera, EnvironmentMap, Scene, Sphere};
use wgpu::util::DeviceExt;

const ENV_SOLID: u32 = 0;
const ENV_GRADIENT: u32 = 1;
const ENV_CUBE: u32 = 2;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct GpuMaterial {
    k_d: [f32; 3],
    n: f32,
    k_s: [f32; 3],
    _pad: f32,
}

impl From<&Material> for GpuMaterial {
    fn from(m: &Material) -> Self {
        Self {
            k_d: m.k_d.to_array(),
            n: m.n,
            k_s: m.k_s.to_array(),
            _pad: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct GpuSphere {
    center: [f32; 3],
    radius: f32,
    mtl: GpuMaterial,
}

impl From<&Sphere> for GpuSphere {
    fn from(s: &Sphere) -> Self {
        Self {
            center: s.center.to_array(),
            radius: s.radius,
            mtl: (&s.mtl).into(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct GpuLight {
    position: [f32; 3],
    _pad0: f32,
    intensity: [f32; 3],
    _pad1: f32,
}

impl From<&PointLight> for GpuLight {
    fn from(l: &PointLight) -> Self {
        Self {
            position: l.position.to_array(),
            _pad0: 0.0,
            intensity: l.intensity.to_array(),
            _pad1: 0.0,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct Params {
    eye: [f32; 3],
    bounce_limit: u32,
    forward: [f32; 3],
    tan_half_fov: f32,
    right: [f32; 3],
    aspect: f32,
    up: [f32; 3],
    env_kind: u32,
    env_a: [f32; 3],
    num_spheres: u32,
    env_b: [f32; 3],
    num_lights: u32,
}

/// Scene-dependent part of [`Params`]; camera fields are filled per frame.
#[derive(Clone, Copy, Debug, Default)]
struct SceneParams {
    bounce_limit: u32,
    env_kind: u32,
    env_a: [f32; 3],
    env_b: [f32; 3],
    num_spheres: u32,
    num_lights: u32,
}

impl SceneParams {
    fn with_camera(&self, camera: &Camera, aspect: f32) -> Params {
        let (forward, right, up) = camera.basis();
        Params {
            eye: camera.position.to_array(),
            bounce_limit: self.bounce_limit,
            forward: forward.to_array(),
            tan_half_fov: (camera.fov_deg.to_radians() * 0.5).tan(),
            right: right.to_array(),
            aspect,
            up: up.to_array(),
            env_kind: self.env_kind,
            env_a: self.env_a,
            num_spheres: self.num_spheres,
            env_b: self.env_b,
            num_lights: self.num_lights,
        }
    }
}

/// Storage buffers cannot be empty; pad with one zeroed element and rely
/// on the count in [`Params`].
fn non_empty<T: Pod + Zeroable>(mut items: Vec<T>) -> Vec<T> {
    if items.is_empty() {
        items.push(T::zeroed());
    }
    items
}

/// Full-screen ray tracing pass over a sphere scene.
pub struct RayTracePass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,
    params_buffer: wgpu::Buffer,
    sampler: wgpu::Sampler,
    scene: SceneParams,
}

impl RayTracePass {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ray_params_buffer"),
            size: std::mem::size_of::<Params>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let storage_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ray_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                storage_entry(1),
                storage_entry(2),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::Cube,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("env_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ray_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ray_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::RAYTRACE_SHADER.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ray_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_fullscreen"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_raytrace"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            bind_group_layout,
            bind_group: None,
            params_buffer,
            sampler,
            scene: SceneParams::default(),
        }
    }

    /// Upload spheres, lights and environment. Replaces any previous scene.
    pub fn set_scene(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &Scene,
        environment: &EnvironmentMap,
    ) {
        let spheres = non_empty(scene.spheres.iter().map(GpuSphere::from).collect());
        let lights = non_empty(scene.lights.iter().map(GpuLight::from).collect());

        let sphere_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ray_sphere_buffer"),
            contents: bytemuck::cast_slice(&spheres),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("ray_light_buffer"),
            contents: bytemuck::cast_slice(&lights),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let (env_kind, env_a, env_b) = match environment {
            EnvironmentMap::Solid(c) => (ENV_SOLID, c.to_array(), [0.0; 3]),
            EnvironmentMap::Gradient { horizon, zenith } => {
                (ENV_GRADIENT, horizon.to_array(), zenith.to_array())
            }
            EnvironmentMap::CubeMap(_) => (ENV_CUBE, [0.0; 3], [0.0; 3]),
        };
        let env_view = upload_cube(device, queue, environment);

        self.scene = SceneParams {
            bounce_limit: scene.bounce_limit.min(lumen_raytrace::MAX_BOUNCES),
            env_kind,
            env_a,
            env_b,
            num_spheres: scene.spheres.len() as u32,
            num_lights: scene.lights.len() as u32,
        };

        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ray_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: sphere_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: light_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&env_view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        }));
        tracing::debug!(
            "uploaded scene: {} spheres, {} lights",
            scene.spheres.len(),
            scene.lights.len()
        );
    }

    pub fn set_bounce_limit(&mut self, limit: u32) {
        self.scene.bounce_limit = limit.min(lumen_raytrace::MAX_BOUNCES);
    }

    /// Trace the whole surface. Does nothing until a scene is set.
    pub fn draw(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        camera: &Camera,
        aspect: f32,
    ) {
        let Some(bind_group) = &self.bind_group else {
            return;
        };
        queue.write_buffer(
            &self.params_buffer,
            0,
            bytemuck::bytes_of(&self.scene.with_camera(camera, aspect)),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("ray_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ray_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                ..Default::default()
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        queue.submit(std::iter::once(encoder.finish()));
    }
}

/// Cube texture for the environment; a 1x1 black cube stands in when the
/// environment is not image based.
fn upload_cube(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    environment: &EnvironmentMap,
) -> wgpu::TextureView {
    let black = [0u8, 0, 0, 255];
    let (size, faces): (u32, Vec<&[u8]>) = match environment {
        EnvironmentMap::CubeMap(cube) => (
            cube.faces()[0].width(),
            cube.faces().iter().map(|f| f.rgba8()).collect(),
        ),
        _ => (1, vec![&black[..]; 6]),
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("env_cube_texture"),
        size: wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 6,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: crate::TEXEL_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    for (layer, data) in faces.into_iter().enumerate() {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: 0,
                    y: 0,
                    z: layer as u32,
                },
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * size),
                rows_per_image: Some(size),
            },
            wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
        );
    }

    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("env_cube_view"),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    })
}
