use crate::shaders;
use crate::{DEPTH_FORMAT, GpuError, OPENGL_TO_WGPU, create_depth_texture};
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4};
use lumen_mesh::MeshBuffers;
use lumen_render::{MeshDrawState, Texture, ViewMatrices, swap_yz_matrix};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct MeshUniforms {
    mvp: [[f32; 4]; 4],
    mv: [[f32; 4]; 4],
    swap: [[f32; 4]; 4],
    nt: [[f32; 4]; 3],
    light: [f32; 3],
    alpha: f32,
    display: u32,
    _pad: [u32; 3],
}

impl MeshUniforms {
    fn new(matrices: &ViewMatrices, state: &MeshDrawState, texture_bound: bool) -> Self {
        Self {
            mvp: (OPENGL_TO_WGPU * matrices.mvp).to_cols_array_2d(),
            mv: matrices.mv.to_cols_array_2d(),
            swap: swap_yz_matrix(state.swap_yz).to_cols_array_2d(),
            nt: mat3_columns(matrices.normal),
            light: state.light_dir.to_array(),
            alpha: state.shininess,
            display: u32::from(state.show_texture && texture_bound),
            _pad: [0; 3],
        }
    }
}

/// mat3x3 columns are 16-byte aligned in WGSL uniform buffers.
fn mat3_columns(m: Mat3) -> [[f32; 4]; 3] {
    [
        m.x_axis.extend(0.0).to_array(),
        m.y_axis.extend(0.0).to_array(),
        m.z_axis.extend(0.0).to_array(),
    ]
}

struct MeshGpuBuffers {
    positions: wgpu::Buffer,
    tex_coords: wgpu::Buffer,
    normals: wgpu::Buffer,
    vertex_count: u32,
}

/// GPU mesh draw path: three vertex streams, one uniform block, one texture.
///
/// State setters only touch the CPU copy; everything is uploaded in
/// [`MeshDrawer::draw`].
pub struct MeshDrawer {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    texture_view: wgpu::TextureView,
    texture_bound: bool,
    mesh: Option<MeshGpuBuffers>,
    state: MeshDrawState,
    depth_texture: wgpu::TextureView,
}

impl MeshDrawer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let state = MeshDrawState::default();
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mesh_uniform_buffer"),
            contents: bytemuck::bytes_of(&MeshUniforms::new(
                &ViewMatrices {
                    mvp: Mat4::IDENTITY,
                    mv: Mat4::IDENTITY,
                    normal: Mat3::IDENTITY,
                },
                &state,
                false,
            )),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mesh_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("mesh_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // Placeholder until a texture is set.
        let texture_view = upload_texture(device, queue, &Texture::solid([255, 255, 255, 255]));
        let bind_group = Self::create_bind_group(
            device,
            &bind_group_layout,
            &uniform_buffer,
            &texture_view,
            &sampler,
        );

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::MESH_SHADER.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mesh_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_mesh"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: 3 * std::mem::size_of::<f32>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: 2 * std::mem::size_of::<f32>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![1 => Float32x2],
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: 3 * std::mem::size_of::<f32>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![2 => Float32x3],
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_mesh"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let depth_texture = create_depth_texture(device, width, height);

        Self {
            pipeline,
            uniform_buffer,
            bind_group_layout,
            bind_group,
            sampler,
            texture_view,
            texture_bound: false,
            mesh: None,
            state,
            depth_texture,
        }
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniform_buffer: &wgpu::Buffer,
        texture_view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(texture_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    /// Replace the mesh. Every three vertices form one triangle.
    pub fn set_mesh(&mut self, device: &wgpu::Device, mesh: &MeshBuffers) -> Result<(), GpuError> {
        mesh.validate()?;
        if mesh.is_empty() {
            tracing::warn!("empty mesh; nothing will be drawn");
            self.mesh = None;
            return Ok(());
        }

        let vertex_buffer = |label: &str, data: &[f32]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX,
            })
        };
        self.mesh = Some(MeshGpuBuffers {
            positions: vertex_buffer("mesh_position_buffer", &mesh.vert_pos),
            tex_coords: vertex_buffer("mesh_tex_coord_buffer", &mesh.tex_coords),
            normals: vertex_buffer("mesh_normal_buffer", &mesh.normals),
            vertex_count: mesh.vertex_count() as u32,
        });
        tracing::debug!("uploaded mesh with {} triangles", mesh.triangle_count());
        Ok(())
    }

    /// Upload a texture with a full mip chain and bind it.
    pub fn set_texture(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, texture: &Texture) {
        self.texture_view = upload_texture(device, queue, texture);
        self.bind_group = Self::create_bind_group(
            device,
            &self.bind_group_layout,
            &self.uniform_buffer,
            &self.texture_view,
            &self.sampler,
        );
        self.texture_bound = true;
        tracing::debug!("bound {}x{} texture", texture.width(), texture.height());
    }

    pub fn swap_yz(&mut self, swap: bool) {
        self.state.swap_yz = swap;
    }

    pub fn show_texture(&mut self, show: bool) {
        self.state.show_texture = show;
    }

    pub fn set_light_dir(&mut self, x: f32, y: f32, z: f32) {
        self.state.light_dir = glam::vec3(x, y, z);
    }

    pub fn set_shininess(&mut self, shininess: f32) {
        self.state.shininess = shininess;
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = create_depth_texture(device, width, height);
    }

    /// Render one frame: clear, then draw the mesh if one is set.
    pub fn draw(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        matrices: &ViewMatrices,
    ) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&MeshUniforms::new(matrices, &self.state, self.texture_bound)),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("mesh_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mesh_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.1,
                            g: 0.1,
                            b: 0.15,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            if let Some(mesh) = &self.mesh {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.positions.slice(..));
                pass.set_vertex_buffer(1, mesh.tex_coords.slice(..));
                pass.set_vertex_buffer(2, mesh.normals.slice(..));
                pass.draw(0..mesh.vertex_count, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

/// Create an sRGB texture holding `texture` and its CPU-built mip chain.
fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &Texture,
) -> wgpu::TextureView {
    let levels = texture.mip_chain();
    let gpu_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("mesh_texture"),
        size: wgpu::Extent3d {
            width: texture.width(),
            height: texture.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: levels.len() as u32,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: crate::TEXEL_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    for (mip_level, level) in levels.iter().enumerate() {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &gpu_texture,
                mip_level: mip_level as u32,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            level.rgba8(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * level.width()),
                rows_per_image: Some(level.height()),
            },
            wgpu::Extent3d {
                width: level.width(),
                height: level.height(),
                depth_or_array_layers: 1,
            },
        );
    }

    gpu_texture.create_view(&Default::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn uniform_block_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<MeshUniforms>(), 272);
    }

    #[test]
    fn display_requires_bound_texture() {
        let matrices = lumen_render::OrbitView::default().matrices(1.0);
        let state = MeshDrawState::default();
        assert_eq!(MeshUniforms::new(&matrices, &state, false).display, 0);
        assert_eq!(MeshUniforms::new(&matrices, &state, true).display, 1);
        let hidden = MeshDrawState {
            show_texture: false,
            ..state
        };
        assert_eq!(MeshUniforms::new(&matrices, &hidden, true).display, 0);
    }

    #[test]
    fn normal_matrix_columns_are_padded() {
        let cols = mat3_columns(Mat3::from_diagonal(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(cols[1], [0.0, 2.0, 0.0, 0.0]);
        assert_eq!(cols[2][3], 0.0);
    }

    #[test]
    fn depth_range_is_remapped() {
        let matrices = lumen_render::OrbitView::default().matrices(1.0);
        let u = MeshUniforms::new(&matrices, &MeshDrawState::default(), false);
        let mvp = Mat4::from_cols_array_2d(&u.mvp);
        // The default view sits 3 units away, so object z = -1.74 lies on
        // the near plane and z = 1.74 on the far plane.
        let near = mvp * glam::Vec4::new(0.0, 0.0, -1.74, 1.0);
        let far = mvp * glam::Vec4::new(0.0, 0.0, 1.74, 1.0);
        assert!((near.z / near.w).abs() < 1e-4);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }
}
