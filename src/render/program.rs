//! Compiled pipelines paired with their named uniform blocks.

use std::fs;
use std::path::{Path, PathBuf};

use glam::{Mat4, Vec3};
use log::debug;

use crate::error::ShaderCompileError;
use crate::geometry::vertex_buffer_layouts;

use super::commands::ProgramKind;
use super::depth::{DepthBuffer, DepthTarget};
use super::uniforms::{names, UniformBlock, UniformLayout, Uniforms};

const SCENE_VERTEX: &str = include_str!("../../assets/shaders/scene_vertex.wgsl");
const SCENE_FRAGMENT: &str = include_str!("../../assets/shaders/scene_fragment.wgsl");
const SHADOW_VERTEX: &str = include_str!("../../assets/shaders/shadow_vertex.wgsl");
const SHADOW_FRAGMENT: &str = include_str!("../../assets/shaders/shadow_fragment.wgsl");

/// WGSL text for one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramSource {
    pub label: String,
    pub vertex: String,
    pub fragment: String,
}

impl ProgramSource {
    pub fn builtin_scene() -> Self {
        Self {
            label: "scene".into(),
            vertex: SCENE_VERTEX.into(),
            fragment: SCENE_FRAGMENT.into(),
        }
    }

    pub fn builtin_shadow() -> Self {
        Self {
            label: "shadow".into(),
            vertex: SHADOW_VERTEX.into(),
            fragment: SHADOW_FRAGMENT.into(),
        }
    }

    pub fn from_files(
        label: &str,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderCompileError> {
        Ok(Self {
            label: label.to_string(),
            vertex: read_source(vertex_path.as_ref())?,
            fragment: read_source(fragment_path.as_ref())?,
        })
    }

    /// Loads `<kind>_vertex.wgsl` and `<kind>_fragment.wgsl` from `dir`.
    pub fn from_dir(dir: impl AsRef<Path>, kind: ProgramKind) -> Result<Self, ShaderCompileError> {
        let dir = dir.as_ref();
        let stem = program_stem(kind);
        Self::from_files(
            stem,
            dir.join(format!("{stem}_vertex.wgsl")),
            dir.join(format!("{stem}_fragment.wgsl")),
        )
    }
}

fn program_stem(kind: ProgramKind) -> &'static str {
    match kind {
        ProgramKind::Scene => "scene",
        ProgramKind::Shadow => "shadow",
    }
}

fn read_source(path: &Path) -> Result<String, ShaderCompileError> {
    fs::read_to_string(path).map_err(|source| ShaderCompileError::Read {
        path: PathBuf::from(path),
        source,
    })
}

/// Uniform struct of the scene program, in WGSL declaration order.
pub fn scene_uniform_layout() -> UniformLayout {
    UniformLayout::new()
        .mat4(names::PROJECTION_MATRIX)
        .mat4(names::VIEW_MATRIX)
        .mat4(names::MODEL_MATRIX)
        .mat4(names::LIGHT_VIEW_PROJ_MATRIX)
        .vec3(names::LIGHT_POSITION)
        .float(names::LIGHT_CUTOFF_INNER)
        .vec3(names::LIGHT_DIRECTION)
        .float(names::LIGHT_CUTOFF_OUTER)
        .vec3(names::LIGHT_COLOR)
        .float(names::LIGHT_NEAR_PLANE)
        .vec3(names::OBJECT_COLOR)
        .float(names::LIGHT_FAR_PLANE)
        .vec3(names::VIEW_POSITION)
        .int(names::SHADOWS_ENABLED)
}

/// Uniform struct of the shadow program.
pub fn shadow_uniform_layout() -> UniformLayout {
    UniformLayout::new()
        .mat4(names::LIGHT_VIEW_PROJ_MATRIX)
        .mat4(names::MODEL_MATRIX)
}

/// A render pipeline plus the uniform block feeding it.
pub struct ShaderProgram {
    pipeline: wgpu::RenderPipeline,
    uniforms: UniformBlock,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    shadow_bind_group: Option<wgpu::BindGroup>,
}

impl ShaderProgram {
    /// Depth-only program rendering into the shadow map.
    pub fn compile_shadow(
        device: &wgpu::Device,
        source: &ProgramSource,
    ) -> Result<Self, ShaderCompileError> {
        let layout = shadow_uniform_layout();
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let (vertex, fragment) = create_modules(device, source);
        let (uniform_layout, uniform_buffer, uniform_bind_group) =
            create_uniform_binding(device, &source.label, &layout);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow-pipeline-layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });
        let buffers = vertex_buffer_layouts();
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shadow-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            primitive: primitive_state(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthTarget::FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &fragment,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[],
            }),
            multiview: None,
            cache: None,
        });
        finish_scope(device, &source.label)?;
        debug!("compiled {} program", source.label);

        Ok(Self {
            pipeline,
            uniforms: UniformBlock::new(layout),
            uniform_buffer,
            uniform_bind_group,
            shadow_bind_group: None,
        })
    }

    /// Lit program rendering into the window. The shadow map is bound here
    /// once and stays bound for the lifetime of the program.
    pub fn compile_scene(
        device: &wgpu::Device,
        source: &ProgramSource,
        surface_format: wgpu::TextureFormat,
        shadow_map: &DepthTarget,
    ) -> Result<Self, ShaderCompileError> {
        let layout = scene_uniform_layout();
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let (vertex, fragment) = create_modules(device, source);
        let (uniform_layout, uniform_buffer, uniform_bind_group) =
            create_uniform_binding(device, &source.label, &layout);

        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow-map-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });
        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow-map-bind-group"),
            layout: &shadow_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(shadow_map.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(shadow_map.sampler()),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene-pipeline-layout"),
            bind_group_layouts: &[&uniform_layout, &shadow_layout],
            push_constant_ranges: &[],
        });
        let buffers = vertex_buffer_layouts();
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("scene-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            primitive: primitive_state(),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DepthBuffer::FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &fragment,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            multiview: None,
            cache: None,
        });
        finish_scope(device, &source.label)?;
        debug!("compiled {} program", source.label);

        Ok(Self {
            pipeline,
            uniforms: UniformBlock::new(layout),
            uniform_buffer,
            uniform_bind_group,
            shadow_bind_group: Some(shadow_bind_group),
        })
    }

    /// Commits changed uniforms to the GPU buffer.
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        if let Some(bytes) = self.uniforms.take_dirty() {
            queue.write_buffer(&self.uniform_buffer, 0, bytes);
        }
    }

    /// Makes this program current for the pass.
    pub fn bind(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        if let Some(group) = &self.shadow_bind_group {
            pass.set_bind_group(1, group, &[]);
        }
    }

    pub fn destroy(&self) {
        self.uniform_buffer.destroy();
    }
}

impl Uniforms for ShaderProgram {
    fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.uniforms.set_mat4(name, value);
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.uniforms.set_vec3(name, value);
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.uniforms.set_float(name, value);
    }

    fn set_int(&mut self, name: &str, value: i32) {
        self.uniforms.set_int(name, value);
    }
}

fn create_modules(
    device: &wgpu::Device,
    source: &ProgramSource,
) -> (wgpu::ShaderModule, wgpu::ShaderModule) {
    let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{}-vertex", source.label)),
        source: wgpu::ShaderSource::Wgsl(source.vertex.as_str().into()),
    });
    let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{}-fragment", source.label)),
        source: wgpu::ShaderSource::Wgsl(source.fragment.as_str().into()),
    });
    (vertex, fragment)
}

fn create_uniform_binding(
    device: &wgpu::Device,
    label: &str,
    layout: &UniformLayout,
) -> (wgpu::BindGroupLayout, wgpu::Buffer, wgpu::BindGroup) {
    let size = layout.size() as u64;
    let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("{label}-uniform-layout")),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(size),
            },
            count: None,
        }],
    });
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(&format!("{label}-uniforms")),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("{label}-uniform-bind-group")),
        layout: &bind_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    });
    (bind_layout, buffer, bind_group)
}

fn primitive_state() -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: Some(wgpu::Face::Back),
        polygon_mode: wgpu::PolygonMode::Fill,
        ..Default::default()
    }
}

fn finish_scope(device: &wgpu::Device, label: &str) -> Result<(), ShaderCompileError> {
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(ShaderCompileError::Compile {
            program: label.to_string(),
            log: err.to_string(),
        }),
        None => Ok(()),
    }
}
