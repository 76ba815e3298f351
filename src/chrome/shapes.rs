use bytemuck::{Pod, Zeroable};
use lyon::math::{Box2D, point};
use lyon::path::builder::BorderRadii;
use lyon::path::{Path, Winding};
use lyon::tessellation::{BuffersBuilder, FillOptions, FillTessellator, FillVertex, VertexBuffers};
use tracing::warn;
use wgpu::util::DeviceExt;

use crate::layout::{Rect, ViewportSize};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ShapeVertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl ShapeVertex {
    fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
            wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ShapeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Filled rounded rectangle in logical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoundedRect {
    pub rect: Rect,
    pub radius: f32,
    pub color: [f32; 4],
}

/// Tessellates `shapes` in order into one NDC mesh for `viewport`.
pub fn tessellate(
    shapes: &[RoundedRect],
    viewport: ViewportSize,
) -> Option<VertexBuffers<ShapeVertex, u16>> {
    let width = viewport.width.max(1.0);
    let height = viewport.height.max(1.0);
    let mut buffers: VertexBuffers<ShapeVertex, u16> = VertexBuffers::new();
    let mut tessellator = FillTessellator::new();

    for shape in shapes {
        if shape.rect.width <= 0.0 || shape.rect.height <= 0.0 {
            continue;
        }
        let radius = shape
            .radius
            .clamp(0.0, shape.rect.width.min(shape.rect.height) * 0.5);
        let mut builder = Path::builder();
        builder.add_rounded_rectangle(
            &Box2D::new(
                point(shape.rect.x, shape.rect.y),
                point(shape.rect.right(), shape.rect.bottom()),
            ),
            &BorderRadii::new(radius),
            Winding::Positive,
        );
        let path = builder.build();

        let color = shape.color;
        if let Err(err) = tessellator.tessellate_path(
            &path,
            &FillOptions::default(),
            &mut BuffersBuilder::new(&mut buffers, |vertex: FillVertex| {
                let [x, y] = vertex.position().to_array();
                ShapeVertex {
                    position: [(x / width) * 2.0 - 1.0, 1.0 - (y / height) * 2.0],
                    color,
                }
            }),
        ) {
            warn!(error = %err, "chrome shape tessellation failed");
            return None;
        }
    }

    (!buffers.indices.is_empty()).then_some(buffers)
}

pub struct ShapeRenderer {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
}

impl ShapeRenderer {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("chrome-shape-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shapes.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("chrome-shape-pipeline-layout"),
            bind_group_layouts: &[],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("chrome-shape-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[ShapeVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            vertex_buffer: None,
            index_buffer: None,
            index_count: 0,
        }
    }

    pub fn update(&mut self, device: &wgpu::Device, shapes: &[RoundedRect], viewport: ViewportSize) {
        let Some(geometry) = tessellate(shapes, viewport) else {
            self.vertex_buffer = None;
            self.index_buffer = None;
            self.index_count = 0;
            return;
        };

        self.vertex_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("chrome-shape-vertices"),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.index_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("chrome-shape-indices"),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        }));
        self.index_count = geometry.indices.len() as u32;
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.index_count == 0 {
            return;
        }
        if let (Some(vertex_buffer), Some(index_buffer)) = (&self.vertex_buffer, &self.index_buffer)
        {
            pass.set_pipeline(&self.pipeline);
            pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..self.index_count, 0, 0..1);
        }
    }
}
