use bytemuck::{Pod, Zeroable};
use tracing::debug;

use crate::events::PreparedImageCpu;
use crate::layout::{ViewportSize, contain_uv_scale};

use super::animation::{PageQuad, QuadSource};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct PageVertex {
    position: [f32; 2],
    uv: [f32; 2],
    tint: [f32; 4],
}

impl PageVertex {
    fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
            wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x4];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PageVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct PageParams {
    uv_scale: [f32; 2],
    has_image: f32,
    _pad: f32,
    paper: [f32; 4],
}

const CORNER_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
const INITIAL_QUAD_CAPACITY: usize = 8;
/// Reverse side of a turning page is slightly darker than its front.
const BACK_SHADE: f32 = 0.92;

struct PageSlot {
    _texture: wgpu::Texture,
    params: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    /// Pixel size of the image when the slot shows one; covers and failed
    /// pages fill the page without letterboxing.
    image_size: Option<(u32, u32)>,
    has_texture: bool,
}

/// Draws flipbook quads: one textured slot per page plus the shared page
/// back and fold shadow.
pub struct PageRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    vertex_buffer: wgpu::Buffer,
    quad_capacity: usize,
    paper: [f32; 4],
    pages: Vec<PageSlot>,
    back: PageSlot,
    shadow: PageSlot,
    draws: Vec<QuadSource>,
    page_aspect: f32,
}

impl PageRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        page_count: usize,
        paper: [f32; 4],
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("flipbook-page-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("page.wgsl").into()),
        });

        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("flipbook-page-bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("flipbook-page-pipeline-layout"),
            bind_group_layouts: &[&bind_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("flipbook-page-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs"),
                buffers: &[PageVertex::layout()],
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
                topology: wgpu::PrimitiveTopology::TriangleStrip,
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

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("flipbook-page-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let vertex_buffer = create_vertex_buffer(device, INITIAL_QUAD_CAPACITY);

        let blank = |label: &str| blank_slot(device, queue, &bind_layout, &sampler, label);
        let back = blank("flipbook-page-back");
        let shadow = blank("flipbook-shadow");
        let pages = (0..page_count).map(|_| blank("flipbook-page")).collect();

        let renderer = Self {
            pipeline,
            bind_layout,
            sampler,
            vertex_buffer,
            quad_capacity: INITIAL_QUAD_CAPACITY,
            paper,
            pages,
            back,
            shadow,
            draws: Vec::new(),
            page_aspect: 0.0,
        };
        renderer.write_static_params(queue);
        renderer
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Shows a decoded catalog image on `page`, letterboxed on paper.
    pub fn set_page_image(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        page: usize,
        image: &PreparedImageCpu,
    ) {
        if page >= self.pages.len() {
            debug!(page, "ignoring image for page outside the book");
            return;
        }
        let texture = upload_texture(
            device,
            queue,
            "flipbook-page-image",
            image.width,
            image.height,
            &image.pixels,
            wgpu::TextureUsages::empty(),
        );
        self.pages[page] = make_slot(
            device,
            &self.bind_layout,
            &self.sampler,
            texture,
            Some((image.width, image.height)),
        );
        self.write_page_params(queue, page);
    }

    /// Fills `page` edge to edge with `pixels` and returns a view that can be
    /// rendered into afterwards (cover text is painted this way).
    pub fn set_cover(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        page: usize,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Option<wgpu::TextureView> {
        if page >= self.pages.len() {
            return None;
        }
        let texture = upload_texture(
            device,
            queue,
            "flipbook-cover",
            width,
            height,
            pixels,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.pages[page] = make_slot(device, &self.bind_layout, &self.sampler, texture, None);
        self.write_page_params(queue, page);
        Some(view)
    }

    /// Converts `quads` (logical pixels) into vertices for this frame.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        quads: &[PageQuad],
        viewport: ViewportSize,
        page_aspect: f32,
    ) {
        if (page_aspect - self.page_aspect).abs() > f32::EPSILON {
            self.page_aspect = page_aspect;
            for page in 0..self.pages.len() {
                self.write_page_params(queue, page);
            }
        }

        if quads.len() > self.quad_capacity {
            self.quad_capacity = quads.len().next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(device, self.quad_capacity);
        }

        self.draws.clear();
        let mut vertices = Vec::with_capacity(quads.len() * 4);
        for quad in quads {
            if matches!(quad.source, QuadSource::Page(page) if page >= self.pages.len()) {
                continue;
            }
            let shadow = if quad.source == QuadSource::Shadow { 1.0 } else { 0.0 };
            for (corner, uv) in quad.corners.iter().zip(CORNER_UVS) {
                vertices.push(PageVertex {
                    position: to_ndc(*corner, viewport),
                    uv,
                    tint: [quad.brightness, quad.alpha.clamp(0.0, 1.0), shadow, 0.0],
                });
            }
            self.draws.push(quad.source);
        }
        if !vertices.is_empty() {
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.draws.is_empty() {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        for (i, source) in self.draws.iter().enumerate() {
            let slot = match source {
                QuadSource::Page(page) => &self.pages[*page],
                QuadSource::PaperBack => &self.back,
                QuadSource::Shadow => &self.shadow,
            };
            pass.set_bind_group(0, &slot.bind_group, &[]);
            let first = (i * 4) as u32;
            pass.draw(first..first + 4, 0..1);
        }
    }

    fn write_page_params(&self, queue: &wgpu::Queue, page: usize) {
        let slot = &self.pages[page];
        let uv_scale = match slot.image_size {
            Some((w, h)) => contain_uv_scale(w, h, self.page_aspect),
            None => [1.0, 1.0],
        };
        let params = PageParams {
            uv_scale,
            has_image: if slot.has_texture { 1.0 } else { 0.0 },
            _pad: 0.0,
            paper: self.paper,
        };
        queue.write_buffer(&slot.params, 0, bytemuck::bytes_of(&params));
    }

    fn write_static_params(&self, queue: &wgpu::Queue) {
        let [r, g, b, a] = self.paper;
        let back = PageParams {
            uv_scale: [1.0, 1.0],
            has_image: 0.0,
            _pad: 0.0,
            paper: [r * BACK_SHADE, g * BACK_SHADE, b * BACK_SHADE, a],
        };
        let shadow = PageParams {
            uv_scale: [1.0, 1.0],
            has_image: 0.0,
            _pad: 0.0,
            paper: [0.0, 0.0, 0.0, 1.0],
        };
        queue.write_buffer(&self.back.params, 0, bytemuck::bytes_of(&back));
        queue.write_buffer(&self.shadow.params, 0, bytemuck::bytes_of(&shadow));
        for page in 0..self.pages.len() {
            self.write_page_params(queue, page);
        }
    }
}

fn blank_slot(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    label: &str,
) -> PageSlot {
    let texture = upload_texture(
        device,
        queue,
        label,
        1,
        1,
        &[255, 255, 255, 255],
        wgpu::TextureUsages::empty(),
    );
    let mut slot = make_slot(device, layout, sampler, texture, None);
    slot.has_texture = false;
    slot
}

fn make_slot(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    texture: wgpu::Texture,
    image_size: Option<(u32, u32)>,
) -> PageSlot {
    let params = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("flipbook-page-params"),
        size: std::mem::size_of::<PageParams>() as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("flipbook-page-bind-group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: params.as_entire_binding(),
            },
        ],
    });
    PageSlot {
        _texture: texture,
        params,
        bind_group,
        image_size,
        has_texture: true,
    }
}

fn create_vertex_buffer(device: &wgpu::Device, quads: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("flipbook-vertices"),
        size: (quads * 4 * std::mem::size_of::<PageVertex>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    pixels: &[u8],
    extra_usage: wgpu::TextureUsages,
) -> wgpu::Texture {
    let size = wgpu::Extent3d {
        width: width.max(1),
        height: height.max(1),
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST | extra_usage,
        view_formats: &[],
    });
    queue.write_texture(
        texture.as_image_copy(),
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * size.width),
            rows_per_image: Some(size.height),
        },
        size,
    );
    texture
}

fn to_ndc(point: [f32; 2], viewport: ViewportSize) -> [f32; 2] {
    let width = viewport.width.max(1.0);
    let height = viewport.height.max(1.0);
    [
        (point[0] / width) * 2.0 - 1.0,
        1.0 - (point[1] / height) * 2.0,
    ]
}
