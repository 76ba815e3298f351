//! Front and back cover artwork.
//!
//! Covers have no image asset. The background is a horizontal grey gradient
//! generated on the CPU; the text is painted on top with glyphon, straight
//! into the cover texture, so it turns with the page.

use glyphon::{
    Cache, Color, FamilyOwned, FontSystem, Resolution, SwashCache, TextAtlas, TextRenderer,
    Viewport,
};
use tracing::warn;

use crate::chrome::text::TextBlock;
use crate::layout::Rect;

const GRADIENT_START: [u8; 3] = [0xF3, 0xF4, 0xF6];
const GRADIENT_END: [u8; 3] = [0xE5, 0xE7, 0xEB];
/// Cover texture width in pixels; the height follows the page aspect.
const COVER_WIDTH: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverText {
    pub title: String,
    pub subtitle: String,
}

/// Pixel size of a cover texture for a page laid out as
/// `height = width * aspect_ratio`.
pub fn cover_size(aspect_ratio: f32) -> (u32, u32) {
    let height = (COVER_WIDTH as f32 * aspect_ratio).round().clamp(1.0, 4096.0) as u32;
    (COVER_WIDTH, height)
}

/// RGBA8 (sRGB) left-to-right gradient.
pub fn gradient_pixels(width: u32, height: u32) -> Vec<u8> {
    let width = width.max(1);
    let height = height.max(1);
    let mut row = Vec::with_capacity(width as usize * 4);
    for x in 0..width {
        let t = if width == 1 {
            0.0
        } else {
            x as f32 / (width - 1) as f32
        };
        for channel in 0..3 {
            let a = GRADIENT_START[channel] as f32;
            let b = GRADIENT_END[channel] as f32;
            row.push((a + (b - a) * t).round() as u8);
        }
        row.push(255);
    }
    row.repeat(height as usize)
}

/// Draws `text` centred onto `target`, an `Rgba8UnormSrgb` texture of `size`.
#[allow(clippy::too_many_arguments)]
pub fn paint_cover_text(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    font_system: &mut FontSystem,
    family: &FamilyOwned,
    target: &wgpu::TextureView,
    size: (u32, u32),
    text: &CoverText,
    color: Color,
) {
    let (width, height) = size;
    let cache = Cache::new(device);
    let mut viewport = Viewport::new(device, &cache);
    let mut atlas = TextAtlas::new(device, queue, &cache, wgpu::TextureFormat::Rgba8UnormSrgb);
    let mut renderer =
        TextRenderer::new(&mut atlas, device, wgpu::MultisampleState::default(), None);
    let mut swash_cache = SwashCache::new();

    viewport.update(queue, Resolution { width, height });

    let w = width as f32;
    let h = height as f32;
    let title_size = (w * 0.07).max(16.0);
    let subtitle_size = (w * 0.035).max(12.0);
    let mut title = TextBlock::new(font_system, title_size, true, color);
    let mut subtitle = TextBlock::new(font_system, subtitle_size, false, color);
    let margin = w * 0.08;
    title.layout(
        font_system,
        family,
        &text.title,
        Rect::new(margin, h * 0.30, w - 2.0 * margin, h * 0.25),
        1.0,
    );
    subtitle.layout(
        font_system,
        family,
        &text.subtitle,
        Rect::new(margin, h * 0.55, w - 2.0 * margin, h * 0.15),
        1.0,
    );

    if let Err(err) = renderer.prepare(
        device,
        queue,
        font_system,
        &mut atlas,
        &viewport,
        [title.area(1.0, size), subtitle.area(1.0, size)],
        &mut swash_cache,
    ) {
        warn!(error = %err, "cover text prepare failed");
        return;
    }

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("cover-text-encoder"),
    });
    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("cover-text"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        if let Err(err) = renderer.render(&atlas, &viewport, &mut pass) {
            warn!(error = %err, "cover text draw failed");
        }
    }
    queue.submit(std::iter::once(encoder.finish()));
}
