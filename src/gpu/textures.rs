use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat, TextureUsages};

use crate::cpu::feedback::StateView;
use crate::cpu::trail::TrailView;
use crate::error::{FxError, FxResult};
use crate::gpu::ffi::{GpuTexel, TEXEL_BYTES};

// ==================== resources ======================================

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TextureStatus {
    #[default]
    Pending, // nothing uploaded yet
    Ready,
    Unavailable, // failed once, uploads are skipped from now on
}

/// Sampleable copy of the feedback simulation's current grid.
#[derive(Resource, Debug, Clone)]
pub struct FeedbackTexture {
    pub handle: Handle<Image>,
    pub status: TextureStatus,
}

/// Sampleable copy of the trail buffer.
#[derive(Resource, Debug, Clone)]
pub struct TrailTexture {
    pub handle: Handle<Image>,
    pub status: TextureStatus,
}

// =====================================================================

/// Zero-filled float texture that both the app and the render world can see.
pub fn float_texture(width: u32, height: u32) -> Image {
    let mut image = Image::new_fill(
        Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        TextureDimension::D2,
        bytemuck::bytes_of(&GpuTexel::default()),
        TextureFormat::Rgba32Float,
        RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
    );
    image.texture_descriptor.usage =
        TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST | TextureUsages::COPY_SRC;
    image
}

pub fn pack_state(view: &StateView) -> Vec<GpuTexel> {
    view.texels().iter().copied().map(GpuTexel::from).collect()
}

pub fn pack_trail(view: &TrailView) -> Vec<GpuTexel> {
    view.cells.iter().copied().map(GpuTexel::from).collect()
}

/// Writes `texels` into the image, resizing it first if the grid changed size.
///
/// A missing image is reported once: the status flips to `Unavailable` and every later
/// call is a silent no-op, leaving whatever was last uploaded in place.
pub fn upload_texels(
    images: &mut Assets<Image>,
    handle: &Handle<Image>,
    status: &mut TextureStatus,
    width: u32,
    height: u32,
    texels: &[GpuTexel],
) -> FxResult<()> {
    if *status == TextureStatus::Unavailable {
        return Ok(());
    }

    let Some(image) = images.get_mut(handle) else {
        *status = TextureStatus::Unavailable;
        return Err(FxError::ResourceUnavailable { label: "texture asset", texels: texels.len() });
    };

    let size = Extent3d { width, height, depth_or_array_layers: 1 };
    if image.texture_descriptor.size != size {
        info!("resizing effect texture to {width}x{height}");
        image.texture_descriptor.size = size;
    }

    let bytes: &[u8] = bytemuck::cast_slice(texels);
    debug_assert_eq!(bytes.len(), width as usize * height as usize * TEXEL_BYTES);
    image.data = Some(bytes.to_vec());
    *status = TextureStatus::Ready;
    Ok(())
}
