use bevy::prelude::*;
use bevy::reflect::TypePath;
use bevy::render::render_resource::{AsBindGroup, ShaderRef};

/// Unlit material that shows a trail (or any Rgba32Float) texture, tinted.
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct TrailMaterial {
    #[uniform(0)]
    pub tint: LinearRgba, // uniforms want the linear form
    // float32 textures are not filterable, the shader uses textureLoad
    #[texture(1, sample_type = "float", filterable = false)]
    pub trail: Handle<Image>,
}

impl Material for TrailMaterial {
    fn fragment_shader() -> ShaderRef {
        "shaders/trail_material.wgsl".into()
    }
}
