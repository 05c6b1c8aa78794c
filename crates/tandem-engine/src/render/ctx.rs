/// Target for drawing: encoder, color view and the view's format and size.
///
/// The format and size let renderers build pipelines and depth buffers
/// without reaching back into the surface.
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub color_view: &'a wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    /// Physical pixels.
    pub size: (u32, u32),
}

impl<'a> RenderTarget<'a> {
    #[inline]
    pub fn new(
        encoder: &'a mut wgpu::CommandEncoder,
        color_view: &'a wgpu::TextureView,
        format: wgpu::TextureFormat,
        size: (u32, u32),
    ) -> Self {
        Self {
            encoder,
            color_view,
            format,
            size,
        }
    }

    /// Width over height, `1.0` for a degenerate target.
    pub fn aspect(&self) -> f32 {
        if self.size.1 == 0 {
            1.0
        } else {
            self.size.0 as f32 / self.size.1 as f32
        }
    }
}
