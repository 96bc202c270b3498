//! Opaque render capability consumed by the reprojection engine
//!
//! The engine never touches the GPU directly: it drives a [`RenderBackend`]
//! that owns texture allocation and the fixed set of pipelines the engine
//! needs. Hardware motion estimation is optional; the backend reports its
//! presence once and the engine resolves the fallback at construction.

/// Opaque GPU texture handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Pixel format of an engine-allocated texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// Single-channel luminance, motion-estimation input
    R8,
    /// Per-block 2-D motion vectors
    Rgba16F,
    /// Warped output frame
    Rgb8,
}

/// Dimensions and format of an engine-allocated texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
}

/// GPU operations the reprojection engine depends on
///
/// All operations are issued asynchronously to the GPU; the engine's own
/// state transitions stay synchronous on the render thread.
pub trait RenderBackend {
    /// Allocate a texture; zero-initialized
    fn create_texture(&mut self, desc: TextureDesc) -> TextureId;

    /// Convert `src` to single-channel luminance in `dst`
    fn luminance(&mut self, src: TextureId, dst: TextureId);

    /// Run block motion estimation from `reference` to `target`, writing the
    /// per-block displacement field into `out`
    fn estimate_motion(&mut self, reference: TextureId, target: TextureId, out: TextureId);

    /// Warp `src` by the `motion` field scaled with `magnitude` into `out`
    /// (sample `src` at `uv + motion(uv) * -magnitude`)
    fn warp(&mut self, src: TextureId, motion: TextureId, magnitude: f32, out: TextureId);

    /// Whether the hardware motion-estimation primitive is present
    ///
    /// Queried once at engine construction; a backend without it never
    /// receives [`estimate_motion`](Self::estimate_motion) calls.
    fn supports_motion_estimation(&self) -> bool;
}
