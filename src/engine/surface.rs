//! Drawable surface seam and the logical/physical pixel mapping.
//!
//! [`SurfaceAdapter`] owns the mapping between logical dimensions, device
//! pixel density and the physical backing store of a [`DrawTarget`]. The
//! mapping is recomputed wholesale on every [`SurfaceAdapter::fit`], never
//! patched incrementally. [`RasterSurface`] is the in-crate RGBA target used
//! by the demo binary, bench and tests.

use std::cell::RefCell;
use std::rc::Rc;

use log::trace;

use super::host::Viewport;

/// Straight (non-premultiplied) RGBA color with a float alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Host-drawable raster target.
///
/// All drawing calls after [`set_scale`](DrawTarget::set_scale) use logical
/// coordinates; the target maps them onto its physical backing store.
pub trait DrawTarget {
    /// Resize the physical backing store, discarding previous contents.
    fn resize(&mut self, physical_width: u32, physical_height: u32);
    /// Install a uniform scale so draw calls use logical coordinates.
    fn set_scale(&mut self, scale: f64);
    /// Clear the given logical region to transparent.
    fn clear(&mut self, logical_width: f64, logical_height: f64);
    /// Fill an axis-aligned logical rectangle, alpha-blending over the
    /// existing contents.
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgba);
}

impl<T: DrawTarget> DrawTarget for Rc<RefCell<T>> {
    fn resize(&mut self, physical_width: u32, physical_height: u32) {
        self.borrow_mut().resize(physical_width, physical_height)
    }

    fn set_scale(&mut self, scale: f64) {
        self.borrow_mut().set_scale(scale)
    }

    fn clear(&mut self, logical_width: f64, logical_height: f64) {
        self.borrow_mut().clear(logical_width, logical_height)
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgba) {
        self.borrow_mut().fill_rect(x, y, width, height, color)
    }
}

/// Current logical dimensions and pixel density of the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceDimensions {
    /// Logical width in whole pixels.
    pub logical_width: u32,
    /// Logical height in whole pixels.
    pub logical_height: u32,
    /// Device pixel ratio, clamped to [1, 3].
    pub dpr: f64,
}

impl Default for SurfaceDimensions {
    fn default() -> Self {
        Self {
            logical_width: 0,
            logical_height: 0,
            dpr: 1.0,
        }
    }
}

/// Owns the viewport-to-backing-store mapping.
#[derive(Debug, Default)]
pub struct SurfaceAdapter {
    dims: SurfaceDimensions,
}

impl SurfaceAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refit the target to the current environment reading.
    ///
    /// Reads viewport size and pixel density fresh, clamps density to
    /// [1, 3], floors the logical dimensions, resizes the backing store to
    /// `floor(logical * density)` per axis and installs the scale transform.
    /// Idempotent; safe to call whether or not rendering is running.
    pub fn fit(&mut self, viewport: &dyn Viewport, target: &mut dyn DrawTarget) -> SurfaceDimensions {
        let (view_width, view_height) = viewport.size();
        let raw_dpr = viewport.device_pixel_ratio();
        let dpr = if raw_dpr.is_finite() {
            raw_dpr.clamp(1.0, 3.0)
        } else {
            1.0
        };

        let logical_width = view_width.max(0.0).floor() as u32;
        let logical_height = view_height.max(0.0).floor() as u32;

        let physical_width = (logical_width as f64 * dpr).floor() as u32;
        let physical_height = (logical_height as f64 * dpr).floor() as u32;

        target.resize(physical_width, physical_height);
        target.set_scale(dpr);

        self.dims = SurfaceDimensions {
            logical_width,
            logical_height,
            dpr,
        };
        trace!(
            "surface fit: {}x{} logical @ dpr {} -> {}x{} physical",
            logical_width, logical_height, dpr, physical_width, physical_height
        );
        self.dims
    }

    /// The dimensions computed by the most recent [`fit`](Self::fit).
    pub fn dimensions(&self) -> SurfaceDimensions {
        self.dims
    }
}

/// In-memory RGBA backing store.
///
/// Data is stored as a flat `[y * width + x] * 4` byte array. `fill_rect`
/// blends source-over, matching what a 2D canvas does with a translucent
/// fill style.
#[derive(Debug, Default)]
pub struct RasterSurface {
    physical_width: u32,
    physical_height: u32,
    scale: f64,
    pixels: Vec<u8>,
}

impl RasterSurface {
    pub fn new() -> Self {
        Self {
            scale: 1.0,
            ..Self::default()
        }
    }

    /// Raw RGBA bytes of the backing store.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn physical_size(&self) -> (u32, u32) {
        (self.physical_width, self.physical_height)
    }

    /// Read one physical pixel as RGBA bytes.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = (y as usize * self.physical_width as usize + x as usize) * 4;
        [
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
            self.pixels[offset + 3],
        ]
    }

    fn blend_pixel(&mut self, x: i64, y: i64, color: Rgba) {
        if x < 0 || y < 0 || x >= self.physical_width as i64 || y >= self.physical_height as i64 {
            return;
        }
        let offset = (y as usize * self.physical_width as usize + x as usize) * 4;
        let src_a = color.a.clamp(0.0, 1.0);
        let dst_a = self.pixels[offset + 3] as f32 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        if out_a <= 0.0 {
            return;
        }
        let blend = |src: u8, dst: u8| -> u8 {
            let src = src as f32 / 255.0;
            let dst = dst as f32 / 255.0;
            let out = (src * src_a + dst * dst_a * (1.0 - src_a)) / out_a;
            (out * 255.0).round() as u8
        };
        self.pixels[offset] = blend(color.r, self.pixels[offset]);
        self.pixels[offset + 1] = blend(color.g, self.pixels[offset + 1]);
        self.pixels[offset + 2] = blend(color.b, self.pixels[offset + 2]);
        self.pixels[offset + 3] = (out_a * 255.0).round() as u8;
    }
}

impl DrawTarget for RasterSurface {
    fn resize(&mut self, physical_width: u32, physical_height: u32) {
        self.physical_width = physical_width;
        self.physical_height = physical_height;
        self.pixels = vec![0u8; physical_width as usize * physical_height as usize * 4];
    }

    fn set_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    fn clear(&mut self, _logical_width: f64, _logical_height: f64) {
        self.pixels.fill(0);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: Rgba) {
        let x0 = (x * self.scale).floor() as i64;
        let y0 = (y * self.scale).floor() as i64;
        let x1 = ((x + width) * self.scale).ceil() as i64;
        let y1 = ((y + height) * self.scale).ceil() as i64;
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_pixel(px, py, color);
            }
        }
    }
}
