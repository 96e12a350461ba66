use std::fmt;

use image::{GrayImage, Luma, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{FitError, FitResult};

/// Depth × height × width of an image stack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackShape {
    pub depth: usize,
    pub height: usize,
    pub width: usize,
}

impl fmt::Display for StackShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.depth, self.height, self.width)
    }
}

/// Integer rectangle in pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct IntRect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl IntRect {
    #[inline]
    pub(crate) fn empty() -> Self {
        Self { x: 0, y: 0, w: 0, h: 0 }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

// -----------------------------------------------------------------------------
// Single-channel slice
// -----------------------------------------------------------------------------

/// One z-slice of intensities, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Plane {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Plane {
    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self { width, height, data: vec![value; width * height] }
    }

    pub fn from_vec(width: usize, height: usize, data: Vec<f32>) -> FitResult<Self> {
        if data.len() != width * height {
            return Err(FitError::PlaneSizeMismatch {
                width,
                height,
                expected: width * height,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    #[inline]
    pub fn width(&self) -> usize { self.width }
    #[inline]
    pub fn height(&self) -> usize { self.height }
    #[inline]
    pub fn data(&self) -> &[f32] { &self.data }
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] { &mut self.data }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: f32) {
        self.data[y * self.width + x] = value;
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    /// 8-bit display copy; values are clamped to [0, 1] before scaling.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            Luma([unit_to_u8(self.get(x as usize, y as usize))])
        })
    }
}

// -----------------------------------------------------------------------------
// RGB slice (outline overlays)
// -----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct RgbPlane {
    width: usize,
    height: usize,
    data: Vec<[f32; 3]>,
}

impl RgbPlane {
    /// Grey replicated into all three channels.
    pub fn from_gray(plane: &Plane) -> Self {
        Self {
            width: plane.width,
            height: plane.height,
            data: plane.data.iter().map(|&v| [v, v, v]).collect(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize { self.width }
    #[inline]
    pub fn height(&self) -> usize { self.height }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [f32; 3] {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, rgb: [f32; 3]) {
        self.data[y * self.width + x] = rgb;
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let [r, g, b] = self.get(x as usize, y as usize);
            Rgb([unit_to_u8(r), unit_to_u8(g), unit_to_u8(b)])
        })
    }
}

#[inline]
fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

// -----------------------------------------------------------------------------
// Stack of slices
// -----------------------------------------------------------------------------

/// Depth-ordered z-slices sharing one width/height.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageStack {
    width: usize,
    height: usize,
    planes: Vec<Plane>,
}

impl ImageStack {
    pub fn from_planes(planes: Vec<Plane>) -> FitResult<Self> {
        let Some(first) = planes.first() else {
            return Err(FitError::EmptyStack);
        };
        let (width, height) = (first.width, first.height);
        if width == 0 || height == 0 {
            return Err(FitError::EmptyStack);
        }
        for (index, p) in planes.iter().enumerate() {
            if p.width != width || p.height != height {
                return Err(FitError::RaggedStack {
                    index,
                    width,
                    height,
                    actual_width: p.width,
                    actual_height: p.height,
                });
            }
        }
        Ok(Self { width, height, planes })
    }

    /// `depth` slices of `width`×`height`, all set to `value`.
    pub fn filled(depth: usize, width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            planes: (0..depth).map(|_| Plane::filled(width, height, value)).collect(),
        }
    }

    pub fn shape(&self) -> StackShape {
        StackShape { depth: self.planes.len(), height: self.height, width: self.width }
    }

    #[inline]
    pub fn width(&self) -> usize { self.width }
    #[inline]
    pub fn height(&self) -> usize { self.height }
    #[inline]
    pub fn depth(&self) -> usize { self.planes.len() }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    pub fn plane(&self, z: usize) -> &Plane {
        &self.planes[z]
    }

    pub fn plane_mut(&mut self, z: usize) -> &mut Plane {
        &mut self.planes[z]
    }

    pub(crate) fn from_planes_unchecked(width: usize, height: usize, planes: Vec<Plane>) -> Self {
        debug_assert!(planes.iter().all(|p| p.width == width && p.height == height));
        Self { width, height, planes }
    }
}
