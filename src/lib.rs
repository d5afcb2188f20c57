//! # Canny + Hough Library
//!
//! This crate computes edge maps from grayscale images via the Canny pipeline and
//! detects straight lines via the Hough transform. It is a batch computational
//! library: given an in-memory 2-D array of real-valued pixel intensities, it
//! produces derived arrays (gradients, edge masks, vote accumulators). There is
//! no image loading or saving, no visualization and no long-running state —
//! decoding an image into a grayscale buffer and consuming the output arrays are
//! the caller's job.
//!
//! ## Features
//!
//! - 2-D convolution with edge-replicated padding
//! - Normalized Gaussian smoothing kernels
//! - Central-difference gradients with magnitude and direction fields
//! - Non-maximum suppression along the quantized gradient direction
//! - Double thresholding and hysteresis edge linking
//! - Hough line transform into a (rho, theta) vote accumulator
//! - Optional debug logging (enable with `logger` feature)
//!
//! ## Basic Usage
//!
//! ```rust
//! use canny_hough::{canny, hough_transform, CannyParams, ImageF64};
//! use image::{ImageBuffer, Luma};
//!
//! // A vertical step edge: dark on the left, bright on the right.
//! let image: ImageF64 = ImageBuffer::from_fn(64, 64, |x, _y| {
//!     if x < 32 { Luma([0.0]) } else { Luma([255.0]) }
//! });
//!
//! let edges = canny(&image, &CannyParams::default()).unwrap();
//! assert_eq!(edges.dimensions(), image.dimensions());
//!
//! // Vote for lines through the detected edge pixels.
//! let hough = hough_transform(&edges);
//! assert_eq!(hough.thetas.len(), 180);
//! ```
//!
//! ## Tuning the pipeline
//!
//! ```rust
//! use canny_hough::{canny, CannyParams, ImageF64};
//! use image::{ImageBuffer, Luma};
//!
//! let image: ImageF64 = ImageBuffer::from_fn(48, 48, |x, y| {
//!     Luma([if (x / 8 + y / 8) % 2 == 0 { 20.0 } else { 200.0 }])
//! });
//!
//! // Heavier smoothing and wider hysteresis band than the defaults.
//! let params = CannyParams {
//!     kernel_size: 7,
//!     sigma: 2.0,
//!     high: 30.0,
//!     low: 10.0,
//! };
//! let edges = canny(&image, &params).unwrap();
//! let count = edges.pixels().filter(|p| p[0] > 0).count();
//! assert!(count > 0);
//! ```
//!
//! ## Optional Features
//!
//! ### Logger Feature
//!
//! Enable debug logging to monitor the pipeline stages:
//!
//! ```toml
//! [dependencies]
//! canny-hough = { version = "0.1.0", features = ["logger"] }
//! log = "0.4"
//! env_logger = "0.11"
//! ```
//!
//! With the feature enabled and a logger installed you will see messages like:
//!
//! ```text
//! DEBUG canny_hough: smoothed ok
//! DEBUG canny_hough: gradient ok
//! DEBUG canny_hough: thinned ok
//! ```

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::definitions::{HasBlack, HasWhite};
use rayon::prelude::*;
use std::{
    collections::{HashSet, VecDeque},
    f64::consts::PI,
};

// Conditional logging macros
#[cfg(feature = "logger")]
macro_rules! debug {
    ($($arg:tt)*) => {
        log::debug!($($arg)*);
    };
}

#[cfg(not(feature = "logger"))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

/// A dense single-channel image of 64-bit floats.
///
/// Used for input intensities, smoothing kernels and the gradient magnitude and
/// direction fields. There is no implicit value range; callers may supply
/// intensities in `[0, 1]`, `[0, 255]` or anything else — all arithmetic is
/// real-valued.
pub type ImageF64 = ImageBuffer<Luma<f64>, Vec<f64>>;

/// The Hough vote grid: `u64` counts indexed by `(x = theta bin, y = rho bin)`.
pub type HoughAccumulator = ImageBuffer<Luma<u64>, Vec<u64>>;

/// Errors surfaced by the fallible pipeline stages.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EdgeError {
    /// Paired inputs (e.g. magnitude and direction) have different dimensions.
    #[error("shape mismatch: {0}x{1} vs {2}x{3}")]
    ShapeMismatch(u32, u32, u32, u32),

    /// The high threshold is below the low threshold, so no pixel could ever
    /// be classified consistently.
    #[error("high threshold ({high}) is below low threshold ({low})")]
    InvalidThresholds {
        /// The offending high threshold.
        high: f64,
        /// The offending low threshold.
        low: f64,
    },

    /// A quantized gradient direction fell outside the eight canonical
    /// 45-degree bins. Unreachable with directions in `[0, 360)`; seeing this
    /// error means an internal arithmetic bug, not bad user input.
    #[error("quantized gradient direction {0} is not a multiple of 45 in [0, 360)")]
    InvalidGradientDirection(i32),
}

/// Convolves an image with a kernel, producing an output of identical shape.
///
/// The input is padded by replicating its edge pixels (`floor(Hk/2)` rows on
/// top and bottom, `floor(Wk/2)` columns on left and right) rather than
/// zero-padding, which would manufacture large artificial gradients along the
/// image border. This is true convolution — the kernel is flipped in both axes
/// before sliding — and the implementation is the plain O(H·W·Hk·Wk) loop with
/// no FFT or separability shortcuts.
///
/// Kernels are expected to be odd in both dimensions so a unique center pixel
/// exists; even dimensions are not rejected but the center alignment is then
/// implementation-defined.
///
/// # Arguments
///
/// * `image` - Input grayscale image
/// * `kernel` - Convolution kernel, odd in both dimensions
///
/// # Examples
///
/// ```rust
/// use canny_hough::{convolve, ImageF64};
/// use image::ImageBuffer;
///
/// let image: ImageF64 = ImageBuffer::from_fn(8, 6, |x, y| image::Luma([(x + y) as f64]));
/// let identity: ImageF64 = ImageBuffer::from_raw(1, 1, vec![1.0]).unwrap();
///
/// let out = convolve(&image, &identity);
/// assert_eq!(out, image);
/// ```
pub fn convolve(image: &ImageF64, kernel: &ImageF64) -> ImageF64 {
    let (width, height) = image.dimensions();
    let (kw, kh) = kernel.dimensions();
    let (w, h) = (width as usize, height as usize);
    let (kw, kh) = (kw as usize, kh as usize);
    let pad_x = kw / 2;
    let pad_y = kh / 2;

    // Replicate edge pixels into the padded buffer.
    let src = image.as_raw();
    let padded_w = w + 2 * pad_x;
    let padded_h = h + 2 * pad_y;
    let mut padded = vec![0.0; padded_w * padded_h];
    for i in 0..padded_h {
        let sy = (i as i64 - pad_y as i64).clamp(0, h as i64 - 1) as usize;
        for j in 0..padded_w {
            let sx = (j as i64 - pad_x as i64).clamp(0, w as i64 - 1) as usize;
            padded[i * padded_w + j] = src[sy * w + sx];
        }
    }

    // True convolution: flip the kernel in both axes before sliding.
    let kdata = kernel.as_raw();
    let mut flipped = vec![0.0; kw * kh];
    for r in 0..kh {
        for c in 0..kw {
            flipped[r * kw + c] = kdata[(kh - 1 - r) * kw + (kw - 1 - c)];
        }
    }

    // Output rows are independent, so compute them in parallel.
    let mut out = vec![0.0; w * h];
    out.par_chunks_mut(w).enumerate().for_each(|(i, row)| {
        for (j, pixel) in row.iter_mut().enumerate() {
            let mut acc = 0.0;
            for r in 0..kh {
                let window = &padded[(i + r) * padded_w + j..(i + r) * padded_w + j + kw];
                for c in 0..kw {
                    acc += window[c] * flipped[r * kw + c];
                }
            }
            *pixel = acc;
        }
    });

    ImageBuffer::from_raw(width, height, out).unwrap()
}

/// Builds a `size` x `size` normalized Gaussian smoothing kernel.
///
/// The kernel is the outer product of a 1-D Gaussian sample vector centered at
/// `size / 2`, which equals the separable 2-D Gaussian density. No explicit
/// re-normalization is applied after discretization: the entries sum to
/// approximately, but not exactly, 1. The approximation tightens as `size`
/// grows relative to `sigma`; callers must not assume exact unity.
///
/// # Arguments
///
/// * `size` - Kernel side length, expected odd
/// * `sigma` - Standard deviation of the Gaussian
pub fn gaussian_kernel(size: u32, sigma: f64) -> ImageF64 {
    let center = (size / 2) as f64;
    let norm = (2.0 * PI).sqrt() * sigma;
    let samples: Vec<f64> = (0..size)
        .map(|x| {
            let d = x as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp() / norm
        })
        .collect();

    let data: Vec<f64> = samples
        .iter()
        .flat_map(|&gy| samples.iter().map(move |&gx| gy * gx))
        .collect();

    ImageBuffer::from_raw(size, size, data).unwrap()
}

/// Computes the partial x-derivative of an image by central differences.
///
/// Convolves with the 1x3 kernel `[0.5, 0, -0.5]`, so a left-to-right
/// intensity ramp of slope 1 yields a derivative of 1 at interior pixels.
pub fn partial_x(image: &ImageF64) -> ImageF64 {
    let kernel = ImageBuffer::from_raw(3, 1, vec![0.5, 0.0, -0.5]).unwrap();
    convolve(image, &kernel)
}

/// Computes the partial y-derivative of an image by central differences.
///
/// Convolves with the 3x1 kernel `[0.5, 0, -0.5]` transposed.
pub fn partial_y(image: &ImageF64) -> ImageF64 {
    let kernel = ImageBuffer::from_raw(1, 3, vec![0.5, 0.0, -0.5]).unwrap();
    convolve(image, &kernel)
}

/// Computes the gradient magnitude and direction fields of an image.
///
/// Magnitude is the elementwise L2 norm of the two partial derivatives.
/// Direction is `atan2(gy, gx)` in degrees shifted by +180 so the natural
/// `[-180, 180]` range becomes the unsigned `[0, 360)`; a computed value of
/// exactly 360 folds to 0.
///
/// # Returns
///
/// A `(magnitude, direction)` pair of images with the same shape as the input.
/// Magnitude entries are non-negative; direction entries lie in `[0, 360)`.
pub fn gradient(image: &ImageF64) -> (ImageF64, ImageF64) {
    let (width, height) = image.dimensions();
    let gx = partial_x(image);
    let gy = partial_y(image);

    let magnitude: Vec<f64> = gx
        .as_raw()
        .par_iter()
        .zip(gy.as_raw().par_iter())
        .map(|(x, y)| x.hypot(*y))
        .collect();

    let direction: Vec<f64> = gx
        .as_raw()
        .par_iter()
        .zip(gy.as_raw().par_iter())
        .map(|(x, y)| {
            let deg = y.atan2(*x).to_degrees() + 180.0;
            // atan2 tops out at pi, so only an exact 360 needs folding; the
            // >= guard also absorbs the rounding slack of to_degrees.
            if deg >= 360.0 {
                0.0
            } else {
                deg
            }
        })
        .collect();

    (
        ImageBuffer::from_raw(width, height, magnitude).unwrap(),
        ImageBuffer::from_raw(width, height, direction).unwrap(),
    )
}

/// Thins a gradient magnitude field along the quantized gradient direction.
///
/// Each direction is rounded to the nearest 45 degrees and mapped to the pair
/// of neighbors lying along that gradient axis (0/180 left-right, 45/225
/// anti-diagonal, 90/270 up-down, 135/315 main diagonal). An interior pixel
/// keeps its magnitude only if it is greater than *or equal to* both neighbors
/// — ties are kept, a deliberate bias toward connectivity. Border rows and
/// columns are always zero in the output.
///
/// # Errors
///
/// * [`EdgeError::ShapeMismatch`] if `magnitude` and `direction` differ in shape.
/// * [`EdgeError::InvalidGradientDirection`] if a quantized angle falls outside
///   the eight canonical bins. This is an internal invariant check and is
///   unreachable for direction fields produced by [`gradient`].
pub fn non_maximum_suppression(
    magnitude: &ImageF64,
    direction: &ImageF64,
) -> Result<ImageF64, EdgeError> {
    let (width, height) = magnitude.dimensions();
    let (dw, dh) = direction.dimensions();
    if (width, height) != (dw, dh) {
        return Err(EdgeError::ShapeMismatch(width, height, dw, dh));
    }

    let mut out = ImageBuffer::from_pixel(width, height, Luma([0.0]));
    if width < 3 || height < 3 {
        return Ok(out);
    }

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            // Round the direction to the nearest 45 degrees, folded into [0, 360).
            let theta = direction.get_pixel(x, y)[0];
            let bin = ((((theta + 22.5) / 45.0).floor() * 45.0) as i32).rem_euclid(360);

            let (first, second) = match bin {
                0 | 180 => (magnitude.get_pixel(x - 1, y), magnitude.get_pixel(x + 1, y)),
                45 | 225 => (
                    magnitude.get_pixel(x + 1, y - 1),
                    magnitude.get_pixel(x - 1, y + 1),
                ),
                90 | 270 => (magnitude.get_pixel(x, y - 1), magnitude.get_pixel(x, y + 1)),
                135 | 315 => (
                    magnitude.get_pixel(x - 1, y - 1),
                    magnitude.get_pixel(x + 1, y + 1),
                ),
                other => return Err(EdgeError::InvalidGradientDirection(other)),
            };

            let m = magnitude.get_pixel(x, y)[0];
            if m >= first[0] && m >= second[0] {
                out.put_pixel(x, y, Luma([m]));
            }
        }
    }

    Ok(out)
}

/// Classifies magnitude pixels into strong and weak edges by two cutoffs.
///
/// A pixel is strong when its magnitude strictly exceeds `high` and weak when
/// it lies within `[low, high]`, inclusive on both ends. A pixel exactly at
/// `high` is therefore weak, never strong — that boundary is preserved as-is
/// from the reference formulation.
///
/// Masks are returned as grayscale images with white (255) for set pixels and
/// black (0) otherwise.
///
/// # Errors
///
/// [`EdgeError::InvalidThresholds`] when `high < low`; the hysteresis band is
/// then empty and every downstream result would be degenerate.
pub fn double_threshold(
    magnitude: &ImageF64,
    high: f64,
    low: f64,
) -> Result<(GrayImage, GrayImage), EdgeError> {
    if high < low {
        return Err(EdgeError::InvalidThresholds { high, low });
    }

    let (width, height) = magnitude.dimensions();
    let mut strong = GrayImage::from_pixel(width, height, Luma::<u8>::black());
    let mut weak = GrayImage::from_pixel(width, height, Luma::<u8>::black());

    for (x, y, pixel) in magnitude.enumerate_pixels() {
        let m = pixel[0];
        if m > high {
            strong.put_pixel(x, y, Luma::<u8>::white());
        } else if m >= low {
            weak.put_pixel(x, y, Luma::<u8>::white());
        }
    }

    Ok((strong, weak))
}

/// In-bounds 8-connected neighbors of `(x, y)`, excluding the pixel itself.
fn neighbors(x: u32, y: u32, width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    let (cx, cy) = (x as i64, y as i64);
    let (w, h) = (width as i64, height as i64);
    (-1i64..=1)
        .flat_map(move |dy| (-1i64..=1).map(move |dx| (cx + dx, cy + dy)))
        .filter(move |&(nx, ny)| (nx, ny) != (cx, cy) && nx >= 0 && ny >= 0 && nx < w && ny < h)
        .map(|(nx, ny)| (nx as u32, ny as u32))
}

/// Hysteresis linking: promotes weak edges connected to strong edges.
///
/// Every strong pixel is marked in the output and seeds a breadth-first
/// traversal over its 8-connected neighborhood; every weak pixel reached
/// through a chain of weak pixels is marked too. The visited set is local to
/// each seed's traversal — a pixel may be revisited from a different seed,
/// which is harmless since re-marking white is idempotent. Seed enumeration
/// order does not affect the result.
///
/// The output is a superset of `strong` and a subset of `strong ∪ weak`; a
/// weak pixel with no weak-pixel path to any strong pixel never appears.
///
/// # Errors
///
/// [`EdgeError::ShapeMismatch`] if the two masks differ in shape.
pub fn link_edges(strong: &GrayImage, weak: &GrayImage) -> Result<GrayImage, EdgeError> {
    let (width, height) = strong.dimensions();
    let (ww, wh) = weak.dimensions();
    if (width, height) != (ww, wh) {
        return Err(EdgeError::ShapeMismatch(width, height, ww, wh));
    }

    let mut edges = GrayImage::from_pixel(width, height, Luma::<u8>::black());

    for (sx, sy, pixel) in strong.enumerate_pixels() {
        if pixel[0] == 0 {
            continue;
        }
        edges.put_pixel(sx, sy, Luma::<u8>::white());

        let mut viewed = HashSet::new();
        let mut queue: VecDeque<(u32, u32)> = neighbors(sx, sy, width, height).collect();
        while let Some((x, y)) = queue.pop_front() {
            // Rejected pixels count as viewed too, so the traversal never
            // re-examines them from this seed.
            if viewed.insert((x, y)) && weak.get_pixel(x, y)[0] > 0 {
                edges.put_pixel(x, y, Luma::<u8>::white());
                queue.extend(neighbors(x, y, width, height));
            }
        }
    }

    Ok(edges)
}

/// Parameters for the [`canny`] pipeline.
///
/// `Default` matches the reference parameterization: a 5x5 Gaussian with
/// sigma 1.4 and a 15/20 hysteresis band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CannyParams {
    /// Side length of the Gaussian smoothing kernel, expected odd.
    pub kernel_size: u32,
    /// Standard deviation of the Gaussian smoothing kernel.
    pub sigma: f64,
    /// High threshold: magnitudes strictly above it are strong edges.
    pub high: f64,
    /// Low threshold: magnitudes in `[low, high]` are weak edges.
    pub low: f64,
}

impl Default for CannyParams {
    fn default() -> Self {
        Self {
            kernel_size: 5,
            sigma: 1.4,
            high: 20.0,
            low: 15.0,
        }
    }
}

/// Runs the full Canny edge detection pipeline.
///
/// Composes the individual stages with no logic of its own: build a Gaussian
/// kernel, smooth the image, compute the gradient, thin it by non-maximum
/// suppression, split into strong/weak masks and link them by hysteresis.
///
/// # Arguments
///
/// * `image` - Input grayscale image; any real-valued intensity range
/// * `params` - Smoothing and threshold parameters, see [`CannyParams`]
///
/// # Returns
///
/// The final binary edge mask, white (255) on edge pixels.
///
/// # Errors
///
/// Propagates [`EdgeError::InvalidThresholds`] for an inverted threshold pair;
/// the remaining error variants are unreachable from this composition.
///
/// # Examples
///
/// ```rust
/// use canny_hough::{canny, CannyParams, ImageF64};
/// use image::{ImageBuffer, Luma};
///
/// let flat: ImageF64 = ImageBuffer::from_pixel(16, 16, Luma([42.0]));
/// let edges = canny(&flat, &CannyParams::default()).unwrap();
///
/// // A uniform image has zero gradient everywhere, hence no edges.
/// assert!(edges.pixels().all(|p| p[0] == 0));
/// ```
pub fn canny(image: &ImageF64, params: &CannyParams) -> Result<GrayImage, EdgeError> {
    debug!("start canny pipeline");

    let kernel = gaussian_kernel(params.kernel_size, params.sigma);
    let smoothed = convolve(image, &kernel);
    debug!("smoothed ok");

    let (magnitude, direction) = gradient(&smoothed);
    debug!("gradient ok");

    let thinned = non_maximum_suppression(&magnitude, &direction)?;
    debug!("thinned ok");

    let (strong, weak) = double_threshold(&thinned, params.high, params.low)?;
    debug!("thresholds ok");

    let edges = link_edges(&strong, &weak)?;
    debug!("linked ok");

    Ok(edges)
}

/// The result of a [`hough_transform`] run: the vote grid plus its axes.
#[derive(Debug, Clone, PartialEq)]
pub struct HoughSpace {
    /// Vote counts indexed by `(x = theta bin, y = rho bin)`.
    pub accumulator: HoughAccumulator,
    /// Rho axis: integer-valued distances from `-diag_len` to `diag_len`
    /// inclusive, unit spacing.
    pub rhos: Vec<f64>,
    /// Theta axis: 180 angles in radians, one degree apart, spanning
    /// `[-90°, 90°)`.
    pub thetas: Vec<f64>,
}

impl HoughSpace {
    /// The `(rho, theta, votes)` triple of the most-voted bin, or `None` for
    /// an empty input image. Peak *extraction* (thresholding, suppression of
    /// nearby peaks) is out of scope; this is a convenience for inspecting
    /// the dominant line.
    pub fn max_votes(&self) -> Option<(f64, f64, u64)> {
        self.accumulator
            .enumerate_pixels()
            .max_by_key(|(_, _, p)| p[0])
            .filter(|(_, _, p)| p[0] > 0)
            .map(|(t, r, p)| (self.rhos[r as usize], self.thetas[t as usize], p[0]))
    }
}

/// Transforms foreground pixels of a binary image into Hough space.
///
/// Uses the parameterization `rho = x·cos(theta) + y·sin(theta)` where `x` is
/// the column and `y` the row of a foreground pixel (any pixel > 0). For each
/// of the 180 one-degree theta bins the continuous rho is mapped to the
/// nearest bin of a unit-spaced axis covering `[-diag_len, diag_len]` with
/// `diag_len = ceil(sqrt(W² + H²))`, and that bin receives one vote. No
/// interpolation or sub-bin weighting: each vote lands in exactly one bin.
///
/// Accumulator peaks correspond to `(rho, theta)` parameterizations of
/// dominant lines. Extracting lines from the peaks is the caller's business.
///
/// # Examples
///
/// ```rust
/// use canny_hough::hough_transform;
/// use image::{GrayImage, Luma};
///
/// // A vertical line at x = 2.
/// let mut image = GrayImage::new(5, 40);
/// for y in 0..40 {
///     image.put_pixel(2, y, Luma([255]));
/// }
///
/// let hough = hough_transform(&image);
/// let (rho, theta, votes) = hough.max_votes().unwrap();
/// assert_eq!((rho, theta, votes), (2.0, 0.0, 40));
/// ```
pub fn hough_transform(binary: &GrayImage) -> HoughSpace {
    let (width, height) = binary.dimensions();
    let diag_len = (width as f64).hypot(height as f64).ceil() as i64;
    let num_rhos = (2 * diag_len + 1) as usize;

    let rhos: Vec<f64> = (-diag_len..=diag_len).map(|r| r as f64).collect();
    let thetas: Vec<f64> = (-90..90).map(|d| (d as f64).to_radians()).collect();
    let num_thetas = thetas.len();

    // Cache the trigonometry once per theta bin.
    let cos_t: Vec<f64> = thetas.iter().map(|t| t.cos()).collect();
    let sin_t: Vec<f64> = thetas.iter().map(|t| t.sin()).collect();

    let points: Vec<(u32, u32)> = binary
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0] > 0)
        .map(|(x, y, _)| (x, y))
        .collect();
    debug!("hough voting over {} foreground pixels", points.len());

    // Votes for distinct pixels can land in the same bin, so the parallel
    // version folds into per-thread partial accumulators and merges them.
    let votes = points
        .par_iter()
        .fold(
            || vec![0u64; num_rhos * num_thetas],
            |mut acc, &(x, y)| {
                for (t, (cos, sin)) in cos_t.iter().zip(sin_t.iter()).enumerate() {
                    let rho = x as f64 * cos + y as f64 * sin;
                    // Nearest bin on the unit-spaced rho axis.
                    let rho_bin = (rho + diag_len as f64).round() as usize;
                    acc[rho_bin * num_thetas + t] += 1;
                }
                acc
            },
        )
        .reduce(
            || vec![0u64; num_rhos * num_thetas],
            |mut merged, partial| {
                for (m, p) in merged.iter_mut().zip(partial) {
                    *m += p;
                }
                merged
            },
        );

    let accumulator = ImageBuffer::from_raw(num_thetas as u32, num_rhos as u32, votes).unwrap();

    HoughSpace {
        accumulator,
        rhos,
        thetas,
    }
}
