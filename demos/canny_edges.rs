use env_logger::Builder;
use image::{ImageBuffer, Luma};
use log::info;

use canny_hough::{canny, CannyParams, ImageF64};

fn main() {
    Builder::from_default_env().format_timestamp_nanos().init();

    // Synthesize a test scene: a bright rectangle on a dark background with a
    // soft radial gradient so the edges are not perfectly sharp.
    let (width, height) = (256u32, 192u32);
    let image: ImageF64 = ImageBuffer::from_fn(width, height, |x, y| {
        let inside = (64..192).contains(&x) && (48..144).contains(&y);
        let base = if inside { 200.0 } else { 30.0 };
        let cx = x as f64 - width as f64 / 2.0;
        let cy = y as f64 - height as f64 / 2.0;
        Luma([base + (cx * cx + cy * cy).sqrt() * 0.1])
    });

    info!("input image: {}x{}", width, height);

    let params = CannyParams::default();
    info!(
        "running canny: kernel_size={} sigma={} high={} low={}",
        params.kernel_size, params.sigma, params.high, params.low
    );

    let edges = canny(&image, &params).expect("canny failed");

    let edge_count = edges.pixels().filter(|p| p[0] > 0).count();
    let total = (width * height) as f64;
    info!(
        "detected {} edge pixels ({:.2}% of the image)",
        edge_count,
        edge_count as f64 / total * 100.0
    );

    // Row profile of the mask, useful for eyeballing where the edges sit.
    for y in (0..height).step_by(16) {
        let row_count = (0..width).filter(|&x| edges.get_pixel(x, y)[0] > 0).count();
        info!("row {:3}: {} edge pixels", y, row_count);
    }
}
