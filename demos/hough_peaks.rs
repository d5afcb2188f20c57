use env_logger::Builder;
use image::{GrayImage, Luma};
use log::info;

use canny_hough::hough_transform;

fn main() {
    Builder::from_default_env().format_timestamp_nanos().init();

    // Synthesize a binary edge image with one vertical, one horizontal and
    // one diagonal line.
    let (width, height) = (128u32, 128u32);
    let mut image = GrayImage::new(width, height);
    for y in 0..height {
        image.put_pixel(40, y, Luma([255]));
    }
    for x in 0..width {
        image.put_pixel(x, 96, Luma([255]));
        image.put_pixel(x, x, Luma([255]));
    }

    let foreground = image.pixels().filter(|p| p[0] > 0).count();
    info!("voting over {} foreground pixels", foreground);

    let hough = hough_transform(&image);
    info!(
        "accumulator: {} rho bins x {} theta bins",
        hough.rhos.len(),
        hough.thetas.len()
    );

    // Report the ten most voted bins; line extraction proper is left to the
    // caller, this only inspects the vote grid.
    let mut bins: Vec<(u64, f64, f64)> = hough
        .accumulator
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0] > 0)
        .map(|(t, r, p)| (p[0], hough.rhos[r as usize], hough.thetas[t as usize]))
        .collect();
    bins.sort_by(|a, b| b.0.cmp(&a.0));

    for (votes, rho, theta) in bins.iter().take(10) {
        info!(
            "votes={:4} rho={:6.1} theta={:6.1} deg",
            votes,
            rho,
            theta.to_degrees()
        );
    }
}
