//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale `(width, height)` down to at most `target_width`, keeping the
/// aspect ratio.
///
/// Images already narrow enough are returned unchanged (no upscaling).
/// The height is rounded to the nearest pixel and never drops below 1.
///
/// # Examples
/// ```
/// # use webprep::imaging::fit_to_width;
/// assert_eq!(fit_to_width((4000, 3000), 1920), (1920, 1440));
/// assert_eq!(fit_to_width((800, 600), 1920), (800, 600));
/// ```
pub fn fit_to_width(source: (u32, u32), target_width: u32) -> (u32, u32) {
    let (w, h) = source;
    if w <= target_width || target_width == 0 {
        return (w, h);
    }
    let ratio = target_width as f64 / w as f64;
    let height = (h as f64 * ratio).round().max(1.0) as u32;
    (target_width, height)
}

/// Pixel count of a `(width, height)` pair, without overflow.
pub fn pixel_count(dims: (u32, u32)) -> u64 {
    u64::from(dims.0) * u64::from(dims.1)
}
