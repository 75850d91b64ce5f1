/// Tile placement and mosaic assembly for visualizing image batches
///
use std::path::Path;

use image::{GrayImage, Luma, Rgb, RgbImage};
use ndarray::{s, Array2, Array3, Array4, ArrayView3, ArrayView4, Axis};
use rand::Rng;
use thiserror::Error;

/// Errors from mosaic assembly and the optional image save.
#[derive(Error, Debug)]
pub enum MosaicError {
    #[error("cannot build a mosaic from an empty batch")]
    EmptyBatch,
    #[error("cannot save a {0}-channel mosaic, only 1 or 3 channels supported")]
    UnsupportedChannels(usize),
    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Embeds each `(features, dx, dx)` tile of the batch into a zero-filled
/// `new_npx` x `new_npx` canvas at an independent random offset per batch
/// element. Requires `new_npx > dx`.
pub fn place_tile_in<R: Rng + ?Sized>(
    rng: &mut R,
    tile: ArrayView4<f32>,
    new_npx: usize,
) -> Array4<f32> {
    let (batch, features, dx, _) = tile.dim();
    assert!(new_npx > dx, "canvas must be wider than the tile");
    let max_x = new_npx - dx;
    let mut canvas = Array4::zeros((batch, features, new_npx, new_npx));
    for b in 0..batch {
        let px = rng.gen_range(0..max_x);
        let py = rng.gen_range(0..max_x);
        canvas
            .slice_mut(s![b, .., px..px + dx, py..py + dx])
            .assign(&tile.index_axis(Axis(0), b));
    }
    canvas
}

// columns = ceil(sqrt(n)); rows = smallest count covering the batch
fn grid_dims(n: usize) -> (usize, usize) {
    let cols = (n as f64).sqrt().ceil() as usize;
    let mut rows = n / cols;
    while cols * rows < n {
        rows += 1;
    }
    (cols, rows)
}

// An all-equal batch normalizes to zero instead of dividing by zero.
fn norm_scale(lo: f32, hi: f32) -> f32 {
    if hi > lo {
        (hi - lo).recip()
    } else {
        0.0
    }
}

fn batch_range<'a>(values: impl Iterator<Item = &'a f32>) -> (f32, f32) {
    values.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    })
}

/// Min-max normalizes a batch of single-channel images to [0, 1] and tiles
/// them into a near-square grid with `pad` zero pixels between tiles,
/// optionally saving the result as an 8-bit grayscale PNG.
pub fn mosaic_vis(
    x: ArrayView3<f32>,
    pad: usize,
    save_path: Option<&Path>,
) -> Result<Array2<f32>, MosaicError> {
    let (n, h, w) = x.dim();
    if n == 0 {
        return Err(MosaicError::EmptyBatch);
    }
    let (lo, hi) = batch_range(x.iter());
    let scale = norm_scale(lo, hi);
    let (cols, rows) = grid_dims(n);
    let mut img = Array2::zeros((h * rows + (rows - 1) * pad, w * cols + (cols - 1) * pad));
    for (k, tile) in x.axis_iter(Axis(0)).enumerate() {
        let (j, i) = (k / cols, k % cols);
        let (r0, c0) = (j * (h + pad), i * (w + pad));
        img.slice_mut(s![r0..r0 + h, c0..c0 + w])
            .assign(&tile.mapv(|v| (v - lo) * scale));
    }
    if let Some(path) = save_path {
        save_gray(&img, path)?;
    }
    Ok(img)
}

/// Channel-last variant of [`mosaic_vis`] for `(batch, h, w, channels)`
/// input; saving supports 1 or 3 channels.
pub fn mosaic_vis_multichannel(
    x: ArrayView4<f32>,
    pad: usize,
    save_path: Option<&Path>,
) -> Result<Array3<f32>, MosaicError> {
    let (n, h, w, c) = x.dim();
    if n == 0 {
        return Err(MosaicError::EmptyBatch);
    }
    let (lo, hi) = batch_range(x.iter());
    let scale = norm_scale(lo, hi);
    let (cols, rows) = grid_dims(n);
    let mut img = Array3::zeros((h * rows + (rows - 1) * pad, w * cols + (cols - 1) * pad, c));
    for (k, tile) in x.axis_iter(Axis(0)).enumerate() {
        let (j, i) = (k / cols, k % cols);
        let (r0, c0) = (j * (h + pad), i * (w + pad));
        img.slice_mut(s![r0..r0 + h, c0..c0 + w, ..])
            .assign(&tile.mapv(|v| (v - lo) * scale));
    }
    if let Some(path) = save_path {
        match c {
            1 => save_gray(&img.index_axis(Axis(2), 0).to_owned(), path)?,
            3 => save_rgb(&img, path)?,
            _ => return Err(MosaicError::UnsupportedChannels(c)),
        }
    }
    Ok(img)
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0) as u8
}

fn save_gray(img: &Array2<f32>, path: &Path) -> Result<(), MosaicError> {
    let (h, w) = img.dim();
    let mut out = GrayImage::new(w as u32, h as u32);
    for ((r, c), &v) in img.indexed_iter() {
        out.put_pixel(c as u32, r as u32, Luma([to_byte(v)]));
    }
    out.save(path)?;
    Ok(())
}

fn save_rgb(img: &Array3<f32>, path: &Path) -> Result<(), MosaicError> {
    let (h, w, _) = img.dim();
    let mut out = RgbImage::new(w as u32, h as u32);
    for r in 0..h {
        for c in 0..w {
            let px = Rgb([
                to_byte(img[[r, c, 0]]),
                to_byte(img[[r, c, 1]]),
                to_byte(img[[r, c, 2]]),
            ]);
            out.put_pixel(c as u32, r as u32, px);
        }
    }
    out.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tempfile::tempdir;

    #[test]
    fn grid_dims_are_near_square() {
        assert_eq!(grid_dims(1), (1, 1));
        assert_eq!(grid_dims(3), (2, 2));
        assert_eq!(grid_dims(4), (2, 2));
        assert_eq!(grid_dims(5), (3, 2));
        assert_eq!(grid_dims(9), (3, 3));
        assert_eq!(grid_dims(10), (4, 3));
    }

    #[test]
    fn four_tiles_make_a_two_by_two_mosaic() {
        let mut batch = Array3::zeros((4, 8, 8));
        for (k, mut tile) in batch.axis_iter_mut(Axis(0)).enumerate() {
            tile.fill(k as f32);
        }
        let img = mosaic_vis(batch.view(), 0, None).unwrap();
        assert_eq!(img.dim(), (16, 16));
        assert!(img.iter().all(|&v| (0.0..=1.0).contains(&v)));
        // brightest tile sits at grid position (1, 1)
        assert_eq!(img[[8, 8]], 1.0);
        assert_eq!(img[[0, 0]], 0.0);
    }

    #[test]
    fn padding_grows_the_canvas_between_tiles() {
        let batch = Array3::from_shape_fn((4, 8, 8), |(b, r, c)| 1.0 + (b + r + c) as f32);
        let img = mosaic_vis(batch.view(), 2, None).unwrap();
        assert_eq!(img.dim(), (18, 18));
        // the pad rows stay zero
        assert!(img.row(8).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn constant_batch_normalizes_to_zero() {
        let batch = Array3::from_elem((2, 4, 4), 7.5f32);
        let img = mosaic_vis(batch.view(), 0, None).unwrap();
        assert!(img.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn empty_batch_is_rejected() {
        let batch = Array3::<f32>::zeros((0, 4, 4));
        assert!(matches!(
            mosaic_vis(batch.view(), 0, None),
            Err(MosaicError::EmptyBatch)
        ));
    }

    #[test]
    fn multichannel_mosaic_keeps_channels() {
        let batch = Array4::from_shape_fn((4, 4, 4, 3), |(b, _, _, ch)| (b + ch) as f32);
        let img = mosaic_vis_multichannel(batch.view(), 0, None).unwrap();
        assert_eq!(img.dim(), (8, 8, 3));
    }

    #[test]
    fn saved_mosaic_lands_on_disk() {
        let batch = Array3::from_shape_fn((4, 8, 8), |(b, r, c)| (b + r + c) as f32);
        let dir = tempdir().unwrap();
        let path = dir.path().join("mosaic.png");
        mosaic_vis(batch.view(), 1, Some(&path)).unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn unsupported_channel_count_only_fails_on_save() {
        let batch = Array4::<f32>::ones((2, 4, 4, 5));
        assert!(mosaic_vis_multichannel(batch.view(), 0, None).is_ok());
        let dir = tempdir().unwrap();
        let path = dir.path().join("five.png");
        assert!(matches!(
            mosaic_vis_multichannel(batch.view(), 0, Some(&path)),
            Err(MosaicError::UnsupportedChannels(5))
        ));
    }

    #[test]
    fn placed_tiles_preserve_content_inside_the_canvas() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let tile = Array4::from_elem((3, 2, 4, 4), 1.0f32);
        let canvas = place_tile_in(&mut rng, tile.view(), 9);
        assert_eq!(canvas.dim(), (3, 2, 9, 9));
        for b in 0..3 {
            let slab = canvas.index_axis(Axis(0), b);
            // every tile value survives, the rest stays zero
            assert_eq!(slab.sum(), 2.0 * 16.0);
            assert!(slab.iter().all(|&v| v == 0.0 || v == 1.0));
        }
    }

    #[test]
    #[should_panic(expected = "wider than the tile")]
    fn tile_larger_than_canvas_panics() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let tile = Array4::<f32>::zeros((1, 1, 8, 8));
        let _ = place_tile_in(&mut rng, tile.view(), 8);
    }
}
