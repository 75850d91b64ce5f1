/// Random point generators and sparse embeddings
///
/// Every random function takes the generator explicitly so callers can seed
/// for reproducibility.
use ndarray::{Array1, Array2, ArrayView2};
use rand::Rng;
use rand_distr::StandardNormal;

/// Batch of points distributed uniformly on the unit n-sphere: normal draws
/// with each row divided by its Euclidean norm.
pub fn uniform_nsphere<R: Rng + ?Sized>(rng: &mut R, batch: usize, size: usize) -> Array2<f32> {
    let mut pts: Array2<f32> = Array2::from_shape_fn((batch, size), |_| rng.sample(StandardNormal));
    for mut row in pts.rows_mut() {
        let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
        row.mapv_inplace(|v| v / norm);
    }
    pts
}

/// Batch of points uniform in the cube [-1, 1)^size.
pub fn uniform_ncube<R: Rng + ?Sized>(rng: &mut R, batch: usize, size: usize) -> Array2<f32> {
    Array2::from_shape_fn((batch, size), |_| rng.gen_range(-1.0f32..1.0))
}

/// Batch of standard-normal points.
pub fn normal_ncube<R: Rng + ?Sized>(rng: &mut R, batch: usize, size: usize) -> Array2<f32> {
    Array2::from_shape_fn((batch, size), |_| rng.sample(StandardNormal))
}

/// Sparse integer embedding: one row of width `c` per entry, with a single
/// 1.0 at the entry's column. Panics on an out-of-range index.
pub fn sie(x: &[usize], c: usize) -> Array2<f32> {
    let mut y = Array2::zeros((x.len(), c));
    for (row, &col) in x.iter().enumerate() {
        y[[row, col]] = 1.0;
    }
    y
}

/// Per-column keep/discard mask for a feature matrix; `prune_ratio = 1.0`
/// means discard everything.
pub fn pruning_mask<R: Rng + ?Sized>(
    rng: &mut R,
    shaped_as: ArrayView2<f32>,
    prune_ratio: f64,
) -> Array1<bool> {
    Array1::from_shape_fn(shaped_as.ncols(), |_| rng.gen_bool(1.0 - prune_ratio))
}
