/// Gaussian receptive field generators
///
/// Coordinate convention: the image center is at (0, 0) and the top-left
/// pixel corresponds to (-size/2, size/2). The returned Y grid is already
/// negated, so increasing row index walks downward in mathematical Y.
use ndarray::{Array2, Array3, Axis, NdFloat, Zip};
use std::f64::consts::{PI, SQRT_2};

fn cast<F: NdFloat>(v: f64) -> F {
    F::from(v).unwrap()
}

fn grid_spacing<F: NdFloat>(n_pix: usize, size: Option<F>) -> F {
    let deg = size.unwrap_or_else(|| cast(n_pix as f64));
    deg / cast::<F>(n_pix as f64)
}

// Returns the (X, -Y) meshgrid of pixel-center coordinates. Coordinates are
// generated by index so the grid has exactly n_pix samples per axis; a
// float-stepped range can gain or lose a sample at the pix_max boundary.
pub fn pixel_grid<F: NdFloat>(n_pix: usize, size: Option<F>) -> (Array2<F>, Array2<F>) {
    assert!(n_pix > 0, "grid needs at least one pixel per axis");
    let deg = size.unwrap_or_else(|| cast(n_pix as f64));
    let dpix = grid_spacing(n_pix, size);
    let half: F = cast(0.5);
    let pix_min = -deg * half + half * dpix;
    let coord = |i: usize| pix_min + cast::<F>(i as f64) * dpix;
    let xm = Array2::from_shape_fn((n_pix, n_pix), |(_, c)| coord(c));
    let ym = Array2::from_shape_fn((n_pix, n_pix), |(r, _)| -coord(r));
    (xm, ym)
}

// 2D isotropic Gaussian density at each pixel center, scaled by pixel area.
fn point_density<F: NdFloat>(
    xg: &Array2<F>,
    yg: &Array2<F>,
    dpix: F,
    x: F,
    y: F,
    sigma: F,
) -> Array2<F> {
    let d = cast::<F>(2.0) * sigma * sigma;
    let a = (d * cast::<F>(PI)).recip();
    let area = dpix * dpix;
    let mut z = Array2::zeros(xg.raw_dim());
    Zip::from(&mut z).and(xg).and(yg).for_each(|z, &gx, &gy| {
        let dx = gx - x;
        let dy = gy - y;
        *z = area * a * (-(dx * dx + dy * dy) / d).exp();
    });
    z
}

fn point_field<F: NdFloat>(
    xg: &Array2<F>,
    yg: &Array2<F>,
    dpix: F,
    x: F,
    y: F,
    sigma: F,
) -> Array2<F> {
    let mut z = point_density(xg, yg, dpix, x, y, sigma);
    if sigma < dpix * cast(0.5) {
        // Kernel narrower than half a pixel: point sampling under-resolves
        // the peak, so rescale to unit total mass.
        let total = z.sum();
        z.mapv_inplace(|v| v / total);
    }
    z
}

// Exact mass of the Gaussian inside the dpix-wide cell centered at (gx, gy):
// the product of 1D CDF differences along each axis.
fn cell_mass<F: NdFloat>(gx: F, gy: F, dpix: F, x: F, y: F, sigma: F) -> F {
    let erf = |v: F| cast::<F>(libm::erf(v.to_f64().unwrap()));
    let half = cast::<F>(0.5) * dpix;
    let denom = cast::<F>(SQRT_2) * sigma;
    let ex = erf((gx - x + half) / denom) - erf((gx - x - half) / denom);
    let ey = erf((gy - y + half) / denom) - erf((gy - y - half) / denom);
    cast::<F>(0.25) * ex * ey
}

fn mass_field<F: NdFloat>(
    xg: &Array2<F>,
    yg: &Array2<F>,
    dpix: F,
    x: F,
    y: F,
    sigma: F,
) -> Array2<F> {
    if sigma < dpix {
        let mut z = Array2::zeros(xg.raw_dim());
        Zip::from(&mut z).and(xg).and(yg).for_each(|z, &gx, &gy| {
            *z = cell_mass(gx, gy, dpix, x, y, sigma);
        });
        z
    } else {
        // Kernel spans many pixels: the point sample is already an accurate
        // cell-integral approximation, skip the erf evaluation.
        point_density(xg, yg, dpix, x, y, sigma)
    }
}

/// Point-sampled Gaussian field centered at `(x, y)` with standard deviation
/// `sigma`, on an `n_pix` x `n_pix` grid spanning `size` (defaults to
/// `n_pix`, i.e. unit pixel spacing). Returns `(X, -Y, Z)`.
pub fn make_gaussian<F: NdFloat>(
    x: F,
    y: F,
    sigma: F,
    n_pix: usize,
    size: Option<F>,
) -> (Array2<F>, Array2<F>, Array2<F>) {
    let (xg, yg) = pixel_grid(n_pix, size);
    let dpix = grid_spacing(n_pix, size);
    let z = point_field(&xg, &yg, dpix, x, y, sigma);
    (xg, yg, z)
}

/// Pixel-integrated Gaussian field: for `sigma < dpix` each value is the
/// exact probability mass falling inside that pixel's cell; otherwise the
/// point-sampled approximation is used. Returns `(X, -Y, Z)`.
pub fn make_gaussian_mass<F: NdFloat>(
    x: F,
    y: F,
    sigma: F,
    n_pix: usize,
    size: Option<F>,
) -> (Array2<F>, Array2<F>, Array2<F>) {
    let (xg, yg) = pixel_grid(n_pix, size);
    let dpix = grid_spacing(n_pix, size);
    let z = mass_field(&xg, &yg, dpix, x, y, sigma);
    (xg, yg, z)
}

/// Stack of point-sampled Gaussian fields sharing one coordinate grid, one
/// layer per `(x, y, sigma)` triple. Longer inputs are truncated to the
/// shortest; panics if the shortest is empty.
pub fn make_gaussian_stack<F: NdFloat>(
    xs: &[F],
    ys: &[F],
    sigmas: &[F],
    n_pix: usize,
    size: Option<F>,
) -> (Array2<F>, Array2<F>, Array3<F>) {
    let stack_size = xs.len().min(ys.len()).min(sigmas.len());
    assert!(stack_size > 0, "stack inputs must be non-empty");
    let (xg, yg) = pixel_grid(n_pix, size);
    let dpix = grid_spacing(n_pix, size);
    let mut z = Array3::zeros((stack_size, n_pix, n_pix));
    for i in 0..stack_size {
        let field = point_field(&xg, &yg, dpix, xs[i], ys[i], sigmas[i]);
        z.index_axis_mut(Axis(0), i).assign(&field);
    }
    (xg, yg, z)
}

/// Stack variant of [`make_gaussian_mass`]; same truncation and grid-sharing
/// behavior as [`make_gaussian_stack`].
pub fn make_gaussian_mass_stack<F: NdFloat>(
    xs: &[F],
    ys: &[F],
    sigmas: &[F],
    n_pix: usize,
    size: Option<F>,
) -> (Array2<F>, Array2<F>, Array3<F>) {
    let stack_size = xs.len().min(ys.len()).min(sigmas.len());
    assert!(stack_size > 0, "stack inputs must be non-empty");
    let (xg, yg) = pixel_grid(n_pix, size);
    let dpix = grid_spacing(n_pix, size);
    let mut z = Array3::zeros((stack_size, n_pix, n_pix));
    for i in 0..stack_size {
        let field = mass_field(&xg, &yg, dpix, xs[i], ys[i], sigmas[i]);
        z.index_axis_mut(Axis(0), i).assign(&field);
    }
    (xg, yg, z)
}
