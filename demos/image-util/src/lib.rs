use firefield::Grid;
use image::{Rgb, RgbImage};

/// Piecewise linear map from a field value to a color.
#[derive(Debug, Clone)]
pub struct Gradient {
    stops: Vec<(f32, [f32; 3])>,
}

impl Gradient {
    /// `stops` must be sorted by value.
    pub fn new(stops: Vec<(f32, [f32; 3])>) -> Self {
        Self { stops }
    }

    /// Black through red and yellow to white.
    pub fn fire() -> Self {
        Self::new(vec![
            (-0.4, [0.0, 0.0, 0.0]),
            (0.0, [0.3, 0.3, 0.2]),
            (0.2, [0.6, 0.2, 0.1]),
            (0.4, [0.9, 0.2, 0.0]),
            (0.6, [1.0, 0.4, 0.0]),
            (0.8, [1.0, 1.0, 0.0]),
            (1.0, [1.0, 1.0, 0.5]),
        ])
    }

    pub fn color(&self, value: f32) -> Rgb<u8> {
        let c = match self.stops.iter().position(|&(v, _)| v > value) {
            None => self.stops.last().map_or([0.0; 3], |s| s.1),
            Some(0) => self.stops[0].1,
            Some(i) => {
                let (v0, c0) = self.stops[i - 1];
                let (v1, c1) = self.stops[i];
                let t = (value - v0) / (v1 - v0);
                [
                    c0[0] + (c1[0] - c0[0]) * t,
                    c0[1] + (c1[1] - c0[1]) * t,
                    c0[2] + (c1[2] - c0[2]) * t,
                ]
            }
        };

        let to_u8 = |l: f32| (l * 256.0).max(0.0).min(255.0) as u8;
        Rgb([to_u8(c[0]), to_u8(c[1]), to_u8(c[2])])
    }
}

/// Renders `grid` with every cell as a `scale` x `scale` block.
pub fn render(grid: &Grid, gradient: &Gradient, scale: u32) -> RgbImage {
    let (w, h) = grid.dim();
    let scale = scale.max(1);

    RgbImage::from_fn(w as u32 * scale, h as u32 * scale, |i, j| {
        gradient.color(grid.get((i / scale) as isize, (j / scale) as isize))
    })
}

pub fn save(prefix: &str, index: usize, img: &RgbImage) -> anyhow::Result<()> {
    img.save(format!("out/{}_{:06}.png", prefix, index))?;

    Ok(())
}

pub fn save_monochrome(prefix: &str, index: usize, grid: &Grid) -> anyhow::Result<()> {
    let (w, h) = grid.dim();

    let mut img = RgbImage::new(w as u32, h as u32);

    for i in 0..w {
        for j in 0..h {
            let l = (grid.get(i as isize, j as isize) * 256.0).max(0.0).min(255.0) as u8;
            img.put_pixel(i as u32, j as u32, Rgb([l, l, l]));
        }
    }

    save(prefix, index, &img)
}

pub fn save_gradient(
    prefix: &str,
    index: usize,
    grid: &Grid,
    gradient: &Gradient,
    scale: u32,
) -> anyhow::Result<()> {
    save(prefix, index, &render(grid, gradient, scale))
}
