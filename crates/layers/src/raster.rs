use crate::palette::Rgb;

/// Row-major RGBA8 pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbaRaster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RgbaRaster {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    pub fn fill(&mut self, color: Rgb) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[color.r, color.g, color.b, 255]);
        }
    }

    /// Fills the even-odd interior of `rings` (pixel-space vertex lists,
    /// implicitly closed), sampling at pixel centres.
    pub fn fill_even_odd(&mut self, rings: &[Vec<[f64; 2]>], color: Rgb, alpha: f32) {
        let Some((y_min, y_max)) = row_range(rings, self.height) else {
            return;
        };
        let alpha = alpha.clamp(0.0, 1.0);
        let mut crossings: Vec<f64> = Vec::new();

        for row in y_min..=y_max {
            let yc = row as f64 + 0.5;
            crossings.clear();
            for ring in rings {
                collect_crossings(ring, yc, &mut crossings);
            }
            crossings.sort_by(|a, b| a.total_cmp(b));

            for span in crossings.chunks_exact(2) {
                // pixel x is covered when x + 0.5 lies in [x0, x1)
                let x0 = (span[0] - 0.5).ceil().max(0.0);
                let x1 = (span[1] - 0.5).ceil().min(self.width as f64);
                if x1 <= x0 {
                    continue;
                }
                self.blend_span(row, x0 as u32, x1 as u32, color, alpha);
            }
        }
    }

    fn blend_span(&mut self, row: u32, x0: u32, x1: u32, color: Rgb, alpha: f32) {
        let start = (row as usize * self.width as usize + x0 as usize) * 4;
        let end = (row as usize * self.width as usize + x1 as usize) * 4;
        for px in self.pixels[start..end].chunks_exact_mut(4) {
            if alpha >= 1.0 {
                px.copy_from_slice(&[color.r, color.g, color.b, 255]);
            } else {
                px[0] = blend_channel(px[0], color.r, alpha);
                px[1] = blend_channel(px[1], color.g, alpha);
                px[2] = blend_channel(px[2], color.b, alpha);
                px[3] = 255;
            }
        }
    }
}

fn blend_channel(dst: u8, src: u8, alpha: f32) -> u8 {
    (dst as f32 + (src as f32 - dst as f32) * alpha).round() as u8
}

fn row_range(rings: &[Vec<[f64; 2]>], height: u32) -> Option<(u32, u32)> {
    if height == 0 {
        return None;
    }
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for p in rings.iter().flatten() {
        lo = lo.min(p[1]);
        hi = hi.max(p[1]);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    let first = (lo - 0.5).ceil().max(0.0);
    let last = (hi - 0.5).floor().min(height as f64 - 1.0);
    if last < first {
        return None;
    }
    Some((first as u32, last as u32))
}

fn collect_crossings(ring: &[[f64; 2]], yc: f64, out: &mut Vec<f64>) {
    let n = ring.len();
    if n < 3 {
        return;
    }
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > yc) != (yj > yc) {
            out.push(xi + (yc - yi) * (xj - xi) / (yj - yi));
        }
        j = i;
    }
}

#[cfg(test)]
mod tests {
    use super::RgbaRaster;
    use crate::palette::Rgb;

    const RED: Rgb = Rgb::from_hex(0xff0000);
    const BLUE: Rgb = Rgb::from_hex(0x0000ff);

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<[f64; 2]> {
        vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]]
    }

    #[test]
    fn fills_rectangle_at_pixel_centres() {
        let mut r = RgbaRaster::new(10, 10);
        r.fill(BLUE);
        r.fill_even_odd(&[rect(2.0, 2.0, 5.0, 4.0)], RED, 1.0);
        assert_eq!(r.pixel(2, 2), Some([255, 0, 0, 255]));
        assert_eq!(r.pixel(4, 3), Some([255, 0, 0, 255]));
        assert_eq!(r.pixel(5, 3), Some([0, 0, 255, 255]));
        assert_eq!(r.pixel(2, 4), Some([0, 0, 255, 255]));
        assert_eq!(r.pixel(1, 2), Some([0, 0, 255, 255]));
    }

    #[test]
    fn hole_is_left_unfilled() {
        let mut r = RgbaRaster::new(10, 10);
        r.fill(BLUE);
        r.fill_even_odd(&[rect(0.0, 0.0, 10.0, 10.0), rect(4.0, 4.0, 6.0, 6.0)], RED, 1.0);
        assert_eq!(r.pixel(1, 1), Some([255, 0, 0, 255]));
        assert_eq!(r.pixel(5, 5), Some([0, 0, 255, 255]));
    }

    #[test]
    fn translucent_fill_blends() {
        let mut r = RgbaRaster::new(4, 4);
        r.fill(Rgb::from_hex(0x000000));
        r.fill_even_odd(&[rect(0.0, 0.0, 4.0, 4.0)], Rgb::from_hex(0xc8c8c8), 0.5);
        assert_eq!(r.pixel(0, 0), Some([100, 100, 100, 255]));
    }

    #[test]
    fn out_of_bounds_geometry_is_clipped() {
        let mut r = RgbaRaster::new(4, 4);
        r.fill(BLUE);
        r.fill_even_odd(&[rect(-10.0, -10.0, 20.0, 2.0)], RED, 1.0);
        assert_eq!(r.pixel(3, 1), Some([255, 0, 0, 255]));
        assert_eq!(r.pixel(3, 2), Some([0, 0, 255, 255]));
        r.fill_even_odd(&[rect(50.0, 50.0, 60.0, 60.0)], RED, 1.0);
        r.fill_even_odd(&[], RED, 1.0);
    }
}
