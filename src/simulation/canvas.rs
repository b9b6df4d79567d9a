use crate::floating_type_mod::FT;

/// RGBA8 image, one `[r, g, b, a]` entry per pixel, rows top to bottom.
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<[u8; 4]>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0, 0, 0, 255]; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        self.pixels[x + y * self.width]
    }

    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [[u8; 4]] {
        &mut self.pixels
    }

    pub fn clear(&mut self, color: [u8; 3]) {
        let [r, g, b] = color;
        self.pixels.fill([r, g, b, 255]);
    }

    /// Blends a disc into the canvas. The outer `feather_edges` pixels fade
    /// out linearly; pixels outside the canvas are skipped. Alpha is kept.
    pub fn draw_circle(&mut self, cx: i64, cy: i64, radius: i64, color: [u8; 3], feather_edges: FT) {
        let r = radius as FT;
        // covered pixels are cx - radius ..= cx + radius - 1, clipped to the canvas
        let x_range = cx.saturating_sub(radius).max(0)..cx.saturating_add(radius).min(self.width as i64);
        let y_range = cy.saturating_sub(radius).max(0)..cy.saturating_add(radius).min(self.height as i64);

        for py in y_range {
            for px in x_range.clone() {
                let dx = (px - cx) as FT;
                let dy = (py - cy) as FT;
                let distance = dx.hypot(dy);
                if distance > r {
                    continue;
                }

                let alpha = if distance > r - feather_edges {
                    1. - (distance - (r - feather_edges)) / feather_edges
                } else {
                    1.
                };

                let pixel = &mut self.pixels[px as usize + py as usize * self.width];
                for (dst, &src) in pixel.iter_mut().zip(color.iter()) {
                    *dst = (*dst as FT * (1. - alpha) + src as FT * alpha).round() as u8;
                }
            }
        }
    }

    /// Flat RGBA bytes, as expected by image encoders.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flatten().cloned().collect()
    }
}
