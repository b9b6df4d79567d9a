use crate::{floating_type_mod::FT, V};

pub type Color = V<FT, 3>;

/// Piecewise linear color ramp through sorted color stops.
pub struct ColorMap {
    insertions: Vec<(FT, Color)>,
}

impl ColorMap {
    pub fn new(mut insertions: Vec<(FT, Color)>) -> Self {
        insertions.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { insertions }
    }

    /// Values outside the stops are clamped to the first/last color.
    pub fn get(&self, x: FT) -> Color {
        let (first, last) = match (self.insertions.first(), self.insertions.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Color::zeros(),
        };
        if x <= first.0 {
            return first.1;
        }
        if x >= last.0 {
            return last.1;
        }

        for w in self.insertions.windows(2) {
            let (lo, hi) = (&w[0], &w[1]);
            if x >= lo.0 && x <= hi.0 {
                if hi.0 == lo.0 {
                    return lo.1;
                }
                let interp = (x - lo.0) / (hi.0 - lo.0);
                return lo.1 + interp * (hi.1 - lo.1);
            }
        }

        // only NaN falls through the stops
        first.1
    }

    pub fn get_u8(&self, x: FT) -> V<u8, 3> {
        self.get(x).map(|f| (f * 255.).round() as u8)
    }
}
