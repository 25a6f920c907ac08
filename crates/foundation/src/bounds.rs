/// Axis-aligned bounding box in lon/lat degrees (`x` = lon, `y` = lat).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    /// Box enclosing every point, or `None` when the iterator is empty.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = [f64; 2]>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut b = Aabb2::new(first, first);
        for p in iter {
            b.min[0] = b.min[0].min(p[0]);
            b.min[1] = b.min[1].min(p[1]);
            b.max[0] = b.max[0].max(p[0]);
            b.max[1] = b.max[1].max(p[1]);
        }
        Some(b)
    }

    /// Inclusive on every edge.
    pub fn contains(&self, p: [f64; 2]) -> bool {
        p[0] >= self.min[0] && p[0] <= self.max[0] && p[1] >= self.min[1] && p[1] <= self.max[1]
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    pub fn center(&self) -> [f64; 2] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb2;

    #[test]
    fn from_points_and_contains() {
        let b = Aabb2::from_points([[10.0, -5.0], [20.0, 5.0], [15.0, 0.0]]).unwrap();
        assert_eq!(b, Aabb2::new([10.0, -5.0], [20.0, 5.0]));
        assert!(b.contains([10.0, 5.0]));
        assert!(b.contains([15.0, 0.0]));
        assert!(!b.contains([9.9, 0.0]));
        assert_eq!(b.center(), [15.0, 0.0]);
        assert_eq!((b.width(), b.height()), (10.0, 10.0));
    }

    #[test]
    fn empty_input_has_no_box() {
        assert!(Aabb2::from_points(std::iter::empty()).is_none());
    }
}
