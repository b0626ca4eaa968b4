use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis aligned rectangle on the ground plane
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub center: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline(always)]
    #[must_use]
    pub const fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    /// Lower corner of the rectangle
    /// ```
    /// use dungeon::Rect;
    /// use glam::Vec2;
    ///
    /// let rect = Rect::new(Vec2::new(1., 2.), Vec2::new(4., 2.));
    /// assert_eq!(rect.min(), Vec2::new(-1., 1.))
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn min(&self) -> Vec2 {
        self.center - self.size * 0.5
    }

    /// Upper corner of the rectangle
    /// ```
    /// use dungeon::Rect;
    /// use glam::Vec2;
    ///
    /// let rect = Rect::new(Vec2::new(1., 2.), Vec2::new(4., 2.));
    /// assert_eq!(rect.max(), Vec2::new(3., 3.))
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.center + self.size * 0.5
    }

    /// Check if a point is inside this rect
    /// ```
    /// use dungeon::Rect;
    /// use glam::Vec2;
    ///
    /// let rect = Rect::new(Vec2::ZERO, Vec2::new(2., 2.));
    /// assert!(rect.contains(Vec2::new(0.5, -1.)));
    /// assert!(!rect.contains(Vec2::new(1.5, 0.)));
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        min.x <= point.x && point.x <= max.x && min.y <= point.y && point.y <= max.y
    }

    /// Check if the interiors of the two rects intersect.
    ///
    /// Rects that only touch along an edge do not overlap.
    #[inline(always)]
    #[must_use]
    pub fn overlaps(&self, other: &Rect) -> bool {
        let (min, max) = (self.min(), self.max());
        let (omin, omax) = (other.min(), other.max());
        max.x > omin.x && min.x < omax.x && max.y > omin.y && min.y < omax.y
    }

    /// Same rect, moved by `offset`
    #[inline(always)]
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Rect {
        Rect {
            center: self.center + offset,
            size: self.size,
        }
    }

    #[inline(always)]
    #[must_use]
    pub fn area(&self) -> f32 {
        self.size.x * self.size.y
    }

    /// Smallest rect covering all the given ones
    /// ```
    /// use dungeon::Rect;
    /// use glam::Vec2;
    ///
    /// let a = Rect::new(Vec2::ZERO, Vec2::new(2., 2.));
    /// let b = Rect::new(Vec2::new(4., 0.), Vec2::new(2., 4.));
    /// let bounds = Rect::bounding([a, b]).unwrap();
    /// assert_eq!(bounds.min(), Vec2::new(-1., -2.));
    /// assert_eq!(bounds.max(), Vec2::new(5., 2.));
    /// ```
    #[must_use]
    pub fn bounding(rects: impl IntoIterator<Item = Rect>) -> Option<Rect> {
        let mut rects = rects.into_iter();
        let first = rects.next()?;
        let (min, max) = rects.fold((first.min(), first.max()), |(min, max), r| {
            (min.min(r.min()), max.max(r.max()))
        });
        Some(Rect {
            center: (min + max) * 0.5,
            size: max - min,
        })
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::Rect;

    #[test]
    fn overlap_is_symmetric() {
        let a = Rect::new(Vec2::ZERO, Vec2::new(4., 4.));
        let b = Rect::new(Vec2::new(3., 1.), Vec2::new(4., 4.));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn touching_rects_do_not_overlap() {
        let a = Rect::new(Vec2::ZERO, Vec2::new(4., 4.));
        let b = Rect::new(Vec2::new(4., 0.), Vec2::new(4., 4.));
        assert!(!a.overlaps(&b));
        assert!(!a.overlaps(&b.translated(Vec2::new(0., 10.))));
        assert!(a.overlaps(&b.translated(Vec2::new(-0.5, 0.))));
    }

    #[test]
    fn empty_bounding() {
        assert_eq!(Rect::bounding([]), None);
    }
}
