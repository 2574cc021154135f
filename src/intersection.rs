use geo::{Coord, CoordNum, Rect};

pub trait Intersection {
    type Output;
    /// `None` when the geometries do not overlap.
    /// Touching edges intersect as a degenerate geometry.
    fn intersection(&self, rhs: &Self) -> Option<Self::Output>;
}

pub trait Union {
    type Output;
    fn union(&self, rhs: &Self) -> Self::Output;
}

fn max<T: CoordNum>(x: T, y: T) -> T {
    if x > y {
        x
    } else {
        y
    }
}

fn min<T: CoordNum>(x: T, y: T) -> T {
    if x < y {
        x
    } else {
        y
    }
}

impl<T: CoordNum> Intersection for Rect<T> {
    type Output = Rect<T>;
    fn intersection(&self, rhs: &Self) -> Option<Rect<T>> {
        let lhs_max = self.max();
        let rhs_min = rhs.min();
        if (lhs_max.x < rhs_min.x) | (lhs_max.y < rhs_min.y) {
            return None;
        }

        let lhs_min = self.min();
        let rhs_max = rhs.max();
        if (lhs_min.x > rhs_max.x) | (lhs_min.y > rhs_max.y) {
            return None;
        }

        let lower = Coord {
            x: max(lhs_min.x, rhs_min.x),
            y: max(lhs_min.y, rhs_min.y),
        };
        let upper = Coord {
            x: min(lhs_max.x, rhs_max.x),
            y: min(lhs_max.y, rhs_max.y),
        };

        Some(Self::new(lower, upper))
    }
}

impl<T: CoordNum> Union for Rect<T> {
    type Output = Rect<T>;
    fn union(&self, rhs: &Self) -> Rect<T> {
        let (lhs_min, lhs_max) = (self.min(), self.max());
        let (rhs_min, rhs_max) = (rhs.min(), rhs.max());
        Self::new(
            Coord {
                x: min(lhs_min.x, rhs_min.x),
                y: min(lhs_min.y, rhs_min.y),
            },
            Coord {
                x: max(lhs_max.x, rhs_max.x),
                y: max(lhs_max.y, rhs_max.y),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_rects() {
        let lhs = Rect::new((0, 0), (10, 10));
        let rhs = Rect::new((5, -5), (15, 5));
        assert_eq!(lhs.intersection(&rhs), Some(Rect::new((5, 0), (10, 5))));
        assert_eq!(lhs.union(&rhs), Rect::new((0, -5), (15, 10)));
    }

    #[test]
    fn disjoint_rects() {
        let lhs = Rect::new((0., 0.), (1., 1.));
        let rhs = Rect::new((2., 2.), (3., 3.));
        assert_eq!(lhs.intersection(&rhs), None);
        assert_eq!(lhs.union(&rhs), Rect::new((0., 0.), (3., 3.)));
    }
}
