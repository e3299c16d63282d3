use ndarray::ArrayView1;

use crate::Float;

/// A distance metric over feature vectors.
///
/// `rdistance` is the "reduced" form: any cheap monotonic proxy for the true
/// metric (the squared distance for `L2Dist`). Algorithms that only compare
/// distances should call `rdistance` and skip the final conversion.
pub trait Distance<F: Float>: Clone {
    /// The true distance between two points.
    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F;

    /// A monotonic proxy for `distance`, cheaper to compute where possible.
    fn rdistance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        self.distance(a, b)
    }

    /// Converts a reduced distance back into the true metric.
    fn rdistance_to_distance(&self, rdist: F) -> F {
        rdist
    }
}

/// Euclidean (L2) distance; `rdistance` is the squared distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L2Dist;

impl<F: Float> Distance<F> for L2Dist {
    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        self.rdistance(a, b).sqrt()
    }

    fn rdistance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        a.iter()
            .zip(b.iter())
            .map(|(&x, &y)| {
                let d = x - y;
                d * d
            })
            .sum()
    }

    fn rdistance_to_distance(&self, rdist: F) -> F {
        rdist.sqrt()
    }
}

/// Manhattan (L1) distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L1Dist;

impl<F: Float> Distance<F> for L1Dist {
    fn distance(&self, a: ArrayView1<F>, b: ArrayView1<F>) -> F {
        a.iter().zip(b.iter()).map(|(&x, &y)| (x - y).abs()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn l2_distance_and_rdistance() {
        let a = array![0.0, 0.0];
        let b = array![3.0, 4.0];
        assert_abs_diff_eq!(L2Dist.distance(a.view(), b.view()), 5.0);
        assert_abs_diff_eq!(L2Dist.rdistance(a.view(), b.view()), 25.0);
        assert_abs_diff_eq!(L2Dist.rdistance_to_distance(25.0), 5.0);
    }

    #[test]
    fn l1_distance() {
        let a = array![1.0, -1.0, 2.0];
        let b = array![2.0, 1.0, -1.0];
        assert_abs_diff_eq!(L1Dist.distance(a.view(), b.view()), 6.0);
        // L1 has no cheaper reduced form; the default passthrough applies.
        assert_abs_diff_eq!(L1Dist.rdistance(a.view(), b.view()), 6.0);
    }

    #[test]
    fn distance_is_zero_for_identical_points() {
        let a = array![2.5f32, 7.5];
        assert_abs_diff_eq!(L2Dist.distance(a.view(), a.view()), 0.0);
        assert_abs_diff_eq!(L1Dist.distance(a.view(), a.view()), 0.0);
    }
}
