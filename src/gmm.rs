//! Gaussian mixture color model used by the cut.

use nalgebra::{ Matrix3, Vector3 };

pub const COMPONENTS: usize = 5;

const KMEANS_ROUNDS: usize = 10;
// added to the covariance diagonal when it is singular
const VARIANCE_FLOOR: f64 = 0.01;

pub type Color = Vector3<f64>;

#[derive(Debug, Clone)]
struct Component {
    weight: f64,
    mean: Color,
    inverse: Matrix3<f64>,
    // 1 / sqrt(det(covariance))
    norm: f64,
}

impl Component {
    fn empty() -> Self {
        Self { weight: 0.0, mean: Color::zeros(), inverse: Matrix3::identity(), norm: 0.0 }
    }

    fn density(&self, color: &Color) -> f64 {
        if self.weight <= 0.0 {
            return 0.0;
        }
        let d = color - self.mean;
        let mahalanobis = d.dot(&(self.inverse * d));
        self.norm * (-0.5 * mahalanobis).exp()
    }
}

#[derive(Debug, Clone)]
pub struct Gmm {
    components: Vec<Component>,
}

impl Gmm {

    /// Fit every component to the samples labelled with its index.
    pub fn learn(samples: &[Color], labels: &[usize]) -> Self {
        let mut sums = vec![Color::zeros(); COMPONENTS];
        let mut products = vec![Matrix3::<f64>::zeros(); COMPONENTS];
        let mut counts = vec![0usize; COMPONENTS];
        for (color, &k) in samples.iter().zip(labels) {
            sums[k] += color;
            products[k] += color * color.transpose();
            counts[k] += 1;
        }

        let total = samples.len().max(1) as f64;
        let components = (0..COMPONENTS).map(|k| {
            if counts[k] == 0 {
                return Component::empty();
            }
            let n = counts[k] as f64;
            let mean = sums[k] / n;
            let mut covariance = products[k] / n - mean * mean.transpose();
            if covariance.determinant() <= f64::EPSILON {
                covariance += Matrix3::identity() * VARIANCE_FLOOR;
            }
            let det = covariance.determinant();
            let inverse = covariance.try_inverse().unwrap_or_else(Matrix3::identity);
            Component { weight: n / total, mean, inverse, norm: 1.0 / det.max(f64::MIN_POSITIVE).sqrt() }
        }).collect();
        Self { components }
    }

    /// Mixture likelihood of `color`.
    pub fn likelihood(&self, color: &Color) -> f64 {
        self.components.iter().map(|c| c.weight * c.density(color)).sum()
    }

    /// Component that explains `color` best.
    pub fn most_likely(&self, color: &Color) -> usize {
        let mut best = 0;
        let mut best_density = 0.0;
        for (k, c) in self.components.iter().enumerate() {
            let d = c.density(color);
            if d > best_density {
                best = k;
                best_density = d;
            }
        }
        best
    }
}

fn nearest(centers: &[Color], color: &Color) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (k, center) in centers.iter().enumerate() {
        let distance = (color - center).norm_squared();
        if distance < best_distance {
            best = k;
            best_distance = distance;
        }
    }
    best
}

/// Split `samples` into `COMPONENTS` clusters, returns the cluster of every sample.
///
/// Seeds are chosen farthest-point first so the result is deterministic.
pub fn kmeans(samples: &[Color]) -> Vec<usize> {
    if samples.is_empty() {
        return Vec::new();
    }
    let mut centers = vec![samples[0]];
    let mut distance: Vec<f64> = samples.iter().map(|s| (s - samples[0]).norm_squared()).collect();
    while centers.len() < COMPONENTS {
        let (far, _) = distance.iter().enumerate()
            .fold((0, -1.0), |(bi, bd), (i, d)| if *d > bd { (i, *d) } else { (bi, bd) });
        let seed = samples[far];
        centers.push(seed);
        distance.iter_mut().zip(samples).for_each(|(d, s)| *d = d.min((s - seed).norm_squared()));
    }

    let mut labels = vec![0; samples.len()];
    for _ in 0..KMEANS_ROUNDS {
        labels.iter_mut().zip(samples).for_each(|(l, s)| *l = nearest(&centers, s));
        let mut sums = vec![Color::zeros(); COMPONENTS];
        let mut counts = vec![0usize; COMPONENTS];
        for (s, &k) in samples.iter().zip(&labels) {
            sums[k] += s;
            counts[k] += 1;
        }
        // an empty cluster keeps its previous center
        for k in 0..COMPONENTS {
            if counts[k] > 0 {
                centers[k] = sums[k] / counts[k] as f64;
            }
        }
    }
    labels
}

#[cfg(test)]
mod test {

    use approx::assert_relative_eq;

    use super::{ Color, Gmm, kmeans };

    fn two_colors() -> Vec<Color> {
        let mut samples = vec![Color::new(200.0, 10.0, 10.0); 30];
        samples.extend(vec![Color::new(10.0, 10.0, 200.0); 20]);
        samples
    }

    #[test]
    fn kmeans_separates_distinct_colors() {
        let samples = two_colors();
        let labels = kmeans(&samples);
        assert!(labels[..30].iter().all(|l| *l == labels[0]));
        assert!(labels[30..].iter().all(|l| *l == labels[30]));
        assert_ne!(labels[0], labels[30]);
    }

    #[test]
    fn weights_follow_sample_share() {
        let samples = two_colors();
        let labels = kmeans(&samples);
        let gmm = Gmm::learn(&samples, &labels);
        let red = gmm.components[labels[0]].weight;
        let blue = gmm.components[labels[30]].weight;
        assert_relative_eq!(red, 0.6);
        assert_relative_eq!(blue, 0.4);
        assert_eq!(gmm.most_likely(&samples[0]), labels[0]);
        assert_eq!(gmm.most_likely(&samples[49]), labels[30]);
    }

    #[test]
    fn seen_colors_are_more_likely() {
        let samples = two_colors();
        let gmm = Gmm::learn(&samples, &kmeans(&samples));
        let seen = gmm.likelihood(&Color::new(200.0, 10.0, 10.0));
        let unseen = gmm.likelihood(&Color::new(10.0, 200.0, 10.0));
        assert!(seen > unseen);
        assert!(seen.is_finite());
    }
}
