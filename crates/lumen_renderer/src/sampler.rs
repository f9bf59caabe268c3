//! Pre-generated sample sets and the power-cosine hemisphere warp.
//!
//! A [`Sampler`] owns `num_sets` sets of `num_samples` points in [0,1)^2,
//! generated up front with one of the [`SamplePattern`]s. Draws walk a
//! randomly chosen set through a shuffled index table and hop to a new set
//! every `num_samples` draws, which hides the structure of any single set.
//! [`Sampler::independent`] skips the sets and draws fresh uniform points.
//!
//! Samplers carry mutable state and are never shared: each render worker
//! owns one.

use std::f32::consts::PI;

use lumen_math::{Vec2, Vec3};
use rand::seq::SliceRandom;
use rand::{Rng as _, SeedableRng};
use serde::{Deserialize, Serialize};

/// Random number engine used throughout the renderer.
pub type Rng = rand_xoshiro::Xoshiro256PlusPlus;

/// Number of sample sets that works well for most sample counts.
pub const DEFAULT_SAMPLE_SETS: usize = 83;

/// Largest f32 below 1.
const ONE_MINUS_EPSILON: f32 = 0.999_999_94;

/// Distribution of the points inside one sample set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplePattern {
    /// Independent uniform points
    Random,
    /// One uniform point per cell of a k x k grid
    #[default]
    Jittered,
    /// Jittered on the coarse grid and n-rooks on the fine grid
    MultiJittered,
}

#[derive(Debug, Clone)]
pub struct Sampler {
    rng: Rng,
    num_samples: usize,
    num_sets: usize,
    samples: Vec<Vec2>,
    shuffled: Vec<usize>,
    count: usize,
    jump: usize,
}

impl Sampler {
    /// Stratified patterns round `num_samples` up to the next perfect square.
    pub fn new(pattern: SamplePattern, num_samples: usize, num_sets: usize, seed: u64) -> Self {
        let mut rng = Rng::seed_from_u64(seed);
        let num_sets = num_sets.max(1);
        let num_samples = match pattern {
            SamplePattern::Random => num_samples.max(1),
            SamplePattern::Jittered | SamplePattern::MultiJittered => {
                let k = grid_size(num_samples);
                k * k
            }
        };

        let mut samples = Vec::with_capacity(num_samples * num_sets);
        for _ in 0..num_sets {
            match pattern {
                SamplePattern::Random => {
                    samples.extend((0..num_samples).map(|_| Vec2::new(rng.gen(), rng.gen())))
                }
                SamplePattern::Jittered => samples.extend(jittered_set(&mut rng, num_samples)),
                SamplePattern::MultiJittered => {
                    samples.extend(multi_jittered_set(&mut rng, num_samples))
                }
            }
        }

        let mut shuffled = Vec::with_capacity(num_samples * num_sets);
        let mut order: Vec<usize> = (0..num_samples).collect();
        for _ in 0..num_sets {
            order.shuffle(&mut rng);
            shuffled.extend_from_slice(&order);
        }

        Self {
            rng,
            num_samples,
            num_sets,
            samples,
            shuffled,
            count: 0,
            jump: 0,
        }
    }

    /// A sampler without stored sets: every draw is a fresh uniform point.
    pub fn independent(seed: u64) -> Self {
        Self {
            rng: Rng::seed_from_u64(seed),
            num_samples: 1,
            num_sets: 0,
            samples: Vec::new(),
            shuffled: Vec::new(),
            count: 0,
            jump: 0,
        }
    }

    /// Samples per set after rounding.
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Zero for [`Sampler::independent`].
    pub fn num_sets(&self) -> usize {
        self.num_sets
    }

    /// Next point of the current set in [0,1)^2.
    pub fn next_square(&mut self) -> Vec2 {
        if self.samples.is_empty() {
            return Vec2::new(self.rng.gen(), self.rng.gen());
        }
        if self.count % self.num_samples == 0 {
            self.jump = self.rng.gen_range(0..self.num_sets) * self.num_samples;
        }
        let slot = self.jump + self.count % self.num_samples;
        self.count = self.count.wrapping_add(1);
        self.samples[self.jump + self.shuffled[slot]]
    }

    /// Independent uniform scalar in [0,1), for roulette and discrete choices.
    pub fn next_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Direction in the z-up hemisphere with density proportional to
    /// `cos(theta)^exponent`. See [`hemisphere_pdf`].
    pub fn next_hemisphere(&mut self, exponent: f32) -> Vec3 {
        hemisphere_from_square(self.next_square(), exponent)
    }
}

fn grid_size(num_samples: usize) -> usize {
    ((num_samples.max(1) as f64).sqrt().ceil() as usize).max(1)
}

fn jittered_set(rng: &mut Rng, num_samples: usize) -> Vec<Vec2> {
    let k = grid_size(num_samples);
    let cell = 1.0 / k as f32;
    let mut set = Vec::with_capacity(k * k);
    for row in 0..k {
        for col in 0..k {
            set.push(
                Vec2::new(
                    (col as f32 + rng.gen::<f32>()) * cell,
                    (row as f32 + rng.gen::<f32>()) * cell,
                )
                .min(Vec2::splat(ONE_MINUS_EPSILON)),
            );
        }
    }
    set
}

/// Chiu, Shirley and Wang multi-jittered set of `k * k` points.
///
/// Point `a * k + b` starts in coarse cell (x = a, y = b); the two shuffles
/// only exchange coordinates between points sharing that coarse stratum.
fn multi_jittered_set(rng: &mut Rng, num_samples: usize) -> Vec<Vec2> {
    let k = grid_size(num_samples);
    let n = k * k;
    let fine = 1.0 / n as f32;

    let mut set: Vec<Vec2> = (0..n)
        .map(|idx| {
            let (a, b) = (idx / k, idx % k);
            Vec2::new(
                ((a * k + b) as f32 + rng.gen::<f32>()) * fine,
                ((b * k + a) as f32 + rng.gen::<f32>()) * fine,
            )
            .min(Vec2::splat(ONE_MINUS_EPSILON))
        })
        .collect();

    for a in 0..k {
        for b in 0..k {
            let other = rng.gen_range(b..k);
            let (i, j) = (a * k + b, a * k + other);
            let tmp = set[i].x;
            set[i].x = set[j].x;
            set[j].x = tmp;
        }
    }
    for b in 0..k {
        for a in 0..k {
            let other = rng.gen_range(a..k);
            let (i, j) = (a * k + b, other * k + b);
            let tmp = set[i].y;
            set[i].y = set[j].y;
            set[j].y = tmp;
        }
    }
    set
}

/// Power-cosine hemisphere warp around +Z. `exponent = 1` is the
/// cosine-weighted (Lambertian) distribution.
pub fn hemisphere_from_square(u: Vec2, exponent: f32) -> Vec3 {
    let phi = 2.0 * PI * u.x;
    let cos_theta = (1.0 - u.y).powf(1.0 / (exponent + 1.0));
    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta)
}

/// Solid-angle density of [`hemisphere_from_square`].
pub fn hemisphere_pdf(cos_theta: f32, exponent: f32) -> f32 {
    if cos_theta <= 0.0 {
        return 0.0;
    }
    (exponent + 1.0) / (2.0 * PI) * cos_theta.powf(exponent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_unit_square(p: Vec2) -> bool {
        (0.0..1.0).contains(&p.x) && (0.0..1.0).contains(&p.y)
    }

    #[test]
    fn test_stratified_patterns_round_to_square() {
        assert_eq!(Sampler::new(SamplePattern::Jittered, 5, 4, 1).num_samples(), 9);
        assert_eq!(Sampler::new(SamplePattern::MultiJittered, 16, 4, 1).num_samples(), 16);
        assert_eq!(Sampler::new(SamplePattern::Random, 5, 4, 1).num_samples(), 5);
        assert_eq!(Sampler::new(SamplePattern::Random, 0, 0, 1).num_sets(), 1);
    }

    #[test]
    fn test_jittered_one_sample_per_cell() {
        let mut rng = Rng::seed_from_u64(42);
        let set = jittered_set(&mut rng, 16);
        let mut seen = [false; 16];
        for p in &set {
            assert!(in_unit_square(*p));
            let cell = (p.y * 4.0) as usize * 4 + (p.x * 4.0) as usize;
            assert!(!seen[cell], "cell {cell} sampled twice");
            seen[cell] = true;
        }
    }

    #[test]
    fn test_multi_jittered_strata() {
        let mut rng = Rng::seed_from_u64(42);
        let k = 4;
        let n = k * k;
        let set = multi_jittered_set(&mut rng, n);

        let mut coarse = vec![false; n];
        let mut fine_x = vec![false; n];
        let mut fine_y = vec![false; n];
        for p in &set {
            assert!(in_unit_square(*p));
            let cell = (p.x * k as f32) as usize * k + (p.y * k as f32) as usize;
            assert!(!coarse[cell]);
            coarse[cell] = true;
            let fx = (p.x * n as f32) as usize;
            let fy = (p.y * n as f32) as usize;
            assert!(!fine_x[fx] && !fine_y[fy], "n-rooks property violated");
            fine_x[fx] = true;
            fine_y[fy] = true;
        }
    }

    #[test]
    fn test_next_square_walks_whole_set() {
        let mut sampler = Sampler::new(SamplePattern::Jittered, 4, 1, 7);
        let mut drawn: Vec<Vec2> = (0..4).map(|_| sampler.next_square()).collect();
        let mut set = sampler.samples.clone();
        let key = |p: &Vec2| (p.x * 1e6) as i64 * 10_000_000 + (p.y * 1e6) as i64;
        drawn.sort_by_key(key);
        set.sort_by_key(key);
        assert_eq!(drawn, set);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = Sampler::new(SamplePattern::MultiJittered, 9, 10, 99);
        let mut b = Sampler::new(SamplePattern::MultiJittered, 9, 10, 99);
        for _ in 0..50 {
            assert_eq!(a.next_square(), b.next_square());
            assert_eq!(a.next_f32(), b.next_f32());
        }
    }

    #[test]
    fn test_hemisphere_warp_stays_in_domain() {
        let mut sampler = Sampler::new(SamplePattern::Random, 64, 4, 3);
        for _ in 0..500 {
            let h = sampler.next_hemisphere(1.0);
            assert!(h.z >= 0.0);
            assert!((h.length() - 1.0).abs() < 1e-4);
        }
    }

    /// Monte Carlo estimate of an integral over the hemisphere using the
    /// power-cosine sampler and its pdf.
    fn estimate(sampler: &mut Sampler, exponent: f32, f: impl Fn(f32) -> f32, n: usize) -> f32 {
        let mut sum = 0.0f64;
        for _ in 0..n {
            let d = sampler.next_hemisphere(exponent);
            let pdf = hemisphere_pdf(d.z, exponent);
            if pdf > 0.0 {
                sum += (f(d.z) / pdf) as f64;
            }
        }
        (sum / n as f64) as f32
    }

    #[test]
    fn test_cosine_sampling_integrates_cosine_to_pi() {
        // integral of cos(theta) over the hemisphere is pi; with a cosine
        // pdf every sample contributes exactly pi
        let mut sampler = Sampler::new(SamplePattern::Jittered, 16, DEFAULT_SAMPLE_SETS, 42);
        let est = estimate(&mut sampler, 1.0, |c| c, 10_000);
        assert!((est - PI).abs() < 1e-3, "estimate {est}");
    }

    #[test]
    fn test_cosine_sampling_converges_for_cos_squared() {
        // integral of cos^2 over the hemisphere is 2*pi/3
        let expected = 2.0 * PI / 3.0;
        let mut sampler = Sampler::new(SamplePattern::MultiJittered, 16, DEFAULT_SAMPLE_SETS, 42);
        let coarse = (estimate(&mut sampler, 1.0, |c| c * c, 100) - expected).abs();
        let fine = (estimate(&mut sampler, 1.0, |c| c * c, 40_000) - expected).abs();
        assert!(fine < 0.02, "error {fine}");
        assert!(fine <= coarse + 0.02);
    }

    #[test]
    fn test_uniform_sampling_integrates_cosine_to_pi() {
        let mut sampler = Sampler::new(SamplePattern::Random, 16, DEFAULT_SAMPLE_SETS, 5);
        let est = estimate(&mut sampler, 0.0, |c| c, 40_000);
        assert!((est - PI).abs() < 0.05, "estimate {est}");
    }

    #[test]
    fn test_pdf_integrates_to_one() {
        // integrate the pdf itself with uniform sampling: E[pdf / (1/2pi)]
        let mut sampler = Sampler::new(SamplePattern::Jittered, 16, DEFAULT_SAMPLE_SETS, 8);
        for exponent in [1.0, 5.0, 20.0] {
            let est = estimate(&mut sampler, 0.0, |c| hemisphere_pdf(c, exponent), 40_000);
            assert!((est - 1.0).abs() < 0.05, "exponent {exponent}: {est}");
        }
    }
}
