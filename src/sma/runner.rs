//! Slime-mould search over assignment vectors.
//!
//! # Algorithm
//!
//! Each iteration `t` of `I`:
//! 1. Elitism: adopt the population's best if it beats the global best.
//! 2. Fitness range `[s_min, s_max]`; a zero-width range sets `s_max = 1`.
//! 3. Decay `b = min(1 - t/I, 0.99999)`, exploration `A = 2·atanh(b)`,
//!    per-iteration `v ~ U[-A, A]`.
//! 4. Weights: `1 + U[0,1)` for the best members, otherwise
//!    `1 - (f - s_min)/(s_max - s_min)`; then `W = tanh(|W|)`.
//! 5. Each member either blends toward the global best plus a peer
//!    difference (`R < 0.5`) or jumps randomly around the global best.
//!    Positions are rounded and clamped to valid machine indices.
//! 6. The new generation replaces the old one wholesale.
//!
//! # Reference
//! Li et al. (2020), "Slime mould algorithm: A new method for stochastic
//! optimization", Future Generation Computer Systems 111.

use rand::rngs::SmallRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::candidate::{discretize, Candidate};
use super::config::SmaConfig;
use super::problem::AssignmentProblem;
use crate::models::AssignmentMapping;

/// Upper bound on the decay factor so `atanh` stays finite.
const DECAY_CEILING: f64 = 0.99999;

/// Result of an optimizer run.
#[derive(Debug, Clone)]
pub struct SmaResult {
    /// Global-best assignment vector.
    pub best: Candidate,
    /// Decoded global best.
    pub mapping: AssignmentMapping,
    /// Best fitness of the random initial population.
    pub initial_fitness: f64,
    /// Global-best fitness at the start of each iteration.
    pub history: Vec<f64>,
    /// Iterations executed.
    pub iterations: usize,
}

impl SmaResult {
    /// Estimated makespan of the returned mapping.
    pub fn best_fitness(&self) -> f64 {
        self.best.fitness
    }
}

/// Iteration state of the slime-mould search.
///
/// Exposed as a step-wise state machine so callers (and tests) can observe
/// the population between generations. [`SmaRunner`] drives it to
/// completion.
#[derive(Debug)]
pub struct SlimeMould<'a> {
    problem: &'a AssignmentProblem,
    population: Vec<Candidate>,
    best: Candidate,
    initial_fitness: f64,
    iteration: usize,
    max_iterations: usize,
    history: Vec<f64>,
}

impl<'a> SlimeMould<'a> {
    /// Draws and evaluates the initial population.
    pub fn initialize<R: Rng>(
        problem: &'a AssignmentProblem,
        config: &SmaConfig,
        rng: &mut R,
    ) -> Self {
        let size = config.population_size.max(2);
        let population: Vec<Candidate> = (0..size)
            .map(|_| {
                let mut c = Candidate::random(problem.task_count(), problem.machine_count(), rng);
                problem.evaluate_candidate(&mut c);
                c
            })
            .collect();

        let best = population[best_index(&population)].clone();
        info!(
            population = size,
            iterations = config.max_iterations,
            estimated_makespan = best.fitness,
            "Initial random population evaluated"
        );

        Self {
            problem,
            initial_fitness: best.fitness,
            best,
            population,
            iteration: 0,
            max_iterations: config.max_iterations,
            history: Vec::with_capacity(config.max_iterations),
        }
    }

    pub fn population(&self) -> &[Candidate] {
        &self.population
    }

    /// Global best recorded so far.
    pub fn best(&self) -> &Candidate {
        &self.best
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn is_finished(&self) -> bool {
        self.iteration >= self.max_iterations
    }

    /// Runs one generation. Returns `false` once the budget is spent.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> bool {
        if self.is_finished() {
            return false;
        }
        let t = self.iteration;

        let current = best_index(&self.population);
        if self.population[current].fitness < self.best.fitness {
            self.best = self.population[current].clone();
            debug!(iteration = t, estimated_makespan = self.best.fitness, "New global best");
        }
        self.history.push(self.best.fitness);

        let (s_min, mut s_max) = fitness_range(&self.population);
        if s_max == s_min {
            s_max = 1.0;
        }

        let a = exploration_coefficient(t, self.max_iterations);
        let v = rng.random_range(-a..=a);

        let weights: Vec<f64> = self
            .population
            .iter()
            .map(|c| weight(c.fitness, s_min, s_max, rng))
            .collect();

        let size = self.population.len();
        let machine_count = self.problem.machine_count();
        let mut next = Vec::with_capacity(size);
        for (i, &w) in weights.iter().enumerate() {
            let peers = index::sample(rng, size, 2);
            let (p1, p2) = (&self.population[peers.index(0)], &self.population[peers.index(1)]);
            let r: f64 = rng.random();

            let slots = if r < 0.5 {
                approach(
                    &self.population[i].slots,
                    &self.best.slots,
                    &p1.slots,
                    &p2.slots,
                    w,
                    v,
                    machine_count,
                )
            } else {
                explode(&self.best.slots, v, machine_count, rng)
            };

            let mut child = Candidate::new(slots);
            self.problem.evaluate_candidate(&mut child);
            next.push(child);
        }

        self.population = next;
        self.iteration += 1;
        true
    }

    /// Decodes the global best into the final result.
    pub fn into_result(self) -> SmaResult {
        let mapping = self.problem.decode(&self.best);
        info!(
            iterations = self.iteration,
            estimated_makespan = self.best.fitness,
            "Slime-mould search finished"
        );
        SmaResult {
            best: self.best,
            mapping,
            initial_fitness: self.initial_fitness,
            history: self.history,
            iterations: self.iteration,
        }
    }
}

/// Runs the slime-mould optimizer to completion.
///
/// # Example
/// ```
/// use u_dispatch::models::{Machine, Task};
/// use u_dispatch::sma::{AssignmentProblem, SmaConfig, SmaRunner};
///
/// let tasks = vec![Task::new(0, 3), Task::new(1, 7), Task::new(2, 5)];
/// let machines = vec![Machine::new("vm1", "10.0.0.1", 1), Machine::new("vm2", "10.0.0.2", 4)];
/// let problem = AssignmentProblem::new(tasks, machines).unwrap();
///
/// let config = SmaConfig::default().with_max_iterations(100).with_seed(42);
/// let result = SmaRunner::run(&problem, &config);
/// assert_eq!(result.mapping.len(), 3);
/// ```
pub struct SmaRunner;

impl SmaRunner {
    /// Runs with an RNG seeded from `config.seed` (or the OS).
    pub fn run(problem: &AssignmentProblem, config: &SmaConfig) -> SmaResult {
        let mut rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Self::run_with_rng(problem, config, &mut rng)
    }

    /// Runs with a caller-supplied RNG.
    pub fn run_with_rng<R: Rng>(
        problem: &AssignmentProblem,
        config: &SmaConfig,
        rng: &mut R,
    ) -> SmaResult {
        let mut state = SlimeMould::initialize(problem, config, rng);
        while state.step(rng) {}
        state.into_result()
    }
}

/// Index of the lowest-fitness member (first on ties).
fn best_index(population: &[Candidate]) -> usize {
    population
        .iter()
        .enumerate()
        .fold(0, |best, (i, c)| if c.fitness < population[best].fitness { i } else { best })
}

fn fitness_range(population: &[Candidate]) -> (f64, f64) {
    population.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| {
        (lo.min(c.fitness), hi.max(c.fitness))
    })
}

/// `A = 2·atanh(min(1 - t/I, 0.99999))`.
pub(crate) fn exploration_coefficient(t: usize, max_iterations: usize) -> f64 {
    let b = 1.0 - t as f64 / max_iterations as f64;
    2.0 * b.min(DECAY_CEILING).atanh()
}

/// Weight in `[0, 1)`.
fn weight<R: Rng>(fitness: f64, s_min: f64, s_max: f64, rng: &mut R) -> f64 {
    let w = if fitness <= s_min {
        1.0 + rng.random::<f64>()
    } else {
        1.0 - (fitness - s_min) / (s_max - s_min)
    };
    w.abs().tanh()
}

/// Exploitation toward the global best plus exploration along a peer difference.
fn approach(
    own: &[usize],
    best: &[usize],
    peer1: &[usize],
    peer2: &[usize],
    w: f64,
    v: f64,
    machine_count: usize,
) -> Vec<usize> {
    own.iter()
        .zip(best)
        .zip(peer1.iter().zip(peer2))
        .map(|((&x, &xb), (&a, &b))| {
            let (x, xb, a, b) = (x as f64, xb as f64, a as f64, b as f64);
            discretize(x + w * (xb - x) + v * (a - b), machine_count)
        })
        .collect()
}

/// Random jump around the global best.
fn explode<R: Rng>(best: &[usize], v: f64, machine_count: usize, rng: &mut R) -> Vec<usize> {
    let amplitude = 2.0 * machine_count as f64;
    best.iter()
        .map(|&xb| {
            let jitter = rng.random::<f64>() - 0.5;
            discretize(xb as f64 + v * jitter * amplitude, machine_count)
        })
        .collect()
}
