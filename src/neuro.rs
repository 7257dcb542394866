use ahash::AHashMap;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub const NUM_INPUTS: usize = 2;
pub const NUM_HIDDEN: usize = 2;
pub const NUM_OUTPUTS: usize = 1;

// Flat weight vector layout: input->hidden weights, hidden biases,
// hidden->output weights, output biases.
pub const GENOME_LEN: usize =
    NUM_INPUTS * NUM_HIDDEN + NUM_HIDDEN + NUM_HIDDEN * NUM_OUTPUTS + NUM_OUTPUTS;

#[derive(Clone)]
pub struct EvoConfig {
    pub population_size: usize,
    pub num_elites: usize,
    pub num_parents: usize,
    pub mutation_rate: f64,
    pub mutation_span: f32,
    pub init_low: f32,
    pub init_high: f32,
}

impl Default for EvoConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            num_elites: 5,
            num_parents: 10,
            mutation_rate: 0.1,
            mutation_span: 1.0,
            init_low: -2.0,
            init_high: 5.0,
        }
    }
}

/// One population member: a 2-2-1 sigmoid network flattened into a weight
/// vector so crossover and mutation can treat it as a plain gene string.
#[derive(Clone, PartialEq)]
pub struct Genome {
    pub weights: Vec<f32>,
}

impl Genome {
    fn random(rng: &mut SmallRng, cfg: &EvoConfig) -> Self {
        Self {
            weights: (0..GENOME_LEN)
                .map(|_| rng.gen_range(cfg.init_low..cfg.init_high))
                .collect(),
        }
    }

    /// Forward pass. Returns the output activation in (0, 1).
    pub fn activate(&self, inputs: [f32; NUM_INPUTS]) -> f32 {
        let w = &self.weights;
        let hidden_bias = NUM_INPUTS * NUM_HIDDEN;
        let out_weights = hidden_bias + NUM_HIDDEN;
        let out_bias = out_weights + NUM_HIDDEN * NUM_OUTPUTS;

        let mut hidden = [0.0f32; NUM_HIDDEN];
        for h in 0..NUM_HIDDEN {
            let mut sum = w[hidden_bias + h];
            for i in 0..NUM_INPUTS {
                sum += inputs[i] * w[h * NUM_INPUTS + i];
            }
            hidden[h] = sigmoid(sum);
        }

        let mut out = w[out_bias];
        for h in 0..NUM_HIDDEN {
            out += hidden[h] * w[out_weights + h];
        }
        sigmoid(out)
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

pub struct Population {
    cfg: EvoConfig,
    members: Vec<Genome>,
    rng: SmallRng,
    generations_evolved: u32,
}

impl Population {
    pub fn new(cfg: EvoConfig, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let members = (0..cfg.population_size)
            .map(|_| Genome::random(&mut rng, &cfg))
            .collect();
        Self {
            cfg,
            members,
            rng,
            generations_evolved: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Decision function for one member given a 2-element observation.
    /// Members always see their latest evolved weights; `evolve` replaces
    /// them in place before any further decision is requested.
    pub fn decide(&self, member: usize, observation: [f32; NUM_INPUTS]) -> f32 {
        self.members[member].activate(observation)
    }

    /// One generational step over the completed fitness record, which must
    /// hold exactly one entry per member. Rank by fitness, carry the top
    /// elites over unchanged, and refill the rest with mutated crossover
    /// children of the top parents. Population size is preserved.
    pub fn evolve(&mut self, fitness: &AHashMap<usize, u32>) {
        assert_eq!(
            fitness.len(),
            self.members.len(),
            "fitness record incomplete at generation end"
        );

        let mut ranked: Vec<usize> = (0..self.members.len()).collect();
        ranked.sort_by_key(|i| std::cmp::Reverse(fitness[i]));
        let best_fitness = fitness[&ranked[0]];

        let mut next: Vec<Genome> = Vec::with_capacity(self.members.len());
        for &i in ranked.iter().take(self.cfg.num_elites) {
            next.push(self.members[i].clone());
        }

        let parents: Vec<usize> = ranked.iter().take(self.cfg.num_parents).copied().collect();
        while next.len() < self.members.len() {
            let pa = self.members[parents[self.rng.gen_range(0..parents.len())]].clone();
            let pb = self.members[parents[self.rng.gen_range(0..parents.len())]].clone();
            let mut child = crossover(&mut self.rng, &pa, &pb);
            mutate(&mut self.rng, &self.cfg, &mut child);
            next.push(child);
        }

        self.members = next;
        self.generations_evolved += 1;
        println!(
            "evolved generation {}: best_fitness = {}, pop_size = {}",
            self.generations_evolved,
            best_fitness,
            self.members.len()
        );
    }
}

/// Single-point crossover on the flat weight vector.
fn crossover(rng: &mut SmallRng, a: &Genome, b: &Genome) -> Genome {
    let cut = rng.gen_range(0..GENOME_LEN);
    let mut weights = a.weights[..cut].to_vec();
    weights.extend_from_slice(&b.weights[cut..]);
    Genome { weights }
}

fn mutate(rng: &mut SmallRng, cfg: &EvoConfig, genome: &mut Genome) {
    for w in genome.weights.iter_mut() {
        if rng.gen_bool(cfg.mutation_rate) {
            *w += rng.gen_range(-cfg.mutation_span..cfg.mutation_span);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_cfg() -> EvoConfig {
        EvoConfig {
            population_size: 6,
            num_elites: 2,
            num_parents: 3,
            ..EvoConfig::default()
        }
    }

    #[test]
    fn activation_stays_in_unit_interval() {
        let pop = Population::new(small_cfg(), 42);
        for member in 0..pop.size() {
            for obs in [[0.0, 0.0], [10.4, 0.3], [-3.0, 1.0]] {
                let a = pop.decide(member, obs);
                assert!(a > 0.0 && a < 1.0, "activation {a} out of range");
            }
        }
    }

    #[test]
    fn zero_weights_give_half_activation() {
        let g = Genome {
            weights: vec![0.0; GENOME_LEN],
        };
        assert_eq!(g.activate([0.7, 0.2]), 0.5);
    }

    #[test]
    fn evolve_keeps_size_and_carries_elites() {
        let mut pop = Population::new(small_cfg(), 7);
        let mut fitness = AHashMap::new();
        for i in 0..pop.size() {
            fitness.insert(i, i as u32 * 10);
        }
        // member 5 scored highest, member 4 second
        let best = pop.members[5].clone();
        let second = pop.members[4].clone();

        pop.evolve(&fitness);

        assert_eq!(pop.size(), 6);
        assert!(pop.members[0] == best);
        assert!(pop.members[1] == second);
    }

    #[test]
    #[should_panic(expected = "fitness record incomplete")]
    fn evolve_rejects_missing_fitness_entries() {
        let mut pop = Population::new(small_cfg(), 7);
        let mut fitness = AHashMap::new();
        fitness.insert(0, 3);
        pop.evolve(&fitness);
    }

    #[test]
    fn crossover_takes_a_prefix_and_b_suffix() {
        let mut rng = SmallRng::seed_from_u64(1);
        let a = Genome {
            weights: vec![1.0; GENOME_LEN],
        };
        let b = Genome {
            weights: vec![2.0; GENOME_LEN],
        };
        for _ in 0..50 {
            let child = crossover(&mut rng, &a, &b);
            assert_eq!(child.weights.len(), GENOME_LEN);
            let mut seen_b = false;
            for &w in &child.weights {
                if w == 2.0 {
                    seen_b = true;
                } else {
                    assert_eq!(w, 1.0);
                    assert!(!seen_b, "parent A gene after the cut point");
                }
            }
        }
    }
}
