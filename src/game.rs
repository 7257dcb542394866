use ahash::AHashMap;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::neuro::{EvoConfig, Population};

pub const FIELD_W: f32 = 500.0;
pub const FIELD_H: f32 = 512.0;

pub const BIRD_X: f32 = 80.0;
pub const BIRD_START_Y: f32 = 250.0;
pub const BIRD_W: f32 = 34.0;
pub const BIRD_H: f32 = 24.0;
const GRAVITY_ACCEL: f32 = 0.3;
const FLAP_IMPULSE: f32 = -6.0;

pub const PIPE_W: f32 = 40.0;
const PIPE_SPEED: f32 = 3.0;
const PIPE_GAP: f32 = 120.0;
const EDGE_MARGIN: f32 = 50.0;
pub const SPAWN_INTERVAL: u32 = 90;

const FLAP_THRESHOLD: f32 = 0.5;

pub struct Bird {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Vertical velocity accumulator.
    pub vel: f32,
    pub alive: bool,
    /// Population member steering this bird, fixed for the whole generation.
    pub member: usize,
}

impl Bird {
    pub fn new(member: usize) -> Self {
        Self {
            x: BIRD_X,
            y: BIRD_START_Y,
            width: BIRD_W,
            height: BIRD_H,
            vel: 0.0,
            alive: true,
            member,
        }
    }

    pub fn flap(&mut self) {
        self.vel = FLAP_IMPULSE;
    }

    // No clamping; leaving the field is what the liveness check catches.
    pub fn update(&mut self) {
        self.vel += GRAVITY_ACCEL;
        self.y += self.vel;
    }

    pub fn is_dead(&self, pipes: &[Pipe]) -> bool {
        if self.y >= FIELD_H || self.y + self.height <= 0.0 {
            return true;
        }
        pipes.iter().any(|p| self.hits(p))
    }

    // Safe only if strictly clear on at least one side; touching edges collide.
    fn hits(&self, p: &Pipe) -> bool {
        !(self.x > p.x + p.width
            || self.x + self.width < p.x
            || self.y > p.y + p.height
            || self.y + self.height < p.y)
    }
}

pub struct Pipe {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Pipe {
    fn new(x: f32, y: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width: PIPE_W,
            height,
        }
    }

    fn advance(&mut self) {
        self.x -= PIPE_SPEED;
    }

    fn is_offscreen(&self) -> bool {
        self.x + self.width <= 0.0
    }
}

/// The per-generation world: owns the bird set, the pipe set, and the
/// fitness record, and drives the evolutionary step at generation end.
pub struct World {
    pub birds: Vec<Bird>,
    /// Pairs are pushed upper-then-lower, so upper pipes sit at even indices.
    pub pipes: Vec<Pipe>,
    pub score: u32,
    pub max_score: u32,
    pub generation: u32,
    pub alive_count: usize,
    /// Best fitness of each finished generation, oldest first.
    pub best_history: Vec<u32>,
    spawn_tick: u32,
    fitness: AHashMap<usize, u32>,
    brains: Population,
    rng: SmallRng,
}

impl World {
    pub fn new(cfg: EvoConfig, seed: u64) -> Self {
        let mut world = Self {
            birds: Vec::new(),
            pipes: Vec::new(),
            score: 0,
            max_score: 0,
            generation: 0,
            alive_count: 0,
            best_history: Vec::new(),
            spawn_tick: 0,
            fitness: AHashMap::new(),
            brains: Population::new(cfg, seed),
            rng: SmallRng::seed_from_u64(!seed),
        };
        world.reset();
        world
    }

    pub fn population_size(&self) -> usize {
        self.brains.size()
    }

    /// One simulation tick. A generation that ends is evolved and reset
    /// within the same tick, before the environment advance.
    pub fn update(&mut self) {
        if self.step_agents() {
            let best = self.fitness.values().copied().max().unwrap_or(0);
            self.best_history.push(best);
            self.brains.evolve(&self.fitness);
            self.reset();
        }
        self.step_environment();
    }

    /// Start a fresh generation against an empty field. The bird -> member
    /// association is rebuilt here and stays stable until the next reset.
    fn reset(&mut self) {
        self.spawn_tick = 0;
        self.score = 0;
        self.pipes.clear();
        self.fitness.clear();
        self.birds = (0..self.brains.size()).map(Bird::new).collect();
        self.alive_count = self.birds.len();
        self.generation += 1;
    }

    /// Decide, move, and liveness-check every alive bird. Returns true when
    /// the last bird died on this tick.
    fn step_agents(&mut self) -> bool {
        let gap_feature = self.next_gap_feature();
        for i in 0..self.birds.len() {
            if !self.birds[i].alive {
                continue;
            }
            // y is scaled by the bird's own height, not the field height;
            // kept exactly as the networks were trained against.
            let observation = [self.birds[i].y / self.birds[i].height, gap_feature];
            if self.brains.decide(self.birds[i].member, observation) > FLAP_THRESHOLD {
                self.birds[i].flap();
            }
            self.birds[i].update();
            if self.birds[i].is_dead(&self.pipes) {
                self.birds[i].alive = false;
                self.alive_count -= 1;
                self.fitness.insert(self.birds[i].member, self.score);
            }
        }
        self.alive_count == 0
    }

    /// Normalized gap-top of the next pair ahead of the lead bird, or 0.0
    /// before the first pair arrives. Upper pipes sit at even indices.
    fn next_gap_feature(&self) -> f32 {
        if self.alive_count == 0 {
            return 0.0;
        }
        let lead_x = self.birds.first().map(|b| b.x).unwrap_or(BIRD_X);
        self.pipes
            .iter()
            .step_by(2)
            .find(|p| p.x + p.width > lead_x)
            .map(|p| p.height / FIELD_H)
            .unwrap_or(0.0)
    }

    /// Pipe movement, despawn, spawn, clock and score. Runs every tick
    /// regardless of how the agent phase went.
    fn step_environment(&mut self) {
        for pipe in &mut self.pipes {
            pipe.advance();
        }
        self.pipes.retain(|p| !p.is_offscreen());

        if self.spawn_tick == 0 {
            self.spawn_pair();
        }
        self.spawn_tick += 1;
        if self.spawn_tick == SPAWN_INTERVAL {
            self.spawn_tick = 0;
        }

        self.score += 1;
        self.max_score = self.max_score.max(self.score);
    }

    fn spawn_pair(&mut self) {
        let span = FIELD_H - 2.0 * EDGE_MARGIN - PIPE_GAP;
        let gap_top = (self.rng.gen_range(0.0f32..1.0) * span).round() + EDGE_MARGIN;
        let lower_top = gap_top + PIPE_GAP;
        self.pipes.push(Pipe::new(FIELD_W, 0.0, gap_top));
        self.pipes.push(Pipe::new(FIELD_W, lower_top, FIELD_H - lower_top));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_world() -> World {
        let cfg = EvoConfig {
            population_size: 4,
            num_elites: 1,
            num_parents: 2,
            ..EvoConfig::default()
        };
        World::new(cfg, 9)
    }

    #[test]
    fn flap_then_update_is_exact() {
        let mut bird = Bird::new(0);
        bird.flap();
        bird.update();
        assert_eq!(bird.vel, FLAP_IMPULSE + GRAVITY_ACCEL);
        assert_eq!(bird.y, BIRD_START_Y + (FLAP_IMPULSE + GRAVITY_ACCEL));
    }

    #[test]
    fn offscreen_birds_are_dead_without_pipes() {
        let mut bird = Bird::new(0);
        bird.y = FIELD_H;
        assert!(bird.is_dead(&[]));

        bird.y = -bird.height;
        assert!(bird.is_dead(&[]));

        bird.y = FIELD_H - bird.height;
        assert!(!bird.is_dead(&[]));
    }

    #[test]
    fn separated_rects_never_collide() {
        let bird = Bird::new(0);
        let far_right = Pipe::new(bird.x + bird.width + 1.0, bird.y, 10.0);
        let below = Pipe {
            x: bird.x,
            y: bird.y + bird.height + 1.0,
            width: 10.0,
            height: 10.0,
        };
        assert!(!bird.is_dead(&[far_right, below]));
    }

    #[test]
    fn identical_rects_always_collide() {
        let bird = Bird::new(0);
        let same = Pipe {
            x: bird.x,
            y: bird.y,
            width: bird.width,
            height: bird.height,
        };
        assert!(bird.is_dead(&[same]));
    }

    #[test]
    fn touching_edges_count_as_collision() {
        let bird = Bird::new(0);
        let flush_right = Pipe {
            x: bird.x + bird.width,
            y: bird.y,
            width: 10.0,
            height: 10.0,
        };
        assert!(bird.is_dead(&[flush_right]));
    }

    #[test]
    fn all_deaths_complete_the_fitness_record() {
        let mut world = test_world();
        // place every bird far enough down that one flap cannot save it
        for bird in &mut world.birds {
            bird.y = FIELD_H + 100.0;
        }
        let ended = world.step_agents();
        assert!(ended);
        assert_eq!(world.alive_count, 0);
        assert_eq!(world.fitness.len(), 4);
    }

    #[test]
    fn generation_rollover_resets_the_field() {
        let mut world = test_world();
        let before = world.generation;
        for bird in &mut world.birds {
            bird.y = FIELD_H + 100.0;
        }
        world.update();

        assert_eq!(world.generation, before + 1);
        assert_eq!(world.birds.len(), world.population_size());
        assert!(world.birds.iter().all(|b| b.alive && b.y == BIRD_START_Y));
        assert_eq!(world.alive_count, 4);
        assert!(world.fitness.is_empty());
        // the same tick advances the fresh environment once
        assert_eq!(world.score, 1);
        assert_eq!(world.pipes.len(), 2);
        assert_eq!(world.best_history.len(), 1);
    }

    #[test]
    fn spawner_fires_every_interval() {
        let mut world = test_world();
        world.step_environment();
        assert_eq!(world.pipes.len(), 2);
        for _ in 0..SPAWN_INTERVAL - 1 {
            world.step_environment();
        }
        assert_eq!(world.pipes.len(), 2);
        world.step_environment();
        assert_eq!(world.pipes.len(), 4);
    }

    #[test]
    fn offscreen_pipes_are_dropped() {
        let mut world = test_world();
        // first pair leaves the field after (FIELD_W + PIPE_W) / PIPE_SPEED moves
        for _ in 0..181 {
            world.step_environment();
        }
        assert!(world.pipes.iter().all(|p| p.x + p.width > 0.0));
        // a third pair spawned on the tick the first one left
        assert_eq!(world.pipes.len(), 4);
    }

    #[test]
    fn spawned_gaps_respect_margins() {
        let mut world = test_world();
        for _ in 0..200 {
            world.spawn_pair();
        }
        for pair in world.pipes.chunks(2) {
            let (upper, lower) = (&pair[0], &pair[1]);
            assert_eq!(upper.y, 0.0);
            assert!(upper.height >= EDGE_MARGIN);
            assert!(upper.height <= FIELD_H - EDGE_MARGIN - PIPE_GAP);
            assert_eq!(lower.y, upper.height + PIPE_GAP);
            assert_eq!(lower.y + lower.height, FIELD_H);
        }
    }

    #[test]
    fn gap_feature_tracks_first_upper_pipe_ahead() {
        let mut world = test_world();
        assert_eq!(world.next_gap_feature(), 0.0);

        // a pair already behind the birds, then one ahead
        world.pipes.push(Pipe::new(BIRD_X - PIPE_W, 0.0, 100.0));
        world.pipes.push(Pipe::new(BIRD_X - PIPE_W, 220.0, FIELD_H - 220.0));
        world.pipes.push(Pipe::new(300.0, 0.0, 256.0));
        world.pipes.push(Pipe::new(300.0, 376.0, FIELD_H - 376.0));
        assert_eq!(world.next_gap_feature(), 256.0 / FIELD_H);
    }
}
