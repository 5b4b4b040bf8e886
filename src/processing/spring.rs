//! Spring physics simulation for smooth cursor movement
//!
//! A damped spring chases a moving target. Each axis is an independent
//! mass-spring-damper integrated with semi-implicit Euler in fixed substeps.

/// Stiffness at responsiveness 0.0
pub const MIN_STIFFNESS: f64 = 50.0;
/// Stiffness at responsiveness 1.0
pub const MAX_STIFFNESS: f64 = 500.0;
/// Damping ratio at smoothness 0.0 (slightly under-damped)
pub const MIN_DAMPING_RATIO: f64 = 0.7;
/// Damping ratio at smoothness 1.0 (over-damped)
pub const MAX_DAMPING_RATIO: f64 = 1.5;
pub const SPRING_MASS: f64 = 1.0;

/// Longest single integration step
///
/// Keeps `h * damping / mass` and `h^2 * stiffness / mass` small enough for
/// every supported parameter pair that an over-damped spring never
/// overshoots in discrete time either.
const MAX_SUBSTEP_SECS: f64 = 1.0 / 240.0;

/// Physical spring constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringParams {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
}

impl SpringParams {
    /// Map perceptual controls in `[0, 1]` to physical constants
    ///
    /// Responsiveness scales stiffness linearly; smoothness scales the
    /// damping ratio linearly. Damping is `2 * zeta * sqrt(k * m)`.
    pub fn from_perceptual(responsiveness: f64, smoothness: f64) -> Self {
        let r = responsiveness.clamp(0.0, 1.0);
        let s = smoothness.clamp(0.0, 1.0);

        let stiffness = MIN_STIFFNESS + r * (MAX_STIFFNESS - MIN_STIFFNESS);
        let zeta = MIN_DAMPING_RATIO + s * (MAX_DAMPING_RATIO - MIN_DAMPING_RATIO);
        let damping = 2.0 * zeta * (stiffness * SPRING_MASS).sqrt();

        Self {
            stiffness,
            damping,
            mass: SPRING_MASS,
        }
    }

    pub fn damping_ratio(&self) -> f64 {
        self.damping / (2.0 * (self.stiffness * self.mass).sqrt())
    }
}

/// 1D spring state
#[derive(Debug, Clone)]
pub struct SpringState {
    pub position: f64,
    pub velocity: f64,
    pub target: f64,
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
}

impl SpringState {
    /// A spring at rest on `initial`
    pub fn new(initial: f64, params: SpringParams) -> Self {
        Self {
            position: initial,
            velocity: 0.0,
            target: initial,
            stiffness: params.stiffness,
            damping: params.damping,
            mass: params.mass,
        }
    }

    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    /// Advance the simulation by `dt` seconds toward the current target
    ///
    /// F = -k * x - c * v, integrated velocity-first.
    pub fn step(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }

        let substeps = (dt / MAX_SUBSTEP_SECS).ceil().max(1.0) as usize;
        let h = dt / substeps as f64;

        for _ in 0..substeps {
            let displacement = self.position - self.target;
            let spring_force = -self.stiffness * displacement;
            let damping_force = -self.damping * self.velocity;
            let acceleration = (spring_force + damping_force) / self.mass;

            self.velocity += acceleration * h;
            self.position += self.velocity * h;
        }
    }
}

/// 2D spring for cursor position (X and Y axes)
#[derive(Debug, Clone)]
pub struct Spring2D {
    pub x: SpringState,
    pub y: SpringState,
}

impl Spring2D {
    pub fn new(x: f64, y: f64, params: SpringParams) -> Self {
        Self {
            x: SpringState::new(x, params),
            y: SpringState::new(y, params),
        }
    }

    pub fn set_target(&mut self, x: f64, y: f64) {
        self.x.set_target(x);
        self.y.set_target(y);
    }

    pub fn step(&mut self, dt: f64) {
        self.x.step(dt);
        self.y.step(dt);
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x.position, self.y.position)
    }
}
