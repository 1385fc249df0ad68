use std::fmt;
use std::ops::{Add, Mul, Sub};

/// Stable handle to an agent slot in the [`Arena`](super::Arena).
///
/// The generation is bumped every time a slot is reused, so a handle kept
/// by another agent (boss → mine, mine → boss) stops resolving once the
/// referenced agent is gone instead of silently pointing at a newcomer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentId {
    pub index: u32,
    pub generation: u32,
}

impl AgentId {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// Identifier of a hostile-to-agents entity owned by the player/movement
/// collaborator (player characters, decoys).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetId(pub u32);

impl TargetId {
    /// Reserved identifier for the first local player.
    pub const PLAYER: Self = Self(0);
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// Continuous arena-space vector (positions, velocities).
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` (radians).
    pub fn from_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }

    /// Angle of the vector from `self` to `other`, in radians.
    pub fn angle_to(self, other: Vec2) -> f32 {
        let d = other - self;
        d.y.atan2(d.x)
    }

    /// Returns the unit vector, or zero for a degenerate input.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            Self::ZERO
        } else {
            Self::new(self.x / len, self.y / len)
        }
    }

    /// Counter-clockwise perpendicular.
    pub fn perpendicular(self) -> Self {
        Self::new(-self.y, self.x)
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Point on the arena's monotonic clock, in milliseconds since arena start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Self = Self(0);

    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Timestamp `ms` milliseconds later.
    pub const fn after(self, ms: u32) -> Self {
        Self(self.0.saturating_add(ms as u64))
    }

    /// Timestamp `ms` milliseconds earlier, clamped at zero.
    pub const fn before(self, ms: u32) -> Self {
        Self(self.0.saturating_sub(ms as u64))
    }

    /// Milliseconds elapsed since `earlier` (zero if `earlier` is later).
    pub const fn since(self, earlier: Timestamp) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<u64> for Timestamp {
    type Output = Timestamp;
    fn add(self, rhs: u64) -> Timestamp {
        Timestamp(self.0.saturating_add(rhs))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Absolute point in time at which something falls due.
///
/// Every timer in the engine is one of these compared against the injected
/// [`Clock`](crate::clock::Clock); nothing counts down per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Deadline(pub Timestamp);

impl Deadline {
    pub const fn at(timestamp: Timestamp) -> Self {
        Self(timestamp)
    }

    /// Deadline `ms` milliseconds after `start`.
    pub const fn after(start: Timestamp, ms: u32) -> Self {
        Self(start.after(ms))
    }

    pub const fn timestamp(self) -> Timestamp {
        self.0
    }

    pub fn is_due(self, now: Timestamp) -> bool {
        now >= self.0
    }

    pub fn remaining(self, now: Timestamp) -> u64 {
        self.0.since(now)
    }
}

/// Integer health pool tracked per agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Health {
    pub current: u32,
    pub max: u32,
}

impl Health {
    pub const fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn is_depleted(&self) -> bool {
        self.current == 0
    }

    /// Fraction of maximum health remaining, in `0.0..=1.0`.
    pub fn fraction(&self) -> f32 {
        if self.max == 0 {
            0.0
        } else {
            self.current as f32 / self.max as f32
        }
    }

    /// Removes up to `amount`, returning what was actually removed.
    pub fn drain(&mut self, amount: u32) -> u32 {
        let dealt = amount.min(self.current);
        self.current -= dealt;
        dealt
    }

    /// Restores up to `amount`, clamped at `max`. Returns what was restored.
    pub fn restore(&mut self, amount: u32) -> u32 {
        let healed = amount.min(self.max - self.current.min(self.max));
        self.current += healed;
        healed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_is_due_at_and_after_its_timestamp() {
        let deadline = Deadline::after(Timestamp(1_000), 500);
        assert!(!deadline.is_due(Timestamp(1_499)));
        assert!(deadline.is_due(Timestamp(1_500)));
        assert!(deadline.is_due(Timestamp(9_000)));
        assert_eq!(deadline.remaining(Timestamp(1_200)), 300);
        assert_eq!(deadline.remaining(Timestamp(2_000)), 0);
    }

    #[test]
    fn health_drain_and_restore_clamp() {
        let mut health = Health::full(100);
        assert_eq!(health.drain(30), 30);
        assert_eq!(health.drain(500), 70);
        assert!(health.is_depleted());
        assert_eq!(health.restore(250), 100);
        assert_eq!(health.current, 100);
    }

    #[test]
    fn vec2_geometry() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
        assert!((b.normalized().length() - 1.0).abs() < 1e-6);
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
        assert!((a.angle_to(Vec2::new(0.0, 1.0)) - core::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }
}
