// Implements the VelocityRamp module, the trapezoidal velocity state machine moving the needle.
//
// Key Features:
// - Tracks a continuously updated target without overshooting it or reversing abruptly.
// - Changes the velocity state by at most one unit per cycle; reversals always pass through 0.
// - Emits at most one step per cycle and tells the caller when to run the next cycle.
//
// Detailed Operation:
// The ramp runs from a timer whose period it chooses itself. Every cycle it clamps the target to
// the travel, decelerates when the remaining gap is shorter than the current speed and otherwise
// accelerates toward the target up to the top speed. If the gap exceeds the dead band, one step is
// issued in the direction of the velocity sign. The delay until the next cycle is read from the
// velocity profile at the current speed, so a faster velocity means a shorter cycle.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

use embedded_time::duration::Microseconds;

use crate::config::{ConfigError, TravelConfig};

/// Velocity states of the reference profile (speeds 0..=47).
pub const REFERENCE_VELOCITIES: usize = 48;

/// Compare values of the reference step timer (1 count = 64 µs, period = count + 1).
const REFERENCE_COMPARE: [u8; REFERENCE_VELOCITIES] = [
    40, 39, 38, 38, 37, 36, 36, 35, //
    34, 34, 33, 32, 32, 31, 31, 30, //
    29, 29, 28, 27, 27, 26, 25, 25, //
    24, 24, 23, 22, 22, 21, 20, 20, //
    19, 18, 18, 17, 17, 16, 15, 15, //
    14, 13, 13, 12, 11, 11, 10, 10, //
];

const REFERENCE_TICK_US: u32 = 64;

/// Direction of a single step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Direction of a velocity state, `None` at standstill.
    #[inline(always)]
    pub const fn of_velocity(velocity: i32) -> Option<Direction> {
        if velocity > 0 {
            Some(Direction::Forward)
        } else if velocity < 0 {
            Some(Direction::Backward)
        } else {
            None
        }
    }

    #[inline(always)]
    pub const fn delta(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

/// Delay between cycles for every speed, non-increasing with speed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VelocityProfile<const V: usize> {
    delays_us: [u32; V],
}

impl<const V: usize> VelocityProfile<V> {
    /// Builds a profile from per-speed delays; rejects tables a ramp cannot run with.
    pub fn new(delays_us: [u32; V]) -> Result<Self, ConfigError> {
        if V < 2 {
            return Err(ConfigError::ProfileTooShort);
        }
        if let Some(index) = delays_us.iter().position(|&delay| delay == 0) {
            return Err(ConfigError::ZeroProfileDelay { index });
        }
        if let Some(index) = (1..V).find(|&idx| delays_us[idx] > delays_us[idx - 1]) {
            return Err(ConfigError::ProfileNotMonotonic { index });
        }
        Ok(Self { delays_us })
    }

    /// Builds a profile from timer compare values: delay = `tick_us * (compare + 1)`.
    pub fn from_compare(compare: [u8; V], tick_us: u32) -> Result<Self, ConfigError> {
        Self::new(compare.map(|count| tick_us * (u32::from(count) + 1)))
    }

    /// Delay for `speed` (speeds above the table use the fastest entry).
    #[inline(always)]
    pub fn delay(&self, speed: u32) -> Microseconds<u32> {
        let idx = (speed as usize).min(V - 1);
        Microseconds(self.delays_us[idx])
    }

    /// Highest velocity magnitude, `V - 1`.
    #[inline(always)]
    pub const fn max_speed(&self) -> i32 {
        V as i32 - 1
    }
}

impl VelocityProfile<REFERENCE_VELOCITIES> {
    /// 48-step profile of the reference gauge: 2624 µs at standstill down to 704 µs.
    pub fn reference() -> Self {
        Self {
            delays_us: REFERENCE_COMPARE.map(|count| REFERENCE_TICK_US * (u32::from(count) + 1)),
        }
    }
}

/// Position, target and velocity of the needle stepper.
pub struct VelocityRamp<const V: usize> {
    travel: TravelConfig,
    profile: VelocityProfile<V>,

    position: i32, // Step counter; changes only through `step`
    target: i32,   // Last requested target (raw until the next cycle clamps it)
    velocity: i32, // -(V-1)..=(V-1)
}

impl<const V: usize> VelocityRamp<V> {
    /// Creates a ramp at rest at `position`, with the target on the same spot.
    pub fn new(travel: TravelConfig, profile: VelocityProfile<V>, position: i32) -> Self {
        Self {
            travel,
            profile,
            position,
            target: position,
            velocity: 0,
        }
    }

    /// One control cycle. Returns the step issued, if any; `next_delay` gives the cycle period.
    pub fn tick(&mut self) -> Option<Direction> {
        self.target = self.travel.clamp(self.target);

        let gap = self.target.abs_diff(self.position);
        let speed = self.velocity.unsigned_abs();
        let max_speed = self.profile.max_speed();

        if gap <= self.travel.dead_band || gap < speed {
            // Inside the dead band, or stopping distance exceeds what is left: slow down
            self.velocity -= self.velocity.signum();
        } else if self.position < self.target && self.velocity < max_speed {
            self.velocity += 1;
        } else if self.position > self.target && self.velocity > -max_speed {
            self.velocity -= 1;
        }

        if gap <= self.travel.dead_band {
            return None;
        }
        let direction = Direction::of_velocity(self.velocity)?;
        self.step(direction);
        Some(direction)
    }

    /// Delay until the next cycle at the current speed.
    #[inline(always)]
    pub fn next_delay(&self) -> Microseconds<u32> {
        self.profile.delay(self.velocity.unsigned_abs())
    }

    /// Moves the step counter by one. Used by the ramp itself and by homing.
    #[inline(always)]
    pub fn step(&mut self, direction: Direction) {
        self.position += direction.delta();
    }

    /// Stops at the current spot: velocity 0 and target on the position.
    pub fn park(&mut self) {
        self.velocity = 0;
        self.target = self.position;
    }

    /// Requests a new target; clamped on the next cycle.
    #[inline(always)]
    pub fn set_target(&mut self, target: i32) {
        self.target = target;
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    /// Target the next cycle will steer to (clamped to the travel).
    pub fn target(&self) -> i32 {
        self.travel.clamp(self.target)
    }

    pub fn velocity(&self) -> i32 {
        self.velocity
    }

    pub fn profile(&self) -> &VelocityProfile<V> {
        &self.profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(position: i32) -> VelocityRamp<REFERENCE_VELOCITIES> {
        VelocityRamp::new(TravelConfig::default(), VelocityProfile::reference(), position)
    }

    fn with_velocity(position: i32, target: i32, velocity: i32) -> VelocityRamp<8> {
        let profile = VelocityProfile::new([800, 700, 600, 500, 400, 300, 200, 100]).unwrap();
        let mut ramp = VelocityRamp::new(TravelConfig::default(), profile, position);
        ramp.velocity = velocity;
        ramp.set_target(target);
        ramp
    }

    #[test]
    fn reference_profile_is_monotonic() {
        let profile = VelocityProfile::reference();
        assert_eq!(profile.delay(0), Microseconds(2_624u32));
        assert_eq!(profile.delay(47), Microseconds(704u32));
        for speed in 1..REFERENCE_VELOCITIES as u32 {
            assert!(profile.delay(speed) <= profile.delay(speed - 1));
        }
        assert_eq!(
            VelocityProfile::from_compare(REFERENCE_COMPARE, REFERENCE_TICK_US),
            Ok(profile)
        );
    }

    #[test]
    fn profile_rejects_bad_tables() {
        assert_eq!(
            VelocityProfile::new([100, 90, 95]),
            Err(ConfigError::ProfileNotMonotonic { index: 2 })
        );
        assert_eq!(
            VelocityProfile::new([100, 0]),
            Err(ConfigError::ZeroProfileDelay { index: 1 })
        );
        assert_eq!(VelocityProfile::new([100]), Err(ConfigError::ProfileTooShort));
    }

    #[test]
    fn settles_on_target() {
        let mut ramp = ramp(0);
        ramp.set_target(50);
        let mut peak = 0;
        for _ in 0..200 {
            ramp.tick();
            peak = peak.max(ramp.velocity());
            assert!(ramp.position() <= 50, "overshoot to {}", ramp.position());
        }
        assert_eq!(ramp.position(), 50);
        assert_eq!(ramp.velocity(), 0);
        assert!(peak > 1);
    }

    #[test]
    fn target_is_clamped_each_cycle() {
        let mut ramp = ramp(0);
        ramp.set_target(1_000);
        // Effective target is reported before the cycle runs
        assert_eq!(ramp.target(), 845);
        ramp.tick();
        assert_eq!(ramp.target(), 845);
        for _ in 0..2_000 {
            ramp.tick();
        }
        assert_eq!(ramp.position(), 845);

        ramp.set_target(-50);
        for _ in 0..2_000 {
            ramp.tick();
        }
        assert_eq!(ramp.target(), 0);
        assert_eq!(ramp.position(), 0);
    }

    #[test]
    fn rest_is_a_fixed_point() {
        let mut ramp = ramp(120);
        for _ in 0..10 {
            assert_eq!(ramp.tick(), None);
            assert_eq!((ramp.position(), ramp.velocity()), (120, 0));
        }
        assert_eq!(ramp.next_delay(), Microseconds(2_624u32));
    }

    #[test]
    fn velocity_changes_by_one_and_passes_zero() {
        for position in [0, 3, 10, 40] {
            for target in [0, 2, 5, 20, 40, 900] {
                for velocity in -7..=7 {
                    let mut ramp = with_velocity(position, target, velocity);
                    ramp.tick();
                    let next = ramp.velocity();
                    assert!((next - velocity).abs() <= 1);
                    assert!(next.abs() <= 7);
                    // Sign flips never skip zero
                    assert!(velocity.signum() * next.signum() >= 0);
                }
            }
        }
    }

    #[test]
    fn reverses_only_through_standstill() {
        let mut ramp = with_velocity(100, 0, 7);
        ramp.set_target(0);
        let mut seen_zero = false;
        for _ in 0..100 {
            ramp.tick();
            if ramp.velocity() == 0 {
                seen_zero = true;
            }
            if ramp.velocity() < 0 {
                assert!(seen_zero);
            }
        }
        // Momentum carries it past the reversal point, then it comes back
        assert!(seen_zero);
    }

    #[test]
    fn faster_speed_shortens_cycle() {
        let mut ramp = ramp(0);
        ramp.set_target(400);
        let mut last = ramp.next_delay();
        for _ in 0..40 {
            ramp.tick();
            let delay = ramp.next_delay();
            assert!(delay <= last);
            last = delay;
        }
    }

    #[test]
    fn dead_band_suppresses_steps() {
        let travel = TravelConfig {
            dead_band: 2,
            ..TravelConfig::default()
        };
        let mut ramp = VelocityRamp::new(travel, VelocityProfile::reference(), 10);
        ramp.set_target(12);
        for _ in 0..100 {
            assert_eq!(ramp.tick(), None);
        }
        // Parked: no speed builds up while waiting inside the band
        assert_eq!((ramp.position(), ramp.velocity()), (10, 0));

        // A real move still ramps up from the first speed
        ramp.set_target(300);
        assert_eq!(ramp.tick(), Some(Direction::Forward));
        assert_eq!(ramp.velocity(), 1);
    }

    #[test]
    fn dead_band_brakes_an_arriving_needle() {
        let travel = TravelConfig {
            dead_band: 3,
            ..TravelConfig::default()
        };
        let mut ramp = VelocityRamp::new(travel, VelocityProfile::reference(), 0);
        ramp.set_target(200);
        for _ in 0..1_000 {
            ramp.tick();
        }
        assert_eq!(ramp.velocity(), 0);
        assert!((197..=200).contains(&ramp.position()));
    }
}
