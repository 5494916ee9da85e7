// Implements the coil pattern table of the 6-state needle stepper.
//
// Key Features:
// - Maps a signed step position to one of 6 coil output words.
// - Uses euclidean modulo so negative positions keep cycling in the same order.
//
// Output bits (3210) drive the four coil pins; coil A sits on bits 0/2, coil B on bits 1/3.
// Consecutive states change the drive of exactly one coil, which is what the winding needs to
// follow the sequence without losing torque.

// Licensed under the Apache License, Version 2.0
// Copyright 2024 Anton Khrustalev, creapunk.com

/// Number of states in one commutation cycle.
pub const PHASE_COUNT: usize = 6;

/// Phase index of a step position: `position mod 6`, always in `[0, 6)`.
#[inline(always)]
pub const fn phase_index(position: i32) -> usize {
    position.rem_euclid(PHASE_COUNT as i32) as usize
}

/// Fixed commutation table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepPhasePattern {
    states: [u8; PHASE_COUNT],
}

impl StepPhasePattern {
    /// Table of the X27.168 driven directly from four pins (bits 3210).
    pub const X27_168: StepPhasePattern = StepPhasePattern {
        states: [0b0110, 0b0100, 0b0001, 0b1001, 0b1000, 0b0010],
    };

    /// Coil word for `position`.
    #[inline(always)]
    pub const fn coils(&self, position: i32) -> u8 {
        self.states[phase_index(position)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Drive of each coil: bits 0/2 for A, bits 1/3 for B
    fn coil_a(word: u8) -> u8 {
        word & 0b0101
    }
    fn coil_b(word: u8) -> u8 {
        word & 0b1010
    }

    #[test]
    fn phase_index_is_euclidean() {
        assert_eq!(phase_index(0), 0);
        assert_eq!(phase_index(7), 1);
        assert_eq!(phase_index(-1), 5);
        assert_eq!(phase_index(-6), 0);
        assert_eq!(phase_index(-7), 5);
        for position in -100..100 {
            let idx = phase_index(position);
            assert!(idx < PHASE_COUNT);
            assert_eq!(phase_index(position + 1), (idx + 1) % PHASE_COUNT);
        }
    }

    #[test]
    fn neighbours_switch_one_coil() {
        let states = StepPhasePattern::X27_168.states;
        for idx in 0..PHASE_COUNT {
            let now = states[idx];
            let next = states[(idx + 1) % PHASE_COUNT];
            let a_changed = coil_a(now) != coil_a(next);
            let b_changed = coil_b(now) != coil_b(next);
            assert!(a_changed ^ b_changed, "states {} and {} differ in both coils", idx, idx + 1);
        }
    }

    #[test]
    fn negative_positions_follow_cycle() {
        let pattern = StepPhasePattern::X27_168;
        assert_eq!(pattern.coils(-1), 0b0010);
        assert_eq!(pattern.coils(-6), pattern.coils(0));
        assert_eq!(pattern.coils(845), pattern.coils(5));
    }
}
