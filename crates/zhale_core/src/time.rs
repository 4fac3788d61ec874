//! Fixed-timestep clock. Wall-clock time feeds an accumulator; the main loop
//! drains it in `fixed_dt` slices so the simulation advances deterministically
//! regardless of render frame rate.

use std::time::Instant;

pub struct TimeState {
    pub fixed_dt: f64,
    pub max_accumulator: f64,
    accumulator: f64,
    pub total_time: f64,
    pub fixed_step_count: u64,
    pub frame_count: u64,
    pub steps_this_frame: u32,
    pub real_dt: f64,
    last_instant: Instant,
}

impl TimeState {
    pub fn new() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            max_accumulator: 0.25,
            accumulator: 0.0,
            total_time: 0.0,
            fixed_step_count: 0,
            frame_count: 0,
            steps_this_frame: 0,
            real_dt: 0.0,
            last_instant: Instant::now(),
        }
    }

    pub fn begin_frame(&mut self) {
        let now = Instant::now();
        let real_dt = now.duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.accumulate(real_dt);
    }

    /// Feed elapsed wall-clock time into the accumulator. Split out from
    /// `begin_frame` so tests can drive the clock without a real timer.
    pub fn accumulate(&mut self, real_dt: f64) {
        self.real_dt = real_dt;

        // Spiral-of-death cap
        if self.real_dt > self.max_accumulator {
            log::warn!(
                "Frame took {:.1}ms — capping accumulator to {}ms",
                self.real_dt * 1000.0,
                self.max_accumulator * 1000.0
            );
            self.real_dt = self.max_accumulator;
        }

        self.accumulator += self.real_dt;
        self.steps_this_frame = 0;
        self.frame_count += 1;
    }

    pub fn should_step(&mut self) -> bool {
        if self.accumulator >= self.fixed_dt {
            self.accumulator -= self.fixed_dt;
            self.total_time += self.fixed_dt;
            self.fixed_step_count += 1;
            self.steps_this_frame += 1;
            true
        } else {
            false
        }
    }
}

impl Default for TimeState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulated_time_drains_in_fixed_slices() {
        let mut time = TimeState::new();
        time.accumulate(time.fixed_dt * 3.5);

        let mut steps = 0;
        while time.should_step() {
            steps += 1;
        }
        assert_eq!(steps, 3);
        assert_eq!(time.steps_this_frame, 3);
        assert_eq!(time.fixed_step_count, 3);
    }

    #[test]
    fn short_frame_produces_no_step() {
        let mut time = TimeState::new();
        time.accumulate(time.fixed_dt * 0.25);
        assert!(!time.should_step());
        assert_eq!(time.steps_this_frame, 0);
    }

    #[test]
    fn long_stall_is_capped() {
        let mut time = TimeState::new();
        time.accumulate(10.0);

        let mut steps = 0;
        while time.should_step() {
            steps += 1;
        }
        let max_steps = (time.max_accumulator / time.fixed_dt).ceil() as u32;
        assert!(steps <= max_steps, "cap should bound steps, got {steps}");
    }

    #[test]
    fn total_time_advances_by_fixed_dt_only() {
        let mut time = TimeState::new();
        time.accumulate(time.fixed_dt * 2.0);
        while time.should_step() {}
        assert!((time.total_time - time.fixed_dt * 2.0).abs() < 1e-9);
    }
}
