//! Frame driver
//!
//! Reads a clock once per tick and hands the timing to a render callback.
//! Animation is recomputed from elapsed time, never accumulated per frame.

use glam::Mat4;
use std::time::Instant;

/// Source of monotonic time in seconds
pub trait Clock {
    fn now_secs(&self) -> f64;
}

/// Wall clock measured from construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Timing passed to the render callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Index of this frame, starting at 0
    pub frame: u64,
    /// Seconds since the first tick
    pub elapsed_secs: f64,
    /// Seconds since the previous frame, 0 for the first
    pub delta_secs: f64,
}

#[derive(Debug, Clone, Copy)]
struct FixedStep {
    step_secs: f64,
    max_catch_up: u32,
    accumulator: f64,
}

/// Drives a render callback from a clock
pub struct FrameDriver<C: Clock = SystemClock> {
    clock: C,
    start: Option<f64>,
    last: f64,
    frame: u64,
    fixed: Option<FixedStep>,
}

impl FrameDriver<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }
}

impl Default for FrameDriver<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> FrameDriver<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            start: None,
            last: 0.0,
            frame: 0,
            fixed: None,
        }
    }

    /// Run the callback once per `step_secs` of elapsed time, at most
    /// `max_catch_up` times per tick. Time beyond the cap is dropped.
    pub fn with_fixed_timestep(mut self, step_secs: f64, max_catch_up: u32) -> Self {
        if step_secs > 0.0 {
            self.fixed = Some(FixedStep {
                step_secs,
                max_catch_up: max_catch_up.max(1),
                accumulator: 0.0,
            });
        } else {
            log::warn!("Ignoring non-positive fixed timestep {}", step_secs);
        }
        self
    }

    /// Frames rendered so far
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// Advance the clock and render. Returns how many frames the callback
    /// produced; the first error stops the tick.
    pub fn tick<E, F>(&mut self, mut render: F) -> Result<u32, E>
    where
        F: FnMut(FrameTime) -> Result<(), E>,
    {
        let now = self.clock.now_secs();
        let Some(start) = self.start else {
            // The first tick always draws frame 0
            self.start = Some(now);
            self.last = now;
            self.frame = 1;
            render(FrameTime {
                frame: 0,
                elapsed_secs: 0.0,
                delta_secs: 0.0,
            })?;
            return Ok(1);
        };

        let delta = (now - self.last).max(0.0);
        self.last = now;

        let Some(fixed) = self.fixed.as_mut() else {
            let time = FrameTime {
                frame: self.frame,
                elapsed_secs: now - start,
                delta_secs: delta,
            };
            self.frame += 1;
            render(time)?;
            return Ok(1);
        };

        fixed.accumulator += delta;
        let mut rendered = 0;
        while fixed.accumulator >= fixed.step_secs && rendered < fixed.max_catch_up {
            fixed.accumulator -= fixed.step_secs;
            let time = FrameTime {
                frame: self.frame,
                elapsed_secs: self.frame as f64 * fixed.step_secs,
                delta_secs: fixed.step_secs,
            };
            self.frame += 1;
            rendered += 1;
            render(time)?;
        }
        if fixed.accumulator >= fixed.step_secs {
            log::debug!(
                "Dropping {:.3}s of frame time after {} catch-up steps",
                fixed.accumulator,
                rendered
            );
            fixed.accumulator %= fixed.step_secs;
        }
        Ok(rendered)
    }
}

/// Rotation about +Y after `elapsed_secs` at a constant angular speed
pub fn spin_transform(elapsed_secs: f64, radians_per_sec: f64) -> Mat4 {
    let angle = (elapsed_secs * radians_per_sec).rem_euclid(std::f64::consts::TAU);
    Mat4::from_rotation_y(angle as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct ManualClock(Rc<Cell<f64>>);

    impl ManualClock {
        fn set(&self, secs: f64) {
            self.0.set(secs);
        }
    }

    impl Clock for ManualClock {
        fn now_secs(&self) -> f64 {
            self.0.get()
        }
    }

    fn collect(driver: &mut FrameDriver<ManualClock>) -> Vec<FrameTime> {
        let mut frames = Vec::new();
        driver
            .tick(|t| {
                frames.push(t);
                Ok::<_, ()>(())
            })
            .unwrap();
        frames
    }

    #[test]
    fn variable_step_reports_elapsed_and_delta() {
        let clock = ManualClock::default();
        clock.set(10.0);
        let mut driver = FrameDriver::with_clock(clock.clone());

        assert_eq!(
            collect(&mut driver),
            vec![FrameTime {
                frame: 0,
                elapsed_secs: 0.0,
                delta_secs: 0.0
            }]
        );

        clock.set(10.5);
        let frames = collect(&mut driver);
        assert_eq!(frames[0].frame, 1);
        assert_eq!(frames[0].elapsed_secs, 0.5);
        assert_eq!(frames[0].delta_secs, 0.5);
        assert_eq!(driver.frame_count(), 2);
    }

    #[test]
    fn fixed_step_catches_up_with_cap() {
        let clock = ManualClock::default();
        let mut driver = FrameDriver::with_clock(clock.clone()).with_fixed_timestep(0.25, 3);
        collect(&mut driver);

        clock.set(0.1);
        assert!(collect(&mut driver).is_empty());

        clock.set(0.6);
        let frames = collect(&mut driver);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].elapsed_secs, 0.5);
        assert!(frames.iter().all(|f| f.delta_secs == 0.25));

        // A long stall renders at most three frames
        clock.set(10.0);
        assert_eq!(collect(&mut driver).len(), 3);
        clock.set(10.1);
        assert!(collect(&mut driver).len() <= 1);
    }

    #[test]
    fn render_error_stops_tick() {
        let mut driver = FrameDriver::with_clock(ManualClock::default());
        let result = driver.tick(|_| Err("lost"));
        assert_eq!(result, Err("lost"));
    }

    #[test]
    fn spin_depends_only_on_elapsed_time() {
        let speed = 0.2 * std::f64::consts::PI;
        let quarter = spin_transform(2.5, speed);
        assert!(quarter
            .transform_vector3(Vec3::X)
            .abs_diff_eq(Vec3::NEG_Z, 1e-5));

        // One full turn later the pose is the same
        let later = spin_transform(2.5 + 10.0, speed);
        assert!(later.abs_diff_eq(quarter, 1e-4));
        assert_eq!(spin_transform(0.0, speed), Mat4::IDENTITY);
    }
}
