//! # Angular PID controller
//!
//! A PID controller operating over a continuous (wrapping) input domain, such
//! as a heading in degrees which wraps at ±180. The error between setpoint
//! and measurement is always the shortest signed distance within the domain,
//! so the controller always turns the short way round.
//!
//! The output is unscaled and unclamped, it is the caller's job to convert it
//! into actuator units and apply any limits.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use util::maths::{get_ang_dist, wrap_to_range};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of an [`AngularPid`].
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct AngularPidParams {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    /// Position tolerance used by `at_setpoint`.
    ///
    /// Units: input domain units (e.g. degrees)
    pub tolerance: f64,

    /// Rate tolerance used by `at_setpoint`.
    ///
    /// Units: input domain units per second
    pub rate_tolerance: f64,

    /// Lower bound of the continuous input domain.
    pub wrap_min: f64,

    /// Upper bound of the continuous input domain.
    pub wrap_max: f64,

    /// Optional symmetric limit on the integral accumulator.
    #[serde(default)]
    pub integral_limit: Option<f64>,
}

/// A PID controller over a wrapping input domain.
#[derive(Debug, Clone, Serialize)]
pub struct AngularPid {
    params: AngularPidParams,

    /// Sample period used for the integral and derivative terms.
    ///
    /// Units: seconds
    period_s: f64,

    /// Current setpoint, always within `(wrap_min, wrap_max]`
    setpoint: f64,

    /// Error from the last `calculate` call
    error: f64,

    /// Rate of change of the error from the last `calculate` call
    rate: f64,

    /// Previous error, `None` before the first sample after a reset
    prev_error: Option<f64>,

    /// The integral accumulation
    integral: f64,

    /// The terms making up the last output
    terms: PidTerms,
}

/// The individual terms of a PID output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct PidTerms {
    pub p: f64,
    pub i: f64,
    pub d: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors which can occur when constructing an [`AngularPid`].
#[derive(Debug, thiserror::Error)]
pub enum AngularPidError {
    #[error("The wrap domain must have wrap_max > wrap_min, found [{0}, {1}]")]
    InvalidWrapDomain(f64, f64),

    #[error("The sample period must be a positive number of seconds, found {0}")]
    InvalidPeriod(f64),

    #[error("Tolerances must be non-negative, found tolerance {0} and rate tolerance {1}")]
    InvalidTolerance(f64, f64),

    #[error("The integral limit must be positive, found {0}")]
    InvalidIntegralLimit(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AngularPidParams {
    /// Check that the parameters describe a usable input domain.
    ///
    /// The gains themselves are not checked.
    pub fn validate(&self) -> Result<(), AngularPidError> {
        if !(self.wrap_min.is_finite() && self.wrap_max.is_finite())
            || self.wrap_max <= self.wrap_min
        {
            return Err(AngularPidError::InvalidWrapDomain(self.wrap_min, self.wrap_max));
        }

        if !(self.tolerance >= 0.0 && self.rate_tolerance >= 0.0) {
            return Err(AngularPidError::InvalidTolerance(
                self.tolerance,
                self.rate_tolerance,
            ));
        }

        if let Some(limit) = self.integral_limit {
            if !(limit > 0.0) {
                return Err(AngularPidError::InvalidIntegralLimit(limit));
            }
        }

        Ok(())
    }
}

impl AngularPid {
    /// Create a new controller from the given parameters and sample period.
    ///
    /// The initial setpoint is the value in the domain closest to zero.
    pub fn new(params: AngularPidParams, period_s: f64) -> Result<Self, AngularPidError> {
        params.validate()?;

        if !(period_s.is_finite() && period_s > 0.0) {
            return Err(AngularPidError::InvalidPeriod(period_s));
        }

        Ok(Self {
            setpoint: wrap_to_range(0.0, params.wrap_min, params.wrap_max),
            params,
            period_s,
            error: 0.0,
            rate: 0.0,
            prev_error: None,
            integral: 0.0,
            terms: PidTerms::default(),
        })
    }

    /// Set the setpoint, which is wrapped into the input domain.
    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.setpoint = wrap_to_range(setpoint, self.params.wrap_min, self.params.wrap_max);
    }

    /// Get the current (wrapped) setpoint.
    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Calculate the controller output for the given measurement.
    ///
    /// The measurement does not need to be inside the input domain.
    pub fn calculate(&mut self, measurement: f64) -> f64 {
        // Shortest signed distance from the measurement to the setpoint
        let error = get_ang_dist(
            measurement,
            self.setpoint,
            self.params.wrap_min,
            self.params.wrap_max,
        );

        // No derivative on the first sample, otherwise the controller kicks
        // by the full error divided by the period.
        let rate = match self.prev_error {
            Some(e) => (error - e) / self.period_s,
            None => 0f64,
        };

        self.integral += error * self.period_s;
        if let Some(limit) = self.params.integral_limit {
            self.integral = self.integral.max(-limit).min(limit);
        }

        self.terms = PidTerms {
            p: self.params.k_p * error,
            i: self.params.k_i * self.integral,
            d: self.params.k_d * rate,
        };

        self.error = error;
        self.rate = rate;
        self.prev_error = Some(error);

        self.terms.p + self.terms.i + self.terms.d
    }

    /// Returns true if both the error and its rate are within tolerance.
    ///
    /// Always false until `calculate` has been called since the last reset.
    pub fn at_setpoint(&self) -> bool {
        self.prev_error.is_some()
            && self.error.abs() <= self.params.tolerance
            && self.rate.abs() <= self.params.rate_tolerance
    }

    /// Clear the integral and derivative history.
    pub fn reset(&mut self) {
        self.error = 0.0;
        self.rate = 0.0;
        self.prev_error = None;
        self.integral = 0.0;
        self.terms = PidTerms::default();
    }

    /// Error from the last `calculate` call.
    pub fn error(&self) -> f64 {
        self.error
    }

    /// Rate of change of the error from the last `calculate` call.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// The terms making up the last output.
    pub fn terms(&self) -> PidTerms {
        self.terms
    }

    pub fn params(&self) -> &AngularPidParams {
        &self.params
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use util::maths::rem_euclid;

    fn deg_params(k_p: f64, k_i: f64, k_d: f64) -> AngularPidParams {
        AngularPidParams {
            k_p,
            k_i,
            k_d,
            tolerance: 3.0,
            rate_tolerance: 100.0,
            wrap_min: -180.0,
            wrap_max: 180.0,
            integral_limit: None,
        }
    }

    #[test]
    fn test_wrap_correctness() {
        let mut pid = AngularPid::new(deg_params(1.0, 0.0, 0.0), 0.02).unwrap();

        let mut setpoint = -179.0;
        while setpoint <= 180.0 {
            let mut measurement = -179.0;
            while measurement <= 180.0 {
                pid.reset();
                pid.set_setpoint(setpoint);
                pid.calculate(measurement);
                let e = pid.error();

                // Unique representative in (-180, 180]
                assert!(e > -180.0 && e <= 180.0, "error {} out of range", e);
                assert_eq!(
                    rem_euclid(measurement + e - setpoint, 360.0),
                    0.0,
                    "sp {} meas {} err {}",
                    setpoint,
                    measurement,
                    e
                );

                measurement += 7.0;
            }
            setpoint += 11.0;
        }
    }

    #[test]
    fn test_unnormalised_measurement() {
        let mut pid = AngularPid::new(deg_params(1.0, 0.0, 0.0), 0.02).unwrap();
        pid.set_setpoint(10.0);

        // 730 degrees is 10 degrees after two full turns
        assert_eq!(pid.calculate(730.0), 0.0);
        assert_eq!(pid.calculate(-340.0), -10.0);
    }

    #[test]
    fn test_setpoint_is_wrapped() {
        let mut pid = AngularPid::new(deg_params(1.0, 0.0, 0.0), 0.02).unwrap();
        pid.set_setpoint(-180.0);
        assert_eq!(pid.setpoint(), 180.0);
        pid.set_setpoint(370.0);
        assert_eq!(pid.setpoint(), 10.0);
    }

    #[test]
    fn test_boundary_crossing() {
        let k_p = 0.02;
        let mut pid = AngularPid::new(deg_params(k_p, 0.0, 0.0), 0.02).unwrap();
        pid.set_setpoint(170.0);

        let out = pid.calculate(-170.0);

        // Short way round is 20 degrees through the ±180 boundary, never 340
        assert_eq!(pid.error().abs(), 20.0);
        assert_eq!(pid.error(), -20.0);
        assert!((out - k_p * pid.error()).abs() < 1e-12);
        assert!(out.signum() == (k_p * pid.error()).signum());
    }

    #[test]
    fn test_zero_error_stability() {
        let mut pid = AngularPid::new(deg_params(0.5, 0.0, 0.1), 0.02).unwrap();
        pid.set_setpoint(45.0);

        assert_eq!(pid.calculate(45.0), 0.0);
        assert_eq!(pid.calculate(45.0), 0.0);
        assert_eq!(pid.calculate(45.0 - 360.0), 0.0);

        // With integral action a prior error leaves the integral term, but P
        // and D are zero once the error is zero and steady.
        let mut pid = AngularPid::new(deg_params(0.5, 1.0, 0.1), 0.02).unwrap();
        pid.set_setpoint(45.0);
        pid.calculate(35.0);
        pid.calculate(45.0);
        pid.calculate(45.0);
        let terms = pid.terms();
        assert_eq!(terms.p, 0.0);
        assert_eq!(terms.d, 0.0);
        assert!(terms.i > 0.0);
    }

    #[test]
    fn test_at_setpoint() {
        let mut pid = AngularPid::new(deg_params(1.0, 0.0, 0.0), 0.02).unwrap();
        pid.set_setpoint(90.0);

        // No sample yet
        assert!(!pid.at_setpoint());

        // Within tolerance on the first sample (no rate yet)
        pid.calculate(88.0);
        assert!(pid.at_setpoint());

        // Large error, low rate
        pid.reset();
        pid.calculate(0.0);
        pid.calculate(0.0);
        assert!(!pid.at_setpoint());

        // Small error but high rate: 88 degrees in 0.02 s
        pid.reset();
        pid.calculate(0.0);
        pid.calculate(88.0);
        assert!(pid.error().abs() <= 3.0);
        assert!(!pid.at_setpoint());

        // Small error and settled
        pid.calculate(88.5);
        assert!(pid.at_setpoint());

        pid.reset();
        assert!(!pid.at_setpoint());
    }

    #[test]
    fn test_integral_limit() {
        let mut params = deg_params(0.0, 1.0, 0.0);
        params.integral_limit = Some(0.5);
        let mut pid = AngularPid::new(params, 0.1).unwrap();
        pid.set_setpoint(90.0);

        for _ in 0..100 {
            pid.calculate(0.0);
        }

        assert_eq!(pid.terms().i, 0.5);
    }

    #[test]
    fn test_derivative() {
        let mut pid = AngularPid::new(deg_params(0.0, 0.0, 1.0), 0.5).unwrap();
        pid.set_setpoint(0.0);

        // First sample has no derivative
        assert_eq!(pid.calculate(-10.0), 0.0);

        // Error goes from 10 to 4 in 0.5 s
        assert_eq!(pid.calculate(-4.0), -12.0);
    }

    #[test]
    fn test_invalid_params() {
        let mut params = deg_params(1.0, 0.0, 0.0);
        params.wrap_max = -180.0;
        match AngularPid::new(params, 0.02) {
            Err(AngularPidError::InvalidWrapDomain(_, _)) => (),
            r => panic!("Expected invalid wrap domain, got {:?}", r),
        }

        match AngularPid::new(deg_params(1.0, 0.0, 0.0), 0.0) {
            Err(AngularPidError::InvalidPeriod(_)) => (),
            r => panic!("Expected invalid period, got {:?}", r),
        }

        let mut params = deg_params(1.0, 0.0, 0.0);
        params.tolerance = -1.0;
        match AngularPid::new(params, 0.02) {
            Err(AngularPidError::InvalidTolerance(_, _)) => (),
            r => panic!("Expected invalid tolerance, got {:?}", r),
        }

        // Negative gains are the caller's problem
        assert!(AngularPid::new(deg_params(-1.0, 0.0, -3.0), 0.02).is_ok());
    }
}
