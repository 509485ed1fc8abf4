//! Equilibrium shape and internal force field of one sagging cable.
//!
//! A uniform cable suspended between two fixed points hangs in a catenary
//! `z(x) = zc + a * cosh((x + xc) / a)` where `a` is the ratio between the
//! horizontal tension component and the cable's weight per unit length. The
//! horizontal tension is constant along the cable, so the whole force field
//! follows from `a` and the two offsets.

use crate::errors::CableError;

/// Iteration budget for the inverse tension fit.
const TENSION_FIT_MAX_ITERATIONS: usize = 50;
/// Step-halving attempts per Newton iteration of the tension fit.
const TENSION_FIT_DAMPING_STEPS: usize = 30;

/// Solved catenary between an anchor at `x = 0` and a load end at `x = span`.
///
/// Values of this type always satisfy the boundary conditions they were
/// solved for; there is no partially-configured state. Build one with
/// [`Catenary::solve`] or [`Catenary::with_tension_at`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Catenary {
    /// Height of the anchor end.
    z1: f64,
    /// Height of the load end.
    z2: f64,
    /// Horizontal span between the ends.
    span: f64,
    /// Cable weight per unit length (force, not mass).
    unit_weight: f64,
    /// Horizontal component of tension, uniform along the cable.
    horizontal_tension: f64,
    /// Catenary scale `horizontal_tension / unit_weight`.
    a: f64,
    /// Horizontal offset aligning the curve with the endpoints.
    xc: f64,
    /// Vertical offset aligning the curve with the endpoints.
    zc: f64,
}

impl Catenary {
    /// Solve the cable shape for a known horizontal tension component.
    ///
    /// `z1` is the anchor-end height, `z2` the load-end height, `span` the
    /// horizontal distance between them and `unit_weight` the cable weight
    /// per unit length. The offsets come from the closed-form algebraic
    /// solution of the two-point boundary problem.
    ///
    /// # Errors
    ///
    /// Returns [`CableError::NonPositiveTension`] or
    /// [`CableError::NonPositiveUnitWeight`] for non-physical parameters,
    /// [`CableError::DegenerateGeometry`] for a zero span and
    /// [`CableError::UnsolvableGeometry`] when the closed form has no real
    /// value, which happens when the cable is far too slack for the span.
    ///
    /// # Examples
    /// ```
    /// use tricable::Catenary;
    ///
    /// let cable = Catenary::solve(5.0, 4.0, 10.0, 0.035, 1.0).unwrap();
    /// assert!((cable.height(0.0) - 5.0).abs() < 1.0e-6);
    /// assert!((cable.height(10.0) - 4.0).abs() < 1.0e-6);
    /// ```
    pub fn solve(
        z1: f64,
        z2: f64,
        span: f64,
        unit_weight: f64,
        horizontal_tension: f64,
    ) -> Result<Self, CableError> {
        if !(horizontal_tension > 0.0) {
            return Err(CableError::NonPositiveTension(horizontal_tension));
        }
        if !(unit_weight > 0.0) {
            return Err(CableError::NonPositiveUnitWeight(unit_weight));
        }
        if !(span > 0.0) {
            return Err(CableError::DegenerateGeometry { span });
        }

        let a = horizontal_tension / unit_weight;
        let zd = z2 - z1;

        // Closed-form solution of `a cosh(xc/a) + zd = a cosh((span + xc)/a)`
        // for xc, derived symbolically once. The exponentials overflow for
        // very small `a`, which surfaces as a non-finite intermediate below.
        let e1 = (span / a).exp();
        let e2 = (2.0 * span / a).exp();
        let a2 = a * a;
        let c1 = (a2 * e2 - 2.0 * a2 * e1 + a2 + zd * zd * e1) * e1;
        let c2 = -2.0 * a * e2 + 2.0 * a * e1;
        let c3 = zd / (a * (e1 - 1.0));
        if !(c1 >= 0.0) || c2 == 0.0 {
            return Err(CableError::UnsolvableGeometry { span, scale: a });
        }
        let argument = 2.0 * (c1.sqrt() / c2).abs() + c3;
        if !(argument > 0.0) || !argument.is_finite() {
            return Err(CableError::UnsolvableGeometry { span, scale: a });
        }
        let xc = a * argument.ln();
        let zc = z1 - a * (xc / a).cosh();
        if !xc.is_finite() || !zc.is_finite() {
            return Err(CableError::UnsolvableGeometry { span, scale: a });
        }

        Ok(Self {
            z1,
            z2,
            span,
            unit_weight,
            horizontal_tension,
            a,
            xc,
            zc,
        })
    }

    /// Solve for the horizontal tension that yields a given total tension at
    /// location `x`, then return the resulting cable.
    ///
    /// The root is found by damped Newton iteration starting from
    /// `target_tension` itself, which is always an upper bound on the answer.
    ///
    /// # Errors
    ///
    /// Returns [`CableError::ConvergenceFailure`] when the iteration budget
    /// is exhausted, plus any shape error from [`Catenary::solve`].
    pub fn with_tension_at(
        z1: f64,
        z2: f64,
        span: f64,
        unit_weight: f64,
        target_tension: f64,
        x: f64,
    ) -> Result<Self, CableError> {
        if !(target_tension > 0.0) {
            return Err(CableError::NonPositiveTension(target_tension));
        }
        let tolerance = 1.0e-9 * target_tension;
        let mut cable = Self::solve(z1, z2, span, unit_weight, target_tension)?;
        let mut residual = cable.total_tension(x) - target_tension;

        for _ in 0..TENSION_FIT_MAX_ITERATIONS {
            if residual.abs() <= tolerance {
                return Ok(cable);
            }
            let th = cable.horizontal_tension;
            let h = 1.0e-7 * th;
            let probe = Self::solve(z1, z2, span, unit_weight, th + h)?;
            let slope = (probe.total_tension(x) - cable.total_tension(x)) / h;
            if !slope.is_finite() || slope.abs() < f64::MIN_POSITIVE {
                break;
            }
            let mut step = -residual / slope;
            let mut accepted = false;
            for _ in 0..TENSION_FIT_DAMPING_STEPS {
                let trial = th + step;
                if trial > 0.0 {
                    if let Ok(candidate) = Self::solve(z1, z2, span, unit_weight, trial) {
                        cable = candidate;
                        residual = cable.total_tension(x) - target_tension;
                        accepted = true;
                        break;
                    }
                }
                step *= 0.5;
            }
            if !accepted {
                break;
            }
        }

        Err(CableError::ConvergenceFailure {
            iterations: TENSION_FIT_MAX_ITERATIONS,
            residual,
        })
    }

    /// Height of the cable at horizontal position `x`.
    ///
    /// Physically meaningful for `x` in `[0, span]`; values outside that
    /// range extend the underlying curve for diagnostic use.
    #[must_use]
    pub fn height(&self, x: f64) -> f64 {
        self.zc + self.a * ((x + self.xc) / self.a).cosh()
    }

    /// Vertical component of tension at horizontal position `x`.
    ///
    /// Negative where the cable slopes downward with increasing `x`.
    #[must_use]
    pub fn vertical_force(&self, x: f64) -> f64 {
        self.horizontal_tension * ((x + self.xc) / self.a).sinh()
    }

    /// Total tension magnitude at horizontal position `x`.
    #[must_use]
    pub fn total_tension(&self, x: f64) -> f64 {
        self.horizontal_tension.hypot(self.vertical_force(x))
    }

    /// Arc length of the cable between its two ends.
    ///
    /// Always at least the straight-line distance between the endpoints.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.a * (((self.span + self.xc) / self.a).sinh() - (self.xc / self.a).sinh())
    }

    /// Horizontal span between the two ends.
    #[must_use]
    pub fn span(&self) -> f64 {
        self.span
    }

    /// Horizontal component of tension, uniform along the cable.
    #[must_use]
    pub fn horizontal_tension(&self) -> f64 {
        self.horizontal_tension
    }

    /// Catenary scale `a = horizontal_tension / unit_weight`.
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.a
    }

    /// Horizontal position of the curve's lowest point.
    ///
    /// May fall outside `[0, span]` when the cable is taut enough that no
    /// interior minimum exists.
    #[must_use]
    pub fn minimum_position(&self) -> f64 {
        -self.xc
    }

    /// Straight-line distance between the two endpoints.
    #[must_use]
    pub fn chord_length(&self) -> f64 {
        self.span.hypot(self.z2 - self.z1)
    }
}
