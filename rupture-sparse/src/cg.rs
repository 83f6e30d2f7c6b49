//! Preconditioned Conjugate Gradient for symmetric positive definite operators.
use crate::operator::{IdentityOperator, LinearOperator};
use core::fmt;
use nalgebra::{DVector, DVectorView, DVectorViewMut};
use rupture_traits::Real;
use std::error::Error;

/// Stops once the approximate residual satisfies `||r|| <= max(rtol * ||b||, atol)`.
///
/// The residual is the one updated by the CG recurrence, which may drift from the true
/// residual `b - Ax` for ill-conditioned operators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualToleranceCriterion<T> {
    rtol: T,
    atol: T,
}

impl<T: Real> ResidualToleranceCriterion<T> {
    pub fn new(rtol: T, atol: T) -> Self {
        Self { rtol, atol }
    }

    pub fn rtol(&self) -> T {
        self.rtol
    }

    pub fn atol(&self) -> T {
        self.atol
    }

    pub fn has_converged(&self, b_norm: T, residual_norm: T) -> bool {
        residual_norm <= (self.rtol * b_norm).max(self.atol)
    }
}

/// Builder for a single CG solve.
///
/// An operator and a stopping criterion must be supplied before the solver can be used. The
/// preconditioner defaults to the identity and the iteration count is unbounded by default.
#[derive(Debug)]
pub struct ConjugateGradient<A, P, C> {
    operator: A,
    preconditioner: P,
    stopping_criterion: C,
    max_iter: Option<usize>,
}

impl ConjugateGradient<(), IdentityOperator, ()> {
    pub fn new() -> Self {
        Self {
            operator: (),
            preconditioner: IdentityOperator,
            stopping_criterion: (),
            max_iter: None,
        }
    }
}

impl<P, C> ConjugateGradient<(), P, C> {
    pub fn with_operator<A>(self, operator: A) -> ConjugateGradient<A, P, C> {
        ConjugateGradient {
            operator,
            preconditioner: self.preconditioner,
            stopping_criterion: self.stopping_criterion,
            max_iter: self.max_iter,
        }
    }
}

impl<A, P> ConjugateGradient<A, P, ()> {
    pub fn with_stopping_criterion<T>(
        self,
        stopping_criterion: ResidualToleranceCriterion<T>,
    ) -> ConjugateGradient<A, P, ResidualToleranceCriterion<T>> {
        ConjugateGradient {
            operator: self.operator,
            preconditioner: self.preconditioner,
            stopping_criterion,
            max_iter: self.max_iter,
        }
    }
}

impl<A, P, C> ConjugateGradient<A, P, C> {
    pub fn with_preconditioner<P2>(self, preconditioner: P2) -> ConjugateGradient<A, P2, C> {
        ConjugateGradient {
            operator: self.operator,
            preconditioner,
            stopping_criterion: self.stopping_criterion,
            max_iter: self.max_iter,
        }
    }

    pub fn with_max_iter(self, max_iter: usize) -> Self {
        Self {
            max_iter: Some(max_iter),
            ..self
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum SolveErrorKind {
    OperatorError(Box<dyn Error + Send + Sync>),
    PreconditionerError(Box<dyn Error + Send + Sync>),
    IndefiniteOperator,
    IndefinitePreconditioner,
    MaxIterationsReached { max_iter: usize },
}

impl fmt::Display for SolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperatorError(err) => write!(f, "Error applying operator: {}", err),
            Self::PreconditionerError(err) => write!(f, "Error applying preconditioner: {}", err),
            Self::IndefiniteOperator => write!(f, "Operator appears to be indefinite."),
            Self::IndefinitePreconditioner => write!(f, "Indefinite preconditioner."),
            Self::MaxIterationsReached { max_iter } => write!(f, "Max iterations ({}) reached.", max_iter),
        }
    }
}

/// A failed CG solve, with the solver state at the time of failure.
#[derive(Debug)]
pub struct SolveError<T> {
    pub output: CgOutput<T>,
    pub kind: SolveErrorKind,
}

impl<T: fmt::Display> fmt::Display for SolveError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CG solve failed after {} iterations (residual norm {}). Error: {}",
            self.output.num_iterations, self.output.residual_norm, self.kind
        )
    }
}

impl<T: fmt::Debug + fmt::Display> Error for SolveError<T> {}

#[derive(Debug, Clone)]
pub struct CgOutput<T> {
    /// Number of updates made to the solution vector.
    pub num_iterations: usize,
    /// Norm of the approximate residual at the last iterate.
    pub residual_norm: T,
}

impl<T, A, P> ConjugateGradient<A, P, ResidualToleranceCriterion<T>>
where
    T: Real,
    A: LinearOperator<T>,
    P: LinearOperator<T>,
{
    /// Solve `Ax = b`, starting from the current contents of `x`.
    pub fn solve_with_guess<'b>(
        &self,
        b: impl Into<DVectorView<'b, T>>,
        x: impl Into<DVectorViewMut<'b, T>>,
    ) -> Result<CgOutput<T>, SolveError<T>> {
        self.solve(b.into(), x.into())
    }

    #[allow(non_snake_case)]
    fn solve(&self, b: DVectorView<T>, mut x: DVectorViewMut<T>) -> Result<CgOutput<T>, SolveError<T>> {
        assert_eq!(b.len(), x.len(), "Right-hand side and solution must have the same length");
        let mut output = CgOutput {
            num_iterations: 0,
            residual_norm: T::zero(),
        };
        let fail = |output: &CgOutput<T>, kind| SolveError {
            output: output.clone(),
            kind,
        };

        let b_norm = b.norm();
        if b_norm == T::zero() {
            x.fill(T::zero());
            return Ok(output);
        }

        let n = b.len();
        let mut r = DVector::zeros(n);
        let mut z = DVector::zeros(n);
        let mut Ap = DVector::zeros(n);

        self.operator
            .apply((&mut r).into(), (&x).into())
            .map_err(|err| fail(&output, SolveErrorKind::OperatorError(err)))?;
        r = &b - r;
        self.preconditioner
            .apply((&mut z).into(), (&r).into())
            .map_err(|err| fail(&output, SolveErrorKind::PreconditionerError(err)))?;
        let mut p = z.clone();
        let mut zTr = z.dot(&r);

        loop {
            output.residual_norm = r.norm();
            if self.stopping_criterion.has_converged(b_norm, output.residual_norm) {
                return Ok(output);
            }
            if let Some(max_iter) = self.max_iter {
                if output.num_iterations >= max_iter {
                    return Err(fail(&output, SolveErrorKind::MaxIterationsReached { max_iter }));
                }
            }

            self.operator
                .apply((&mut Ap).into(), (&p).into())
                .map_err(|err| fail(&output, SolveErrorKind::OperatorError(err)))?;
            let pAp = p.dot(&Ap);
            if pAp <= T::zero() {
                return Err(fail(&output, SolveErrorKind::IndefiniteOperator));
            }
            if zTr <= T::zero() {
                return Err(fail(&output, SolveErrorKind::IndefinitePreconditioner));
            }

            let alpha = zTr / pAp;
            x.axpy(alpha, &p, T::one());
            r.axpy(-alpha, &Ap, T::one());
            output.num_iterations += 1;

            self.preconditioner
                .apply((&mut z).into(), (&r).into())
                .map_err(|err| fail(&output, SolveErrorKind::PreconditionerError(err)))?;
            let zTr_next = z.dot(&r);
            let beta = zTr_next / zTr;
            p.axpy(T::one(), &z, beta);
            zTr = zTr_next;
        }
    }
}
