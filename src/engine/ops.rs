//! Operator algebra: building derived nodes from existing ones.
//!
//! Binary operators combine two variables of the same graph or a variable
//! and a finite constant. Each operator appends one derived node and wires
//! the parent/child edges; no distribution work happens until a moment or a
//! sample is queried.
//!
//! Mixing variables from two different graphs is a programming error, so the
//! `std::ops` implementations panic on it. The panic message carries the
//! underlying [`RvError`].

use std::ops::{Add, Mul, Neg, Sub};
use std::rc::Rc;

use crate::engine::errors::RvError;
use crate::engine::graph::{NodeId, RandVar, TransformFn};

impl RandVar {
    fn sibling(&self, id: NodeId) -> RandVar {
        RandVar {
            graph: Rc::clone(&self.graph),
            id,
        }
    }

    fn require_same_graph(&self, other: &RandVar, op: &str) -> Result<(), RvError> {
        if self.same_graph(other) {
            Ok(())
        } else {
            Err(RvError::InvalidOperand(format!(
                "cannot {op} random variables from different graphs"
            )))
        }
    }

    fn require_finite(constant: f64, op: &str) -> Result<(), RvError> {
        if constant.is_finite() {
            Ok(())
        } else {
            Err(RvError::InvalidOperand(format!(
                "cannot {op} by non-finite constant {constant}"
            )))
        }
    }

    pub(crate) fn try_add(&self, other: &RandVar) -> Result<RandVar, RvError> {
        self.require_same_graph(other, "add")?;
        let id = self.graph.borrow_mut().add_sum(self.id, other.id);
        Ok(self.sibling(id))
    }

    pub(crate) fn try_shift(&self, shift: f64) -> Result<RandVar, RvError> {
        Self::require_finite(shift, "shift")?;
        let id = self.graph.borrow_mut().add_const_sum(self.id, shift);
        Ok(self.sibling(id))
    }

    pub(crate) fn try_mul(&self, other: &RandVar) -> Result<RandVar, RvError> {
        self.require_same_graph(other, "multiply")?;
        let id = self.graph.borrow_mut().add_product(self.id, other.id);
        Ok(self.sibling(id))
    }

    pub(crate) fn try_scale(&self, factor: f64) -> Result<RandVar, RvError> {
        Self::require_finite(factor, "scale")?;
        let id = self.graph.borrow_mut().add_const_product(self.id, factor);
        Ok(self.sibling(id))
    }

    /// `X - Y`, built as `X + (-1)·Y`.
    pub(crate) fn try_sub(&self, other: &RandVar) -> Result<RandVar, RvError> {
        self.require_same_graph(other, "subtract")?;
        let negated = other.try_scale(-1.0)?;
        self.try_add(&negated)
    }

    /// The integer power `Xⁿ` for `n ≥ 1`.
    ///
    /// Non-integer exponents are unrepresentable by the parameter type; an
    /// exponent of zero is rejected rather than producing the degenerate
    /// constant 1.
    ///
    /// # Errors
    ///
    /// [`RvError::InvalidExponent`] when `exponent < 1`.
    pub fn pow(&self, exponent: u32) -> Result<RandVar, RvError> {
        if exponent < 1 {
            return Err(RvError::InvalidExponent(format!(
                "exponent must be >= 1, got {exponent}"
            )));
        }
        let id = self.graph.borrow_mut().add_power(self.id, exponent);
        Ok(self.sibling(id))
    }

    /// The transformed variable `g(X)` for an arbitrary unary function.
    ///
    /// `func` must be a pure numeric function, defined for every value `X`
    /// can take. It is invoked during both sampling and moment enumeration,
    /// so it must not query the graph itself.
    pub fn map(&self, func: impl Fn(f64) -> f64 + 'static) -> RandVar {
        let func: Rc<TransformFn> = Rc::new(func);
        let id = self.graph.borrow_mut().add_transform(self.id, func);
        self.sibling(id)
    }
}

macro_rules! delegate_or_panic {
    ($expr:expr) => {
        match $expr {
            Ok(rv) => rv,
            Err(err) => panic!("{err}"),
        }
    };
}

/// `X + Y`.
///
/// # Panics
/// Panics if the operands belong to different graphs.
impl Add<&RandVar> for &RandVar {
    type Output = RandVar;

    fn add(self, rhs: &RandVar) -> RandVar {
        delegate_or_panic!(self.try_add(rhs))
    }
}

/// `X + c`.
///
/// # Panics
/// Panics if the constant is not finite.
impl Add<f64> for &RandVar {
    type Output = RandVar;

    fn add(self, rhs: f64) -> RandVar {
        delegate_or_panic!(self.try_shift(rhs))
    }
}

/// `c + X`.
///
/// # Panics
/// Panics if the constant is not finite.
impl Add<&RandVar> for f64 {
    type Output = RandVar;

    fn add(self, rhs: &RandVar) -> RandVar {
        delegate_or_panic!(rhs.try_shift(self))
    }
}

/// `X - Y`, defined as `X + (-1)·Y`.
///
/// # Panics
/// Panics if the operands belong to different graphs.
impl Sub<&RandVar> for &RandVar {
    type Output = RandVar;

    fn sub(self, rhs: &RandVar) -> RandVar {
        delegate_or_panic!(self.try_sub(rhs))
    }
}

/// `X - c`.
///
/// # Panics
/// Panics if the constant is not finite.
impl Sub<f64> for &RandVar {
    type Output = RandVar;

    fn sub(self, rhs: f64) -> RandVar {
        delegate_or_panic!(self.try_shift(-rhs))
    }
}

/// `c - X`, defined as `(-1)·X + c`.
///
/// # Panics
/// Panics if the constant is not finite.
impl Sub<&RandVar> for f64 {
    type Output = RandVar;

    fn sub(self, rhs: &RandVar) -> RandVar {
        let negated = delegate_or_panic!(rhs.try_scale(-1.0));
        delegate_or_panic!(negated.try_shift(self))
    }
}

/// `X · Y`.
///
/// # Panics
/// Panics if the operands belong to different graphs.
impl Mul<&RandVar> for &RandVar {
    type Output = RandVar;

    fn mul(self, rhs: &RandVar) -> RandVar {
        delegate_or_panic!(self.try_mul(rhs))
    }
}

/// `X · c`.
///
/// # Panics
/// Panics if the constant is not finite.
impl Mul<f64> for &RandVar {
    type Output = RandVar;

    fn mul(self, rhs: f64) -> RandVar {
        delegate_or_panic!(self.try_scale(rhs))
    }
}

/// `c · X`.
///
/// # Panics
/// Panics if the constant is not finite.
impl Mul<&RandVar> for f64 {
    type Output = RandVar;

    fn mul(self, rhs: &RandVar) -> RandVar {
        delegate_or_panic!(rhs.try_scale(self))
    }
}

/// `-X`, defined as `(-1)·X`.
impl Neg for &RandVar {
    type Output = RandVar;

    fn neg(self) -> RandVar {
        delegate_or_panic!(self.try_scale(-1.0))
    }
}
