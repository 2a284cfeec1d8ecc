// src/expr.rs
// Symbolic scalar used by the Symbolic evaluator. An Expr is an immutable expression tree with
// shared children; the smart constructors fold constants as the tree is built, so feeding plain
// numbers through the dynamics yields constants again and feeding symbols yields closed forms.
// Arithmetic traits plus num_traits::{Zero, One} let nalgebra matrices hold Expr entries.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};
use std::sync::Arc;

use num_traits::{One, Zero};

use crate::error::{DynamicsError, DynamicsResult};

/// Expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(f64),
    Symbol(Arc<str>),
    Sum(Arc<Expr>, Arc<Expr>),
    Product(Arc<Expr>, Arc<Expr>),
    Neg(Arc<Expr>),
    Recip(Arc<Expr>),
    Cos(Arc<Expr>),
    Sin(Arc<Expr>),
}

impl Expr {
    pub fn constant(value: f64) -> Self {
        Expr::Const(value)
    }

    pub fn symbol(name: &str) -> Self {
        Expr::Symbol(Arc::from(name))
    }

    /// Returns the value if the expression folded to a constant.
    pub fn as_const(&self) -> Option<f64> {
        match self {
            Expr::Const(c) => Some(*c),
            _ => None,
        }
    }

    pub fn sum(lhs: Expr, rhs: Expr) -> Expr {
        match (lhs.as_const(), rhs.as_const()) {
            (Some(a), Some(b)) => Expr::Const(a + b),
            (Some(a), None) if a == 0.0 => rhs,
            (None, Some(b)) if b == 0.0 => lhs,
            _ => Expr::Sum(Arc::new(lhs), Arc::new(rhs)),
        }
    }

    pub fn product(lhs: Expr, rhs: Expr) -> Expr {
        match (lhs.as_const(), rhs.as_const()) {
            (Some(a), Some(b)) => Expr::Const(a * b),
            (Some(c), _) | (_, Some(c)) if c == 0.0 => Expr::Const(0.0),
            (Some(c), None) if c == 1.0 => rhs,
            (None, Some(c)) if c == 1.0 => lhs,
            (Some(c), None) if c == -1.0 => Expr::negate(rhs),
            (None, Some(c)) if c == -1.0 => Expr::negate(lhs),
            _ => Expr::Product(Arc::new(lhs), Arc::new(rhs)),
        }
    }

    pub fn negate(e: Expr) -> Expr {
        match e {
            Expr::Const(c) => Expr::Const(-c),
            Expr::Neg(inner) => (*inner).clone(),
            other => Expr::Neg(Arc::new(other)),
        }
    }

    pub fn reciprocal(e: Expr) -> Expr {
        match e {
            Expr::Const(c) => Expr::Const(1.0 / c),
            Expr::Recip(inner) => (*inner).clone(),
            other => Expr::Recip(Arc::new(other)),
        }
    }

    pub fn cos(e: Expr) -> Expr {
        match e {
            Expr::Const(c) => Expr::Const(c.cos()),
            other => Expr::Cos(Arc::new(other)),
        }
    }

    pub fn sin(e: Expr) -> Expr {
        match e {
            Expr::Const(c) => Expr::Const(c.sin()),
            other => Expr::Sin(Arc::new(other)),
        }
    }

    /// Evaluates the expression with the given symbol bindings.
    pub fn eval(&self, bindings: &[(&str, f64)]) -> DynamicsResult<f64> {
        Ok(match self {
            Expr::Const(c) => *c,
            Expr::Symbol(name) => bindings
                .iter()
                .find(|(bound, _)| *bound == &**name)
                .map(|(_, value)| *value)
                .ok_or_else(|| DynamicsError::UnboundSymbol(name.to_string()))?,
            Expr::Sum(a, b) => a.eval(bindings)? + b.eval(bindings)?,
            Expr::Product(a, b) => a.eval(bindings)? * b.eval(bindings)?,
            Expr::Neg(a) => -a.eval(bindings)?,
            Expr::Recip(a) => 1.0 / a.eval(bindings)?,
            Expr::Cos(a) => a.eval(bindings)?.cos(),
            Expr::Sin(a) => a.eval(bindings)?.sin(),
        })
    }

    /// Partial derivative with respect to the named symbol.
    pub fn diff(&self, symbol: &str) -> Expr {
        match self {
            Expr::Const(_) => Expr::Const(0.0),
            Expr::Symbol(name) => Expr::Const(if &**name == symbol { 1.0 } else { 0.0 }),
            Expr::Sum(a, b) => Expr::sum(a.diff(symbol), b.diff(symbol)),
            Expr::Product(a, b) => Expr::sum(
                Expr::product(a.diff(symbol), (**b).clone()),
                Expr::product((**a).clone(), b.diff(symbol)),
            ),
            Expr::Neg(a) => Expr::negate(a.diff(symbol)),
            // (1/a)' = -a' / a²
            Expr::Recip(a) => {
                let inv = Expr::Recip(a.clone());
                Expr::negate(Expr::product(a.diff(symbol), Expr::product(inv.clone(), inv)))
            }
            Expr::Cos(a) => Expr::negate(Expr::product(Expr::sin((**a).clone()), a.diff(symbol))),
            Expr::Sin(a) => Expr::product(Expr::cos((**a).clone()), a.diff(symbol)),
        }
    }
}

impl Default for Expr {
    fn default() -> Self {
        Expr::Const(0.0)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Const(value)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(c) => write!(f, "{c}"),
            Expr::Symbol(name) => write!(f, "{name}"),
            Expr::Sum(a, b) => write!(f, "({a} + {b})"),
            Expr::Product(a, b) => write!(f, "{a}*{b}"),
            Expr::Neg(a) => write!(f, "-{a}"),
            Expr::Recip(a) => write!(f, "1/({a})"),
            Expr::Cos(a) => write!(f, "cos({a})"),
            Expr::Sin(a) => write!(f, "sin({a})"),
        }
    }
}

impl Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        Expr::sum(self, rhs)
    }
}

impl Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        Expr::sum(self, Expr::negate(rhs))
    }
}

impl Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        Expr::product(self, rhs)
    }
}

impl Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        Expr::product(self, Expr::reciprocal(rhs))
    }
}

impl Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        Expr::negate(self)
    }
}

impl AddAssign for Expr {
    fn add_assign(&mut self, rhs: Expr) {
        *self = Expr::sum(std::mem::take(self), rhs);
    }
}

impl SubAssign for Expr {
    fn sub_assign(&mut self, rhs: Expr) {
        *self = Expr::sum(std::mem::take(self), Expr::negate(rhs));
    }
}

impl MulAssign for Expr {
    fn mul_assign(&mut self, rhs: Expr) {
        *self = Expr::product(std::mem::take(self), rhs);
    }
}

impl Zero for Expr {
    fn zero() -> Self {
        Expr::Const(0.0)
    }

    fn is_zero(&self) -> bool {
        self.as_const() == Some(0.0)
    }
}

impl One for Expr {
    fn one() -> Self {
        Expr::Const(1.0)
    }
}
