//! Reverse-mode tape.
//!
//! Every operation on a [`Var`] appends one node to its [`Tape`] holding the
//! indices of (at most two) inputs and the local partial derivative with
//! respect to each. [`Var::backward`] sweeps the tape once in reverse.
//!
//! A tape lives for one loss evaluation; building a fresh tape is how the fit
//! loop clears accumulated gradients.

use std::cell::RefCell;
use std::ops::{Add, Div, Mul, Neg, Sub};

#[derive(Clone, Copy, Debug)]
struct Node {
    deps: [(usize, f64); 2],
    arity: u8,
}

/// Append-only record of the operations behind a loss.
#[derive(Debug, Default)]
pub struct Tape {
    nodes: RefCell<Vec<Node>>,
}

impl Tape {
    pub fn new() -> Self {
        Self::default()
    }

    /// New leaf (trainable or constant, the tape does not care).
    pub fn var(&self, value: f64) -> Var<'_> {
        let idx = self.push(Node {
            deps: [(0, 0.0); 2],
            arity: 0,
        });
        Var {
            tape: self,
            idx,
            val: value,
        }
    }

    /// Leaves for a slice of values, in order.
    pub fn vars(&self, values: &[f64]) -> Vec<Var<'_>> {
        values.iter().map(|&v| self.var(v)).collect()
    }

    /// Number of recorded nodes.
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, node: Node) -> usize {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(node);
        nodes.len() - 1
    }

    fn unary(&self, a: usize, da: f64, val: f64) -> Var<'_> {
        let idx = self.push(Node {
            deps: [(a, da), (0, 0.0)],
            arity: 1,
        });
        Var {
            tape: self,
            idx,
            val,
        }
    }

    fn binary(&self, a: usize, da: f64, b: usize, db: f64, val: f64) -> Var<'_> {
        let idx = self.push(Node {
            deps: [(a, da), (b, db)],
            arity: 2,
        });
        Var {
            tape: self,
            idx,
            val,
        }
    }
}

/// A scalar recorded on a [`Tape`].
#[derive(Clone, Copy)]
pub struct Var<'t> {
    tape: &'t Tape,
    idx: usize,
    val: f64,
}

impl std::fmt::Debug for Var<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Var")
            .field("idx", &self.idx)
            .field("val", &self.val)
            .finish()
    }
}

impl<'t> Var<'t> {
    #[inline]
    pub fn value(&self) -> f64 {
        self.val
    }

    /// The tape this variable lives on.
    #[inline]
    pub fn tape(&self) -> &'t Tape {
        self.tape
    }

    /// Constant on the same tape.
    #[inline]
    pub fn lift(&self, c: f64) -> Var<'t> {
        self.tape.var(c)
    }

    /// Adjoints of every node with respect to `self`.
    pub fn backward(&self) -> Grads {
        let nodes = self.tape.nodes.borrow();
        let mut adj = vec![0.0; nodes.len()];
        adj[self.idx] = 1.0;
        for i in (0..=self.idx).rev() {
            let a = adj[i];
            if a == 0.0 {
                continue;
            }
            let node = nodes[i];
            for &(dep, w) in &node.deps[..node.arity as usize] {
                adj[dep] += w * a;
            }
        }
        Grads { adj }
    }

    fn map(self, val: f64, d: f64) -> Var<'t> {
        self.tape.unary(self.idx, d, val)
    }

    pub fn exp(self) -> Var<'t> {
        let e = self.val.exp();
        self.map(e, e)
    }

    pub fn ln(self) -> Var<'t> {
        self.map(self.val.ln(), 1.0 / self.val)
    }

    pub fn sqrt(self) -> Var<'t> {
        let s = self.val.sqrt();
        self.map(s, 0.5 / s)
    }

    /// Sub-gradient 0 at the origin.
    pub fn abs(self) -> Var<'t> {
        let d = if self.val > 0.0 {
            1.0
        } else if self.val < 0.0 {
            -1.0
        } else {
            0.0
        };
        self.map(self.val.abs(), d)
    }

    pub fn powi(self, n: i32) -> Var<'t> {
        let d = f64::from(n) * self.val.powi(n - 1);
        self.map(self.val.powi(n), d)
    }

    pub fn powf(self, p: f64) -> Var<'t> {
        let d = p * self.val.powf(p - 1.0);
        self.map(self.val.powf(p), d)
    }

    pub fn recip(self) -> Var<'t> {
        self.map(1.0 / self.val, -1.0 / (self.val * self.val))
    }

    /// `max(x, 0)`; zero gradient in the clamped region and at the kink.
    pub fn relu(self) -> Var<'t> {
        if self.val > 0.0 {
            self.map(self.val, 1.0)
        } else {
            self.map(0.0, 0.0)
        }
    }

    /// Gradient flows to `self` on ties.
    pub fn max(self, other: Var<'t>) -> Var<'t> {
        if self.val >= other.val {
            self.tape.binary(self.idx, 1.0, other.idx, 0.0, self.val)
        } else {
            self.tape.binary(self.idx, 0.0, other.idx, 1.0, other.val)
        }
    }

    /// Gradient flows to `self` on ties.
    pub fn min(self, other: Var<'t>) -> Var<'t> {
        if self.val <= other.val {
            self.tape.binary(self.idx, 1.0, other.idx, 0.0, self.val)
        } else {
            self.tape.binary(self.idx, 0.0, other.idx, 1.0, other.val)
        }
    }
}

/// Result of a reverse sweep.
#[derive(Clone, Debug)]
pub struct Grads {
    adj: Vec<f64>,
}

impl Grads {
    /// d(output)/d(v). Variables recorded after the output get 0.
    pub fn wrt(&self, v: &Var<'_>) -> f64 {
        self.adj.get(v.idx).copied().unwrap_or(0.0)
    }

    pub fn wrt_all(&self, vs: &[Var<'_>]) -> Vec<f64> {
        vs.iter().map(|v| self.wrt(v)).collect()
    }
}

// ---- operators: Var ∘ Var ----

impl<'t> Add for Var<'t> {
    type Output = Var<'t>;
    fn add(self, rhs: Var<'t>) -> Var<'t> {
        self.tape
            .binary(self.idx, 1.0, rhs.idx, 1.0, self.val + rhs.val)
    }
}

impl<'t> Sub for Var<'t> {
    type Output = Var<'t>;
    fn sub(self, rhs: Var<'t>) -> Var<'t> {
        self.tape
            .binary(self.idx, 1.0, rhs.idx, -1.0, self.val - rhs.val)
    }
}

impl<'t> Mul for Var<'t> {
    type Output = Var<'t>;
    fn mul(self, rhs: Var<'t>) -> Var<'t> {
        self.tape
            .binary(self.idx, rhs.val, rhs.idx, self.val, self.val * rhs.val)
    }
}

impl<'t> Div for Var<'t> {
    type Output = Var<'t>;
    fn div(self, rhs: Var<'t>) -> Var<'t> {
        let q = self.val / rhs.val;
        self.tape
            .binary(self.idx, 1.0 / rhs.val, rhs.idx, -q / rhs.val, q)
    }
}

impl<'t> Neg for Var<'t> {
    type Output = Var<'t>;
    fn neg(self) -> Var<'t> {
        self.map(-self.val, -1.0)
    }
}

// ---- operators: Var ∘ f64 and f64 ∘ Var ----

impl<'t> Add<f64> for Var<'t> {
    type Output = Var<'t>;
    fn add(self, rhs: f64) -> Var<'t> {
        self.map(self.val + rhs, 1.0)
    }
}

impl<'t> Sub<f64> for Var<'t> {
    type Output = Var<'t>;
    fn sub(self, rhs: f64) -> Var<'t> {
        self.map(self.val - rhs, 1.0)
    }
}

impl<'t> Mul<f64> for Var<'t> {
    type Output = Var<'t>;
    fn mul(self, rhs: f64) -> Var<'t> {
        self.map(self.val * rhs, rhs)
    }
}

impl<'t> Div<f64> for Var<'t> {
    type Output = Var<'t>;
    fn div(self, rhs: f64) -> Var<'t> {
        self.map(self.val / rhs, 1.0 / rhs)
    }
}

impl<'t> Add<Var<'t>> for f64 {
    type Output = Var<'t>;
    fn add(self, rhs: Var<'t>) -> Var<'t> {
        rhs + self
    }
}

impl<'t> Sub<Var<'t>> for f64 {
    type Output = Var<'t>;
    fn sub(self, rhs: Var<'t>) -> Var<'t> {
        rhs.map(self - rhs.val, -1.0)
    }
}

impl<'t> Mul<Var<'t>> for f64 {
    type Output = Var<'t>;
    fn mul(self, rhs: Var<'t>) -> Var<'t> {
        rhs * self
    }
}

impl<'t> Div<Var<'t>> for f64 {
    type Output = Var<'t>;
    fn div(self, rhs: Var<'t>) -> Var<'t> {
        rhs.recip() * self
    }
}
