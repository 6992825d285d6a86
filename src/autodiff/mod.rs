//! Scalar reverse-mode automatic differentiation.
//!
//! ```
//! use fitloop::autodiff::Tape;
//!
//! let tape = Tape::new();
//! let x = tape.var(3.0);
//! let y = x * x + x * 2.0;
//! let g = y.backward();
//! assert_eq!(g.wrt(&x), 8.0);
//! ```

pub mod real;
pub mod tape;

pub use real::{Real, mean, sum};
pub use tape::{Grads, Tape, Var};
