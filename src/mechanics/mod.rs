pub mod converge;
pub mod optim;
pub mod penalty;
pub mod series;
pub mod stoch;
pub mod transforms;

pub use converge::*;
pub use optim::*;
pub use stoch::{Dropout, bernoulli, gaussian01, normal, seeded};
