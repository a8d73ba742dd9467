mod solver;

pub use solver::agent::DpAgent;
pub use solver::arena::Arena;
pub use solver::environment::Environment;
pub use solver::error::SolverError;
pub use solver::ids::{ActionId, StateId};
pub use solver::iteration::{
    RoundMetrics, SolveMetrics, Solution, SolverConfig, SolverConfigError, solve,
    solve_with_hook,
};
pub use solver::policy::Policy;
pub use solver::simulator::{Episode, PolicySimulator};
pub use solver::snapshot::{PolicySnapshot, StateSnapshot};
