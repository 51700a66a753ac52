/// Actions an observer can request from the inverse kinematics solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop iterating and return the current wrench.
    StopEarly,
}
