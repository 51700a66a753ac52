use tendril_core::Snapshot;

/// Event emitted by the RK4 solver for each accepted node.
///
/// Step 0 is the initial node before any integration.
/// Steps 1..N are emitted after each integration step.
#[derive(Debug, Clone)]
pub struct Event<'a, I, O> {
    /// The step number (0 for the initial node, 1..N for integration steps).
    pub step: usize,

    /// Snapshot of the model input and output at this node.
    pub snapshot: &'a Snapshot<I, O>,
}
