/// Outcome of integrating a rod from a base wrench.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationResult {
    /// The equilibrium was integrated and found stable.
    Valid,

    /// The base wrench leaves the rod straight; nothing was integrated.
    Singular,

    /// `det J` crossed or touched zero after the stability check was armed.
    Unstable,
}

impl IntegrationResult {
    #[must_use]
    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }
}
