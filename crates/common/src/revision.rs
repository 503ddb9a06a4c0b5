use serde::{Deserialize, Serialize};

/// EVM specification revision (hard fork).
///
/// Ordering is meaningful: `rev >= Revision::Berlin` is how every
/// "since revision X" rule in the engine is expressed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Revision {
    Frontier,
    Homestead,
    Tangerine,
    SpuriousDragon,
    Byzantium,
    Constantinople,
    Petersburg,
    Istanbul,
    Berlin,
    London,
    Paris,
    Shanghai,
    #[default]
    Cancun,
    Prague,
}

impl Revision {
    /// Latest revision the engine fully supports.
    pub const LATEST: Revision = Revision::Prague;

    pub const fn name(&self) -> &'static str {
        match self {
            Revision::Frontier => "Frontier",
            Revision::Homestead => "Homestead",
            Revision::Tangerine => "Tangerine Whistle",
            Revision::SpuriousDragon => "Spurious Dragon",
            Revision::Byzantium => "Byzantium",
            Revision::Constantinople => "Constantinople",
            Revision::Petersburg => "Petersburg",
            Revision::Istanbul => "Istanbul",
            Revision::Berlin => "Berlin",
            Revision::London => "London",
            Revision::Paris => "Paris",
            Revision::Shanghai => "Shanghai",
            Revision::Cancun => "Cancun",
            Revision::Prague => "Prague",
        }
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_ordering() {
        assert!(Revision::Frontier < Revision::Homestead);
        assert!(Revision::Berlin < Revision::London);
        assert!(Revision::Shanghai < Revision::Cancun);
        assert!(Revision::Cancun >= Revision::Berlin);
    }
}
