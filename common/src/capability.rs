use std::fmt;

/// Capability tag declared by problem and model types.
/// A model can only run against a problem if they share at least one tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    /// Next-value prediction on a scalar or vector series
    TimeSeries,
    /// Environments driven by an action input
    Control,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::TimeSeries => write!(f, "TimeSeries"),
            Capability::Control => write!(f, "Control"),
        }
    }
}

/// Whether two declared capability sets overlap
#[inline]
pub fn intersects(a: &[Capability], b: &[Capability]) -> bool {
    a.iter().any(|c| b.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection() {
        use Capability::*;
        assert!(intersects(&[TimeSeries], &[TimeSeries, Control]));
        assert!(!intersects(&[TimeSeries], &[Control]));
        assert!(!intersects(&[], &[Control]));
    }
}
