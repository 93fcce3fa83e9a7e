use std::fmt::{Display, Formatter};

/// A per-content usage counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Views,
    Shares,
}

impl Metric {
    /// Key prefix in the store, e.g. `views` in `views:<id>`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Views => "views",
            Metric::Shares => "shares",
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
