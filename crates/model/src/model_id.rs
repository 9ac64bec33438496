use std::convert::Infallible;
use std::fmt::{self, Display};
use std::str::FromStr;

/// A model identifier in the `provider:model` form, e.g. `openai:gpt-4o`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelId {
    /// The provider part, `"unknown"` if the identifier has no prefix.
    pub provider: String,
    /// The model name understood by the provider.
    pub name: String,
}

impl ModelId {
    /// Parses a model identifier. Only the first colon separates the
    /// provider, so `a:b:c` has provider `a` and name `b:c`.
    pub fn parse(s: &str) -> Self {
        match s.split_once(':') {
            Some((provider, name)) => Self {
                provider: provider.to_owned(),
                name: name.to_owned(),
            },
            None => Self {
                provider: "unknown".to_owned(),
                name: s.to_owned(),
            },
        }
    }

    /// Returns `true` if the identifier carries no provider prefix.
    #[inline]
    pub fn is_bare(&self) -> bool {
        self.provider == "unknown"
    }
}

impl FromStr for ModelId {
    type Err = Infallible;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.name)
    }
}
