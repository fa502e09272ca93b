//! App Store environment.

/// Environment a signed payload was issued for.
///
/// See <https://developer.apple.com/documentation/storekit/appstore/environment>.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Environment {
    /// App Store sandbox.
    Sandbox,
    /// Live App Store.
    Production,
    /// StoreKit testing in Xcode. Payloads are locally signed and never verified.
    Xcode,
}

impl Environment {
    /// All environments, in declaration order.
    pub const ALL: [Environment; 3] = [Self::Sandbox, Self::Production, Self::Xcode];

    /// Whether signed payloads in this environment bypass chain and signature verification.
    pub fn skips_verification(self) -> bool {
        match self {
            Self::Xcode => true,
            Self::Sandbox | Self::Production => false,
        }
    }

    /// The name Apple uses for this environment.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sandbox => "Sandbox",
            Self::Production => "Production",
            Self::Xcode => "Xcode",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown environment name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown environment {0:?}, expected Sandbox, Production or Xcode")]
pub struct UnknownEnvironment(pub String);

impl std::str::FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|env| env.as_str() == s)
            .ok_or_else(|| UnknownEnvironment(s.to_string()))
    }
}
