//! Service descriptors and bind options

use std::fmt;

/// Identifies a service component by package and class.
///
/// Displayed in the short `package/.Class` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentName {
    package: String,
    class: String,
}

impl ComponentName {
    pub fn new(package: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            class: class.into(),
        }
    }

    /// The mock location service shipped with this application
    pub fn mock_location_service() -> Self {
        Self::new("com.lilstiffy.mockgps", "service.MockLocationService")
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn class(&self) -> &str {
        &self.class
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/.{}", self.package, self.class)
    }
}

/// Options for a bind request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindFlags {
    /// Create the service if it is not running yet
    pub auto_create: bool,
}

impl BindFlags {
    pub const AUTO_CREATE: BindFlags = BindFlags { auto_create: true };
}
