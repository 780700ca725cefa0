use std::fmt;

/// A named service that the registry can construct on demand.
///
/// `create` receives the name the instance is registered under; implementors
/// usually keep it in a [`ServiceName`] field and return it from `service_name`.
pub trait Service: Send + Sync + 'static {
    fn create(name: &str) -> Self
    where
        Self: Sized;

    fn service_name(&self) -> &str;
}

/// Registration name embedded by services.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
