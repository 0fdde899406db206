//! Terminal value of an operation

/// How an operation ended
///
/// Everything except `Value` is a failure marker; the CLI renders those as
/// placeholders instead of aborting the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// Every phase resolved
    Value(T),
    /// The resource does not exist and the policy said not to wait for it,
    /// or the caller had no key to look it up with
    Absent,
    /// The resource kept coming back missing until the retry budget ran out
    GaveUp { attempts: u32 },
    /// A hard failure: transport, server or decode error
    Failed(String),
}

impl<T> Outcome<T> {
    pub fn into_value(self) -> Option<T> {
        match self {
            Outcome::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Value(value) => Outcome::Value(f(value)),
            Outcome::Absent => Outcome::Absent,
            Outcome::GaveUp { attempts } => Outcome::GaveUp { attempts },
            Outcome::Failed(message) => Outcome::Failed(message),
        }
    }
}
