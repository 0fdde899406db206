//! The polling contract shared by every operation

/// Result of a single poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness<T> {
    /// Still waiting on the remote side
    NotReady,
    /// Finished with a value
    Ready(T),
}

impl<T> Readiness<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready(_))
    }

    /// Take the value out, if ready
    pub fn ready(self) -> Option<T> {
        match self {
            Readiness::Ready(value) => Some(value),
            Readiness::NotReady => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Readiness<U> {
        match self {
            Readiness::Ready(value) => Readiness::Ready(f(value)),
            Readiness::NotReady => Readiness::NotReady,
        }
    }
}

/// Something the scheduler can drive to completion by repeated polling
///
/// Implementations must never block in `poll`. While not ready, polling
/// may only advance internal state (for example re-issue a remote call
/// whose previous attempt came back empty). Once `poll` has returned
/// `Ready`, every later call returns an equal value and issues no work.
pub trait Pollable {
    type Output;

    fn poll(&mut self) -> Readiness<Self::Output>;
}

impl<P: Pollable + ?Sized> Pollable for Box<P> {
    type Output = P::Output;

    fn poll(&mut self) -> Readiness<Self::Output> {
        (**self).poll()
    }
}
