//! What an operation does when a phase's resource is missing

/// Policy for a 404 response, fixed when the operation is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPolicy {
    /// The resource is expected to appear: re-issue the same call.
    ///
    /// `max_attempts` bounds how many times a phase may issue its call
    /// before the operation gives up; `None` waits forever.
    Retry { max_attempts: Option<u32> },
    /// Treat the first 404 as final
    #[default]
    Fail,
}

impl MissingPolicy {
    pub fn retry_forever() -> Self {
        MissingPolicy::Retry { max_attempts: None }
    }

    /// Retry until the call has been issued `attempts` times in total
    ///
    /// Values below 1 are raised to 1: the first call always happens.
    pub fn retry_up_to(attempts: u32) -> Self {
        MissingPolicy::Retry {
            max_attempts: Some(attempts.max(1)),
        }
    }

    /// Decide what follows a 404, given how many 404s this phase has seen
    /// so far (including this one)
    pub(crate) fn on_missing(&self, misses: u32) -> MissVerdict {
        match self {
            MissingPolicy::Fail => MissVerdict::Absent,
            MissingPolicy::Retry { max_attempts: None } => MissVerdict::Retry,
            MissingPolicy::Retry {
                max_attempts: Some(max),
            } => {
                if misses >= *max {
                    MissVerdict::GaveUp { attempts: misses }
                } else {
                    MissVerdict::Retry
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MissVerdict {
    Retry,
    Absent,
    GaveUp { attempts: u32 },
}
