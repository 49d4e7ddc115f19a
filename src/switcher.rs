//! Profile switching state.
//!
//! The decoder itself is stateless. A host that loads profiles in the
//! background uses a [`ProfileSwitcher`] to skip loads of the profile it
//! already has and to drop results that arrive after a newer request.

/// Handle for one in-flight profile load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    source: String,
}

impl LoadTicket {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What became of a finished load.
#[derive(Debug, PartialEq)]
pub enum Completion<T, E> {
    /// The load was the latest request and succeeded; its source is now current.
    Installed(T),
    /// The load was the latest request but failed; the previous profile stays current.
    Failed(E),
    /// A newer request superseded this load. Discard the result.
    Stale,
}

/// Tracks the installed profile and the latest requested one.
#[derive(Debug, Default)]
pub struct ProfileSwitcher {
    current: Option<String>,
    pending: Option<LoadTicket>,
    generation: u64,
}

impl ProfileSwitcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source of the installed profile.
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Source of the load the switcher is waiting on.
    pub fn pending(&self) -> Option<&str> {
        self.pending.as_ref().map(|t| t.source.as_str())
    }

    /// Ask for `source` to become current.
    ///
    /// Returns `None` when no load is needed: `source` is already being
    /// loaded, or is installed and nothing else is pending. Otherwise the
    /// returned ticket supersedes every earlier one.
    pub fn request(&mut self, source: &str) -> Option<LoadTicket> {
        if self.pending().is_some_and(|p| p == source) {
            return None;
        }
        if self.current() == Some(source) {
            // Switching back cancels whatever was in flight.
            self.pending = None;
            return None;
        }

        self.generation += 1;
        let ticket = LoadTicket {
            generation: self.generation,
            source: source.to_string(),
        };
        self.pending = Some(ticket.clone());
        Some(ticket)
    }

    pub fn is_latest(&self, ticket: &LoadTicket) -> bool {
        self.pending.as_ref() == Some(ticket)
    }

    /// Settle a load started with `ticket`.
    pub fn complete<T, E>(&mut self, ticket: &LoadTicket, result: Result<T, E>) -> Completion<T, E> {
        if !self.is_latest(ticket) {
            return Completion::Stale;
        }
        self.pending = None;
        match result {
            Ok(value) => {
                self.current = Some(ticket.source.clone());
                Completion::Installed(value)
            }
            Err(e) => Completion::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_request_loads() {
        let mut sw = ProfileSwitcher::new();
        let ticket = sw.request("v1.0/American Clean").expect("ticket");
        assert_eq!(ticket.source(), "v1.0/American Clean");
        assert_eq!(sw.pending(), Some("v1.0/American Clean"));
        assert_eq!(sw.current(), None);

        assert_eq!(sw.complete(&ticket, Ok::<_, ()>(1)), Completion::Installed(1));
        assert_eq!(sw.current(), Some("v1.0/American Clean"));
        assert_eq!(sw.pending(), None);
    }

    #[test]
    fn redundant_requests_are_skipped() {
        let mut sw = ProfileSwitcher::new();
        let ticket = sw.request("toan_zoan").unwrap();
        // Already in flight.
        assert!(sw.request("toan_zoan").is_none());
        sw.complete(&ticket, Ok::<_, ()>(()));
        // Already installed.
        assert!(sw.request("toan_zoan").is_none());
    }

    #[test]
    fn newer_request_makes_older_stale() {
        let mut sw = ProfileSwitcher::new();
        let a = sw.request("a").unwrap();
        let b = sw.request("b").unwrap();
        assert!(b.generation() > a.generation());

        // b finishes first; a arrives late and must not overwrite it.
        assert_eq!(sw.complete(&b, Ok::<_, ()>("b")), Completion::Installed("b"));
        assert_eq!(sw.complete(&a, Ok::<_, ()>("a")), Completion::Stale);
        assert_eq!(sw.current(), Some("b"));
    }

    #[test]
    fn stale_even_when_older_finishes_first() {
        let mut sw = ProfileSwitcher::new();
        let a = sw.request("a").unwrap();
        let b = sw.request("b").unwrap();
        assert_eq!(sw.complete(&a, Ok::<_, ()>("a")), Completion::Stale);
        assert_eq!(sw.current(), None);
        assert_eq!(sw.complete(&b, Ok::<_, ()>("b")), Completion::Installed("b"));
    }

    #[test]
    fn failure_keeps_previous_profile() {
        let mut sw = ProfileSwitcher::new();
        let a = sw.request("a").unwrap();
        sw.complete(&a, Ok::<_, &str>(()));

        let b = sw.request("b").unwrap();
        assert_eq!(sw.complete(&b, Err::<(), _>("corrupt")), Completion::Failed("corrupt"));
        assert_eq!(sw.current(), Some("a"));

        // The failed source can be retried.
        assert!(sw.request("b").is_some());
    }

    #[test]
    fn switching_back_cancels_in_flight_load() {
        let mut sw = ProfileSwitcher::new();
        let a = sw.request("a").unwrap();
        sw.complete(&a, Ok::<_, ()>(()));

        let b = sw.request("b").unwrap();
        assert!(sw.request("a").is_none());
        assert_eq!(sw.pending(), None);
        assert_eq!(sw.complete(&b, Ok::<_, ()>(())), Completion::Stale);
        assert_eq!(sw.current(), Some("a"));
    }
}
