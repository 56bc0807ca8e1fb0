//! Request generation counters.
//!
//! Every outgoing request is stamped with a token. When its response comes
//! back it is only applied if no newer request of the same kind has been
//! issued in the meantime; otherwise it is dropped.

use log::debug;
use std::fmt;

/// Operation kinds that are sequenced independently of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Import,
    Visualizations,
    Compile,
    Recommend,
    Export,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestKind::Import => "import",
            RequestKind::Visualizations => "visualizations",
            RequestKind::Compile => "compile",
            RequestKind::Recommend => "recommend",
            RequestKind::Export => "export",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    pub kind: RequestKind,
    pub generation: u64,
}

/// Outcome of handing a response back to its coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion<T> {
    Applied(T),
    /// A newer request of the same kind was issued; this response was ignored.
    Discarded,
}

impl<T> Completion<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Completion::Applied(value) => Some(value),
            Completion::Discarded => None,
        }
    }

    pub fn is_discarded(&self) -> bool {
        matches!(self, Completion::Discarded)
    }
}

#[derive(Debug, Clone)]
pub struct RequestSequencer {
    kind: RequestKind,
    issued: u64,
    settled: u64,
}

impl RequestSequencer {
    pub fn new(kind: RequestKind) -> Self {
        Self {
            kind,
            issued: 0,
            settled: 0,
        }
    }

    pub fn issue(&mut self) -> RequestToken {
        self.issued += 1;
        RequestToken {
            kind: self.kind,
            generation: self.issued,
        }
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        token.kind == self.kind && token.generation == self.issued
    }

    /// Marks the response for `token` as received. Returns `false` when the
    /// token is stale and the response must be dropped.
    pub fn settle(&mut self, token: RequestToken) -> bool {
        if !self.is_current(token) {
            debug!(
                "Discarding stale {} response (generation {}, latest {})",
                token.kind, token.generation, self.issued
            );
            return false;
        }
        self.settled = token.generation;
        true
    }

    /// True while the most recently issued request has not come back.
    pub fn is_pending(&self) -> bool {
        self.settled < self.issued
    }

    /// Makes every in-flight request stale without issuing a new one.
    pub fn invalidate(&mut self) {
        self.issued += 1;
        self.settled = self.issued;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_token_settles() {
        let mut seq = RequestSequencer::new(RequestKind::Compile);
        let first = seq.issue();
        let second = seq.issue();
        assert!(seq.is_pending());
        assert!(!seq.settle(first));
        assert!(seq.is_pending());
        assert!(seq.settle(second));
        assert!(!seq.is_pending());
    }

    #[test]
    fn invalidate_drops_in_flight_requests() {
        let mut seq = RequestSequencer::new(RequestKind::Import);
        let token = seq.issue();
        seq.invalidate();
        assert!(!seq.is_pending());
        assert!(!seq.settle(token));
    }

    #[test]
    fn tokens_of_other_kinds_never_match() {
        let mut compile = RequestSequencer::new(RequestKind::Compile);
        let mut recommend = RequestSequencer::new(RequestKind::Recommend);
        let token = recommend.issue();
        compile.issue();
        assert!(!compile.settle(token));
    }
}
