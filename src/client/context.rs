use client::Target;


/// Lifecycle of the single request made over a connection
///
/// States are ordered, and context never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RequestState {
    /// Connection is established but nothing is written yet
    NotSent,
    /// Request is handed to the connection for writing
    Sent,
    /// Full response has been received and passed to the handler
    ResponseReceived,
}

/// Per-connection state of the request execution
///
/// Created by `Execution::initialize_context` when connection is
/// established and owned by that connection until it's finalized.
#[derive(Debug)]
pub struct Context {
    target: Target,
    state: RequestState,
    finalized: bool,
}

impl Context {
    pub fn new(target: Target) -> Context {
        Context {
            target: target,
            state: RequestState::NotSent,
            finalized: false,
        }
    }
    /// The url this connection was made for
    pub fn target(&self) -> &Target {
        &self.target
    }
    pub fn state(&self) -> RequestState {
        self.state
    }
    pub fn is_sent(&self) -> bool {
        self.state >= RequestState::Sent
    }
    pub fn is_response_received(&self) -> bool {
        self.state == RequestState::ResponseReceived
    }
    /// Returns true when connection is already torn down
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
    /// Move to the next lifecycle state
    ///
    /// # Panics
    ///
    /// When the state would move backwards.
    pub fn advance(&mut self, state: RequestState) {
        assert!(state >= self.state,
            "request state can't go from {:?} back to {:?}",
            self.state, state);
        self.state = state;
    }
    /// Mark context as finalized, returns `false` if it already was
    pub fn finalize(&mut self) -> bool {
        !::std::mem::replace(&mut self.finalized, true)
    }
}

#[cfg(test)]
mod test {
    use client::Target;
    use super::{Context, RequestState};

    fn context() -> Context {
        Context::new(Target::new("example.com", 80, "/"))
    }

    #[test]
    fn monotonic() {
        let mut ctx = context();
        assert_eq!(ctx.state(), RequestState::NotSent);
        assert!(!ctx.is_sent());
        ctx.advance(RequestState::Sent);
        assert!(ctx.is_sent());
        ctx.advance(RequestState::ResponseReceived);
        assert!(ctx.is_sent());
        assert!(ctx.is_response_received());
    }

    #[test]
    #[should_panic(expected="back to")]
    fn no_back_transitions() {
        let mut ctx = context();
        ctx.advance(RequestState::ResponseReceived);
        ctx.advance(RequestState::Sent);
    }

    #[test]
    fn finalize_once() {
        let mut ctx = context();
        assert!(ctx.finalize());
        assert!(!ctx.finalize());
        assert!(ctx.is_finalized());
    }
}
