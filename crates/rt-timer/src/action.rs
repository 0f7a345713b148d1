//! The work a timer dispatches on each due call.

/// A zero-argument operation invoked once per due call.
///
/// Implemented for every `FnMut() + Send` closure, so most callers never
/// implement it by hand. Types with their own state (a controller, a
/// sampler that prints) can implement it directly. An owner that must
/// outlive the timer is lent through a closure, `|| owner.step()`.
///
/// The timer holds the action for its whole lifetime and only ever invokes
/// it from the thread that polls the timer.
pub trait Action: Send {
    /// Run the action once.
    fn invoke(&mut self);
}

impl<F> Action for F
where
    F: FnMut() + Send,
{
    #[inline]
    fn invoke(&mut self) {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        calls: u32,
    }

    impl Counter {
        fn step(&mut self) {
            self.calls += 1;
        }
    }

    impl Action for Counter {
        fn invoke(&mut self) {
            self.step();
        }
    }

    fn invoke_twice(action: &mut impl Action) {
        action.invoke();
        action.invoke();
    }

    #[test]
    fn test_closure_action() {
        let mut calls = 0;
        let mut action = || calls += 1;
        invoke_twice(&mut action);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_owner_lent_through_closure() {
        let mut owner = Counter { calls: 0 };
        let mut action = || owner.step();
        invoke_twice(&mut action);
        assert_eq!(owner.calls, 2);
    }

    #[test]
    fn test_stateful_action() {
        let mut counter = Counter { calls: 0 };
        invoke_twice(&mut counter);
        assert_eq!(counter.calls, 2);
    }
}
