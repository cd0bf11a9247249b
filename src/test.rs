//! Test records, run outcomes, and the objection mechanism that brackets a
//! test's active window.

use futures::future::BoxFuture;
use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use crate::device::Dut;
use crate::sim;
use crate::TbResult;

pub struct Test {
    pub name: String,
    pub generator: fn(Dut) -> BoxFuture<'static, TbResult>,
}

impl Test {
    pub fn new(name: &str, generator: fn(Dut) -> BoxFuture<'static, TbResult>) -> Self {
        Test {
            name: name.to_string(),
            generator,
        }
    }
}

/// Ordered collection of tests; executed strictly in push order.
pub struct Tests(Vec<Test>);

impl Tests {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Tests(Vec::new())
    }
    pub fn push(&mut self, test: Test) {
        self.0.push(test);
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl IntoIterator for Tests {
    type Item = Test;
    type IntoIter = std::vec::IntoIter<Test>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Result of one executed test.
#[derive(Debug, Clone)]
pub struct TestOutcome {
    pub name: String,
    pub result: TbResult,
    pub wall_secs: f64,
    pub sim_time_ns: u64,
}

impl TestOutcome {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

struct ObjState {
    count: u32,
    wakers: Vec<Waker>,
}

thread_local! {
    static OBJECTIONS: RefCell<ObjState> = RefCell::new(ObjState {
        count: 0,
        wakers: Vec::new(),
    });
}

/// Keeps the run alive while held. The harness waits for every raised
/// objection to be dropped before tearing the test down.
pub struct Objection {
    name: String,
    dropped: bool,
}

impl Objection {
    pub fn raise(name: &str) -> Objection {
        OBJECTIONS.with(|o| o.borrow_mut().count += 1);
        sim::log(&format!("objection raised: {}", name));
        Objection {
            name: name.to_string(),
            dropped: false,
        }
    }

    pub fn drop_objection(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.dropped {
            return;
        }
        self.dropped = true;
        sim::log(&format!("objection dropped: {}", self.name));
        OBJECTIONS.with(|o| {
            let mut state = o.borrow_mut();
            state.count = state.count.saturating_sub(1);
            if state.count == 0 {
                for waker in state.wakers.drain(..) {
                    waker.wake();
                }
            }
        });
    }
}

impl Drop for Objection {
    fn drop(&mut self) {
        if !self.dropped {
            // a sequence failure can unwind past the explicit drop
            sim::log(&format!(
                "WARNING: objection '{}' released without an explicit drop",
                self.name
            ));
            self.release();
        }
    }
}

pub(crate) fn reset() {
    OBJECTIONS.with(|o| {
        let mut state = o.borrow_mut();
        state.count = 0;
        state.wakers.clear();
    });
}

/// Resolves once no objection is outstanding.
pub(crate) fn all_dropped() -> AllDropped {
    AllDropped
}

pub(crate) struct AllDropped;

impl Future for AllDropped {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        OBJECTIONS.with(|o| {
            let mut state = o.borrow_mut();
            if state.count == 0 {
                Poll::Ready(())
            } else {
                state.wakers.push(cx.waker().clone());
                Poll::Pending
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objection_count_gates_all_dropped() {
        reset();
        let a = Objection::raise("a");
        let b = Objection::raise("b");
        assert_eq!(OBJECTIONS.with(|o| o.borrow().count), 2);
        a.drop_objection();
        assert_eq!(OBJECTIONS.with(|o| o.borrow().count), 1);
        b.drop_objection();
        assert_eq!(OBJECTIONS.with(|o| o.borrow().count), 0);
    }

    #[test]
    fn leaked_objection_releases_on_drop() {
        reset();
        {
            let _guard = Objection::raise("leaky");
        }
        assert_eq!(OBJECTIONS.with(|o| o.borrow().count), 0);
    }
}
