use intmap::IntMap;
use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use crate::executor;
use crate::sim;

thread_local! {
    // key is the absolute fire time in steps; IntMap specializes on u64
    // keys, TIME_SET provides ordered next-event lookup
    static TIMER_MAP: RefCell<IntMap<VecDeque<Waker>>> = RefCell::new(IntMap::new());
    static TIME_SET: RefCell<BTreeSet<u64>> = RefCell::new(BTreeSet::new());
    static EDGE_WAITERS: RefCell<VecDeque<TrigShared>> = RefCell::new(VecDeque::new());
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum EdgeKind {
    Rising,
    Falling,
}

struct TrigShared {
    waker: Waker,
    edge_kind: EdgeKind,
}

#[derive(Clone, Copy)]
enum TrigKind {
    Edge(EdgeKind),
    Timer(u64),
}

/// Leaf future suspending a task until a clock edge or a timer expiry.
#[derive(Clone, Copy)]
pub struct Trigger {
    kind: TrigKind,
    awaited: bool,
}

impl Trigger {
    pub fn timer(time: u64, unit: &str) -> Self {
        Trigger {
            kind: TrigKind::Timer(sim::steps(time, unit)),
            awaited: false,
        }
    }
    pub fn timer_steps(steps: u64) -> Self {
        Trigger {
            kind: TrigKind::Timer(steps),
            awaited: false,
        }
    }
    pub fn rising_edge() -> Self {
        Trigger {
            kind: TrigKind::Edge(EdgeKind::Rising),
            awaited: false,
        }
    }
    pub fn falling_edge() -> Self {
        Trigger {
            kind: TrigKind::Edge(EdgeKind::Falling),
            awaited: false,
        }
    }
}

impl Future for Trigger {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // A trigger is awaited once; the second poll means the waker fired.
        if self.awaited {
            return Poll::Ready(());
        }
        self.awaited = true;
        match self.kind {
            TrigKind::Timer(steps) => {
                let abs_time = sim::now_steps() + steps;
                let waker = cx.waker().clone();
                TIMER_MAP.with(|m| {
                    let mut map = m.borrow_mut();
                    if let Some(waiters) = map.get_mut(abs_time) {
                        waiters.push_back(waker);
                    } else {
                        let mut waiters = VecDeque::new();
                        waiters.push_back(waker);
                        map.insert(abs_time, waiters);
                        TIME_SET.with(|s| s.borrow_mut().insert(abs_time));
                    }
                });
            }
            TrigKind::Edge(edge_kind) => {
                EDGE_WAITERS.with(|w| {
                    w.borrow_mut().push_back(TrigShared {
                        waker: cx.waker().clone(),
                        edge_kind,
                    })
                });
            }
        }
        Poll::Pending
    }
}

/// Wakes every task parked on the given clock edge; waiters for the other
/// edge kind stay parked.
pub(crate) fn react_edge(edge: EdgeKind) {
    let woken = EDGE_WAITERS.with(|w| {
        let mut waiters = w.borrow_mut();
        let mut keep = VecDeque::new();
        let mut wake = Vec::new();
        for shared in waiters.drain(..) {
            if shared.edge_kind == edge {
                wake.push(shared.waker);
            } else {
                keep.push_back(shared);
            }
        }
        *waiters = keep;
        wake
    });
    if !woken.is_empty() {
        for waker in woken {
            waker.wake();
        }
        executor::run_once();
    }
}

/// Wakes every task whose timer expires at time `t` (absolute steps).
pub(crate) fn react_time(t: u64) {
    TIME_SET.with(|s| s.borrow_mut().remove(&t));
    let waiters = TIMER_MAP.with(|m| m.borrow_mut().remove(t));
    if let Some(waiters) = waiters {
        for waker in waiters {
            waker.wake();
        }
        executor::run_once();
    } else {
        panic!("did not expect timer event at t={}", t);
    }
}

/// Earliest pending timer expiry, if any.
pub(crate) fn next_timer_step() -> Option<u64> {
    TIME_SET.with(|s| s.borrow().iter().next().copied())
}

/// Drops all parked waiters. Part of end-of-test teardown.
pub(crate) fn cancel_all() {
    EDGE_WAITERS.with(|w| w.borrow_mut().clear());
    TIMER_MAP.with(|m| m.borrow_mut().clear());
    TIME_SET.with(|s| s.borrow_mut().clear());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Task;
    use crate::tb_obj::TbObj;
    use crate::value::Val;

    #[test]
    fn timers_fire_in_time_order() {
        let order: TbObj<Vec<&'static str>> = TbObj::new(Vec::new());
        let t0 = sim::now_steps();
        let o = order.clone();
        let _ = Task::fork(async move {
            Trigger::timer(30, "ns").await;
            o.get_mut().push("late");
            Ok(Val::None)
        });
        let o = order.clone();
        let _ = Task::fork(async move {
            Trigger::timer(10, "ns").await;
            o.get_mut().push("early");
            Ok(Val::None)
        });
        assert!(sim::run_sim_loop(None));
        assert_eq!(*order.get(), vec!["early", "late"]);
        assert_eq!(sim::now_steps() - t0, sim::steps(30, "ns"));
    }

    #[test]
    fn coincident_timers_share_one_event() {
        let hits = TbObj::new(0u32);
        for _ in 0..3 {
            let h = hits.clone();
            let _ = Task::fork(async move {
                Trigger::timer(5, "ns").await;
                *h.get_mut() += 1;
                Ok(Val::None)
            });
        }
        assert!(sim::run_sim_loop(None));
        assert_eq!(*hits.get(), 3);
    }

    #[test]
    fn edge_waiters_filter_on_kind() {
        let seen: TbObj<Vec<&'static str>> = TbObj::new(Vec::new());
        let s = seen.clone();
        let _ = Task::fork(async move {
            Trigger::rising_edge().await;
            s.get_mut().push("rising");
            Ok(Val::None)
        });
        let s = seen.clone();
        let _ = Task::fork(async move {
            Trigger::falling_edge().await;
            s.get_mut().push("falling");
            Ok(Val::None)
        });
        executor::run_once();

        react_edge(EdgeKind::Falling);
        assert_eq!(*seen.get(), vec!["falling"]);
        react_edge(EdgeKind::Rising);
        assert_eq!(*seen.get(), vec!["falling", "rising"]);
    }
}
