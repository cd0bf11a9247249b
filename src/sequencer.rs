//! Rendezvous point between sequences and the driver. Capacity one, strict
//! one-item-in-flight: `put` returns only after the driver has signalled
//! `item_done` for that item.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

use crate::item::Item;
use crate::tb_obj::TbObj;

struct State {
    // offered item, not yet claimed by the driver
    slot: Option<Item>,
    // claimed by the driver, awaiting item_done
    in_flight: bool,
    // item_done has fired; consumed by the owning put
    finished: bool,
    // a put currently owns the slot
    active: bool,
    put_waker: Option<Waker>,
    driver_waker: Option<Waker>,
    // puts queued behind the active one, FIFO
    wait_q: VecDeque<Waker>,
}

#[derive(Clone)]
pub struct Sequencer(TbObj<State>);

impl Sequencer {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Sequencer(TbObj::new(State {
            slot: None,
            in_flight: false,
            finished: false,
            active: false,
            put_waker: None,
            driver_waker: None,
            wait_q: VecDeque::new(),
        }))
    }

    /// Hands one item to the driver. Suspends until the driver is ready and
    /// has completed the item (`item_done`).
    pub fn put(&self, item: Item) -> Put {
        Put {
            seqr: self.clone(),
            item: Some(item),
            phase: PutPhase::Idle,
        }
    }

    /// Called by the driver. Suspends until a sequence offers an item.
    pub fn get_next(&self) -> GetNext {
        GetNext { seqr: self.clone() }
    }

    /// Called by the driver after applying an item; unblocks the matching
    /// `put`. Calling this with no outstanding item is a broken handshake.
    pub fn item_done(&self) {
        self.0.with_mut(|mut s| {
            if !s.in_flight {
                panic!("item_done() called with no outstanding item");
            }
            s.in_flight = false;
            s.finished = true;
            if let Some(waker) = s.put_waker.take() {
                waker.wake();
            }
        });
    }
}

enum PutPhase {
    Idle,
    Queued,
    Offered,
}

pub struct Put {
    seqr: Sequencer,
    item: Option<Item>,
    phase: PutPhase,
}

impl Future for Put {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        let mut state = this.seqr.0.get_mut();
        match this.phase {
            PutPhase::Idle | PutPhase::Queued => {
                if state.active {
                    // another put owns the slot; wait in line
                    state.wait_q.push_back(cx.waker().clone());
                    this.phase = PutPhase::Queued;
                    Poll::Pending
                } else {
                    state.active = true;
                    state.slot = this.item.take();
                    state.put_waker = Some(cx.waker().clone());
                    if let Some(waker) = state.driver_waker.take() {
                        waker.wake();
                    }
                    this.phase = PutPhase::Offered;
                    Poll::Pending
                }
            }
            PutPhase::Offered => {
                if state.finished {
                    state.finished = false;
                    state.active = false;
                    if let Some(next) = state.wait_q.pop_front() {
                        next.wake();
                    }
                    Poll::Ready(())
                } else {
                    state.put_waker = Some(cx.waker().clone());
                    Poll::Pending
                }
            }
        }
    }
}

pub struct GetNext {
    seqr: Sequencer,
}

impl Future for GetNext {
    type Output = Item;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.seqr.0.with_mut(|mut s| {
            if s.in_flight {
                panic!("get_next() while an item is still outstanding");
            }
            if let Some(item) = s.slot.take() {
                s.in_flight = true;
                Poll::Ready(item)
            } else {
                s.driver_waker = Some(cx.waker().clone());
                Poll::Pending
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{self, Task};
    use crate::value::Val;

    #[test]
    fn rendezvous_is_fifo_with_one_item_in_flight() {
        let seqr = Sequencer::new();
        let log: TbObj<Vec<String>> = TbObj::new(Vec::new());

        let s = seqr.clone();
        let l = log.clone();
        let _ = Task::fork(async move {
            for i in 0..3 {
                s.put(Item::stimulus(i % 2 == 0)).await;
                l.get_mut().push(format!("put{} returned", i));
            }
            Ok(Val::None)
        });

        let s = seqr.clone();
        let l = log.clone();
        let _ = Task::fork(async move {
            for i in 0..3 {
                let item = s.get_next().await;
                l.get_mut().push(format!("got{} rst={}", i, item.reset as u8));
                s.item_done();
                l.get_mut().push(format!("done{}", i));
            }
            Ok(Val::None)
        });

        executor::run_once();
        // put N may only return after done N, and put N+1 may only be
        // offered after put N returned
        assert_eq!(
            *log.get(),
            vec![
                "got0 rst=1",
                "done0",
                "put0 returned",
                "got1 rst=0",
                "done1",
                "put1 returned",
                "got2 rst=1",
                "done2",
                "put2 returned",
            ]
        );
    }

    #[test]
    fn driver_blocks_until_an_item_is_offered() {
        let seqr = Sequencer::new();
        let log: TbObj<Vec<&'static str>> = TbObj::new(Vec::new());

        let s = seqr.clone();
        let l = log.clone();
        let _ = Task::fork(async move {
            let _ = s.get_next().await;
            l.get_mut().push("driver woke");
            s.item_done();
            Ok(Val::None)
        });
        executor::run_once();
        assert!(log.get().is_empty());

        let s = seqr.clone();
        let _ = Task::fork(async move {
            s.put(Item::stimulus(false)).await;
            Ok(Val::None)
        });
        executor::run_once();
        assert_eq!(*log.get(), vec!["driver woke"]);
    }

    #[test]
    #[should_panic(expected = "no outstanding item")]
    fn item_done_without_item_is_fatal() {
        let seqr = Sequencer::new();
        seqr.item_done();
    }
}
