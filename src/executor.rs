use crate::TbResult;
use futures::{
    future::{BoxFuture, FutureExt},
    task::{waker_ref, ArcWake, Context, Poll},
};
use futures_channel::oneshot;
use queues::{IsQueue, Queue};
use std::{
    cell::RefCell,
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
};

thread_local! {
    static READY_QUEUE: RefCell<Queue<Arc<Task>>> = RefCell::new(Queue::new());
}

pub(crate) fn schedule_task(task: Arc<Task>) {
    READY_QUEUE.with(|q| {
        q.borrow_mut().add(task).expect("error queueing task");
    });
}

fn next_task() -> Option<Arc<Task>> {
    READY_QUEUE.with(|q| q.borrow_mut().remove().ok())
}

/// Polls ready tasks until the queue is empty. Woken tasks re-enter the
/// queue, so this runs every task that can make progress at the current
/// simulation time.
pub(crate) fn run_once() {
    while let Some(task) = next_task() {
        process_task(task);
    }
}

/// Drops all queued tasks. Part of end-of-test teardown.
pub(crate) fn clear_ready_queue() {
    while let Some(task) = next_task() {
        task.cancel();
    }
}

fn process_task(task: Arc<Task>) {
    if *task.state.lock().unwrap() == TaskState::Cancelled {
        // dropped once all references disappear
        return;
    }

    let mut fut_slot = task.future.lock().unwrap();
    if let Some(mut fut) = fut_slot.take() {
        let waker = waker_ref(&task);
        let context = &mut Context::from_waker(&*waker);
        match fut.as_mut().poll(context) {
            Poll::Pending => {
                *fut_slot = Some(fut);
            }
            Poll::Ready(result) => {
                let tx = task.join_tx.lock().unwrap().take();
                // the join handle may have been dropped; that is fine
                if let Some(tx) = tx {
                    let _ = tx.send(result);
                }
            }
        }
    } else {
        panic!("scheduled a completed or uninitialized task");
    }
}

#[derive(PartialEq)]
enum TaskState {
    Pending,
    Cancelled,
}

/// A cooperatively scheduled unit of work (driver loop, monitor loop,
/// clock generator, sequence, test wrapper).
pub struct Task {
    future: Mutex<Option<BoxFuture<'static, TbResult>>>,
    state: Mutex<TaskState>,
    join_tx: Mutex<Option<oneshot::Sender<TbResult>>>,
}

impl Task {
    /// Spawns a future as a concurrently running task.
    pub fn fork(future: impl Future<Output = TbResult> + Send + 'static) -> JoinHandle {
        let (tx, rx) = oneshot::channel();
        let task = Arc::new(Task {
            future: Mutex::new(Some(future.boxed())),
            state: Mutex::new(TaskState::Pending),
            join_tx: Mutex::new(Some(tx)),
        });
        let handle = JoinHandle {
            task: task.clone(),
            join_rx: rx,
        };
        schedule_task(task);
        handle
    }

    /// Marks the task cancelled; the executor drops it instead of polling.
    pub fn cancel(&self) {
        *self.state.lock().unwrap() = TaskState::Cancelled;
    }
}

impl ArcWake for Task {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        schedule_task(arc_self.clone());
    }
}

pub struct JoinHandle {
    task: Arc<Task>,
    join_rx: oneshot::Receiver<TbResult>,
}

impl JoinHandle {
    pub fn cancel(self) {
        self.task.cancel();
    }
}

impl Future for JoinHandle {
    type Output = TbResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.join_rx.poll_unpin(cx) {
            Poll::Ready(result) => {
                Poll::Ready(result.expect("awaited task was cancelled"))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tb_obj::TbObj;
    use crate::value::Val;

    #[test]
    fn fork_runs_to_completion() {
        let done = TbObj::new(false);
        let d = done.clone();
        let _ = Task::fork(async move {
            *d.get_mut() = true;
            Ok(Val::None)
        });
        run_once();
        assert!(*done.get());
    }

    #[test]
    fn join_handle_returns_task_result() {
        let seen = TbObj::new(None);
        let s = seen.clone();
        let _ = Task::fork(async move {
            let inner = Task::fork(async { Ok(Val::String("inner".to_string())) });
            let result = inner.await;
            *s.get_mut() = Some(result.clone());
            result
        });
        run_once();
        assert_eq!(*seen.get(), Some(Ok(Val::String("inner".to_string()))));
    }

    #[test]
    fn cancelled_task_is_not_polled() {
        let ran = TbObj::new(false);
        let r = ran.clone();
        let handle = Task::fork(async move {
            *r.get_mut() = true;
            Ok(Val::None)
        });
        handle.cancel();
        run_once();
        assert!(!*ran.get());
    }
}
