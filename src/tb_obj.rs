use std::{
    cell::{Ref, RefCell, RefMut},
    rc::Rc,
    sync::{Arc, Mutex, MutexGuard},
};

// TbObj lets tasks mutably share test objects (scoreboard, sequencer state,
// event logs) across suspension points. The simulation is single threaded,
// so Rc/RefCell is sufficient even though the executor demands Send futures.
pub struct TbObj<T>(Rc<RefCell<T>>);

impl<T> TbObj<T> {
    pub fn new(data: T) -> TbObj<T> {
        TbObj(Rc::new(RefCell::new(data)))
    }
    pub fn get(&self) -> Ref<T> {
        (*self.0).borrow()
    }
    pub fn get_mut(&self) -> RefMut<T> {
        (*self.0).borrow_mut()
    }
    pub fn with_mut<R>(&self, f: impl FnOnce(RefMut<T>) -> R) -> R {
        f(self.get_mut())
    }
}

impl<T> Clone for TbObj<T> {
    fn clone(&self) -> Self {
        TbObj(self.0.clone())
    }
}

// Rc is neither Send nor Sync, but tasks never leave the simulation thread.
unsafe impl<T> Send for TbObj<T> {}
unsafe impl<T> Sync for TbObj<T> {}

// Mutex-backed variant for slots that are also read from outside the
// executor (e.g. the per-test result slot the run harness collects).
pub struct TbObjSafe<T>(Arc<Mutex<T>>);

impl<T> TbObjSafe<T> {
    pub fn new(data: T) -> TbObjSafe<T> {
        TbObjSafe(Arc::new(Mutex::new(data)))
    }
    pub fn get(&self) -> MutexGuard<T> {
        (*self.0).try_lock().unwrap()
    }
    pub fn with_mut<R>(&self, f: impl FnOnce(MutexGuard<T>) -> R) -> R {
        f(self.get())
    }
}

impl<T> Clone for TbObjSafe<T> {
    fn clone(&self) -> Self {
        TbObjSafe(self.0.clone())
    }
}
