//! Explicit release of graphics resources.

/// A resource that holds something the graphics backend must be told to free.
///
/// `dispose` is called exactly once per value, by the [`ResourcePool`] that
/// owns it.
pub trait Disposable {
    fn dispose(&mut self);
}

/// Owns every resource of one kind created for a mount.
///
/// Resources are addressed by the index `push` returns. `release_all` drains
/// the pool, so running it again (or dropping the pool afterwards) releases
/// nothing twice.
#[derive(Debug)]
pub struct ResourcePool<T: Disposable> {
    items: Vec<T>,
}

impl<T: Disposable> ResourcePool<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn push(&mut self, item: T) -> usize {
        self.items.push(item);
        self.items.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Disposes every held resource in creation order and returns how many.
    pub fn release_all(&mut self) -> usize {
        let count = self.items.len();
        for mut item in self.items.drain(..) {
            item.dispose();
        }
        count
    }
}

impl<T: Disposable> Default for ResourcePool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Disposable> Drop for ResourcePool<T> {
    fn drop(&mut self) {
        let leaked = self.release_all();
        if leaked > 0 {
            log::debug!("released {leaked} resources on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    struct Counted(Rc<Cell<usize>>);

    impl Disposable for Counted {
        fn dispose(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn release_all_is_idempotent() {
        let released = Rc::new(Cell::new(0));
        let mut pool = ResourcePool::new();
        for _ in 0..3 {
            pool.push(Counted(released.clone()));
        }
        assert_eq!(pool.release_all(), 3);
        assert_eq!(pool.release_all(), 0);
        drop(pool);
        assert_eq!(released.get(), 3);
    }

    #[test]
    fn drop_releases_leftovers() {
        let released = Rc::new(Cell::new(0));
        {
            let mut pool = ResourcePool::new();
            let index = pool.push(Counted(released.clone()));
            assert_eq!(index, 0);
            assert!(pool.get(0).is_some());
        }
        assert_eq!(released.get(), 1);
    }
}
