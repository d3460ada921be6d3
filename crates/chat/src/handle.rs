use std::fmt;

use once_cell::unsync::OnceCell;

/// A resource loaded on first use and owned by whoever holds the handle.
///
/// The loader runs until it succeeds once; after that the value is reused.
/// A failed load leaves the handle empty so a later call can try again.
pub struct ModelHandle<T, E> {
    cell: OnceCell<T>,
    loader: Box<dyn Fn() -> Result<T, E>>,
}

impl<T, E> ModelHandle<T, E> {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<T, E> + 'static,
    {
        Self {
            cell: OnceCell::new(),
            loader: Box::new(loader),
        }
    }

    pub fn get(&self) -> Result<&T, E> {
        self.cell.get_or_try_init(|| (self.loader)())
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T, E> fmt::Debug for ModelHandle<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
