use std::cell::RefCell;

/// Holds the strategy currently in effect for some part of compilation.
///
/// Readers call [`ActiveCell::get`] on every use, so a value installed with
/// [`ActiveCell::swap`] is seen immediately. The returned guard puts the
/// previous value back when dropped, on normal return, `?` and unwinding alike.
#[derive(Debug, Default)]
pub struct ActiveCell<T> {
    current: RefCell<T>,
}

impl<T: Clone> ActiveCell<T> {
    pub fn new(value: T) -> Self {
        Self { current: RefCell::new(value) }
    }

    pub fn get(&self) -> T {
        self.current.borrow().clone()
    }

    pub fn swap(&self, value: T) -> ActiveGuard<'_, T> {
        let previous = self.current.replace(value);
        ActiveGuard { cell: self, previous: Some(previous) }
    }
}

#[must_use = "the previous value is restored as soon as the guard is dropped"]
pub struct ActiveGuard<'a, T> {
    cell: &'a ActiveCell<T>,
    previous: Option<T>,
}

impl<T> Drop for ActiveGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.cell.current.replace(previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_swaps_unwind_in_order() {
        let cell = ActiveCell::new(1);
        {
            let _outer = cell.swap(2);
            assert_eq!(cell.get(), 2);
            {
                let _inner = cell.swap(3);
                assert_eq!(cell.get(), 3);
            }
            assert_eq!(cell.get(), 2);
        }
        assert_eq!(cell.get(), 1);
    }

    #[test]
    fn restores_on_early_error_return() {
        fn failing(cell: &ActiveCell<&'static str>) -> Result<(), String> {
            let _g = cell.swap("where");
            let _n: i32 = "not a number".parse().map_err(|_| "boom".to_string())?;
            Ok(())
        }

        let cell = ActiveCell::new("select");
        assert!(failing(&cell).is_err());
        assert_eq!(cell.get(), "select");
    }

    #[test]
    fn restores_on_unwind() {
        let cell = ActiveCell::new(0);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _g = cell.swap(9);
            panic!("compilation aborted");
        }));
        assert!(result.is_err());
        assert_eq!(cell.get(), 0);
    }
}
