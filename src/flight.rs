use std::cell::Cell;

/// Holds a single-flight flag raised for as long as it lives.
///
/// Dropping the guard lowers the flag, so a failed or abandoned request can
/// never leave the flag stuck.
pub(crate) struct InFlight<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> InFlight<'a> {
    /// Raises `flag`, or returns `None` if it was already raised.
    pub(crate) fn begin(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self { flag })
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_begin_is_refused_until_drop() {
        let flag = Cell::new(false);
        let guard = InFlight::begin(&flag).unwrap();
        assert!(flag.get());
        assert!(InFlight::begin(&flag).is_none());
        drop(guard);
        assert!(!flag.get());
        assert!(InFlight::begin(&flag).is_some());
    }
}
