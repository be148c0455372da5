use std::iter::FusedIterator;
use std::panic::Location;

use crate::profiler::{DropAction, RegionGuard, RegionProfiler};

/// An iterator whose pulls are timed as a region.
///
/// Each call to `next` enters the region, pulls one element from the inner iterator and exits the
/// region as soon as the element is produced. The consumer's loop body therefore runs outside the
/// region. The pull that finds the inner iterator exhausted is canceled: it is neither counted
/// nor timed. Nothing is left open between pulls, so abandoning the iterator early needs no
/// cleanup, and a pull that panics is canceled while unwinding.
///
/// Created by [`RegionProfiler::iter_wrap`] and [`iter_proxy`](crate::iter_proxy).
pub struct ProfiledIter<'a, I> {
    profiler: Option<&'a RegionProfiler>,
    inner: I,
    name: String,
    as_global: bool,
    exhausted: bool,
}

impl<'a, I: Iterator> ProfiledIter<'a, I> {
    pub(crate) fn new(profiler: &'a RegionProfiler, inner: I, name: String, as_global: bool) -> Self {
        Self {
            profiler: Some(profiler),
            inner,
            name,
            as_global,
            exhausted: false,
        }
    }

    /// Wraps `inner` without timing anything.
    pub fn passthrough(inner: I) -> Self {
        Self {
            profiler: None,
            inner,
            name: String::new(),
            as_global: false,
            exhausted: false,
        }
    }

    /// The region name the pulls are recorded under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_recording(&self) -> bool {
        self.profiler.is_some()
    }

    fn enter(&self) -> RegionGuard<'a> {
        let Some(profiler) = self.profiler else {
            return RegionGuard::inert();
        };
        match profiler.enter(Some(&self.name), Location::caller(), self.as_global) {
            // Canceled unless the pull produces an element.
            Some(node) => RegionGuard::new(profiler, node, DropAction::Cancel),
            None => RegionGuard::inert(),
        }
    }
}

impl<I: Iterator> Iterator for ProfiledIter<'_, I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if self.exhausted {
            return None;
        }
        let guard = self.enter();
        let item = self.inner.next();
        if item.is_some() {
            guard.exit();
        } else {
            self.exhausted = true;
            guard.cancel();
        }
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.exhausted {
            (0, Some(0))
        } else {
            self.inner.size_hint()
        }
    }
}

impl<I: Iterator> FusedIterator for ProfiledIter<'_, I> {}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::clock::TickClock;
    use crate::listener::test_support::RecordingListener;

    fn tick_profiler() -> RegionProfiler {
        RegionProfiler::with_clock(Arc::new(TickClock::new()))
    }

    #[test]
    fn each_produced_element_is_one_call() {
        let profiler = tick_profiler();
        let collected: Vec<_> = profiler.iter_wrap(1..=3, Some("iter"), false).collect();
        assert_eq!(collected, vec![1, 2, 3]);

        profiler.with_tree(|tree| {
            let iter = tree.find_path(&["iter"]).unwrap();
            assert_eq!(iter.call_count(), 3);
            assert_eq!(iter.total(), Duration::from_secs(3));
            assert!(!iter.is_active());
        });
    }

    #[test]
    fn loop_body_regions_are_siblings_of_the_iterator_region() {
        let profiler = tick_profiler();
        let foo = || {
            let _foo = profiler.region("foo()");
            for _ in profiler.iter_wrap(0..3, Some("iter"), false) {
                drop(profiler.region("b"));
                drop(profiler.region("b"));
            }
        };
        foo();
        foo();

        profiler.with_tree(|tree| {
            assert_eq!(tree.find_path(&["foo()"]).unwrap().call_count(), 2);
            assert_eq!(tree.find_path(&["foo()", "iter"]).unwrap().call_count(), 6);
            assert_eq!(tree.find_path(&["foo()", "b"]).unwrap().call_count(), 12);
            assert!(tree.find_path(&["foo()", "iter", "b"]).is_none());
        });
    }

    #[test]
    fn breaking_early_counts_only_completed_pulls() {
        let profiler = tick_profiler();
        let recorder = RecordingListener::default();
        profiler.add_listener(Box::new(recorder.clone()));
        for _ in profiler.iter_wrap(vec![1, 2, 3], Some("iter"), false) {
            break;
        }

        profiler.with_tree(|tree| {
            assert_eq!(tree.find_path(&["iter"]).unwrap().call_count(), 1);
        });
        assert_eq!(recorder.events(), vec!["enter iter", "exit iter"]);
    }

    #[test]
    fn exhaustion_is_canceled() {
        let profiler = tick_profiler();
        let recorder = RecordingListener::default();
        profiler.add_listener(Box::new(recorder.clone()));
        let mut iter = profiler.iter_wrap(Vec::<u8>::new(), Some("empty"), false);
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);

        assert_eq!(recorder.events(), vec!["enter empty", "cancel empty"]);
        profiler.with_tree(|tree| {
            let empty = tree.find_path(&["empty"]).unwrap();
            assert_eq!(empty.call_count(), 0);
            assert_eq!(empty.total(), Duration::ZERO);
        });
    }

    #[test]
    fn panicking_pull_is_canceled() {
        let profiler = tick_profiler();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let source = (0..3).map(|i| if i == 1 { panic!("bad element") } else { i });
            for _ in profiler.iter_wrap(source, Some("iter"), false) {}
        }));
        assert!(result.is_err());

        assert_eq!(profiler.current_region(), crate::NodeId::ROOT);
        profiler.with_tree(|tree| {
            assert_eq!(tree.find_path(&["iter"]).unwrap().call_count(), 1);
        });
    }

    #[test]
    fn global_iterator_region_hangs_off_the_root() {
        let profiler = tick_profiler();
        {
            let _a = profiler.region("a");
            for _ in profiler.iter_wrap([1, 2], Some("pull"), true) {}
        }
        {
            let _x = profiler.region("x");
            for _ in profiler.iter_wrap([3], Some("pull"), true) {}
        }
        profiler.with_tree(|tree| {
            let pull = tree.global("pull").unwrap();
            assert_eq!(tree[pull].call_count(), 3);
            assert!(tree.find_path(&["a", "pull"]).is_none());
        });
    }

    #[test]
    fn unnamed_iterator_is_named_after_the_call_site() {
        let profiler = tick_profiler();
        let iter = profiler.iter_wrap([1], None, false);
        assert!(iter.name().starts_with("<main> <iter.rs:"));
    }

    #[test]
    fn passthrough_records_nothing() {
        let mut iter = ProfiledIter::passthrough([1, 2].into_iter());
        assert!(!iter.is_recording());
        assert_eq!(iter.size_hint(), (2, Some(2)));
        assert_eq!(iter.by_ref().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(iter.size_hint(), (0, Some(0)));
    }
}
