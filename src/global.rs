//! The process-wide profiler.
//!
//! [`install`] creates one [`RegionProfiler`] for the whole process, and the free functions and
//! macros of this module record into it. Before `install`, and on threads other than the one that
//! installed it, they record nothing and cost one atomic load.
//!
//! ```rust,no_run
//! use region_profiler::{func_region, global, region, ProfilerConfig};
//!
//! fn load() -> Vec<u32> {
//!     let _region = func_region!();
//!     (0..100).collect()
//! }
//!
//! global::install(&ProfilerConfig::default());
//! let data = load();
//! for value in global::iter_proxy(&data, Some("pull"), false) {
//!     let _step = region!("step");
//!     let _ = value * 2;
//! }
//! global::finalize().unwrap();
//! ```

use std::sync::OnceLock;

use log::{error, warn};

use crate::config::{ProfilerConfig, ReportOptions};
use crate::error::ProfilerError;
use crate::iter::ProfiledIter;
use crate::profiler::{RegionGuard, RegionProfiler};

struct Installed {
    profiler: RegionProfiler,
    report: ReportOptions,
}

static INSTALLED: OnceLock<Installed> = OnceLock::new();

/// Creates the process-wide profiler. The calling thread becomes its owner.
///
/// Only the first call has an effect. Later calls log a warning and return the existing
/// instance, whose configuration stays in force.
pub fn install(config: &ProfilerConfig) -> &'static RegionProfiler {
    let mut created = false;
    let installed = INSTALLED.get_or_init(|| {
        created = true;
        Installed {
            profiler: RegionProfiler::from_config(config),
            report: config.report.clone(),
        }
    });
    if !created {
        warn!("region profiler is already installed; keeping the existing instance");
    }
    &installed.profiler
}

/// The process-wide profiler, if installed.
#[must_use]
pub fn installed() -> Option<&'static RegionProfiler> {
    INSTALLED.get().map(|installed| &installed.profiler)
}

/// Finalizes the process-wide profiler and writes the configured report. A report that cannot
/// be written is logged.
///
/// # Errors
///
/// [`ProfilerError::AlreadyFinalized`] on a second call, or an error if nothing is installed.
pub fn finalize() -> Result<(), ProfilerError> {
    let Some(installed) = INSTALLED.get() else {
        return Err("no region profiler is installed".into());
    };
    installed.profiler.finalize()?;

    let written = installed
        .report
        .build_reporter()
        .and_then(|mut reporter| installed.profiler.report(reporter.as_mut()));
    if let Err(e) = written {
        error!("could not write the profile report: {e}");
    }
    Ok(())
}

/// Enters the region `name` of the process-wide profiler.
#[track_caller]
pub fn region(name: &str) -> RegionGuard<'static> {
    enter_region(Some(name), false)
}

/// Enters the global region `name` of the process-wide profiler.
#[track_caller]
pub fn global_region(name: &str) -> RegionGuard<'static> {
    enter_region(Some(name), true)
}

/// Enters a region of the process-wide profiler named after the call site.
#[track_caller]
pub fn auto_region() -> RegionGuard<'static> {
    enter_region(None, false)
}

#[track_caller]
pub fn enter_region(name: Option<&str>, as_global: bool) -> RegionGuard<'static> {
    match installed() {
        Some(profiler) => profiler.enter_region(name, as_global),
        None => RegionGuard::inert(),
    }
}

/// Times each pull of `iterable` in the process-wide profiler. Without a profiler the iterator
/// is passed through untouched.
#[track_caller]
pub fn iter_proxy<I: IntoIterator>(
    iterable: I,
    name: Option<&str>,
    as_global: bool,
) -> ProfiledIter<'static, I::IntoIter> {
    match installed() {
        Some(profiler) => profiler.iter_wrap(iterable, name, as_global),
        None => ProfiledIter::passthrough(iterable.into_iter()),
    }
}

/// Enters a region of the process-wide profiler and evaluates to its guard.
///
/// - `region!()`: named after the call site
/// - `region!("name")`
/// - `region!("name", global)`: a global region
#[macro_export]
macro_rules! region {
    () => {
        $crate::global::enter_region(::std::option::Option::None, false)
    };
    ($name:expr, global) => {
        $crate::global::enter_region(::std::option::Option::Some($name), true)
    };
    ($name:expr) => {
        $crate::global::enter_region(::std::option::Option::Some($name), false)
    };
}

/// Enters a region of the process-wide profiler named after the enclosing function, e.g.
/// `"load()"`. `func_region!(global)` enters it as a global region.
#[macro_export]
macro_rules! func_region {
    () => {
        $crate::global::enter_region(
            ::std::option::Option::Some($crate::function_region_name!().as_str()),
            false,
        )
    };
    (global) => {
        $crate::global::enter_region(
            ::std::option::Option::Some($crate::function_region_name!().as_str()),
            true,
        )
    };
}
