//! Automatic region names.
//!
//! A region entered without an explicit name is named after its call site, qualified by the
//! region it is entered in: `"foo() <worker.rs:42>"`. Two unnamed regions in the same parent
//! therefore only share a node when they are the same line of code.

use std::panic::Location;
use std::path::Path;

/// The file name component of a call site, without directories.
#[must_use]
pub fn file_name<'a>(location: &'a Location<'_>) -> &'a str {
    let file = location.file();
    Path::new(file)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file)
}

/// The name of an unnamed region entered at `location` inside the region `parent`.
#[must_use]
pub fn callsite_name(parent: &str, location: &Location<'_>) -> String {
    format!("{parent} <{}:{}>", file_name(location), location.line())
}

/// Strips the module path from a fully qualified function path and appends `()`.
#[doc(hidden)]
#[must_use]
pub fn function_region_name(path: &str) -> String {
    let path = path.strip_suffix("::{{closure}}").unwrap_or(path);
    let name = path.rsplit("::").next().unwrap_or(path);
    format!("{name}()")
}

/// Expands to the region name of the enclosing function, e.g. `"foo()"`.
#[macro_export]
macro_rules! function_region_name {
    () => {{
        fn __region_marker() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let path = __type_name_of(__region_marker);
        $crate::callsite::function_region_name(
            path.strip_suffix("::__region_marker").unwrap_or(path),
        )
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn here() -> &'static Location<'static> {
        Location::caller()
    }

    #[test]
    fn names_include_parent_file_and_line() {
        let location = here();
        let name = callsite_name("foo()", location);
        assert_eq!(name, format!("foo() <callsite.rs:{}>", location.line()));
    }

    #[test]
    fn distinct_lines_give_distinct_names() {
        let first = callsite_name("<main>", here());
        let second = callsite_name("<main>", here());
        assert_ne!(first, second);
    }

    #[test]
    fn function_names_drop_the_module_path() {
        assert_eq!(function_region_name("my_crate::worker::step"), "step()");
        assert_eq!(function_region_name("step"), "step()");
        assert_eq!(
            function_region_name("my_crate::worker::step::{{closure}}"),
            "step()"
        );
    }

    #[test]
    fn macro_names_the_enclosing_function() {
        fn process_batch() -> String {
            function_region_name!()
        }
        assert_eq!(process_batch(), "process_batch()");
    }
}
