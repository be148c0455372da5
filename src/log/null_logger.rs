/*!

This module provides a "logger" that does not output anything anywhere but satisfies the public API.

*/

use crate::log::LogConfiguration;

impl LogConfiguration {
    /// Applies the global level of this `LogConfiguration` to whatever logger is installed.
    pub(in crate::log) fn set_config(&mut self) {
        log::set_max_level(self.global_log_level);
    }
}
