/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! Test support for crates built on Switchyard.
//!
//! Provides the [`switchyard_test`](prelude::switchyard_test) attribute for async tests and
//! [`init_test_tracing`], which routes `tracing` output from every test in the process to a
//! single log file under `logs/`.

use std::sync::Once;

use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Commonly used test items.
pub mod prelude {
    pub use switchyard_test_macro::switchyard_test;

    pub use crate::init_test_tracing;
}

#[doc(hidden)]
pub mod __private {
    pub use parking_lot;
    pub use tokio;
    pub use tracing;
}

static INIT: Once = Once::new();

/// Installs the global test subscriber exactly once per test binary.
///
/// Output goes to `logs/switchyard_tests.txt` relative to the crate under test. The filter
/// defaults to `switchyard=trace` and can be overridden with `RUST_LOG`. Failing to create
/// the log directory or to install the subscriber is not fatal; tests simply run without
/// captured logs.
pub fn init_test_tracing() {
    INIT.call_once(|| {
        if std::fs::create_dir_all("logs").is_err() {
            return;
        }

        let file_appender = RollingFileAppender::new(Rotation::NEVER, "logs", "switchyard_tests.txt");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        // Keep the writer alive until process exit so buffered lines are flushed.
        Box::leak(Box::new(guard));

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("switchyard=trace"));

        let subscriber = FmtSubscriber::builder()
            .with_span_events(FmtSpan::NONE)
            .with_max_level(Level::TRACE)
            .compact()
            .with_line_number(true)
            .without_time()
            .with_target(true)
            .with_env_filter(filter)
            .with_writer(non_blocking)
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
