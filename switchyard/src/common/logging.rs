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

use std::sync::atomic::{AtomicBool, Ordering};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use crate::common::SwitchyardConfig;

static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Installs the global tracing subscriber, writing to a daily rolling file in
/// `paths.log_directory`.
///
/// The filter comes from `RUST_LOG` when set, otherwise from `tracing.level`. Only the
/// first call installs anything; later calls, and calls made after another subscriber
/// was installed, return `None`. Keep the returned guard alive for as long as logs
/// should be flushed.
pub fn init_logging(config: &SwitchyardConfig) -> Option<WorkerGuard> {
    if LOGGING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return None;
    }

    let directory = &config.paths.log_directory;
    if let Err(err) = std::fs::create_dir_all(directory) {
        eprintln!("switchyard: cannot create log directory {directory}: {err}");
        return None;
    }
    let appender = match RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("switchyard")
        .filename_suffix("log")
        .build(directory)
    {
        Ok(appender) => appender,
        Err(err) => {
            eprintln!("switchyard: cannot open log file in {directory}: {err}");
            return None;
        }
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.tracing.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_thread_names(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .ok()
        .map(|()| guard)
}
