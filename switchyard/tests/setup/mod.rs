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

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use switchyard::prelude::*;

/// Service used by most routing tests.
pub const ECHO_SERVICE: &str = "{urn:switchyard:test}Echo";
/// Interface implemented by the echo endpoints.
pub const ECHO_INTERFACE: &str = "{urn:switchyard:test}EchoPort";

/// A provider endpoint of the echo service owned by `component`.
pub fn echo_endpoint(component: &str, endpoint: &str) -> EndpointDescriptor {
    EndpointDescriptor::new(component, ECHO_SERVICE, endpoint).with_interface(ECHO_INTERFACE)
}

/// Replies with the request content on `InOut`; completes anything else.
pub fn echo() -> impl ComponentProcessor {
    processor_fn(|exchange: MessageExchange| async move {
        if exchange.pattern() == ExchangePattern::InOut {
            let request = exchange.in_message().unwrap_or_default();
            exchange.set_out_message(request)?;
        } else {
            exchange.done()?;
        }
        Ok::<_, anyhow::Error>(())
    })
}

/// Records the ids of the component it is connected for, then completes the exchange.
#[derive(Clone, Default)]
pub struct Recorder {
    pub seen: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn count(&self) -> usize {
        self.seen.lock().len()
    }
}

#[async_trait]
impl ComponentProcessor for Recorder {
    async fn process(&self, exchange: MessageExchange) -> anyhow::Result<()> {
        self.seen.lock().push(exchange.id().to_string());
        exchange.done()?;
        Ok(())
    }
}

/// In-memory configuration with short timeouts and file logging disabled.
pub fn test_config() -> SwitchyardConfig {
    let mut config = SwitchyardConfig::default();
    config.behavior.enable_tracing = false;
    config.timeouts.sync_send_timeout_ms = 2_000;
    config.timeouts.shutdown_drain_timeout_ms = 200;
    config
}

/// Polls `condition` until it holds or one second passes.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
