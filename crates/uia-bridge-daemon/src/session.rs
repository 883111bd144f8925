use std::sync::Arc;

use uia_bridge_core::orientation::PollPolicy;
use uia_bridge_core::Clock;
use uia_bridge_core::ClassMap;
use uia_bridge_core::ElementRegistry;
use uia_bridge_core::Platform;
use uia_bridge_core::RealSleeper;
use uia_bridge_core::Sleeper;
use uia_bridge_core::SystemClock;

use crate::config::BridgeConfig;

/// Everything a command can touch: the device, the element handles issued
/// so far and the time ports used by bounded polls.
///
/// The registry lives as long as the session; handles are only dropped by
/// `clearElementCache`.
pub struct BridgeSession<P: Platform> {
    platform: P,
    registry: ElementRegistry<P::Element>,
    class_map: &'static ClassMap,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    poll_policy: PollPolicy,
    unicode_keyboard: bool,
}

impl<P: Platform> BridgeSession<P> {
    pub fn new(platform: P, config: &BridgeConfig) -> Self {
        Self {
            platform,
            registry: ElementRegistry::new(),
            class_map: ClassMap::standard(),
            clock: Arc::new(SystemClock),
            sleeper: Arc::new(RealSleeper),
            poll_policy: PollPolicy::default(),
            unicode_keyboard: config.unicode_keyboard(),
        }
    }

    pub fn with_time(mut self, clock: Arc<dyn Clock>, sleeper: Arc<dyn Sleeper>) -> Self {
        self.clock = clock;
        self.sleeper = sleeper;
        self
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn registry(&self) -> &ElementRegistry<P::Element> {
        &self.registry
    }

    pub fn class_map(&self) -> &'static ClassMap {
        self.class_map
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn sleeper(&self) -> &dyn Sleeper {
        self.sleeper.as_ref()
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.poll_policy
    }

    pub fn unicode_keyboard(&self) -> bool {
        self.unicode_keyboard
    }
}
