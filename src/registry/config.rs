//! Registry configuration

/// Policy applied when a session falls behind its outbound event ring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Disconnect the lagging session to protect delivery to the rest
    Disconnect,
    /// Skip the missed events and continue from the current position
    DropOldest,
}

/// Registry configuration options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Capacity of the outbound event ring each session consumes from
    ///
    /// Zero is treated as 1 when the registry is created.
    pub event_buffer: usize,

    /// What happens when a session falls behind by more than `event_buffer`
    pub overflow_policy: OverflowPolicy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            event_buffer: 256,
            overflow_policy: OverflowPolicy::Disconnect,
        }
    }
}

impl RegistryConfig {
    /// Set the outbound event ring capacity (floored at 1)
    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity.max(1);
        self
    }

    /// Set the overflow policy
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }
}
