use std::fmt;

#[derive(Debug, Default, Hash, PartialEq, Eq, Clone, Copy)]
pub enum QosReliability {
    #[default]
    Reliable,
    BestEffort,
}

impl fmt::Display for QosReliability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reliable => write!(f, "Reliable"),
            Self::BestEffort => write!(f, "Best Effort"),
        }
    }
}

/// History kind; the depth of `KeepLast` is the number of messages buffered
/// before the oldest ones are dropped.
#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum QosHistory {
    KeepLast(usize),
    KeepAll,
}

impl QosHistory {
    pub fn depth(&self) -> usize {
        match self {
            Self::KeepLast(depth) => *depth,
            Self::KeepAll => usize::MAX,
        }
    }
}

impl Default for QosHistory {
    fn default() -> Self {
        Self::KeepLast(10)
    }
}

impl fmt::Display for QosHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeepLast(depth) => write!(f, "Keep Last ({})", depth),
            Self::KeepAll => write!(f, "Keep All"),
        }
    }
}

#[derive(Debug, Default, Hash, PartialEq, Eq, Clone, Copy)]
pub enum QosDurability {
    TransientLocal,
    #[default]
    Volatile,
}

impl fmt::Display for QosDurability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransientLocal => write!(f, "Transient Local"),
            Self::Volatile => write!(f, "Volatile"),
        }
    }
}

#[derive(Debug, Default, Hash, PartialEq, Eq, Clone, Copy)]
pub struct QosProfile {
    pub reliability: QosReliability,
    pub durability: QosDurability,
    pub history: QosHistory,
}

impl QosProfile {
    /// Profile of the `/parameter_events` topic (`rmw_qos_profile_parameter_events`).
    pub fn parameter_events() -> Self {
        Self {
            reliability: QosReliability::Reliable,
            durability: QosDurability::Volatile,
            history: QosHistory::KeepLast(1000),
        }
    }

    pub fn with_depth(mut self, depth: usize) -> Self {
        self.history = QosHistory::KeepLast(depth);
        self
    }

    pub fn with_reliability(mut self, reliability: QosReliability) -> Self {
        self.reliability = reliability;
        self
    }

    pub fn with_durability(mut self, durability: QosDurability) -> Self {
        self.durability = durability;
        self
    }

    // This format comes from rmw_zenoh
    // <ReliabilityKind>:<DurabilityKind>:<HistoryKind>,<HistoryDepth>:<Deadline>:<Lifespan>:<Liveliness>
    // Deadline, lifespan and liveliness are always the defaults here.
    pub fn encode(&self) -> String {
        let default_qos = Self::default();

        let reliability = if self.reliability != default_qos.reliability {
            match self.reliability {
                QosReliability::Reliable => "1",
                QosReliability::BestEffort => "2",
            }
        } else {
            ""
        };

        let durability = if self.durability != default_qos.durability {
            match self.durability {
                QosDurability::TransientLocal => "1",
                QosDurability::Volatile => "2",
            }
        } else {
            ""
        };

        // Kind only if non-default, depth always
        let history = match self.history {
            QosHistory::KeepLast(depth) if self.history != default_qos.history => {
                format!("1,{}", depth)
            }
            QosHistory::KeepLast(depth) => format!(",{}", depth),
            QosHistory::KeepAll => "2,".to_string(),
        };

        format!("{}:{}:{}:,:,:,,", reliability, durability, history)
    }
}

impl fmt::Display for QosProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "QoS({}, {}, {})",
            self.reliability, self.durability, self.history
        )
    }
}
