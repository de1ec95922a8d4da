//! Network fault actions.
//!
//! Network faults go through the chaos tool's `netem` command, which
//! starts a traffic-control helper container against the victim's
//! network namespace. Flag names and their order are the external
//! contract with the tool's parser and are reproduced exactly:
//!
//! ```text
//! netem --duration 30s --tc-image gaiadocker/iproute2:3.3 delay --time 500ms
//! ```

use crate::chaos::command::{TimeSpan, TimeUnit};
use crate::constants::TC_HELPER_IMAGE;

// =============================================================================
// Network Action
// =============================================================================

/// Builder for a network fault. Terminates into a [`NetworkAction`] by
/// choosing the sub-command to run.
#[derive(Debug, Clone)]
pub struct NetworkActionBuilder {
    duration: TimeSpan,
    tc_image: String,
}

/// Starts describing a network fault.
///
/// Defaults: one minute duration, the stock traffic-control helper
/// image.
pub fn network_action() -> NetworkActionBuilder {
    NetworkActionBuilder {
        duration: TimeSpan::of(1, TimeUnit::Minutes),
        tc_image: TC_HELPER_IMAGE.to_string(),
    }
}

impl NetworkActionBuilder {
    /// How long the fault stays applied.
    pub fn lasting_for(mut self, value: u64, unit: TimeUnit) -> Self {
        self.duration = TimeSpan::of(value, unit);
        self
    }

    /// Overrides the traffic-control helper image.
    pub fn with_tc_image(mut self, image: impl Into<String>) -> Self {
        self.tc_image = image.into();
        self
    }

    /// Fixes the sub-command and produces the finished action.
    pub fn execute_sub_command(self, sub: impl Into<NetworkSubCommand>) -> NetworkAction {
        NetworkAction {
            duration: self.duration,
            tc_image: self.tc_image,
            sub: sub.into(),
        }
    }
}

/// A fully described network fault.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkAction {
    duration: TimeSpan,
    tc_image: String,
    sub: NetworkSubCommand,
}

impl NetworkAction {
    pub(crate) fn render_tokens(&self) -> Vec<String> {
        let mut tokens = vec![
            "netem".to_string(),
            "--duration".to_string(),
            self.duration.to_string(),
            "--tc-image".to_string(),
            self.tc_image.clone(),
        ];
        tokens.extend(self.sub.render_tokens());
        tokens
    }
}

// =============================================================================
// Network Sub-Commands
// =============================================================================

/// Parameters of the specific network disturbance.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkSubCommand {
    Delay(DelayPackets),
    Loss(LosePackets),
    Rate(LimitBandwidth),
    Corrupt(CorruptPackets),
    Duplicate(DuplicatePackets),
}

impl NetworkSubCommand {
    fn render_tokens(&self) -> Vec<String> {
        match self {
            Self::Delay(delay) => {
                let mut tokens = vec![
                    "delay".to_string(),
                    "--time".to_string(),
                    delay.time.to_string(),
                ];
                if let Some(jitter) = delay.jitter {
                    tokens.push("--jitter".to_string());
                    tokens.push(jitter.to_string());
                }
                tokens
            }
            Self::Loss(loss) => {
                let mut tokens = vec![
                    "loss".to_string(),
                    "--percent".to_string(),
                    loss.percent.to_string(),
                ];
                if let Some(correlation) = loss.correlation {
                    tokens.push("--correlation".to_string());
                    tokens.push(correlation.to_string());
                }
                tokens
            }
            Self::Rate(rate) => vec![
                "rate".to_string(),
                "--rate".to_string(),
                format!("{}{}", rate.rate, rate.unit.suffix()),
            ],
            Self::Corrupt(corrupt) => vec![
                "corrupt".to_string(),
                "--percent".to_string(),
                corrupt.percent.to_string(),
            ],
            Self::Duplicate(duplicate) => vec![
                "duplicate".to_string(),
                "--percent".to_string(),
                duplicate.percent.to_string(),
            ],
        }
    }
}

/// Delays outgoing packets by a fixed time, with optional jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPackets {
    time: TimeSpan,
    jitter: Option<TimeSpan>,
}

/// Starts a delay sub-command (default 100ms).
pub fn delay_outgoing_packets() -> DelayPackets {
    DelayPackets {
        time: TimeSpan::of(100, TimeUnit::Millis),
        jitter: None,
    }
}

impl DelayPackets {
    /// Sets the delay applied to each packet.
    pub fn delay_for(mut self, value: u64, unit: TimeUnit) -> Self {
        self.time = TimeSpan::of(value, unit);
        self
    }

    /// Adds random variation around the delay.
    pub fn with_jitter(mut self, value: u64, unit: TimeUnit) -> Self {
        self.jitter = Some(TimeSpan::of(value, unit));
        self
    }
}

/// Drops a percentage of outgoing packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LosePackets {
    percent: u8,
    correlation: Option<u8>,
}

/// Starts a packet-loss sub-command (default 10 percent).
pub fn lose_packets() -> LosePackets {
    LosePackets {
        percent: 10,
        correlation: None,
    }
}

impl LosePackets {
    /// Percentage of packets to drop.
    pub fn with_percent(mut self, percent: u8) -> Self {
        self.percent = percent;
        self
    }

    /// Correlation with the previous packet's fate.
    pub fn with_correlation(mut self, correlation: u8) -> Self {
        self.correlation = Some(correlation);
        self
    }
}

/// Bandwidth unit for rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateUnit {
    Bit,
    Kbit,
    Mbit,
    Gbit,
}

impl RateUnit {
    fn suffix(&self) -> &'static str {
        match self {
            Self::Bit => "bit",
            Self::Kbit => "kbit",
            Self::Mbit => "mbit",
            Self::Gbit => "gbit",
        }
    }
}

/// Limits outgoing bandwidth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitBandwidth {
    rate: u64,
    unit: RateUnit,
}

/// Starts a rate-limit sub-command (default 100kbit).
pub fn limit_bandwidth() -> LimitBandwidth {
    LimitBandwidth {
        rate: 100,
        unit: RateUnit::Kbit,
    }
}

impl LimitBandwidth {
    /// Sets the bandwidth ceiling.
    pub fn rate_of(mut self, rate: u64, unit: RateUnit) -> Self {
        self.rate = rate;
        self.unit = unit;
        self
    }
}

/// Corrupts a percentage of outgoing packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorruptPackets {
    percent: u8,
}

/// Starts a corruption sub-command (default 10 percent).
pub fn corrupt_packets() -> CorruptPackets {
    CorruptPackets { percent: 10 }
}

impl CorruptPackets {
    /// Percentage of packets to corrupt.
    pub fn with_percent(mut self, percent: u8) -> Self {
        self.percent = percent;
        self
    }
}

/// Duplicates a percentage of outgoing packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicatePackets {
    percent: u8,
}

/// Starts a duplication sub-command (default 10 percent).
pub fn duplicate_packets() -> DuplicatePackets {
    DuplicatePackets { percent: 10 }
}

impl DuplicatePackets {
    /// Percentage of packets to duplicate.
    pub fn with_percent(mut self, percent: u8) -> Self {
        self.percent = percent;
        self
    }
}

impl From<DelayPackets> for NetworkSubCommand {
    fn from(value: DelayPackets) -> Self {
        Self::Delay(value)
    }
}

impl From<LosePackets> for NetworkSubCommand {
    fn from(value: LosePackets) -> Self {
        Self::Loss(value)
    }
}

impl From<LimitBandwidth> for NetworkSubCommand {
    fn from(value: LimitBandwidth) -> Self {
        Self::Rate(value)
    }
}

impl From<CorruptPackets> for NetworkSubCommand {
    fn from(value: CorruptPackets) -> Self {
        Self::Corrupt(value)
    }
}

impl From<DuplicatePackets> for NetworkSubCommand {
    fn from(value: DuplicatePackets) -> Self {
        Self::Duplicate(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn netem_tokens_have_fixed_order() {
        let action = network_action()
            .lasting_for(30, TimeUnit::Seconds)
            .execute_sub_command(delay_outgoing_packets().delay_for(500, TimeUnit::Millis));
        assert_eq!(
            action.render_tokens().join(" "),
            "netem --duration 30s --tc-image gaiadocker/iproute2:3.3 delay --time 500ms"
        );
    }

    #[test]
    fn delay_jitter_is_optional() {
        let with_jitter = delay_outgoing_packets()
            .delay_for(200, TimeUnit::Millis)
            .with_jitter(50, TimeUnit::Millis);
        let tokens = NetworkSubCommand::from(with_jitter).render_tokens();
        assert_eq!(tokens, ["delay", "--time", "200ms", "--jitter", "50ms"]);
    }

    #[test]
    fn loss_renders_percent_and_correlation() {
        let loss = lose_packets().with_percent(25).with_correlation(75);
        let tokens = NetworkSubCommand::from(loss).render_tokens();
        assert_eq!(tokens, ["loss", "--percent", "25", "--correlation", "75"]);
    }

    #[test]
    fn rate_renders_unit_suffix() {
        let rate = limit_bandwidth().rate_of(1, RateUnit::Mbit);
        let tokens = NetworkSubCommand::from(rate).render_tokens();
        assert_eq!(tokens, ["rate", "--rate", "1mbit"]);
    }
}
