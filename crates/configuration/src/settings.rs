use core_types::StrategyId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::ConfigError;

/// The root configuration structure for one running strategy instance.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub instance: InstanceConfig,
    #[serde(default)]
    pub risk: RiskLimits,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Which parameter block in `strategies` the engine runs.
    pub strategy: StrategyId,
    #[serde(default)]
    pub strategies: Strategies,
}

/// Identity and sizing of the traded instrument.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceConfig {
    pub symbol: String,
    pub account: String,
    /// Connection the symbol is resolved on.
    pub connection: String,
    /// Connection the account lives on. Defaults to `connection`.
    #[serde(default)]
    pub account_connection: Option<String>,
    /// Contracts per entry order.
    pub quantity: Decimal,
    /// Minimum price increment of the instrument.
    pub tick_size: Decimal,
}

impl InstanceConfig {
    pub fn account_connection(&self) -> &str {
        self.account_connection.as_deref().unwrap_or(&self.connection)
    }
}

/// Limits that suppress new entries. None of them ever closes a position.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RiskLimits {
    /// Maximum confirmed trades per run.
    #[serde(default)]
    pub max_trades: Option<u32>,
    /// Stop entering once gross P&L reaches this value.
    #[serde(default)]
    pub max_profit: Option<Decimal>,
    /// Stop entering once gross P&L falls to minus this value. Given as a magnitude.
    #[serde(default)]
    pub max_loss: Option<Decimal>,
    /// Only admit an entry while no position is open on the instrument.
    /// Unset means the strategy's default, see `Config::risk_limits`.
    #[serde(default)]
    pub require_flat: Option<bool>,
}

impl RiskLimits {
    pub fn requires_flat(&self) -> bool {
        self.require_flat.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    /// When set, logs are also written to a daily rolling file in this directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            directory: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Contains the parameter sets for all available strategies.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Strategies {
    #[serde(default)]
    pub box_range: BoxRangeParams,
    #[serde(default)]
    pub range_scalp: RangeScalpParams,
    #[serde(default)]
    pub price_surge: SurgeParams,
    #[serde(default)]
    pub weighted_surge: SurgeParams,
    #[serde(default)]
    pub sma_cross: SmaCrossParams,
}

/// Parameters for the inside-range fade with a range-derived bracket.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BoxRangeParams {
    /// Completed bars in the full range.
    #[serde(default = "default_box_lookback")]
    pub lookback: usize,
    /// Completed bars in the half range.
    #[serde(default = "default_half_lookback")]
    pub half_lookback: usize,
    /// Most recent completed bars left out of both ranges.
    #[serde(default = "default_box_settle")]
    pub settle: usize,
    /// Trade off the half range instead of the full range.
    #[serde(default)]
    pub half_range: bool,
    /// Keep extremes after their bars leave the lookback.
    #[serde(default = "default_true")]
    pub retain_extremes: bool,
    /// Shift of the entry and bracket away from the range edge.
    #[serde(default)]
    pub offset_ticks: u32,
    /// Enter with stop orders beyond the range instead of limits inside it.
    #[serde(default)]
    pub stop_orders: bool,
    /// Bar updates to observe before the first signal.
    #[serde(default)]
    pub warmup_updates: u64,
}

impl Default for BoxRangeParams {
    fn default() -> Self {
        Self {
            lookback: default_box_lookback(),
            half_lookback: default_half_lookback(),
            settle: default_box_settle(),
            half_range: false,
            retain_extremes: true,
            offset_ticks: 0,
            stop_orders: false,
            warmup_updates: 0,
        }
    }
}

/// Parameters for the range scalp with colour-permitted stop entries.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RangeScalpParams {
    #[serde(default = "default_box_lookback")]
    pub lookback: usize,
    #[serde(default)]
    pub settle: usize,
    #[serde(default = "default_true")]
    pub retain_extremes: bool,
    /// Distance beyond the range edge for the stop trigger.
    #[serde(default = "default_trigger_offset_ticks")]
    pub trigger_offset_ticks: u32,
    #[serde(default = "default_scalp_take_profit")]
    pub take_profit_ticks: u32,
    #[serde(default = "default_scalp_stop_loss")]
    pub stop_loss_ticks: u32,
}

impl Default for RangeScalpParams {
    fn default() -> Self {
        Self {
            lookback: default_box_lookback(),
            settle: 0,
            retain_extremes: true,
            trigger_offset_ticks: default_trigger_offset_ticks(),
            take_profit_ticks: default_scalp_take_profit(),
            stop_loss_ticks: default_scalp_stop_loss(),
        }
    }
}

/// Parameters shared by the body-size and weighted-price surge strategies.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SurgeParams {
    #[serde(default = "default_box_lookback")]
    pub lookback: usize,
    #[serde(default = "default_multiplier")]
    pub multiplier: Decimal,
    #[serde(default = "default_surge_take_profit")]
    pub take_profit_ticks: u32,
    #[serde(default = "default_surge_stop_loss")]
    pub stop_loss_ticks: u32,
}

impl Default for SurgeParams {
    fn default() -> Self {
        Self {
            lookback: default_box_lookback(),
            multiplier: default_multiplier(),
            take_profit_ticks: default_surge_take_profit(),
            stop_loss_ticks: default_surge_stop_loss(),
        }
    }
}

/// Parameters for the moving-average spread breakout.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SmaCrossParams {
    #[serde(default = "default_fast_period")]
    pub fast_period: usize,
    #[serde(default = "default_slow_period")]
    pub slow_period: usize,
    #[serde(default = "default_spread_multiplier")]
    pub spread_multiplier: Decimal,
    /// First bar offset of the reference spread average.
    #[serde(default = "default_spread_offset")]
    pub spread_offset: usize,
    /// Number of spreads in the reference average.
    #[serde(default = "default_spread_lookback")]
    pub spread_lookback: usize,
}

impl Default for SmaCrossParams {
    fn default() -> Self {
        Self {
            fast_period: default_fast_period(),
            slow_period: default_slow_period(),
            spread_multiplier: default_spread_multiplier(),
            spread_offset: default_spread_offset(),
            spread_lookback: default_spread_lookback(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_box_lookback() -> usize {
    10
}
fn default_half_lookback() -> usize {
    5
}
fn default_box_settle() -> usize {
    1
}
fn default_trigger_offset_ticks() -> u32 {
    2
}
fn default_scalp_take_profit() -> u32 {
    6
}
fn default_scalp_stop_loss() -> u32 {
    40
}
fn default_multiplier() -> Decimal {
    dec!(1.15)
}
fn default_surge_take_profit() -> u32 {
    40
}
fn default_surge_stop_loss() -> u32 {
    20
}
fn default_fast_period() -> usize {
    10
}
fn default_slow_period() -> usize {
    20
}
fn default_spread_multiplier() -> Decimal {
    dec!(2.0)
}
fn default_spread_offset() -> usize {
    3
}
fn default_spread_lookback() -> usize {
    5
}

impl Config {
    /// The risk limits with per-strategy defaults filled in. Only the box range
    /// enters while a position is open; every other variant waits until flat.
    pub fn risk_limits(&self) -> RiskLimits {
        let mut limits = self.risk.clone();
        limits
            .require_flat
            .get_or_insert(self.strategy != StrategyId::BoxRange);
        limits
    }

    /// Checks everything the engine relies on before it is allowed to start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let instance = &self.instance;
        if instance.symbol.trim().is_empty() {
            return Err(invalid("symbol has not been specified"));
        }
        if instance.account.trim().is_empty() {
            return Err(invalid("account has not been specified"));
        }
        if instance.connection != instance.account_connection() {
            return Err(invalid(format!(
                "symbol and account are on different connections ({} vs {})",
                instance.connection,
                instance.account_connection()
            )));
        }
        if instance.quantity <= Decimal::ZERO {
            return Err(invalid("quantity must be greater than 0"));
        }
        if instance.tick_size <= Decimal::ZERO {
            return Err(invalid("tick_size must be greater than 0"));
        }

        if let Some(max_profit) = self.risk.max_profit {
            if max_profit < Decimal::ZERO {
                return Err(invalid("max_profit must not be negative"));
            }
        }
        if let Some(max_loss) = self.risk.max_loss {
            if max_loss < Decimal::ZERO {
                return Err(invalid("max_loss is a magnitude and must not be negative"));
            }
        }

        self.validate_strategy()
    }

    fn validate_strategy(&self) -> Result<(), ConfigError> {
        let s = &self.strategies;
        match self.strategy {
            StrategyId::BoxRange => {
                if s.box_range.lookback == 0 || s.box_range.half_lookback == 0 {
                    return Err(invalid("box_range lookbacks must be at least 1"));
                }
                if s.box_range.half_lookback > s.box_range.lookback {
                    return Err(invalid("box_range half_lookback must not exceed lookback"));
                }
            }
            StrategyId::RangeScalp => {
                if s.range_scalp.lookback == 0 {
                    return Err(invalid("range_scalp lookback must be at least 1"));
                }
            }
            StrategyId::PriceSurge => validate_surge("price_surge", &s.price_surge)?,
            StrategyId::WeightedSurge => validate_surge("weighted_surge", &s.weighted_surge)?,
            StrategyId::SmaCross => {
                let p = &s.sma_cross;
                if p.fast_period == 0 || p.fast_period >= p.slow_period {
                    return Err(invalid("sma_cross needs 0 < fast_period < slow_period"));
                }
                if p.spread_lookback == 0 || p.spread_multiplier <= Decimal::ZERO {
                    return Err(invalid(
                        "sma_cross needs spread_lookback >= 1 and a positive spread_multiplier",
                    ));
                }
            }
        }
        Ok(())
    }
}

fn validate_surge(name: &str, params: &SurgeParams) -> Result<(), ConfigError> {
    if params.lookback == 0 {
        return Err(invalid(format!("{name} lookback must be at least 1")));
    }
    if params.multiplier <= Decimal::ZERO {
        return Err(invalid(format!("{name} multiplier must be greater than 0")));
    }
    Ok(())
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(msg.into())
}
