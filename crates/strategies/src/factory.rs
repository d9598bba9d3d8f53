use crate::box_range::BoxRange;
use crate::error::StrategyError;
use crate::range_scalp::RangeScalp;
use crate::sma_cross::SmaCross;
use crate::surge::{Surge, SurgeMeasure};
use crate::Strategy;
use configuration::Config;
use core_types::StrategyId;

/// Creates the strategy selected by `config.strategy`, parameterised from its
/// block in `config.strategies` and the instance's symbol and tick size.
pub fn create_strategy(config: &Config) -> Result<Box<dyn Strategy>, StrategyError> {
    let symbol = config.instance.symbol.clone();
    let tick_size = config.instance.tick_size;
    let strategies = &config.strategies;

    // The compiler will error if a new StrategyId is added but not handled here.
    match config.strategy {
        StrategyId::BoxRange => Ok(Box::new(BoxRange::new(
            strategies.box_range.clone(),
            tick_size,
            symbol,
        )?)),
        StrategyId::RangeScalp => Ok(Box::new(RangeScalp::new(
            strategies.range_scalp.clone(),
            tick_size,
            symbol,
        )?)),
        StrategyId::PriceSurge => Ok(Box::new(Surge::new(
            strategies.price_surge.clone(),
            SurgeMeasure::Body,
            symbol,
        )?)),
        StrategyId::WeightedSurge => Ok(Box::new(Surge::new(
            strategies.weighted_surge.clone(),
            SurgeMeasure::Weighted,
            symbol,
        )?)),
        StrategyId::SmaCross => Ok(Box::new(SmaCross::new(strategies.sma_cross.clone(), symbol)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use configuration::config_from_toml;

    fn config_for(strategy: &str) -> Config {
        config_from_toml(&format!(
            r#"
            strategy = "{strategy}"
            [instance]
            symbol = "ES"
            account = "SIM-001"
            connection = "sim"
            quantity = 1
            tick_size = 0.25
            "#
        ))
        .unwrap()
    }

    #[test]
    fn builds_every_variant() {
        for (name, id) in [
            ("box_range", StrategyId::BoxRange),
            ("range_scalp", StrategyId::RangeScalp),
            ("price_surge", StrategyId::PriceSurge),
            ("weighted_surge", StrategyId::WeightedSurge),
            ("sma_cross", StrategyId::SmaCross),
        ] {
            let strategy = create_strategy(&config_for(name)).unwrap();
            assert_eq!(strategy.id(), id);
        }
    }
}
