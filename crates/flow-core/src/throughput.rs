use crate::fixed::Fixed64;
use crate::graph::GraphError;
use crate::item::Item;
use std::collections::BTreeMap;

/// Per-minute item rates and power draw of a node (or a set of nodes).
///
/// Every stored rate is strictly positive; power is never negative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Throughput {
    inputs_per_minute: BTreeMap<Item, Fixed64>,
    outputs_per_minute: BTreeMap<Item, Fixed64>,
    power: Fixed64,
}

impl Throughput {
    /// Build a throughput from per-item rates. Repeated items are summed.
    pub fn new(
        inputs_per_minute: impl IntoIterator<Item = (Item, Fixed64)>,
        outputs_per_minute: impl IntoIterator<Item = (Item, Fixed64)>,
        power: Fixed64,
    ) -> Result<Self, GraphError> {
        if power < Fixed64::ZERO {
            return Err(GraphError::InvalidArgument(format!(
                "power consumption cannot be negative, got {power}"
            )));
        }
        Ok(Self {
            inputs_per_minute: collect_rates("input", inputs_per_minute)?,
            outputs_per_minute: collect_rates("output", outputs_per_minute)?,
            power,
        })
    }

    pub fn inputs_per_minute(&self) -> &BTreeMap<Item, Fixed64> {
        &self.inputs_per_minute
    }

    pub fn outputs_per_minute(&self) -> &BTreeMap<Item, Fixed64> {
        &self.outputs_per_minute
    }

    pub fn input_rate(&self, item: &Item) -> Option<Fixed64> {
        self.inputs_per_minute.get(item).copied()
    }

    pub fn output_rate(&self, item: &Item) -> Option<Fixed64> {
        self.outputs_per_minute.get(item).copied()
    }

    pub fn power(&self) -> Fixed64 {
        self.power
    }

    pub fn is_empty(&self) -> bool {
        self.inputs_per_minute.is_empty() && self.outputs_per_minute.is_empty()
    }

    /// Sum two throughputs item by item.
    pub fn combine(&self, other: &Throughput) -> Result<Throughput, GraphError> {
        let power = self
            .power
            .checked_add(other.power)
            .ok_or_else(|| overflow("power"))?;
        Throughput::new(
            chain_rates(&self.inputs_per_minute, &other.inputs_per_minute),
            chain_rates(&self.outputs_per_minute, &other.outputs_per_minute),
            power,
        )
    }

    /// Outputs minus inputs per item. Positive means surplus, negative
    /// means deficit; items that balance exactly map to zero.
    pub fn net_rates(&self) -> BTreeMap<Item, Fixed64> {
        let mut net: BTreeMap<Item, Fixed64> = self.outputs_per_minute.clone();
        for (item, rate) in &self.inputs_per_minute {
            let entry = net.entry(item.clone()).or_insert(Fixed64::ZERO);
            *entry = entry.saturating_sub(*rate);
        }
        net
    }
}

fn chain_rates<'a>(
    a: &'a BTreeMap<Item, Fixed64>,
    b: &'a BTreeMap<Item, Fixed64>,
) -> impl Iterator<Item = (Item, Fixed64)> + 'a {
    a.iter()
        .chain(b.iter())
        .map(|(item, rate)| (item.clone(), *rate))
}

fn collect_rates(
    side: &str,
    rates: impl IntoIterator<Item = (Item, Fixed64)>,
) -> Result<BTreeMap<Item, Fixed64>, GraphError> {
    let mut map: BTreeMap<Item, Fixed64> = BTreeMap::new();
    for (item, rate) in rates {
        if rate <= Fixed64::ZERO {
            return Err(GraphError::InvalidArgument(format!(
                "{side} rate for {} must be positive, got {rate}",
                item.display_name()
            )));
        }
        let entry = map.entry(item).or_insert(Fixed64::ZERO);
        *entry = entry.checked_add(rate).ok_or_else(|| overflow(side))?;
    }
    Ok(map)
}

fn overflow(what: &str) -> GraphError {
    GraphError::InvalidArgument(format!("{what} rate overflowed"))
}
