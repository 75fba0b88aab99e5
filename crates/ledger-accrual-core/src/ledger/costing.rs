//! Unit cost lookup for pricing sales at cost.
//!
//! Sales are matched to purchases by product name only. When a product was
//! bought at several unit costs the configured `CostingPolicy` picks one
//! figure for the whole dataset.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::config::CostingPolicy;
use crate::records::Purchase;
use crate::types::{Money, Quantity};

#[derive(Debug, Clone, Copy)]
enum CostAccumulator {
    Weighted { quantity: Quantity, cost: Money },
    Dated { date: NaiveDate, unit_cost: Money },
    /// Running totals left the representable range; the product has no cost.
    Overflowed,
}

/// Unit cost per product name under one costing policy.
#[derive(Debug, Clone, Default)]
pub struct UnitCostTable {
    costs: HashMap<String, Money>,
}

impl UnitCostTable {
    /// Build the table from purchases that already passed validation.
    pub fn build<'a>(purchases: impl IntoIterator<Item = &'a Purchase>, policy: CostingPolicy) -> Self {
        let mut acc: HashMap<&'a str, CostAccumulator> = HashMap::new();

        for p in purchases {
            match policy {
                CostingPolicy::WeightedAverage => {
                    let entry = acc
                        .entry(p.product_name.as_str())
                        .or_insert(CostAccumulator::Weighted {
                            quantity: Decimal::ZERO,
                            cost: Decimal::ZERO,
                        });
                    *entry = match *entry {
                        CostAccumulator::Weighted { quantity, cost } => {
                            let step = || {
                                Some(CostAccumulator::Weighted {
                                    quantity: quantity.checked_add(p.quantity)?,
                                    cost: cost.checked_add(p.total_cost().ok()?)?,
                                })
                            };
                            step().unwrap_or(CostAccumulator::Overflowed)
                        }
                        other => other,
                    };
                }
                CostingPolicy::FirstCost | CostingPolicy::LastCost => {
                    let candidate = CostAccumulator::Dated {
                        date: p.purchase_at,
                        unit_cost: p.amount,
                    };
                    // Ties keep input order: first seen for FirstCost,
                    // last seen for LastCost.
                    let replace = match acc.get(p.product_name.as_str()) {
                        Some(CostAccumulator::Dated { date, .. }) => match policy {
                            CostingPolicy::FirstCost => p.purchase_at < *date,
                            _ => p.purchase_at >= *date,
                        },
                        _ => true,
                    };
                    if replace {
                        acc.insert(p.product_name.as_str(), candidate);
                    }
                }
            }
        }

        let costs = acc
            .into_iter()
            .filter_map(|(name, a)| {
                let unit = match a {
                    // zero quantity divides to None as well
                    CostAccumulator::Weighted { quantity, cost } => cost.checked_div(quantity)?,
                    CostAccumulator::Dated { unit_cost, .. } => unit_cost,
                    CostAccumulator::Overflowed => return None,
                };
                Some((name.to_string(), unit))
            })
            .collect();

        Self { costs }
    }

    pub fn unit_cost(&self, product_name: &str) -> Option<Money> {
        self.costs.get(product_name).copied()
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }
}
