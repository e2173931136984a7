//! Cheapest-cart planning across markets.
//!
//! Each requested item is resolved to comparison groups, and every group
//! contributes its cheapest offer to the market that has it.

use crate::engine::{group_and_compare, ComparisonOptions};
use crate::filters::FilterChainBuilder;
use crate::observation::{GroupKey, Snapshot};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// A shopping list entry. Every set field is a case-insensitive substring match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
}

impl CartItem {
    pub fn new(product: impl Into<String>) -> Self {
        Self { product: product.into(), brand: None, quantity: None }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_quantity(mut self, quantity: impl Into<String>) -> Self {
        self.quantity = Some(quantity.into());
        self
    }
}

impl std::str::FromStr for CartItem {
    type Err = String;

    /// Parses `product[/brand[/quantity]]`; blank parts are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/').map(str::trim);

        let product = parts.next().unwrap_or_default();
        if product.is_empty() {
            return Err(format!("Cart item '{}' has no product", s));
        }

        let brand = parts.next().filter(|b| !b.is_empty()).map(str::to_string);
        let quantity = parts.next().filter(|q| !q.is_empty()).map(str::to_string);

        if parts.next().is_some() {
            return Err(format!("Cart item '{}' has too many parts. Use: product/brand/quantity", s));
        }

        Ok(Self { product: product.to_string(), brand, quantity })
    }
}

impl std::fmt::Display for CartItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.product)?;
        if let Some(brand) = &self.brand {
            write!(f, " / {}", brand)?;
        }
        if let Some(quantity) = &self.quantity {
            write!(f, " / {}", quantity)?;
        }
        Ok(())
    }
}

/// One product bought at its cheapest market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_name: String,
    pub brand: String,
    pub quantity: String,
    pub price: f64,
}

/// Result of planning a cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartPlan {
    pub lines_by_market: BTreeMap<String, Vec<CartLine>>,
    pub totals_by_market: BTreeMap<String, f64>,
    pub cheapest_market: Option<String>,
    pub cheapest_total: f64,
    /// Difference between the largest and smallest market totals
    pub total_spread: f64,
    /// Items that matched nothing in the snapshot
    pub unmatched: Vec<CartItem>,
}

impl CartPlan {
    /// Returns the sum over every market, i.e. the cost of the split cart.
    pub fn split_total(&self) -> f64 {
        self.totals_by_market.values().sum()
    }

    /// Returns the number of planned lines.
    pub fn line_count(&self) -> usize {
        self.lines_by_market.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines_by_market.is_empty()
    }
}

/// Plans the cheapest purchase of `items` from `snapshot`.
pub fn plan_cart(snapshot: &Snapshot, items: &[CartItem], options: &ComparisonOptions) -> CartPlan {
    let mut plan = CartPlan::default();
    let mut planned: HashSet<GroupKey> = HashSet::new();

    for item in items {
        let filters = FilterChainBuilder::new()
            .term(Some(&item.product), false)
            .brand(item.brand.as_deref())
            .quantity(item.quantity.as_deref())
            .build();

        let groups = group_and_compare(filters.apply(snapshot.observations()), options);
        if groups.is_empty() {
            debug!("No match for cart item {}", item);
            plan.unmatched.push(item.clone());
            continue;
        }

        for group in groups {
            if !planned.insert(group.key.clone()) {
                continue;
            }

            *plan.totals_by_market.entry(group.min_price_market.clone()).or_insert(0.0) +=
                group.min_price;
            plan.lines_by_market.entry(group.min_price_market.clone()).or_default().push(CartLine {
                product_name: group.product_name,
                brand: group.brand,
                quantity: group.quantity,
                price: group.min_price,
            });
        }
    }

    // BTreeMap iteration is by market name, so ties go to the first name
    let mut cheapest: Option<(&String, f64)> = None;
    for (market, &total) in &plan.totals_by_market {
        if cheapest.map_or(true, |(_, best)| total < best) {
            cheapest = Some((market, total));
        }
    }

    if let Some((market, total)) = cheapest {
        let max = plan.totals_by_market.values().copied().fold(f64::NEG_INFINITY, f64::max);
        plan.total_spread = max - total;
        plan.cheapest_total = total;
        plan.cheapest_market = Some(market.clone());
    }

    plan
}
