//! Grouping and ranking of observations into comparison groups.

use super::models::{ComparisonGroup, Offer};
use super::options::{ComparisonOptions, ReferenceBaseline};
use crate::observation::{GroupKey, PriceObservation};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;

/// Observations sharing a key, deduplicated per market.
struct Bucket<'a> {
    key: GroupKey,
    first: &'a PriceObservation,
    /// Latest observation per market, in market first-seen order
    latest: Vec<&'a PriceObservation>,
    market_index: HashMap<&'a str, usize>,
}

impl<'a> Bucket<'a> {
    fn new(key: GroupKey, first: &'a PriceObservation) -> Self {
        Self { key, first, latest: Vec::new(), market_index: HashMap::new() }
    }

    fn offer(&mut self, observation: &'a PriceObservation) {
        match self.market_index.entry(observation.market_name()) {
            Entry::Vacant(e) => {
                e.insert(self.latest.len());
                self.latest.push(observation);
            }
            Entry::Occupied(e) => {
                let slot = &mut self.latest[*e.get()];
                // Equal timestamps: the later record in the input wins
                if observation.extracted_at >= slot.extracted_at {
                    *slot = observation;
                }
            }
        }
    }
}

/// Groups observations by normalized (product, brand, quantity) and ranks markets.
///
/// Output order is the first-seen order of each key in `observations`.
/// Each market keeps only its latest observation. When that observation has a
/// non-positive or non-finite price the market has no offer, and groups left
/// without any offer are dropped.
pub fn group_and_compare<'a, I>(observations: I, options: &ComparisonOptions) -> Vec<ComparisonGroup>
where
    I: IntoIterator<Item = &'a PriceObservation>,
{
    let mut buckets: Vec<Bucket<'a>> = Vec::new();
    let mut index: HashMap<GroupKey, usize> = HashMap::new();

    for observation in observations {
        let slot = match index.entry(observation.key()) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                let slot = buckets.len();
                buckets.push(Bucket::new(e.key().clone(), observation));
                e.insert(slot);
                slot
            }
        };

        buckets[slot].offer(observation);
    }

    let total = buckets.len();
    let groups: Vec<ComparisonGroup> =
        buckets.into_iter().filter_map(|bucket| summarize(bucket, options)).collect();

    if groups.len() < total {
        debug!("Dropped {} groups without valid offers", total - groups.len());
    }

    groups
}

fn summarize(bucket: Bucket<'_>, options: &ComparisonOptions) -> Option<ComparisonGroup> {
    // Dedup runs first: a market whose latest price is invalid has no offer
    let mut retained: Vec<&PriceObservation> =
        bucket.latest.iter().copied().filter(|o| o.has_valid_price()).collect();
    if retained.len() < bucket.latest.len() {
        debug!(
            "Excluded {} markets with an invalid latest price for {}",
            bucket.latest.len() - retained.len(),
            bucket.key
        );
    }
    if retained.is_empty() {
        return None;
    }
    retained.sort_by(|a, b| {
        a.unit_price.total_cmp(&b.unit_price).then_with(|| a.market_name().cmp(b.market_name()))
    });

    let offers: Vec<Offer> = retained
        .iter()
        .map(|o| Offer {
            market: o.market_name().to_string(),
            price: o.unit_price,
            extracted_at: o.extracted_at,
            source_url: o.source_url.clone(),
        })
        .collect();

    let min_price = offers[0].price;
    let max_price = offers[offers.len() - 1].price;
    let average_price = offers.iter().map(|o| o.price).sum::<f64>() / offers.len() as f64;

    let reference_price = match options.reference {
        ReferenceBaseline::Maximum => max_price,
        ReferenceBaseline::Average => average_price,
        ReferenceBaseline::RunnerUp => offers.get(1).map(|o| o.price).unwrap_or(min_price),
    };

    let savings_amount = (reference_price - min_price).max(0.0);
    let savings_percent =
        if reference_price > 0.0 { savings_amount / reference_price * 100.0 } else { 0.0 };

    let average_delta = average_price - min_price;
    let average_delta_percent =
        if average_price > 0.0 { average_delta / average_price * 100.0 } else { 0.0 };

    // A single market cannot demonstrate savings
    let is_opportunity = offers.len() > 1 && savings_percent >= options.opportunity_threshold;

    let segment = retained
        .iter()
        .find_map(|o| o.segment.clone())
        .or_else(|| bucket.first.segment.clone());

    Some(ComparisonGroup {
        key: bucket.key,
        product_name: bucket.first.product_name.trim().to_string(),
        brand: bucket.first.brand.trim().to_string(),
        quantity: bucket.first.quantity.trim().to_string(),
        segment,
        min_price,
        min_price_market: offers[0].market.clone(),
        offers,
        reference_price,
        savings_amount,
        savings_percent,
        average_price,
        average_delta,
        average_delta_percent,
        is_opportunity,
    })
}

/// Reorders groups by savings amount, largest first. Ties keep their order.
pub fn sort_by_savings(groups: &mut [ComparisonGroup]) {
    groups.sort_by(|a, b| b.savings_amount.total_cmp(&a.savings_amount));
}
