use std::fmt;

use serde::Serialize;

use crate::config::AttributeTokens;
use crate::error::InputError;
use crate::overrides::OverrideEntry;
use crate::parser::{Product, RequestInfo, bucket_count};

/// A normalized (trimmed, upper-cased) product identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Asin(String);

impl Asin {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Asin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Splits multi-line input into identifiers, one per line, skipping blank lines.
///
/// Order is preserved and duplicates are kept.
pub fn parse_identifiers(text: &str) -> Vec<Asin> {
    text.lines()
        .map(Asin::new)
        .filter(|a| !a.is_empty())
        .collect()
}

/// Gathers identifiers from command-line values and optional file text.
///
/// Command-line values come first, then file lines, in order. An empty
/// result is an [`InputError::NoIdentifiers`].
pub fn collect_identifiers(
    values: &[String],
    file_text: Option<&str>,
) -> Result<Vec<Asin>, InputError> {
    let mut asins: Vec<Asin> = values.iter().flat_map(|v| parse_identifiers(v)).collect();
    if let Some(text) = file_text {
        asins.extend(parse_identifiers(text));
    }
    if asins.is_empty() {
        return Err(InputError::NoIdentifiers);
    }
    Ok(asins)
}

/// Review counts per star bucket.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StarCounts {
    pub five: u64,
    pub four: u64,
    pub three: u64,
    pub two: u64,
    pub one: u64,
}

impl StarCounts {
    /// Buckets ordered from five stars down to one.
    pub fn as_array(&self) -> [u64; 5] {
        [self.five, self.four, self.three, self.two, self.one]
    }

    /// Sum of all buckets, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.as_array()
            .iter()
            .fold(0u64, |acc, n| acc.saturating_add(*n))
    }
}

/// Bucket-wise saturating addition.
impl std::ops::AddAssign for StarCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.five = self.five.saturating_add(rhs.five);
        self.four = self.four.saturating_add(rhs.four);
        self.three = self.three.saturating_add(rhs.three);
        self.two = self.two.saturating_add(rhs.two);
        self.one = self.one.saturating_add(rhs.one);
    }
}

/// One output row.
///
/// A `None` rating means the lookup failed or the product had no usable
/// rating; `total_reviews` and `stars` are `None` in that case too.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub asin: Asin,
    pub design: Option<String>,
    pub size: Option<String>,
    pub average_rating: Option<f64>,
    pub total_reviews: Option<u64>,
    pub stars: Option<StarCounts>,
}

impl ProductRecord {
    /// A record with every attribute and numeric field empty.
    pub fn empty(asin: Asin) -> Self {
        Self {
            asin,
            design: None,
            size: None,
            average_rating: None,
            total_reviews: None,
            stars: None,
        }
    }

    /// Derives a record from a decoded product.
    ///
    /// Size and Design come from the first specification whose lower-cased
    /// name contains one of the configured tokens. Rating fields are only
    /// filled when the product carries a rating.
    pub fn from_product(asin: Asin, product: &Product, tokens: &AttributeTokens) -> Self {
        let mut record = Self::empty(asin);

        for spec in product.specifications.iter().flatten() {
            let name = spec.name.as_deref().unwrap_or("").to_lowercase();
            if record.size.is_none() && tokens.is_size(&name) {
                record.size = spec.value_text();
            }
            if record.design.is_none() && tokens.is_design(&name) {
                record.design = spec.value_text();
            }
        }

        if let Some(rating) = product.rating {
            let breakdown = product.rating_breakdown.as_ref();
            record.average_rating = Some(rating);
            record.total_reviews = product.ratings_total;
            record.stars = Some(StarCounts {
                five: bucket_count(breakdown.and_then(|b| b.five_star.as_ref())),
                four: bucket_count(breakdown.and_then(|b| b.four_star.as_ref())),
                three: bucket_count(breakdown.and_then(|b| b.three_star.as_ref())),
                two: bucket_count(breakdown.and_then(|b| b.two_star.as_ref())),
                one: bucket_count(breakdown.and_then(|b| b.one_star.as_ref())),
            });
        }

        record
    }

    /// Replaces Design/Size with the override's non-blank values.
    pub fn with_override(mut self, entry: Option<&OverrideEntry>) -> Self {
        let Some(entry) = entry else {
            return self;
        };
        if let Some(design) = entry.design.as_deref().filter(|d| !d.trim().is_empty()) {
            self.design = Some(design.to_string());
        }
        if let Some(size) = entry.size.as_deref().filter(|s| !s.trim().is_empty()) {
            self.size = Some(size.to_string());
        }
        self
    }

    pub fn has_rating(&self) -> bool {
        self.average_rating.is_some()
    }

    /// Star counts, treating a missing breakdown as all zeros.
    pub fn star_counts(&self) -> StarCounts {
        self.stars.unwrap_or_default()
    }
}

/// Last-seen remote usage counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaState {
    pub used: Option<u64>,
    pub remaining: Option<u64>,
}

impl QuotaState {
    /// Overwrites each counter the response reports; absent ones keep their value.
    pub fn update(&mut self, info: &RequestInfo) {
        if let Some(used) = info.credits_used {
            self.used = Some(used);
        }
        if let Some(remaining) = info.credits_remaining {
            self.remaining = Some(remaining);
        }
    }
}
