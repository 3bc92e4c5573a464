//! Normalizes comma-delimited geocoder addresses into a postal format.
//!
//! Nominatim-style display names list components from most to least specific
//! (name, house number, street, locality, sub-locality, county, region,
//! postcode, country). How many of the optional ones are present is only
//! visible through the token count, so each count gets its own template.

use std::fmt;

use tracing::warn;

use crate::models::{FootprintCollection, NO_ADDRESS_FOUND};

/// Rendered for addresses too short to hold a street, locality and region
pub const INSUFFICIENT_DATA: &str = "Not enough data to parse.";

/// Fewer tokens than this cannot be parsed
const MIN_TOKENS: usize = 6;

/// Token positions making up each postal line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Template {
    street: &'static [usize],
    locality: usize,
    region: usize,
    postcode: usize,
}

/// Token-count → template. Counts without an entry are passed through
/// unparsed.
const TEMPLATES: &[(usize, Template)] = &[
    // name, house number, street, locality, sub-locality, region, postcode, country
    (
        8,
        Template {
            street: &[1, 2],
            locality: 3,
            region: 5,
            postcode: 6,
        },
    ),
    // house number, street, locality, county, region, postcode, country
    (
        7,
        Template {
            street: &[0, 1],
            locality: 2,
            region: 4,
            postcode: 5,
        },
    ),
    // street, locality, county, region, postcode, country
    (
        6,
        Template {
            street: &[0],
            locality: 1,
            region: 3,
            postcode: 4,
        },
    ),
];

fn template_for(tokens: usize) -> Option<&'static Template> {
    TEMPLATES
        .iter()
        .find(|(count, _)| *count == tokens)
        .map(|(_, template)| template)
}

/// Street line plus "locality, region postcode" line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostalAddress {
    pub street: String,
    pub locality: String,
    pub region: String,
    pub postcode: String,
}

impl fmt::Display for PostalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{}, {} {}",
            self.street, self.locality, self.region, self.postcode
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedAddress {
    Postal(PostalAddress),
    /// Fewer tokens than any template needs
    InsufficientData,
    /// Token count with no template; holds the raw address
    Unrecognized(String),
}

impl fmt::Display for ParsedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsedAddress::Postal(postal) => postal.fmt(f),
            ParsedAddress::InsufficientData => f.write_str(INSUFFICIENT_DATA),
            ParsedAddress::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

/// Parse one geocoder address. `None` for the no-match sentinel.
pub fn parse_address(address: &str) -> Option<ParsedAddress> {
    if address == NO_ADDRESS_FOUND {
        return None;
    }

    let tokens: Vec<&str> = address.split(',').map(str::trim).collect();

    if let Some(template) = template_for(tokens.len()) {
        let street = template
            .street
            .iter()
            .map(|&i| tokens[i])
            .collect::<Vec<_>>()
            .join(" ");

        return Some(ParsedAddress::Postal(PostalAddress {
            street,
            locality: tokens[template.locality].to_string(),
            region: tokens[template.region].to_string(),
            postcode: tokens[template.postcode].to_string(),
        }));
    }

    if tokens.len() < MIN_TOKENS {
        return Some(ParsedAddress::InsufficientData);
    }

    warn!(
        "No address template for {} components, keeping raw address: {}",
        tokens.len(),
        address
    );
    Some(ParsedAddress::Unrecognized(address.to_string()))
}

/// Fill `parsed_address` for every row from its `address`.
///
/// Rows that were never geocoded keep `None`. Parsing only reads `address`,
/// so running it twice gives the same result.
pub fn parse_addresses(mut collection: FootprintCollection) -> FootprintCollection {
    for footprint in &mut collection.footprints {
        footprint.parsed_address = footprint.address.as_deref().and_then(parse_address);
    }
    collection
}
