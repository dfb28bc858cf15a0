//! Search service results.
//!
//! The search service proxies Elasticsearch, so responses arrive either as a
//! raw `hits` document, a bare array, or a `{products, total}` object. All
//! three normalize into [`SearchResults`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product hit, with display fallbacks filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default = "unknown_title")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "placeholder_thumbnail")]
    pub thumbnail: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub rating: Decimal,
}

fn unknown_title() -> String {
    "Unknown Product".to_owned()
}

fn default_currency() -> String {
    "$".to_owned()
}

fn placeholder_thumbnail() -> String {
    "/placeholder.jpg".to_owned()
}

/// Normalized search response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub products: Vec<SearchHit>,
    pub total: u64,
    pub query: String,
}

impl SearchResults {
    #[must_use]
    pub fn empty(query: &str) -> Self {
        Self {
            products: Vec::new(),
            total: 0,
            query: query.to_owned(),
        }
    }

    /// Normalize any of the accepted response shapes.
    #[must_use]
    pub fn from_response(query: &str, response: SearchResponse) -> Self {
        let (products, total) = match response {
            SearchResponse::Elastic { hits } => {
                let products: Vec<SearchHit> =
                    hits.hits.into_iter().map(ElasticHit::into_hit).collect();
                let total = hits.total.map_or(products.len() as u64, |t| t.value);
                (products, total)
            }
            SearchResponse::Listing { products, total } => {
                let total = total.unwrap_or(products.len() as u64);
                (products, total)
            }
            SearchResponse::Bare(products) => {
                let total = products.len() as u64;
                (products, total)
            }
            SearchResponse::Unknown(value) => {
                tracing::warn!(%value, "Unexpected search response format");
                (Vec::new(), 0)
            }
        };
        Self {
            products,
            total,
            query: query.to_owned(),
        }
    }
}

/// Raw response shapes from the search service.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SearchResponse {
    Elastic { hits: ElasticHits },
    Listing {
        products: Vec<SearchHit>,
        #[serde(default)]
        total: Option<u64>,
    },
    Bare(Vec<SearchHit>),
    Unknown(serde_json::Value),
}

#[derive(Debug, Deserialize)]
pub struct ElasticHits {
    #[serde(default)]
    total: Option<ElasticTotal>,
    #[serde(default)]
    hits: Vec<ElasticHit>,
}

#[derive(Debug, Deserialize)]
struct ElasticTotal {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct ElasticHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source", default)]
    source: serde_json::Map<String, serde_json::Value>,
}

impl ElasticHit {
    fn into_hit(self) -> SearchHit {
        let mut source = self.source;
        source.insert("id".to_owned(), serde_json::Value::String(self.id.clone()));
        // Null fields fall back like missing ones
        source.retain(|_, v| !v.is_null());
        serde_json::from_value(serde_json::Value::Object(source)).unwrap_or_else(|_| SearchHit {
            id: self.id,
            title: unknown_title(),
            description: String::new(),
            price: Decimal::ZERO,
            currency: default_currency(),
            thumbnail: placeholder_thumbnail(),
            category: String::new(),
            brand: String::new(),
            rating: Decimal::ZERO,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn parse(query: &str, value: serde_json::Value) -> SearchResults {
        SearchResults::from_response(query, serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_elasticsearch_hits() {
        let results = parse(
            "laptop",
            serde_json::json!({
                "hits": {
                    "total": {"value": 42},
                    "hits": [
                        {"_id": "301671", "_source": {"title": "Gaming Laptop", "price": 1299.99, "brand": null}},
                        {"_id": "301672", "_source": {}}
                    ]
                }
            }),
        );
        assert_eq!(results.total, 42);
        assert_eq!(results.query, "laptop");
        assert_eq!(results.products[0].title, "Gaming Laptop");
        assert_eq!(results.products[0].brand, "");
        assert_eq!(results.products[1].title, "Unknown Product");
        assert_eq!(results.products[1].thumbnail, "/placeholder.jpg");
        assert_eq!(results.products[1].id, "301672");
    }

    #[test]
    fn test_listing_and_bare_array() {
        let listing = parse(
            "mouse",
            serde_json::json!({"products": [{"id": "1", "title": "Mouse"}]}),
        );
        assert_eq!(listing.total, 1);

        let bare = parse("mouse", serde_json::json!([{"_id": "1"}, {"_id": "2"}]));
        assert_eq!(bare.total, 2);
    }

    #[test]
    fn test_unknown_shape_is_empty() {
        let results = parse("x", serde_json::json!({"took": 3}));
        assert_eq!(results, SearchResults::empty("x"));
    }
}
