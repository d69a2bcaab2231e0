//! # Product Model
//!
//! Catalog records as returned by the search endpoint.

use serde::{Deserialize, Serialize};

/// Aggregated customer reviews for a product
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    #[serde(default)]
    pub review_average: f64,
    #[serde(default)]
    pub review_count: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInformation {
    #[serde(default)]
    pub review_summary: ReviewSummary,
}

/// A single catalog product
///
/// Products carry no identity used by the client; their position in the
/// result list is what identifies them on screen.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<u64>,
    pub product_name: String,
    #[serde(default)]
    pub review_information: ReviewInformation,
    #[serde(rename = "USPs", default)]
    pub usps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_state: Option<i64>,
    pub sales_price_inc_vat: f64,
    #[serde(default)]
    pub product_image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_day_delivery: Option<bool>,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        image: impl Into<String>,
        price: f64,
        usps: Vec<String>,
        review_average: f64,
        review_count: u32,
    ) -> Self {
        Self {
            product_id: None,
            product_name: name.into(),
            review_information: ReviewInformation {
                review_summary: ReviewSummary {
                    review_average,
                    review_count,
                },
            },
            usps,
            availability_state: None,
            sales_price_inc_vat: price,
            product_image: image.into(),
            next_day_delivery: None,
        }
    }

    pub fn review_summary(&self) -> &ReviewSummary {
        &self.review_information.review_summary
    }
}

/// One fetched batch of products plus pagination metadata
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsPage {
    pub products: Vec<Product>,
    pub current_page: u32,
    pub page_size: u32,
    pub total_results: u32,
    pub page_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "products": [
            {
                "productId": 785359,
                "productName": "Samsung Galaxy S21 128GB Grijs",
                "reviewInformation": {
                    "reviews": [],
                    "reviewSummary": { "reviewAverage": 9.1, "reviewCount": 952 }
                },
                "USPs": ["128 GB opslagcapaciteit", "6,2 inch scherm"],
                "availabilityState": 2,
                "salesPriceIncVat": 699.0,
                "productImage": "https://image.example.com/785359.png",
                "coolbluesChoiceInformationTitle": "ignored",
                "nextDayDelivery": true
            }
        ],
        "currentPage": 1,
        "pageSize": 24,
        "totalResults": 1,
        "pageCount": 1
    }"#;

    #[test]
    fn products_page_should_decode_catalog_json() {
        let page: ProductsPage = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(page.current_page, 1);
        assert_eq!(page.page_size, 24);
        assert_eq!(page.page_count, 1);
        assert_eq!(page.products.len(), 1);

        let product = &page.products[0];
        assert_eq!(product.product_id, Some(785359));
        assert_eq!(product.product_name, "Samsung Galaxy S21 128GB Grijs");
        assert_eq!(product.usps.len(), 2);
        assert_eq!(product.sales_price_inc_vat, 699.0);
        assert_eq!(product.review_summary().review_count, 952);
        assert_eq!(product.next_day_delivery, Some(true));
    }

    #[test]
    fn product_should_tolerate_missing_optional_fields() {
        let json = r#"{ "productName": "Cable", "salesPriceIncVat": 4.5 }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.product_name, "Cable");
        assert!(product.usps.is_empty());
        assert_eq!(product.review_summary().review_count, 0);
        assert_eq!(product.product_image, "");
    }

    #[test]
    fn page_missing_pagination_fields_should_fail() {
        let json = r#"{ "products": [] }"#;
        assert!(serde_json::from_str::<ProductsPage>(json).is_err());
    }
}
