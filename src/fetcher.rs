//! Single-product lookup: one remote call turned into one [`ProductRecord`].

use tracing::warn;

use crate::config::AppConfig;
use crate::error::FetchError;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::overrides::OverrideTable;
use crate::parser::parse_product_response;
use crate::record::{Asin, ProductRecord, QuotaState};

pub struct RecordFetcher<'a, C> {
    client: C,
    config: &'a AppConfig,
    overrides: &'a OverrideTable,
}

impl<'a, C: HttpClient> RecordFetcher<'a, C> {
    /// `client` is expected to add the API credential itself, see
    /// [`crate::fetch::auth::UrlParam::api_key`].
    pub fn new(client: C, config: &'a AppConfig, overrides: &'a OverrideTable) -> Self {
        Self {
            client,
            config,
            overrides,
        }
    }

    /// Looks up one product.
    ///
    /// A response without a usable rating is still `Ok`: the record keeps
    /// whatever Design/Size were found and leaves the numeric fields empty.
    /// `quota` is refreshed from the response's usage block when present.
    #[tracing::instrument(skip(self, asin, quota), fields(asin = %asin))]
    pub async fn fetch(
        &self,
        asin: &Asin,
        quota: &mut QuotaState,
    ) -> Result<ProductRecord, FetchError> {
        let query = [
            ("type", "product"),
            ("amazon_domain", self.config.marketplace.as_str()),
            ("asin", asin.as_str()),
        ];
        let bytes = fetch_bytes(&self.client, &self.config.endpoint, &query).await?;
        let response = parse_product_response(&bytes)?;

        if let Some(info) = &response.request_info {
            quota.update(info);
        }

        let record = match &response.product {
            Some(product) => ProductRecord::from_product(asin.clone(), product, &self.config.tokens),
            None => ProductRecord::empty(asin.clone()),
        };
        if !record.has_rating() {
            warn!(asin = %asin, "No usable rating in response");
        }

        Ok(record.with_override(self.overrides.get(asin)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;
    use crate::fetch::auth::UrlParam;
    use crate::record::StarCounts;
    use mockito::Matcher;
    use std::time::Duration;

    fn config(server: &mockito::Server) -> AppConfig {
        let mut config = AppConfig::new("test-key");
        config.endpoint = format!("{}/request", server.url());
        config
    }

    fn client(config: &AppConfig) -> UrlParam<BasicClient> {
        UrlParam::api_key(
            BasicClient::new(Duration::from_secs(5)).unwrap(),
            config.api_key.clone(),
        )
    }

    #[tokio::test]
    async fn test_fetch_sends_expected_query_and_maps_record() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/request")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("api_key".into(), "test-key".into()),
                Matcher::UrlEncoded("type".into(), "product".into()),
                Matcher::UrlEncoded("amazon_domain".into(), "amazon.pl".into()),
                Matcher::UrlEncoded("asin".into(), "B0DNKXYG1X".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{
                    "request_info": {"credits_used": 5, "credits_remaining": 95},
                    "product": {
                        "rating": 4.5,
                        "ratings_total": 100,
                        "specifications": [{"name": "Kolor", "value": "Szary"}],
                        "rating_breakdown": {
                            "five_star": {"count": 60},
                            "four_star": {"count": 20},
                            "three_star": {"count": 10},
                            "two_star": {"count": 5},
                            "one_star": {"count": 5}
                        }
                    }
                }"#,
            )
            .create_async()
            .await;

        let config = config(&server);
        let overrides = OverrideTable::empty();
        let fetcher = RecordFetcher::new(client(&config), &config, &overrides);
        let mut quota = QuotaState::default();

        let record = fetcher
            .fetch(&Asin::new("b0dnkxyg1x"), &mut quota)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(record.asin.as_str(), "B0DNKXYG1X");
        assert_eq!(record.design.as_deref(), Some("Szary"));
        assert_eq!(record.average_rating, Some(4.5));
        assert_eq!(record.total_reviews, Some(100));
        assert_eq!(
            record.stars,
            Some(StarCounts {
                five: 60,
                four: 20,
                three: 10,
                two: 5,
                one: 5
            })
        );
        assert_eq!(quota.used, Some(5));
        assert_eq!(quota.remaining, Some(95));
    }

    #[tokio::test]
    async fn test_override_wins_when_api_has_no_specifications() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/request")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"product": {"rating": 3.0, "ratings_total": 2}}"#)
            .create_async()
            .await;

        let config = config(&server);
        let overrides = OverrideTable::parse(b"X,Red\n").unwrap();
        let fetcher = RecordFetcher::new(client(&config), &config, &overrides);

        let record = fetcher
            .fetch(&Asin::new("x"), &mut QuotaState::default())
            .await
            .unwrap();
        assert_eq!(record.design.as_deref(), Some("Red"));
        assert!(record.size.is_none());
    }

    #[tokio::test]
    async fn test_missing_product_is_ok_with_nulls() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/request")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"request_info": {"credits_remaining": 7}}"#)
            .create_async()
            .await;

        let config = config(&server);
        let overrides = OverrideTable::empty();
        let fetcher = RecordFetcher::new(client(&config), &config, &overrides);
        let mut quota = QuotaState::default();

        let record = fetcher.fetch(&Asin::new("B01"), &mut quota).await.unwrap();
        assert_eq!(record, ProductRecord::empty(Asin::new("B01")));
        assert_eq!(quota.remaining, Some(7));
        assert_eq!(quota.used, None);
    }

    #[tokio::test]
    async fn test_error_status_and_bad_payload_are_errors() {
        let mut server = mockito::Server::new_async().await;
        let _m500 = server
            .mock("GET", "/request")
            .match_query(Matcher::UrlEncoded("asin".into(), "B500".into()))
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;
        let _mjunk = server
            .mock("GET", "/request")
            .match_query(Matcher::UrlEncoded("asin".into(), "BJUNK".into()))
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let config = config(&server);
        let overrides = OverrideTable::empty();
        let fetcher = RecordFetcher::new(client(&config), &config, &overrides);
        let mut quota = QuotaState::default();

        let err = fetcher.fetch(&Asin::new("B500"), &mut quota).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { .. }));

        let err = fetcher.fetch(&Asin::new("BJUNK"), &mut quota).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
