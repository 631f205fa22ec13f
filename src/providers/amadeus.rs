//! Amadeus flight offers client
//!
//! Every search first exchanges the client id and secret for a bearer token
//! (OAuth2 client credentials), then queries the flight-offers endpoint.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{AuthType, AuthUrl, ClientId, ClientSecret, TokenResponse, TokenUrl};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{FlightLeg, FlightOffer, FlightSearch, ProviderError, ensure_success};
use crate::config::FlightsConfig;

struct Credentials {
    client_id: String,
    client_secret: String,
}

pub struct AmadeusClient {
    client: Client,
    credentials: Option<Credentials>,
    base_url: String,
    max_offers: u32,
}

impl AmadeusClient {
    pub fn new(config: &FlightsConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("Tripwise/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        let credentials = match (&config.client_id, &config.client_secret) {
            (Some(id), Some(secret)) => Some(Credentials {
                client_id: id.clone(),
                client_secret: secret.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            client,
            credentials,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_offers: config.max_offers,
        })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    async fn access_token(&self, credentials: &Credentials) -> Result<String, ProviderError> {
        let token_url = format!("{}/v1/security/oauth2/token", self.base_url);
        let auth_url = AuthUrl::new(token_url.clone()).map_err(ProviderError::parse)?;
        let token_url = TokenUrl::new(token_url).map_err(ProviderError::parse)?;

        let oauth = BasicClient::new(
            ClientId::new(credentials.client_id.clone()),
            Some(ClientSecret::new(credentials.client_secret.clone())),
            auth_url,
            Some(token_url),
        )
        .set_auth_type(AuthType::RequestBody);

        let token = oauth
            .exchange_client_credentials()
            .request_async(async_http_client)
            .await
            .map_err(|e| ProviderError::Auth(e.to_string()))?;

        Ok(token.access_token().secret().clone())
    }
}

#[async_trait]
impl FlightSearch for AmadeusClient {
    #[instrument(skip(self))]
    async fn search(
        &self,
        origin_code: &str,
        destination_code: &str,
        date: NaiveDate,
    ) -> Result<Vec<FlightOffer>, ProviderError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(ProviderError::NotConfigured("Amadeus client id/secret"))?;
        let token = self.access_token(credentials).await?;

        let url = format!("{}/v2/shopping/flight-offers", self.base_url);
        let departure_date = date.format("%Y-%m-%d").to_string();
        let max = self.max_offers.to_string();

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[
                ("originLocationCode", origin_code),
                ("destinationLocationCode", destination_code),
                ("departureDate", departure_date.as_str()),
                ("adults", "1"),
                ("max", max.as_str()),
            ])
            .send()
            .await
            .map_err(ProviderError::transport)?;
        let response = ensure_success(response).await?;

        let body: OffersResponse = response.json().await.map_err(ProviderError::transport)?;
        let offers = body
            .data
            .into_iter()
            .map(AmadeusOffer::into_offer)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Found {} flight offers {} -> {}",
            offers.len(),
            origin_code,
            destination_code
        );
        Ok(offers)
    }
}

#[derive(Debug, Deserialize)]
struct OffersResponse {
    #[serde(default)]
    data: Vec<AmadeusOffer>,
}

#[derive(Debug, Deserialize)]
struct AmadeusOffer {
    price: AmadeusPrice,
    #[serde(default)]
    itineraries: Vec<AmadeusItinerary>,
}

#[derive(Debug, Deserialize)]
struct AmadeusPrice {
    total: String,
}

#[derive(Debug, Deserialize)]
struct AmadeusItinerary {
    #[serde(default)]
    duration: String,
    #[serde(default)]
    segments: Vec<AmadeusSegment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AmadeusSegment {
    departure: AmadeusEndpoint,
    arrival: AmadeusEndpoint,
    carrier_code: String,
    #[serde(default)]
    duration: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AmadeusEndpoint {
    iata_code: String,
}

impl AmadeusOffer {
    /// Keep the outbound itinerary only; searches are one-way
    fn into_offer(self) -> Result<FlightOffer, ProviderError> {
        let total_price = Decimal::from_str(self.price.total.trim()).map_err(|e| {
            ProviderError::Parse(format!("invalid price '{}': {e}", self.price.total))
        })?;
        let outbound = self.itineraries.into_iter().next();
        let (duration_iso8601, segments) = outbound
            .map(|itinerary| (itinerary.duration, itinerary.segments))
            .unwrap_or_default();

        let legs = segments
            .into_iter()
            .map(|segment| FlightLeg {
                departure_code: segment.departure.iata_code,
                arrival_code: segment.arrival.iata_code,
                carrier_code: segment.carrier_code,
                duration_iso8601: segment.duration,
            })
            .collect();

        Ok(FlightOffer {
            total_price,
            duration_iso8601,
            legs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFERS_JSON: &str = r#"{
        "meta": {"count": 1},
        "data": [{
            "type": "flight-offer",
            "id": "1",
            "itineraries": [{
                "duration": "PT9H10M",
                "segments": [
                    {"departure": {"iataCode": "JFK", "at": "2026-10-21T18:00:00"},
                     "arrival": {"iataCode": "KEF", "at": "2026-10-22T04:00:00"},
                     "carrierCode": "FI", "number": "614", "duration": "PT6H"},
                    {"departure": {"iataCode": "KEF", "at": "2026-10-22T07:40:00"},
                     "arrival": {"iataCode": "LHR", "at": "2026-10-22T11:50:00"},
                     "carrierCode": "FI", "number": "450", "duration": "PT3H10M"}
                ]
            }],
            "price": {"currency": "EUR", "total": "355.34", "base": "253.00"}
        }]
    }"#;

    #[test]
    fn test_offers_response_conversion() {
        let response: OffersResponse = serde_json::from_str(OFFERS_JSON).unwrap();
        let offer = response
            .data
            .into_iter()
            .next()
            .unwrap()
            .into_offer()
            .unwrap();

        assert_eq!(offer.total_price, Decimal::new(35_534, 2));
        assert_eq!(offer.duration_iso8601, "PT9H10M");
        assert_eq!(offer.legs.len(), 2);
        assert_eq!(offer.legs[0].departure_code, "JFK");
        assert_eq!(offer.legs[1].arrival_code, "LHR");
        assert_eq!(offer.legs[1].carrier_code, "FI");
    }

    #[test]
    fn test_empty_data_is_zero_offers() {
        let response: OffersResponse = serde_json::from_str(r#"{"meta": {"count": 0}}"#).unwrap();
        assert!(response.data.is_empty());
    }

    #[test]
    fn test_bad_price_is_parse_error() {
        let offer = AmadeusOffer {
            price: AmadeusPrice {
                total: "free".to_string(),
            },
            itineraries: Vec::new(),
        };
        assert!(matches!(offer.into_offer(), Err(ProviderError::Parse(_))));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_request() {
        let config = FlightsConfig {
            client_id: Some("id-only".to_string()),
            client_secret: None,
            base_url: "http://127.0.0.1:9".to_string(),
            max_offers: 5,
        };
        let client = AmadeusClient::new(&config, Duration::from_secs(1)).unwrap();
        assert!(!client.is_configured());

        let date = NaiveDate::from_ymd_opt(2026, 10, 21).unwrap();
        let err = client.search("JFK", "LHR", date).await.unwrap_err();
        assert_eq!(err, ProviderError::NotConfigured("Amadeus client id/secret"));
    }
}
