use anyhow::{anyhow, Context};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::models::base::FacilityId;
use crate::models::reservation::{
    availability_map, AvailabilityMap, AvailabilityOutcome, BaseServiceRequest,
    BaseServiceResponse, ReservationOutcome, ReservationRequest, ReservationResult,
};

/// Client for the external base reservation service. Every call is a single
/// POST carrying the session token; nothing is retried.
pub struct BaseServiceRepo {
    client: Client,
    endpoint: Url,
}

impl BaseServiceRepo {
    pub fn new(client: Client, endpoint: &str) -> anyhow::Result<Self> {
        let endpoint = Url::parse(endpoint)
            .with_context(|| format!("Invalid base service url: {}", endpoint))?;
        Ok(Self { client, endpoint })
    }

    pub async fn reserve_bases(
        &self,
        auth_token: &str,
        request: &ReservationRequest,
    ) -> anyhow::Result<ReservationResult> {
        let outcome: ReservationOutcome = self
            .post(auth_token, &BaseServiceRequest::reservation(request))
            .await?;

        let result = ReservationResult::partition(&request.facility_ids, outcome);
        debug!(
            "Reservation for {} reserved {:?}, failed {:?}",
            request.group_name, result.reserved, result.failed
        );
        Ok(result)
    }

    pub async fn check_availability(
        &self,
        auth_token: &str,
        facility_ids: &[FacilityId],
        start_time: i64,
        end_time: i64,
    ) -> anyhow::Result<AvailabilityMap> {
        let outcome: AvailabilityOutcome = self
            .post(
                auth_token,
                &BaseServiceRequest::availability(facility_ids, start_time, end_time),
            )
            .await?;

        Ok(availability_map(facility_ids, outcome))
    }

    async fn post<T: DeserializeOwned>(
        &self,
        auth_token: &str,
        body: &BaseServiceRequest,
    ) -> anyhow::Result<T> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(AUTHORIZATION, auth_token)
            .json(body)
            .send()
            .await
            .context("Base service could not be reached")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("Base service answered {} with: {}", status, text);
            return Err(anyhow!("Base service answered {}", status));
        }

        let decoded: BaseServiceResponse<T> = response
            .json()
            .await
            .context("Base service returned an unreadable body")?;

        match decoded.result {
            Some(result) => Ok(result),
            None => Err(anyhow!(
                "Base service returned no result: {}",
                decoded.error.unwrap_or_default()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::routing::post;
    use axum::{Json, Router};
    use reqwest::StatusCode;
    use serde_json::{json, Value};

    use super::*;
    use crate::test_support::spawn_upstream;

    async fn echo_service() -> String {
        spawn_upstream(Router::new().route(
            "/bases",
            post(|headers: axum::http::HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers.get("authorization").unwrap(), "token-1");

                let ids: Vec<u64> = body["facility_ids"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|id| id.as_u64().unwrap())
                    .collect();
                let record = |id: &u64| {
                    json!({ "facility_id": id, "group_name": body["group_name"], "start_time": 1, "end_time": 2 })
                };

                if body["request_type"] == "availability" {
                    Json(json!({ "result": {
                        "possible_reservations": ids.iter().filter(|id| **id % 2 == 0).map(record).collect::<Vec<_>>(),
                        "denied_reservations": ids.iter().filter(|id| **id % 2 == 1).map(record).collect::<Vec<_>>(),
                    }}))
                } else {
                    Json(json!({ "result": {
                        "succeeded_reservations": ids.iter().filter(|id| **id != 13).map(record).collect::<Vec<_>>(),
                        "failed_reservations": ids.iter().filter(|id| **id == 13).map(record).collect::<Vec<_>>(),
                    }}))
                }
            }),
        ))
        .await
    }

    #[tokio::test]
    async fn reserves_and_partitions() {
        let url = echo_service().await;
        let repo = BaseServiceRepo::new(Client::new(), &format!("{}/bases", url)).unwrap();
        let request = ReservationRequest::new("OvO", [10, 13, 12], 100, 200).unwrap();

        let result = repo.reserve_bases("token-1", &request).await.unwrap();

        assert_eq!(result.reserved, vec![10, 12]);
        assert_eq!(result.failed, vec![13]);
        assert_eq!(result.reservations[0].group_name, "OvO");
    }

    #[tokio::test]
    async fn maps_availability() {
        let url = echo_service().await;
        let repo = BaseServiceRepo::new(Client::new(), &format!("{}/bases", url)).unwrap();

        let availability = repo
            .check_availability("token-1", &[1, 2], 100, 200)
            .await
            .unwrap();

        assert_eq!(availability, AvailabilityMap::from([(1, false), (2, true)]));
    }

    #[tokio::test]
    async fn surfaces_upstream_errors() {
        let url = spawn_upstream(Router::new().route(
            "/bases",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        ))
        .await;
        let repo = BaseServiceRepo::new(Client::new(), &format!("{}/bases", url)).unwrap();
        let request = ReservationRequest::new("OvO", [1], 100, 200).unwrap();

        assert!(repo.reserve_bases("token-1", &request).await.is_err());
    }

    #[tokio::test]
    async fn surfaces_unreachable_service() {
        let repo = BaseServiceRepo::new(Client::new(), "http://127.0.0.1:9/bases").unwrap();
        assert!(repo.check_availability("token-1", &[1], 1, 2).await.is_err());
    }
}
