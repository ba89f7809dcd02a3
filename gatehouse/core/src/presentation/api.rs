// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Status endpoint: `GET /gatehouse/status` returns the [`StatusReport`] JSON.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

use crate::application::gatehouse::{Gatehouse, StatusReport};

pub const STATUS_PATH: &str = "/gatehouse/status";

pub fn router<S>(gatehouse: Arc<Gatehouse>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route(STATUS_PATH, get(status))
        .with_state(gatehouse)
}

async fn status(State(gatehouse): State<Arc<Gatehouse>>) -> Json<StatusReport> {
    Json(gatehouse.status())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::GatehouseConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_status_endpoint() {
        let mut gatehouse = Gatehouse::new(GatehouseConfig::default());
        gatehouse.activate_permissions();
        let app: Router = router(Arc::new(gatehouse));

        let response = app
            .oneshot(Request::get(STATUS_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let report: StatusReport = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(report.active_count, 1);
        assert!(report.layers["dharma"].active);
        assert!(!report.layers["sutra"].active);
    }
}
