//! Product catalog routes.
//!
//! Endpoints:
//! - `GET  /api/v1/products`          — full price list with parsed spec fields
//! - `GET  /api/v1/products/search`   — tire search (width required)
//! - `POST /api/v1/products/reload`   — wholesale price list reload

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use treadline_core::catalog::{clamp_limit, parse_tire_spec, TireQuery};
use treadline_core::domain::product::Product;
use treadline_core::domain::tire::VehicleClass;
use treadline_core::errors::{ApplicationError, DomainError};
use treadline_store::{PriceBook, PriceListSource};

use crate::respond::{correlation_id, error_response, ErrorBody};

#[derive(Clone)]
pub struct ProductsState {
    pub price_book: Arc<PriceBook>,
    pub price_source: Arc<dyn PriceListSource>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub stock: u32,
    pub unit_cost: Decimal,
    pub cost_with_tax: Decimal,
    pub final_price: Decimal,
    // Parsed spec fields; all null when the name carries no recognizable size.
    pub width: Option<u16>,
    pub aspect_ratio: Option<u16>,
    pub rim_diameter: Option<u16>,
    pub vehicle_class: Option<VehicleClass>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        let spec = parse_tire_spec(&product.name);
        Self {
            id: product.id.0.clone(),
            name: product.name.clone(),
            stock: product.stock,
            unit_cost: product.unit_cost,
            cost_with_tax: product.cost_with_tax,
            final_price: product.final_price,
            width: spec.map(|s| s.width),
            aspect_ratio: spec.and_then(|s| s.aspect_ratio),
            rim_diameter: spec.map(|s| s.rim_diameter),
            vehicle_class: spec.map(|s| s.vehicle_class),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub width: Option<u16>,
    pub aspect_ratio: Option<u16>,
    pub diameter: Option<String>,
    pub exact_match: Option<bool>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub count: usize,
    pub products: Vec<ProductView>,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub products: usize,
}

pub fn router(state: ProductsState) -> Router {
    Router::new()
        .route("/api/v1/products", get(list_products))
        .route("/api/v1/products/search", get(search_products))
        .route("/api/v1/products/reload", post(reload_products))
        .with_state(state)
}

async fn list_products(State(state): State<ProductsState>) -> Json<Vec<ProductView>> {
    let views = state.price_book.products().iter().map(ProductView::from).collect();
    Json(views)
}

async fn search_products(
    State(state): State<ProductsState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, (StatusCode, Json<ErrorBody>)> {
    let correlation_id = correlation_id();

    let Some(width) = params.width else {
        let error = ApplicationError::from(DomainError::InvalidTireQuery(
            "width is required".to_string(),
        ));
        return Err(error_response(error.into_interface(correlation_id)));
    };

    let query = TireQuery {
        width,
        aspect_ratio: params.aspect_ratio,
        diameter: params.diameter,
        exact: params.exact_match.unwrap_or(false),
        limit: clamp_limit(params.limit),
    };

    let matches = state.price_book.search(&query);
    info!(
        event_name = "products.search",
        correlation_id = %correlation_id,
        width = query.width,
        exact = query.exact,
        results = matches.len(),
        "tire search served"
    );

    let products: Vec<ProductView> =
        matches.iter().map(|m| ProductView::from(&m.product)).collect();
    Ok(Json(SearchResponse { count: products.len(), products }))
}

async fn reload_products(
    State(state): State<ProductsState>,
) -> Result<Json<ReloadResponse>, (StatusCode, Json<ErrorBody>)> {
    let correlation_id = correlation_id();

    let products = state.price_source.load().map_err(|error| {
        warn!(
            event_name = "products.reload_failed",
            correlation_id = %correlation_id,
            error = %error,
            "price list reload failed"
        );
        error_response(
            ApplicationError::PriceList(error.to_string()).into_interface(correlation_id.clone()),
        )
    })?;

    let count = state.price_book.replace_all(products);
    info!(
        event_name = "products.reloaded",
        correlation_id = %correlation_id,
        products = count,
        "price list replaced"
    );
    Ok(Json(ReloadResponse { products: count }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use rust_decimal::Decimal;
    use tower::ServiceExt;

    use super::{router, ProductsState};
    use treadline_core::domain::product::{Product, ProductId};
    use treadline_store::{PriceBook, PriceListError, PriceListSource};

    struct StaticSource(Vec<Product>);

    impl PriceListSource for StaticSource {
        fn load(&self) -> Result<Vec<Product>, PriceListError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenSource;

    impl PriceListSource for BrokenSource {
        fn load(&self) -> Result<Vec<Product>, PriceListError> {
            Err(PriceListError::EmptyWorkbook)
        }
    }

    fn product(id: &str, name: &str, final_price: i64) -> Product {
        Product {
            id: ProductId(id.to_string()),
            name: name.to_string(),
            unit_cost: Decimal::new(final_price * 70, 2),
            stock: 4,
            cost_with_tax: Decimal::new(final_price * 85, 2),
            final_price: Decimal::new(final_price * 100, 2),
        }
    }

    fn fixture() -> Vec<Product> {
        vec![
            product("p1", "205 55 16 FIRESTONE F600", 180),
            product("p2", "205 60 R16 BRIDGESTONE", 165),
            product("p3", "VALVULA TR414", 2),
        ]
    }

    fn state(products: Vec<Product>) -> ProductsState {
        ProductsState {
            price_book: Arc::new(PriceBook::with_products(products.clone())),
            price_source: Arc::new(StaticSource(products)),
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        serde_json::from_slice(&bytes).expect("body should be json")
    }

    #[tokio::test]
    async fn list_includes_parsed_and_unparseable_products() {
        let app = router(state(fixture()));
        let response = app
            .oneshot(Request::builder().uri("/api/v1/products").body(Body::empty()).expect("req"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let items = body.as_array().expect("array");
        assert_eq!(items.len(), 3);

        let valve = items.iter().find(|p| p["id"] == "p3").expect("valve row");
        assert!(valve["width"].is_null());
        assert!(valve["vehicle_class"].is_null());

        let tire = items.iter().find(|p| p["id"] == "p1").expect("tire row");
        assert_eq!(tire["width"], 205);
        assert_eq!(tire["vehicle_class"], "car");
    }

    #[tokio::test]
    async fn search_requires_width() {
        let app = router(state(fixture()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/products/search?aspect_ratio=55")
                    .body(Body::empty())
                    .expect("req"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn search_ranks_by_price_and_honors_limit() {
        let app = router(state(fixture()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/products/search?width=205&aspect_ratio=57&limit=1")
                    .body(Body::empty())
                    .expect("req"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["count"], 1);
        // p2 is the cheaper of the two fuzzy matches.
        assert_eq!(body["products"][0]["id"], "p2");
    }

    #[tokio::test]
    async fn reload_replaces_the_price_book() {
        let replacement = vec![product("p9", "175 70 13 TORNEL", 95)];
        let state = ProductsState {
            price_book: Arc::new(PriceBook::with_products(fixture())),
            price_source: Arc::new(StaticSource(replacement)),
        };
        let app = router(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/products/reload")
                    .body(Body::empty())
                    .expect("req"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["products"], 1);
        assert_eq!(state.price_book.len(), 1);
        assert!(state.price_book.products().iter().all(|p| p.id.0 == "p9"));
    }

    #[tokio::test]
    async fn reload_failure_maps_to_internal_error() {
        let state = ProductsState {
            price_book: Arc::new(PriceBook::with_products(fixture())),
            price_source: Arc::new(BrokenSource),
        };
        let app = router(state.clone());

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/products/reload")
                    .body(Body::empty())
                    .expect("req"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // Failed reload must not clobber the current set.
        assert_eq!(state.price_book.len(), 3);
    }
}
