use hfp_core::{
    METRO_REFERENCE_LATITUDE as LAT, METRO_REFERENCE_LONGITUDE as LON, NewVehiclePosition,
};
use reqwest::StatusCode;
use web_api::{error::ApiError, routes::vehicles::ClosestParameters};

use super::{
    helper::{TestHelper, seconds_ago},
    test_client::point,
};

fn position(route: &str, vehicle: &str, lat_offset: f64) -> NewVehiclePosition {
    NewVehiclePosition::test_default(route, vehicle, seconds_ago(10), LAT + lat_offset, LON)
}

#[tokio::test]
async fn test_closest_returns_three_nearest_by_default() {
    let helper = TestHelper::new().await;
    helper
        .add([
            position("M1", "4", 0.004),
            position("M1", "1", 0.001),
            position("M1", "3", 0.003),
            position("M1", "2", 0.002),
        ])
        .await;

    let vehicles = helper.app.closest(point(LAT, LON)).await.unwrap();

    let order: Vec<&str> = vehicles.iter().map(|v| v.vehicle_number.as_str()).collect();
    assert_eq!(order, vec!["1", "2", "3"]);
    assert!(vehicles.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[tokio::test]
async fn test_closest_respects_n_and_ignores_invalid_n() {
    let helper = TestHelper::new().await;
    helper
        .add((1..=5).map(|i| position("M1", &i.to_string(), i as f64 * 0.001)))
        .await;

    let mut params = point(LAT, LON);
    params.n = Some("5".into());
    assert_eq!(helper.app.closest(params).await.unwrap().len(), 5);

    let mut params = point(LAT, LON);
    params.n = Some("abc".into());
    assert_eq!(helper.app.closest(params).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_closest_returns_every_report_of_the_same_vehicle() {
    let helper = TestHelper::new().await;
    let first = position("M1", "1", 0.001);
    let mut second = first.clone();
    second.observed_at = seconds_ago(20);
    helper.add([first, second, position("M1", "2", 0.003)]).await;

    let vehicles = helper.app.closest(point(LAT, LON)).await.unwrap();

    let order: Vec<&str> = vehicles.iter().map(|v| v.vehicle_number.as_str()).collect();
    assert_eq!(order, vec!["1", "1", "2"]);
}

#[tokio::test]
async fn test_unique_closest_returns_one_row_per_vehicle() {
    let helper = TestHelper::new().await;
    let mut older = position("M1", "1", 0.002);
    older.observed_at = seconds_ago(30);
    helper
        .add([
            position("M1", "1", 0.001),
            older,
            position("M1", "2", 0.003),
        ])
        .await;

    let vehicles = helper.app.unique_closest(point(LAT, LON)).await.unwrap();

    let order: Vec<&str> = vehicles.iter().map(|v| v.vehicle_number.as_str()).collect();
    assert_eq!(order, vec!["1", "2"]);
    assert_eq!(vehicles[0].latitude, LAT + 0.001);
}

#[tokio::test]
async fn test_closest_on_empty_store_returns_empty_list() {
    let helper = TestHelper::new().await;

    assert!(helper.app.closest(point(LAT, LON)).await.unwrap().is_empty());
    assert!(
        helper
            .app
            .unique_closest(point(LAT, LON))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_closest_without_coordinates_returns_bad_request() {
    let helper = TestHelper::new().await;

    for params in [
        ClosestParameters::default(),
        ClosestParameters {
            latitude: Some(LAT.to_string()),
            ..Default::default()
        },
        ClosestParameters {
            latitude: Some("north".into()),
            longitude: Some(LON.to_string()),
            n: None,
        },
    ] {
        let error = helper.app.closest(params).await.unwrap_err();
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.error, ApiError::MissingCoordinates);
    }
}

#[tokio::test]
async fn test_unique_closest_with_out_of_range_coordinates_returns_bad_request() {
    let helper = TestHelper::new().await;

    let error = helper.app.unique_closest(point(95.0, LON)).await.unwrap_err();

    assert_eq!(error.status, StatusCode::BAD_REQUEST);
    assert_eq!(error.error, ApiError::InvalidCoordinates);
}

#[tokio::test]
async fn test_failing_store_returns_query_failed_without_details() {
    let helper = TestHelper::new().await;
    helper.store.set_failing(true);

    let error = helper.app.closest(point(LAT, LON)).await.unwrap_err();
    assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error.error, ApiError::QueryFailed);
    assert!(!error.description.contains("unavailable"));

    let error = helper.app.metro_max_speeds().await.unwrap_err();
    assert_eq!(error.error, ApiError::QueryFailed);

    let error = helper.app.average_speed().await.unwrap_err();
    assert_eq!(error.error, ApiError::QueryFailed);
}

#[tokio::test]
async fn test_metro_max_speeds_filters_routes_and_radius() {
    let helper = TestHelper::new().await;
    helper
        .add([
            position("M1", "1", 0.001).with_speed(20.0),
            position("M2", "2", 0.002).with_speed(30.0),
            position("550", "3", 0.001).with_speed(40.0),
            position("M1", "4", 0.05).with_speed(50.0),
        ])
        .await;

    let speeds = helper.app.metro_max_speeds().await.unwrap();

    let rows: Vec<(&str, &str, f64)> = speeds
        .iter()
        .map(|s| (s.route_number.as_str(), s.vehicle_number.as_str(), s.max_speed))
        .collect();
    assert_eq!(rows, vec![("M2", "2", 30.0), ("M1", "1", 20.0)]);

    for speed in &speeds {
        assert!(speed.milliseconds_ago >= 10_000, "{speed:?}");
        assert!(speed.milliseconds_ago < 70_000, "{speed:?}");
        assert!(speed.distance <= 1000.0, "{speed:?}");
    }
}

#[tokio::test]
async fn test_average_speed_per_route() {
    let helper = TestHelper::new().await;
    helper
        .add([
            position("M1", "1", 0.001).with_speed(10.0),
            position("M1", "2", 0.002).with_speed(20.0),
            position("M2", "3", 0.003).with_speed(30.0),
        ])
        .await;

    let speeds = helper.app.average_speed().await.unwrap();

    let rows: Vec<(&str, f64)> = speeds
        .iter()
        .map(|s| (s.route_number.as_str(), s.average_speed))
        .collect();
    assert_eq!(rows, vec![("M1", 15.0), ("M2", 30.0)]);
}
