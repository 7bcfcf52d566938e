use chrono::{DateTime, Duration, TimeZone, Utc};
use hfp_core::{
    ClosestVehiclesQuery, Coordinates, METRO_REFERENCE_LATITUDE, METRO_REFERENCE_LONGITUDE,
    MaxSpeedQuery, NewVehiclePosition, RouteId, SpatialError, SpatialQueryEngine,
    VehiclePositionInbound, test_helper::InMemoryStore,
};

const LAT: f64 = 60.1699;
const LON: f64 = 24.9384;
const LAT_PARAM: &str = "60.1699";
const LON_PARAM: &str = "24.9384";

fn start() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

async fn engine_with(positions: &[NewVehiclePosition]) -> SpatialQueryEngine<InMemoryStore> {
    let store = InMemoryStore::new();
    for p in positions {
        store.add_vehicle_position(p).await.unwrap();
    }
    SpatialQueryEngine::new(store)
}

fn query(n: &str) -> ClosestVehiclesQuery {
    ClosestVehiclesQuery::from_params(Some(LAT_PARAM), Some(LON_PARAM), Some(n)).unwrap()
}

/// Positions north of the query point, `offset` in thousandths of a degree of latitude.
fn north(route: &str, vehicle: &str, offset: u32, seconds: i64) -> NewVehiclePosition {
    NewVehiclePosition::test_default(
        route,
        vehicle,
        start() + Duration::seconds(seconds),
        LAT + offset as f64 / 1000.0,
        LON,
    )
}

#[tokio::test]
async fn test_closest_returns_nearest_first_and_at_most_n() {
    let engine = engine_with(&[
        north("550", "10", 5, 0),
        north("550", "11", 1, 0),
        north("4", "12", 3, 0),
        north("4", "13", 9, 0),
    ])
    .await;

    let vehicles = engine.closest(&query("3")).await.unwrap();

    let ids: Vec<&str> = vehicles
        .iter()
        .map(|v| v.position.vehicle_id.as_str())
        .collect();
    assert_eq!(ids, vec!["11", "12", "10"]);
    assert!(vehicles.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[tokio::test]
async fn test_closest_allows_the_same_vehicle_more_than_once() {
    let engine = engine_with(&[
        north("550", "10", 1, 0),
        north("550", "10", 2, 1),
        north("550", "20", 3, 0),
    ])
    .await;

    let vehicles = engine.closest(&query("3")).await.unwrap();

    let ids: Vec<&str> = vehicles
        .iter()
        .map(|v| v.position.vehicle_id.as_str())
        .collect();
    assert_eq!(ids, vec!["10", "10", "20"]);
}

#[tokio::test]
async fn test_unique_closest_keeps_nearest_observation_per_vehicle() {
    let engine = engine_with(&[
        north("550", "10", 1, 0),
        north("550", "10", 4, 1),
        north("550", "20", 2, 0),
        north("550", "20", 3, 1),
        north("4", "30", 5, 0),
    ])
    .await;

    let vehicles = engine.unique_closest(&query("10")).await.unwrap();

    let rows: Vec<(&str, DateTime<Utc>)> = vehicles
        .iter()
        .map(|v| (v.position.vehicle_id.as_str(), v.position.observed_at))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("10", start()),
            ("20", start()),
            ("30", start()),
        ]
    );
}

#[tokio::test]
async fn test_unique_closest_is_a_subset_of_closest_without_limit() {
    let engine = engine_with(&[
        north("550", "10", 1, 0),
        north("550", "10", 4, 1),
        north("550", "20", 2, 0),
        north("550", "30", 3, 0),
    ])
    .await;

    let all = engine.closest(&query("1000")).await.unwrap();
    let unique = engine.unique_closest(&query("1000")).await.unwrap();

    assert_eq!(unique.len(), 3);
    assert!(unique.iter().all(|u| all.contains(u)));
}

#[tokio::test]
async fn test_limit_defaults_to_three_when_absent() {
    let positions: Vec<_> = (1..=5)
        .map(|i| north("550", &i.to_string(), i, 0))
        .collect();
    let engine = engine_with(&positions).await;

    let query = ClosestVehiclesQuery::from_params(Some(LAT_PARAM), Some(LON_PARAM), None).unwrap();

    assert_eq!(engine.closest(&query).await.unwrap().len(), 3);
    assert_eq!(engine.unique_closest(&query).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_equal_distances_are_ordered_by_vehicle_then_newest() {
    let engine = engine_with(&[
        north("550", "b", 2, 0),
        north("550", "a", 2, 0),
        north("550", "a", 2, 5),
    ])
    .await;

    let vehicles = engine.closest(&query("3")).await.unwrap();

    let rows: Vec<(&str, DateTime<Utc>)> = vehicles
        .iter()
        .map(|v| (v.position.vehicle_id.as_str(), v.position.observed_at))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("a", start() + Duration::seconds(5)),
            ("a", start()),
            ("b", start()),
        ]
    );
}

#[tokio::test]
async fn test_repeated_queries_without_writes_return_the_same_result() {
    let engine = engine_with(&[
        north("550", "10", 1, 0),
        north("550", "20", 1, 0),
        north("4", "30", 7, 0),
    ])
    .await;

    let first = engine.closest(&query("3")).await.unwrap();
    let second = engine.closest(&query("3")).await.unwrap();
    assert_eq!(first, second);

    let first = engine.unique_closest(&query("3")).await.unwrap();
    let second = engine.unique_closest(&query("3")).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_closest_on_empty_store_is_empty() {
    let engine = engine_with(&[]).await;
    assert!(engine.closest(&query("3")).await.unwrap().is_empty());
    assert!(engine.unique_closest(&query("3")).await.unwrap().is_empty());
}

fn near_metro_point(
    route: &str,
    vehicle: &str,
    offset: f64,
    observed_at: DateTime<Utc>,
    speed: f64,
) -> NewVehiclePosition {
    NewVehiclePosition::test_default(
        route,
        vehicle,
        observed_at,
        METRO_REFERENCE_LATITUDE + offset,
        METRO_REFERENCE_LONGITUDE,
    )
    .with_speed(speed)
}

#[tokio::test]
async fn test_metro_max_speeds_reports_age_relative_to_evaluation() {
    let observed_at = start();
    let engine = engine_with(&[near_metro_point("M1", "1", 0.0045, observed_at, 20.0)]).await;

    let speeds = engine
        .metro_max_speeds(observed_at + Duration::seconds(10))
        .await
        .unwrap();

    assert_eq!(speeds.len(), 1);
    assert_eq!(speeds[0].route_id, RouteId::new("M1").unwrap());
    assert_eq!(speeds[0].milliseconds_ago, 10_000);
    assert_eq!(speeds[0].max_speed, 20.0);
    assert!((speeds[0].distance - 500.0).abs() < 5.0);
}

#[tokio::test]
async fn test_metro_max_speeds_filters_by_route_and_radius() {
    let at = start();
    let engine = engine_with(&[
        near_metro_point("M1", "1", 0.001, at, 10.0),
        near_metro_point("M2", "2", 0.002, at, 30.0),
        near_metro_point("550", "3", 0.001, at, 50.0),
        near_metro_point("M1", "4", 0.018, at, 40.0),
    ])
    .await;

    let speeds = engine.metro_max_speeds(at).await.unwrap();

    let rows: Vec<(&str, &str, f64)> = speeds
        .iter()
        .map(|s| (s.route_id.as_str(), s.vehicle_id.as_str(), s.max_speed))
        .collect();
    assert_eq!(rows, vec![("M2", "2", 30.0), ("M1", "1", 10.0)]);
    assert!(speeds.iter().all(|s| s.distance <= 1000.0));
}

#[tokio::test]
async fn test_max_speeds_near_arbitrary_point() {
    let at = start();
    let engine = engine_with(&[north("4", "1", 1, 0), north("4", "2", 30, 0)]).await;

    let query = MaxSpeedQuery {
        point: Coordinates::new(LAT, LON).unwrap(),
        radius_meters: 500.0,
        routes: vec![RouteId::new("4").unwrap()],
        evaluated_at: at,
    };

    let speeds = engine.max_speeds_near_point(&query).await.unwrap();
    assert_eq!(speeds.len(), 1);
    assert_eq!(speeds[0].vehicle_id.as_str(), "1");
    assert_eq!(speeds[0].milliseconds_ago, 0);
}

#[tokio::test]
async fn test_average_speed_per_route() {
    let engine = engine_with(&[
        north("550", "1", 1, 0).with_speed(10.0),
        north("550", "2", 1, 0).with_speed(20.0),
        north("4", "3", 1, 0).with_speed(5.0),
    ])
    .await;

    let speeds = engine.average_speed_per_route().await.unwrap();

    let rows: Vec<(&str, f64)> = speeds
        .iter()
        .map(|s| (s.route_id.as_str(), s.average_speed))
        .collect();
    assert_eq!(rows, vec![("4", 5.0), ("550", 15.0)]);
}

#[tokio::test]
async fn test_store_faults_are_reported_as_query_failed() {
    let engine = engine_with(&[north("550", "1", 1, 0)]).await;
    engine.store().set_failing(true);

    assert!(matches!(
        engine.closest(&query("3")).await.unwrap_err(),
        SpatialError::QueryFailed { .. }
    ));
    assert!(matches!(
        engine.unique_closest(&query("3")).await.unwrap_err(),
        SpatialError::QueryFailed { .. }
    ));
    assert!(matches!(
        engine.metro_max_speeds(start()).await.unwrap_err(),
        SpatialError::QueryFailed { .. }
    ));
    assert!(matches!(
        engine.average_speed_per_route().await.unwrap_err(),
        SpatialError::QueryFailed { .. }
    ));
}
