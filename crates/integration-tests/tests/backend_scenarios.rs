//! Full-stack race scenarios over HTTP.
//!
//! A short track keeps the real-time animation waits around a second; the
//! exact-duration assertions live in the core crate's paused-clock suite.

use std::sync::Arc;

use anyhow::{Context, Result};
use asyncrace_api::{
    ApiConfig, GarageClient, HttpEngineClient, HttpWinnersClient, VehicleId, Vehicle,
};
use asyncrace_core::{
    NO_FINISHER_BANNER, RaceConfig, RaceCoordinator, RaceMode, RaceSession, SessionMode,
    VehicleRegistry, WinnerLedger,
};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 100 px of free track, so a 600 px server distance clamps to a ~1 s run.
fn short_track() -> RaceConfig {
    RaceConfig {
        track_length: 148.0,
        car_width: 40.0,
        lane_margin: 8.0,
        ..RaceConfig::default()
    }
}

fn car(id: u64, name: &str, color: &str) -> Vehicle {
    Vehicle {
        id: VehicleId(id),
        name: name.to_string(),
        color: color.to_string(),
    }
}

struct Stack {
    coordinator: RaceCoordinator,
}

fn stack(server: &MockServer, config: RaceConfig) -> Result<Stack> {
    let api = ApiConfig::new(server.uri());
    let engine = Arc::new(HttpEngineClient::new(&api)?);
    let winners = Arc::new(HttpWinnersClient::new(&api)?);
    let coordinator = RaceCoordinator::new(
        engine,
        WinnerLedger::new(winners),
        RaceSession::new(),
        config,
    );
    Ok(Stack { coordinator })
}

async fn mount_engine_start(server: &MockServer, id: u64, velocity: f64, distance: f64) {
    Mock::given(method("PATCH"))
        .and(path("/engine"))
        .and(query_param("id", id.to_string()))
        .and(query_param("status", "started"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "velocity": velocity,
            "distance": distance,
            "id": id,
        })))
        .mount(server)
        .await;
}

async fn mount_drive(server: &MockServer, id: u64, status: u16) {
    Mock::given(method("PATCH"))
        .and(path("/engine"))
        .and(query_param("id", id.to_string()))
        .and(query_param("status", "drive"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

async fn mount_stop(server: &MockServer) {
    Mock::given(method("PATCH"))
        .and(path("/engine"))
        .and(query_param("status", "stopped"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

#[tokio::test]
async fn a_full_race_crowns_the_fast_car_and_records_its_first_win() -> Result<()> {
    let server = MockServer::start().await;
    mount_engine_start(&server, 1, 100.0, 600.0).await;
    mount_engine_start(&server, 2, 120.0, 600.0).await;
    mount_engine_start(&server, 3, 90.0, 600.0).await;
    // Only car 2 survives its drive call.
    mount_drive(&server, 1, 500).await;
    mount_drive(&server, 2, 200).await;
    mount_drive(&server, 3, 500).await;

    // First win: the read 404s, then the record is created.
    Mock::given(method("GET"))
        .and(path("/winners/2"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/winners"))
        .and(body_partial_json(serde_json::json!({ "id": 2, "wins": 1 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "id": 2, "wins": 1, "time": 833.3,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let stack = stack(&server, short_track())?;
    let grid = vec![
        car(1, "Ford Mustang", "#ff0000"),
        car(2, "Tesla Model S", "#00ff00"),
        car(3, "Kia Sportage", "#0000ff"),
    ];

    let mut handle = stack.coordinator.run(&grid, RaceMode::FullGrid)?;
    let outcome = handle.wait().await.context("race did not resolve")?;

    let winner = outcome.winner.context("expected a winner")?;
    assert_eq!(winner.id, VehicleId(2));
    // 100 px of track at 120 px/s.
    assert!((winner.elapsed_ms - 833.333).abs() < 50.0, "elapsed {}", winner.elapsed_ms);
    assert_eq!(outcome.banner.as_deref(), Some("Car #2 wins in 0.83 s"));

    let snapshot = stack.coordinator.session().snapshot();
    assert_eq!(snapshot.mode, SessionMode::Finished);
    assert_eq!(snapshot.failed.len(), 2);
    Ok(())
}

#[tokio::test]
async fn a_repeat_win_bumps_the_count_and_keeps_the_best_time() -> Result<()> {
    let server = MockServer::start().await;
    mount_engine_start(&server, 2, 120.0, 600.0).await;
    mount_drive(&server, 2, 200).await;

    Mock::given(method("GET"))
        .and(path("/winners/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 2, "wins": 1, "time": 500.0,
        })))
        .expect(1)
        .mount(&server)
        .await;
    // The new ~833 ms run is slower than the stored 500 ms best.
    Mock::given(method("PUT"))
        .and(path("/winners/2"))
        .and(body_partial_json(serde_json::json!({ "wins": 2, "time": 500.0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 2, "wins": 2, "time": 500.0,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let stack = stack(&server, short_track())?;
    let mut handle = stack
        .coordinator
        .run(&[car(2, "Tesla Model S", "#00ff00")], RaceMode::FullGrid)?;
    let outcome = handle.wait().await.context("race did not resolve")?;
    assert_eq!(outcome.winner.map(|w| w.id), Some(VehicleId(2)));
    Ok(())
}

#[tokio::test]
async fn a_lone_breakdown_writes_nothing_to_the_ledger() -> Result<()> {
    let server = MockServer::start().await;
    mount_engine_start(&server, 1, 110.0, 600.0).await;
    mount_drive(&server, 1, 500).await;

    // No winner, no ledger traffic at all.
    Mock::given(method("GET"))
        .and(path("/winners/1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(0)
        .mount(&server)
        .await;

    let stack = stack(&server, short_track())?;
    let mut handle = stack
        .coordinator
        .run(&[car(1, "Honda Civic", "#aabbcc")], RaceMode::FullGrid)?;
    let outcome = handle.wait().await.context("race did not resolve")?;

    assert!(outcome.winner.is_none());
    assert_eq!(outcome.banner.as_deref(), Some(NO_FINISHER_BANNER));
    Ok(())
}

#[tokio::test]
async fn an_unreachable_engine_withdraws_the_whole_grid() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/engine"))
        .and(query_param("status", "started"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let stack = stack(&server, short_track())?;
    let grid = vec![car(1, "Audi A4", "#101010"), car(2, "BMW X5", "#202020")];
    let mut handle = stack.coordinator.run(&grid, RaceMode::FullGrid)?;
    let outcome = handle.wait().await.context("race did not resolve")?;

    assert!(outcome.winner.is_none());
    assert!(outcome.results.iter().all(|r| !r.is_finished()));
    let snapshot = stack.coordinator.session().snapshot();
    assert_eq!(snapshot.failed.len(), 2);
    Ok(())
}

#[tokio::test]
async fn cancelling_fires_best_effort_stops_over_http() -> Result<()> {
    let server = MockServer::start().await;
    mount_engine_start(&server, 1, 80.0, 600.0).await;
    // The drive call never answers inside this test's lifetime.
    Mock::given(method("PATCH"))
        .and(path("/engine"))
        .and(query_param("status", "drive"))
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(60)))
        .mount(&server)
        .await;
    mount_stop(&server).await;

    let stack = stack(&server, short_track())?;
    let mut handle = stack
        .coordinator
        .run(&[car(1, "Nissan Leaf", "#334455")], RaceMode::FullGrid)?;

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    handle.cancel();
    let outcome = handle.wait().await.context("race did not resolve")?;
    assert!(outcome.cancelled);
    assert_eq!(stack.coordinator.session().mode(), SessionMode::Idle);

    // The teardown stop is fire-and-forget; give it a beat to land.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    let stops = server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.query().unwrap_or("").contains("status=stopped"))
        .count();
    assert_eq!(stops, 1);
    Ok(())
}

#[tokio::test]
async fn deleting_a_vehicle_cascades_to_its_winner_record() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/garage/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": 5 })))
        .expect(1)
        .mount(&server)
        .await;
    // The car never won; the cascade tolerates the 404.
    Mock::given(method("DELETE"))
        .and(path("/winners/5"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/garage"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([]))
                .insert_header("X-Total-Count", "0"),
        )
        .mount(&server)
        .await;

    let api = ApiConfig::new(server.uri());
    let registry = VehicleRegistry::new(
        GarageClient::new(&api)?,
        WinnerLedger::new(Arc::new(HttpWinnersClient::new(&api)?)),
        RaceSession::new(),
        7,
    );
    registry.delete(VehicleId(5)).await?;
    Ok(())
}

#[tokio::test]
async fn invalid_vehicle_input_never_reaches_the_backend() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/garage"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let api = ApiConfig::new(server.uri());
    let registry = VehicleRegistry::new(
        GarageClient::new(&api)?,
        WinnerLedger::new(Arc::new(HttpWinnersClient::new(&api)?)),
        RaceSession::new(),
        7,
    );

    assert!(registry.create("   ", "#ff0000").await.is_err());
    assert!(registry.create("Okay Name", "teal").await.is_err());
    assert!(
        registry
            .create("a name far too long for the garage", "#ff0000")
            .await
            .is_err()
    );
    Ok(())
}

#[tokio::test]
async fn the_garage_is_locked_while_a_race_runs() -> Result<()> {
    let server = MockServer::start().await;
    mount_engine_start(&server, 1, 80.0, 600.0).await;
    mount_drive(&server, 1, 200).await;
    mount_stop(&server).await;
    Mock::given(method("DELETE"))
        .and(path("/garage/1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api = ApiConfig::new(server.uri());
    let session = RaceSession::new();
    let stack_coordinator = RaceCoordinator::new(
        Arc::new(HttpEngineClient::new(&api)?),
        WinnerLedger::new(Arc::new(HttpWinnersClient::new(&api)?)),
        session.clone(),
        short_track(),
    );
    let registry = VehicleRegistry::new(
        GarageClient::new(&api)?,
        WinnerLedger::new(Arc::new(HttpWinnersClient::new(&api)?)),
        session,
        7,
    );

    let mut handle = stack_coordinator.run(&[car(1, "Volvo XC90", "#556677")], RaceMode::SingleCar)?;
    let locked = registry.delete(VehicleId(1)).await;
    assert!(locked.is_err());

    handle.wait().await.context("race did not resolve")?;
    Ok(())
}
