mod common;

use std::f32::consts::TAU;

use common::{connected, runner, MockAutopilot, Response};
use drone_gcs::{
    config::{tick_period, ConfigError, MissionConfig},
    error::{LinkError, MissionError},
    messages::{Command, VehicleMessage},
    mission::{events::MissionEvent, maneuvers, MissionContext},
    telemetry::TelemetryFeed,
};
use flight_core::{
    trajectory::{Circle, Square},
    MissionStage, Pose, Waypoint,
};
use glam::Vec3;
use tokio::time::{sleep, Duration, Instant};

#[tokio::test(start_paused = true)]
async fn connection_timeout_fails_without_commands(){
    let mock = MockAutopilot::new();
    let (mut runner, _feed) = runner(MissionConfig::default(), &mock);
    let start = Instant::now();

    let result = runner.run().await;

    assert!(matches!(result, Err(MissionError::ConnectionTimeout(_))));
    assert!(start.elapsed() >= Duration::from_secs(10));
    assert_eq!(runner.stage(), MissionStage::Failed);
    assert_eq!(runner.history(), &[MissionStage::Connecting, MissionStage::Failed]);
    assert!(mock.calls().is_empty());
    assert!(mock.setpoints().is_empty());
}

#[tokio::test(start_paused = true)]
async fn late_connection_is_accepted(){
    let mock = MockAutopilot::new();
    let (mut runner, feed) = runner(MissionConfig::default(), &mock);
    tokio::spawn(async move{
        sleep(Duration::from_secs(4)).await;
        feed.push(&connected("MANUAL"));
    });

    assert!(runner.run().await.is_ok());
    assert_eq!(runner.stage(), MissionStage::Disarmed);
}

#[tokio::test(start_paused = true)]
async fn rejected_mode_skips_arming(){
    let mock = MockAutopilot::new();
    mock.respond("set_mode", Response::Reject);
    let (mut runner, feed) = runner(MissionConfig::default(), &mock);
    feed.push(&connected("MANUAL"));

    let result = runner.run().await;

    assert!(matches!(result, Err(MissionError::CommandRejected(Command::SetMode(_)))));
    assert_eq!(mock.calls(), vec![Command::SetMode("OFFBOARD".into())]);
    assert_eq!(mock.setpoints().len(), 100);
    assert_eq!(
        runner.history(),
        &[MissionStage::Connecting, MissionStage::SettingMode, MissionStage::Failed]
    );
}

#[tokio::test(start_paused = true)]
async fn priming_streams_hold_position(){
    let mock = MockAutopilot::new();
    mock.respond("set_mode", Response::Reject);
    let (mut runner, feed) = runner(MissionConfig::default(), &mock);
    feed.push(&connected("MANUAL"));
    feed.push(&VehicleMessage::Pose(Waypoint::new(1.0, -2.0, 0.5, 45.0).to_pose()));

    let _ = runner.run().await;

    for setpoint in mock.setpoints(){
        assert_eq!(setpoint, Pose::hold(Vec3::new(1.0, -2.0, 0.5)));
    }
}

#[tokio::test(start_paused = true)]
async fn full_mission_sequence(){
    let mock = MockAutopilot::new();
    let (mut runner, feed) = runner(MissionConfig::default(), &mock);
    let mut events = runner.context().events.subscribe();
    feed.push(&connected("MANUAL"));

    assert!(runner.run().await.is_ok());

    assert_eq!(
        runner.history(),
        &[
            MissionStage::Connecting,
            MissionStage::SettingMode,
            MissionStage::Arming,
            MissionStage::TakingOff,
            MissionStage::Circling,
            MissionStage::Hovering,
            MissionStage::Squaring,
            MissionStage::Hovering,
            MissionStage::Landing,
            MissionStage::Disarmed,
        ]
    );
    assert_eq!(
        mock.calls(),
        vec![
            Command::SetMode("OFFBOARD".into()),
            Command::Arm(true),
            Command::Takeoff { altitude: 3.0 },
            Command::Land,
            Command::Arm(false),
        ]
    );
    // priming + circle + hover + square + hover
    assert_eq!(mock.setpoints().len(), 100 + 900 + 90 + 750 + 60);

    let mut waypoints = 0;
    let mut completed = false;
    while let Ok(event) = events.try_recv(){
        match event{
            MissionEvent::Waypoint { .. } => waypoints += 1,
            MissionEvent::Completed => completed = true,
            _ => {}
        }
    }
    assert_eq!(waypoints, 5);
    assert!(completed);
}

#[tokio::test(start_paused = true)]
async fn priming_skipped_when_already_offboard(){
    let mock = MockAutopilot::new();
    let (mut runner, feed) = runner(MissionConfig::default(), &mock);
    feed.push(&connected("OFFBOARD"));

    assert!(runner.run().await.is_ok());
    assert_eq!(mock.setpoints().len(), 900 + 90 + 750 + 60);
}

#[tokio::test(start_paused = true)]
async fn takeoff_fault_aborts_before_landing(){
    let mock = MockAutopilot::new();
    mock.respond("takeoff", Response::Fault);
    let (mut runner, feed) = runner(MissionConfig::default(), &mock);
    feed.push(&connected("MANUAL"));

    let result = runner.run().await;

    assert!(matches!(
        result,
        Err(MissionError::TransportFault{command: Some(Command::Takeoff{..}), source: LinkError::Closed})
    ));
    assert_eq!(mock.calls().len(), 3);
    assert!(!mock.calls().contains(&Command::Land));
    assert_eq!(runner.history().last(), Some(&MissionStage::Failed));
    assert_eq!(runner.history()[runner.history().len() - 2], MissionStage::TakingOff);
}

#[tokio::test(start_paused = true)]
async fn rejected_arm_aborts(){
    let mock = MockAutopilot::new();
    mock.respond("arm", Response::Reject);
    let (mut runner, feed) = runner(MissionConfig::default(), &mock);
    feed.push(&connected("MANUAL"));

    assert!(matches!(runner.run().await, Err(MissionError::CommandRejected(Command::Arm(true)))));
    assert_eq!(mock.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn disarm_failure_still_ends_disarmed(){
    let mock = MockAutopilot::new();
    mock.respond("disarm", Response::Reject);
    let (mut runner, feed) = runner(MissionConfig::default(), &mock);
    feed.push(&connected("MANUAL"));

    assert!(runner.run().await.is_ok());
    assert_eq!(runner.stage(), MissionStage::Disarmed);
    assert_eq!(mock.calls().last(), Some(&Command::Arm(false)));
}

#[tokio::test(start_paused = true)]
async fn invalid_rate_is_rejected(){
    let mock = MockAutopilot::new();
    let config = MissionConfig{
        publish_rate_hz: 0.0,
        ..Default::default()
    };
    let (mut runner, feed) = runner(config, &mock);
    feed.push(&connected("MANUAL"));

    assert!(matches!(runner.run().await, Err(MissionError::Config(_))));
    assert_eq!(runner.stage(), MissionStage::Failed);
    assert!(mock.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn rate_without_usable_period_is_rejected(){
    // 1e10 Hz rounds to a zero period, 1e-40 Hz overflows one
    let configs = [
        MissionConfig{publish_rate_hz: 1e10, ..Default::default()},
        MissionConfig{publish_rate_hz: 1e-40, ..Default::default()},
        MissionConfig{connection_poll_hz: 1e10, ..Default::default()},
        MissionConfig{priming_rate_hz: 1e-40, ..Default::default()},
    ];
    for config in configs{
        let mock = MockAutopilot::new();
        let (mut runner, feed) = runner(config, &mock);
        feed.push(&connected("MANUAL"));

        assert!(matches!(runner.run().await, Err(MissionError::Config(ConfigError::NonPositiveRate(_)))));
        assert_eq!(runner.stage(), MissionStage::Failed);
        assert!(mock.calls().is_empty());
    }
}

#[test]
pub fn tick_periods(){
    assert_eq!(tick_period(4.0), Some(Duration::from_millis(250)));
    assert_eq!(tick_period(0.0), None);
    assert_eq!(tick_period(-5.0), None);
    assert_eq!(tick_period(f32::NAN), None);
    assert_eq!(tick_period(1e10), None);
    assert_eq!(tick_period(1e-40), None);
    assert!(matches!(
        maneuvers::rate("publish_rate_hz", 1e10),
        Err(ConfigError::NonPositiveRate("publish_rate_hz"))
    ));
}

#[tokio::test(start_paused = true)]
async fn setpoint_fault_aborts_mission(){
    let mock = MockAutopilot::new();
    mock.respond("setpoint", Response::Fault);
    let (mut runner, feed) = runner(MissionConfig::default(), &mock);
    feed.push(&connected("MANUAL"));

    let result = runner.run().await;

    assert!(matches!(result, Err(MissionError::TransportFault{command: None, ..})));
    assert!(mock.calls().is_empty());
    assert_eq!(
        runner.history(),
        &[MissionStage::Connecting, MissionStage::SettingMode, MissionStage::Failed]
    );
}

#[tokio::test(start_paused = true)]
async fn circle_publishes_every_sample(){
    let mock = MockAutopilot::new();
    let (_feed, cache) = TelemetryFeed::channel();
    let ctx = MissionContext::new(MissionConfig::default(), mock.clone(), cache);
    let circle = Circle::new(5.0, 3.0, Duration::from_secs(30));
    let start = Instant::now();

    let published = maneuvers::fly_circle(&ctx, &circle).await.unwrap();

    assert_eq!(published, 900);
    let setpoints = mock.setpoints();
    assert_eq!(setpoints.len(), 900);
    for (i, setpoint) in setpoints.iter().enumerate(){
        let angle = i as f32 / 900.0 * TAU;
        let expected = Waypoint::new(5.0 * angle.cos(), 5.0 * angle.sin(), 3.0, angle.to_degrees()).to_pose();
        assert!((setpoint.position - expected.position).length() < 1e-4);
        assert!((setpoint.position.truncate().length() - 5.0).abs() < 1e-4);
        assert_eq!(setpoint.position.z, 3.0);
    }
    // 900 ticks at 30 Hz, the first one immediate
    assert!(start.elapsed() >= Duration::from_millis(29_900));
    assert!(start.elapsed() < Duration::from_secs(31));
}

#[tokio::test(start_paused = true)]
async fn hover_holds_cached_pose(){
    let mock = MockAutopilot::new();
    let (feed, cache) = TelemetryFeed::channel();
    let held = Waypoint::new(1.0, 2.0, 3.0, 30.0).to_pose();
    feed.push(&VehicleMessage::Pose(held));
    let ctx = MissionContext::new(MissionConfig::default(), mock.clone(), cache);

    tokio::spawn(async move{
        sleep(Duration::from_secs(1)).await;
        feed.push(&VehicleMessage::Pose(Pose::hold(Vec3::new(9.0, 9.0, 9.0))));
    });

    let published = maneuvers::hover(&ctx, Duration::from_secs(3)).await.unwrap();

    assert_eq!(published, 90);
    assert!(mock.setpoints().iter().all(|setpoint| *setpoint == held));
    assert_eq!(ctx.telemetry.pose().position, Vec3::new(9.0, 9.0, 9.0));
}

#[tokio::test(start_paused = true)]
async fn square_visits_corners_in_order(){
    let mock = MockAutopilot::new();
    let (_feed, cache) = TelemetryFeed::channel();
    let ctx = MissionContext::new(MissionConfig::default(), mock.clone(), cache);
    let square = Square::new(4.0, 3.0, Duration::from_secs(5));

    let published = maneuvers::fly_square(&ctx, &square).await.unwrap();

    assert_eq!(published, 750);
    let setpoints = mock.setpoints();
    for (corner, waypoint) in square.waypoints().iter().enumerate(){
        let chunk = &setpoints[corner * 150..(corner + 1) * 150];
        assert!(chunk.iter().all(|setpoint| *setpoint == waypoint.to_pose()));
    }
    assert_eq!(setpoints.first(), setpoints.last());
}
