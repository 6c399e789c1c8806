use std::time::Duration;

use flight_core::trajectory::{sample_count, Circle, Square};
use log::info;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::{
    config::{tick_period, ConfigError, Maneuver},
    error::MissionError,
};

use super::{events::MissionEvent, MissionContext};

/// A fixed frequency ticker. The first tick completes immediately.
/// `name` labels the rate in the error when `hz` has no usable period
pub fn rate(name: &'static str, hz: f32) -> Result<Interval, ConfigError> {
    let period = tick_period(hz).ok_or(ConfigError::NonPositiveRate(name))?;
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Ok(ticker)
}

/// Flies one step of the plan and returns how many setpoints it published
pub async fn fly(ctx: &MissionContext, maneuver: &Maneuver) -> Result<usize, MissionError> {
    match maneuver {
        Maneuver::Circle(circle) => fly_circle(ctx, circle).await,
        Maneuver::Hover(duration) => hover(ctx, *duration).await,
        Maneuver::Square(square) => fly_square(ctx, square).await,
    }
}

pub async fn fly_circle(ctx: &MissionContext, circle: &Circle) -> Result<usize, MissionError> {
    info!(
        "Circle started, radius {} m at {} m for {:?}",
        circle.radius, circle.height, circle.duration
    );
    let mut ticker = rate("publish_rate_hz", ctx.config.publish_rate_hz)?;
    let mut published = 0;
    for waypoint in circle.samples(ctx.config.publish_rate_hz) {
        ticker.tick().await;
        ctx.commands.move_to(&waypoint).await?;
        published += 1;
    }
    info!("Circle complete");
    Ok(published)
}

/// Station keeping on the pose cached when the hover starts.
/// The cached orientation is held too, so the heading does not change
pub async fn hover(ctx: &MissionContext, duration: Duration) -> Result<usize, MissionError> {
    let hold = ctx.telemetry.pose();
    info!("Hovering at {:?} for {:?}", hold.position, duration);
    let mut ticker = rate("publish_rate_hz", ctx.config.publish_rate_hz)?;
    let count = sample_count(duration, ctx.config.publish_rate_hz);
    for _ in 0..count {
        ticker.tick().await;
        ctx.commands.publish(hold).await?;
    }
    Ok(count)
}

/// Each corner is held for a fixed time whether or not the vehicle got there
pub async fn fly_square(ctx: &MissionContext, square: &Square) -> Result<usize, MissionError> {
    info!("Square started, side {} m at {} m", square.side, square.height);
    let mut ticker = rate("publish_rate_hz", ctx.config.publish_rate_hz)?;
    let hold = square.hold_samples(ctx.config.publish_rate_hz);
    let mut published = 0;
    for (index, waypoint) in square.waypoints().iter().enumerate() {
        ctx.emit(MissionEvent::Waypoint {
            index,
            waypoint: *waypoint,
        });
        for _ in 0..hold {
            ticker.tick().await;
            ctx.commands.move_to(waypoint).await?;
            published += 1;
        }
    }
    info!("Square complete");
    Ok(published)
}
