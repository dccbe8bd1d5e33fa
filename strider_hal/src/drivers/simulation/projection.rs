//! Position projection for the simulated motor.
//!
//! Integrates the commanded rate over elapsed time from the last committed
//! encoder position, then clamps the result in a fixed order:
//!
//! | Order | Clamp          | Effect                                        |
//! |-------|----------------|-----------------------------------------------|
//! | 1     | target         | command complete                              |
//! | 2     | soft limit     | command complete                              |
//! | 3     | hard limit     | command complete, encoder zeroed if wired so  |
//! | 4     | physical limit | command complete, simulated mechanical damage |
//!
//! Every clamp that fires overrides the previous one, so the result is the
//! most restrictive position along the direction of travel. A limit the
//! motor already sits on or beyond holds it at `from`; a step never moves
//! against the direction of travel.

use strider_common::motor::{Direction, LimitKind, MotorLimits, is_limit_reached};
use strider_common::uom::{Length, Rate, Time};

/// Re-entrancy guard for a projection in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionPhase {
    /// No projection running; reads may start one.
    #[default]
    Idle,
    /// A projection is computing; reads return the committed position.
    Projecting,
}

/// Why a projection stopped the motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionStop {
    /// The commanded target position was reached.
    Target,
    /// A limit was reached.
    Limit(LimitKind),
}

/// One projection step's inputs.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionInput<'a> {
    /// Last committed encoder position.
    pub from: &'a Length,
    /// Rate magnitude.
    pub rate: &'a Rate,
    pub direction: Direction,
    pub elapsed: &'a Time,
    /// Absolute target for position moves.
    pub target: Option<&'a Length>,
    pub limits: &'a MotorLimits,
}

/// One projection step's result.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// New encoder position, in the unit of `from`.
    pub position: Length,
    pub stop: Option<ProjectionStop>,
    /// A hard limit wired to the sensor's zero pin was hit.
    pub zero_encoder: bool,
}

/// Integrate and clamp one step.
pub fn project(input: ProjectionInput<'_>) -> Projection {
    let ProjectionInput {
        from,
        rate,
        direction,
        elapsed,
        target,
        limits,
    } = input;
    let unit = from.unit();
    let travel = rate.to_length(elapsed).abs() * direction.sign();
    let mut position = from + &travel;
    let mut stop = None;

    let mut clamp = |limit: &Length, reason: ProjectionStop, position: &mut Length| {
        if is_limit_reached(direction, limit, from) {
            *position = from.clone();
            stop = Some(reason);
        } else if is_limit_reached(direction, limit, position) {
            *position = limit.convert_to(unit);
            stop = Some(reason);
        }
    };

    if let Some(target) = target {
        clamp(target, ProjectionStop::Target, &mut position);
    }
    let bounds = limits.in_direction(direction);
    if let Some(soft) = &bounds.soft {
        clamp(soft, ProjectionStop::Limit(LimitKind::Soft), &mut position);
    }
    if let Some(hard) = bounds.hard_position() {
        clamp(hard, ProjectionStop::Limit(LimitKind::Hard), &mut position);
    }
    clamp(
        &bounds.physical,
        ProjectionStop::Limit(LimitKind::Physical),
        &mut position,
    );

    let zero_encoder =
        stop == Some(ProjectionStop::Limit(LimitKind::Hard)) && bounds.hard_resets_encoder();
    if zero_encoder {
        position = Length::zero(unit.clone());
    }

    Projection {
        position,
        stop,
        zero_encoder,
    }
}
