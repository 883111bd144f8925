//! Gesture parameter computation.
//!
//! Everything here is pure: callers fetch display sizes and element bounds
//! from the platform and pass them in, then hand the resulting
//! [`GestureVector`] back to the platform.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::geometry::{Point, Rect, Size};

/// Flick speeds are clamped to this magnitude before computing step counts.
pub const MAX_FLICK_SPEED: f64 = 1250.0;

/// Normalised start point of a flick that does not target an element.
pub const DEFAULT_FLICK_START: Point = Point::new(0.5, 0.5);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GestureError {
    #[error("Flick speed must be a finite, non-zero value (got {0})")]
    InvalidSpeed(f64),
    #[error("Gesture step count must be at least 1")]
    InvalidSteps,
    #[error("Coordinate {point} is outside of element rect: {rect}")]
    InvalidCoordinates { point: Point, rect: String },
    #[error("Invalid pinch direction '{0}', expected 'in' or 'out'")]
    InvalidDirection(String),
}

/// A single-pointer motion in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureVector {
    pub start: Point,
    pub end: Point,
    pub steps: u32,
}

impl fmt::Display for GestureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} in {} steps",
            self.start, self.end, self.steps
        )
    }
}

/// Steps for a flick at `speed`: `1250 / speed + 1`, sign dropped.
///
/// A negative keyed speed can cancel the `+ 1` out entirely, so the result is
/// floored at one step.
pub fn steps_for_speed(speed: f64) -> Result<u32, GestureError> {
    if speed == 0.0 || !speed.is_finite() {
        return Err(GestureError::InvalidSpeed(speed));
    }
    let steps = (MAX_FLICK_SPEED / speed + 1.0).abs();
    Ok((steps as u32).max(1))
}

/// Step count of a device flick with the given speed components.
pub fn flick_steps(x_speed: f64, y_speed: f64) -> Result<u32, GestureError> {
    let magnitude = x_speed.hypot(y_speed);
    if magnitude == 0.0 || !magnitude.is_finite() {
        return Err(GestureError::InvalidSpeed(magnitude));
    }
    steps_for_speed(magnitude.min(MAX_FLICK_SPEED))
}

/// End point of a device flick starting at `start`.
///
/// The travelled distance is a quarter of the display's shorter side, split
/// between the axes by the ratio of the speed components. Each axis then
/// takes the sign of its own speed component.
pub fn flick_end_point(
    start: Point,
    x_speed: f64,
    y_speed: f64,
    display: Size,
) -> Result<Point, GestureError> {
    if x_speed == 0.0 && y_speed == 0.0 {
        return Err(GestureError::InvalidSpeed(0.0));
    }
    let quarter = display.shorter_side() as f64 / 4.0;
    // y_speed == 0 yields an infinite ratio, which collapses the y offset to 0.
    let ratio = (x_speed / y_speed).abs();
    let (x_offset, y_offset) = if ratio < 1.0 {
        (quarter * ratio, quarter)
    } else {
        (quarter, quarter / ratio)
    };
    Ok(Point::new(
        start.x + sign(x_speed) * x_offset,
        start.y + sign(y_speed) * y_offset,
    ))
}

/// Device flick from an absolute `start` point.
pub fn flick(
    start: Point,
    x_speed: f64,
    y_speed: f64,
    display: Size,
) -> Result<GestureVector, GestureError> {
    let steps = flick_steps(x_speed, y_speed)?;
    let end = flick_end_point(start, x_speed, y_speed, display)?;
    Ok(GestureVector { start, end, steps })
}

/// Flick that starts on an element: offsets are applied verbatim and the
/// step count comes from a caller-supplied scalar speed.
pub fn element_flick(
    start: Point,
    x_offset: f64,
    y_offset: f64,
    speed: f64,
) -> Result<GestureVector, GestureError> {
    let steps = steps_for_speed(speed)?;
    Ok(GestureVector {
        start,
        end: Point::new(start.x + x_offset, start.y + y_offset),
        steps,
    })
}

/// Resolves a possibly normalised point against `rect`.
///
/// Per axis: `0` selects the centre, a magnitude below one is a fraction of
/// the rectangle's length, anything else is absolute. The rectangle origin is
/// added in every case. With `check_bounds` the result must lie inside
/// `rect`.
pub fn absolute_position(
    point: Point,
    rect: Rect,
    check_bounds: bool,
) -> Result<Point, GestureError> {
    let origin = rect.origin();
    let absolute = Point::new(
        translate_coordinate(point.x, rect.width() as f64, origin.x),
        translate_coordinate(point.y, rect.height() as f64, origin.y),
    );
    if check_bounds && !rect.contains(absolute) {
        return Err(GestureError::InvalidCoordinates {
            point: absolute,
            rect: rect.to_short_string(),
        });
    }
    Ok(absolute)
}

fn translate_coordinate(coordinate: f64, length: f64, offset: f64) -> f64 {
    let translated = if coordinate == 0.0 {
        length * 0.5
    } else if coordinate.abs() < 1.0 {
        length * coordinate
    } else {
        coordinate
    };
    translated + offset
}

/// Swipe or drag between two points resolved against the display.
pub fn device_motion(
    start: Point,
    end: Point,
    steps: u32,
    display: Size,
) -> Result<GestureVector, GestureError> {
    if steps == 0 {
        return Err(GestureError::InvalidSteps);
    }
    let rect = display.as_rect();
    Ok(GestureVector {
        start: absolute_position(start, rect, true)?,
        end: absolute_position(end, rect, true)?,
        steps,
    })
}

/// Swipe between two points relative to an element's bounds.
pub fn element_motion(
    start: Point,
    end: Point,
    steps: u32,
    bounds: Rect,
) -> Result<GestureVector, GestureError> {
    if steps == 0 {
        return Err(GestureError::InvalidSteps);
    }
    Ok(GestureVector {
        start: absolute_position(start, bounds, false)?,
        end: absolute_position(end, bounds, false)?,
        steps,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinchDirection {
    In,
    Out,
}

impl PinchDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            PinchDirection::In => "in",
            PinchDirection::Out => "out",
        }
    }
}

impl FromStr for PinchDirection {
    type Err = GestureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "in" => Ok(PinchDirection::In),
            "out" => Ok(PinchDirection::Out),
            _ => Err(GestureError::InvalidDirection(s.to_string())),
        }
    }
}

/// Two-finger pinch; the platform owns the finger paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinchGesture {
    pub direction: PinchDirection,
    pub percent: u32,
    pub steps: u32,
}

fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}
