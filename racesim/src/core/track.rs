use crate::error::{GeometryError, RaceError};
use anyhow::Context;
use helpers::general::{cumulative_lengths, lin_interp};
use serde::Deserialize;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt::Debug;
use std::fs::OpenOptions;
use std::path::Path;

/// 2-D point (x, y).
pub type Point2 = [f64; 2];

/// Agents are drawn at most this far before the end of the path while crossing the line.
pub const DRAW_MARGIN: f64 = 0.1;

/// PathGeometry is the capability the race engine consumes to map a distance along the closed
/// path onto a point. The engine never modifies the geometry.
pub trait PathGeometry: Debug + Send {
    /// Total length of the path.
    fn total_length(&self) -> f64;

    /// Point at distance `d`, `d` must be in [0.0, total_length[.
    fn point_at_distance(&self, d: f64) -> Result<Point2, GeometryError>;

    /// End point of the path, used as the default finish point.
    fn end_point(&self) -> Result<Point2, GeometryError> {
        self.point_at_distance((self.total_length() - DRAW_MARGIN).max(0.0))
    }
}

fn check_distance(d: f64, length: f64) -> Result<(), GeometryError> {
    if !d.is_finite() {
        return Err(GeometryError::NonFinite);
    }
    if !(0.0 <= d && d < length) {
        return Err(GeometryError::OutOfRange {
            distance: d,
            length,
        });
    }
    Ok(())
}

// -------------------------------------------------------------------------------------------------
// POLYLINE ----------------------------------------------------------------------------------------
// -------------------------------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct CsvTrackEl {
    pub x_m: f64,
    pub y_m: f64,
}

/// Polyline is a centerline given as a sequence of points, e.g. read from a track CSV file.
#[derive(Debug, Clone)]
pub struct Polyline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    cum_s: Vec<f64>,
}

impl Polyline {
    pub fn from_points(points: &[Point2]) -> Result<Polyline, RaceError> {
        if points.len() < 2 {
            return Err(RaceError::TooFewPathPoints(points.len()));
        }

        let cum_s = cumulative_lengths(points);
        let length = *cum_s.last().unwrap_or(&0.0);

        if !(length.is_finite() && length > 0.0) {
            return Err(RaceError::InvalidPathLength(length));
        }

        Ok(Polyline {
            xs: points.iter().map(|p| p[0]).collect(),
            ys: points.iter().map(|p| p[1]).collect(),
            cum_s,
        })
    }

    /// from_csv reads a track centerline from a CSV file with the columns x_m and y_m.
    pub fn from_csv(trackfile_path: &Path) -> anyhow::Result<Polyline> {
        let fh = OpenOptions::new()
            .read(true)
            .open(trackfile_path)
            .context(format!(
                "Failed to open track file {}!",
                trackfile_path.to_string_lossy()
            ))?;

        let mut csv_reader = csv::Reader::from_reader(&fh);
        let mut points: Vec<Point2> = vec![];

        for result in csv_reader.deserialize() {
            let csv_track_el: CsvTrackEl = result.context(format!(
                "Failed to parse track file {}!",
                trackfile_path.to_string_lossy()
            ))?;
            points.push([csv_track_el.x_m, csv_track_el.y_m]);
        }

        Ok(Polyline::from_points(&points)?)
    }
}

impl PathGeometry for Polyline {
    fn total_length(&self) -> f64 {
        *self.cum_s.last().unwrap_or(&0.0)
    }

    fn point_at_distance(&self, d: f64) -> Result<Point2, GeometryError> {
        check_distance(d, self.total_length())?;

        let x = lin_interp(d, &self.cum_s, &self.xs).ok_or(GeometryError::NonFinite)?;
        let y = lin_interp(d, &self.cum_s, &self.ys).ok_or(GeometryError::NonFinite)?;
        Ok([x, y])
    }

    fn end_point(&self) -> Result<Point2, GeometryError> {
        match (self.xs.last(), self.ys.last()) {
            (Some(&x), Some(&y)) => Ok([x, y]),
            _ => Err(GeometryError::NonFinite),
        }
    }
}

// -------------------------------------------------------------------------------------------------
// CIRCLE ------------------------------------------------------------------------------------------
// -------------------------------------------------------------------------------------------------

/// Circle is an analytic circular path, starting at (center_x + radius, center_y) and running
/// counter-clockwise.
#[derive(Debug, Clone)]
pub struct Circle {
    pub center: Point2,
    pub radius: f64,
}

impl PathGeometry for Circle {
    fn total_length(&self) -> f64 {
        2.0 * PI * self.radius
    }

    fn point_at_distance(&self, d: f64) -> Result<Point2, GeometryError> {
        check_distance(d, self.total_length())?;

        let theta = d / self.radius;
        Ok([
            self.center[0] + self.radius * theta.cos(),
            self.center[1] + self.radius * theta.sin(),
        ])
    }
}

// -------------------------------------------------------------------------------------------------
// TRACK -------------------------------------------------------------------------------------------
// -------------------------------------------------------------------------------------------------

/// * `name` - Track name, also used to find the centerline file input/tracks/{name}.csv
/// * `circle_radius` - If set, an analytic circle of this radius is used instead of a CSV file
/// * `finish_point` - Finish line point (defaults to the end point of the path)
/// * `finish_threshold_sq` - Squared distance to the finish point below which a lap can count
/// * `pit_boxes` - Pit box point per agent id (defaults to a row of boxes below the finish point)
#[derive(Debug, Deserialize, Clone)]
pub struct TrackPars {
    pub name: String,
    #[serde(default)]
    pub circle_radius: Option<f64>,
    #[serde(default)]
    pub finish_point: Option<Point2>,
    #[serde(default = "default_finish_threshold_sq")]
    pub finish_threshold_sq: f64,
    #[serde(default)]
    pub pit_boxes: HashMap<u32, Point2>,
}

fn default_finish_threshold_sq() -> f64 {
    25.0
}

const PIT_BOX_SPACING: f64 = 30.0;
const PIT_LANE_OFFSET: f64 = -120.0;

#[derive(Debug)]
pub struct Track {
    pub name: String,
    pub length: f64,
    pub finish_point: Point2,
    pub finish_threshold_sq: f64,
    pit_boxes: HashMap<u32, Point2>,
    geometry: Box<dyn PathGeometry>,
}

impl Track {
    pub fn new(track_pars: &TrackPars, geometry: Box<dyn PathGeometry>) -> Result<Track, RaceError> {
        let length = geometry.total_length();

        if !(length.is_finite() && length > 0.0) {
            return Err(RaceError::InvalidPathLength(length));
        }

        let finish_point = match track_pars.finish_point {
            Some(finish_point) => finish_point,
            None => geometry
                .end_point()
                .map_err(|_| RaceError::InvalidPathLength(length))?,
        };

        Ok(Track {
            name: track_pars.name.to_owned(),
            length,
            finish_point,
            finish_threshold_sq: track_pars.finish_threshold_sq,
            pit_boxes: track_pars.pit_boxes.to_owned(),
            geometry,
        })
    }

    /// from_track_pars creates the geometry described by the track parameters, i.e. either an
    /// analytic circle or the centerline read from input/tracks/{name}.csv.
    pub fn from_track_pars(track_pars: &TrackPars) -> anyhow::Result<Track> {
        let geometry: Box<dyn PathGeometry> = match track_pars.circle_radius {
            Some(radius) => Box::new(Circle {
                center: [0.0, 0.0],
                radius,
            }),
            None => {
                let mut trackfile_path = std::path::PathBuf::new();
                trackfile_path.push("input");
                trackfile_path.push("tracks");
                trackfile_path.push(&track_pars.name);
                trackfile_path.set_extension("csv");

                Box::new(Polyline::from_csv(&trackfile_path)?)
            }
        };

        Ok(Track::new(track_pars, geometry)?)
    }

    pub fn point_at(&self, d: f64) -> Result<Point2, GeometryError> {
        self.geometry.point_at_distance(d)
    }

    /// draw_distance returns the distance at which an agent is drawn if it would reach
    /// `potential_distance` in this tick, i.e. just before the end of the path while crossing it.
    pub fn draw_distance(&self, potential_distance: f64) -> f64 {
        let max_dist = (self.length - DRAW_MARGIN).max(0.0);

        if potential_distance >= self.length {
            max_dist
        } else {
            potential_distance.max(0.0).min(max_dist)
        }
    }

    /// is_near_finish checks if the point lies within the finish threshold.
    pub fn is_near_finish(&self, point: Point2) -> bool {
        helpers::general::dist_sq(point, self.finish_point) < self.finish_threshold_sq
    }

    /// pit_box returns the pit box point of an agent, `store_idx` is the agent's position in the
    /// agent store and is used to place boxes that are not configured explicitly.
    pub fn pit_box(&self, agent_id: u32, store_idx: usize) -> Point2 {
        match self.pit_boxes.get(&agent_id) {
            Some(&point) => point,
            None => [
                self.finish_point[0] - PIT_BOX_SPACING + PIT_BOX_SPACING * store_idx as f64,
                self.finish_point[1] + PIT_LANE_OFFSET,
            ],
        }
    }
}
