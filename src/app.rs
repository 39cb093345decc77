use std::fmt;
use std::sync::Arc;

use glam::{Mat4, Vec2, Vec4};

use crate::error::{ConfigError, SkipReason};
use crate::feed::{CameraFeed, CameraPosition, SimulatedFeed};
use crate::mapper::StereoUniformMapper;
use crate::plane::PlaneTransform;
use crate::registry::FeedList;
use crate::rig::{Rig, RigFeed};
use crate::uniforms::{UniformSet, UniformValue};

/// Result of one simulated frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Written,
    Skipped(SkipReason),
    /// Setup failed; the mapper never runs.
    Inactive,
}

impl fmt::Display for FrameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Written => f.write_str("written"),
            Self::Skipped(reason) => write!(f, "skipped ({reason})"),
            Self::Inactive => f.write_str("inactive"),
        }
    }
}

/// Drives a mapper over simulated feeds built from a [`Rig`].
pub struct Session {
    rig: Rig,
    feeds: Vec<(RigFeed, Arc<SimulatedFeed>)>,
    mapper: Option<StereoUniformMapper<UniformSet>>,
    setup_error: Option<ConfigError>,
    frame: u32,
}

impl Session {
    pub fn new(rig: Rig) -> Self {
        let registry = FeedList::new();
        let feeds: Vec<_> = rig
            .feeds
            .iter()
            .map(|rig_feed| {
                let feed = Arc::new(SimulatedFeed::new(
                    rig_feed.eye,
                    rig_feed.intrinsics,
                    rig_feed.current_resolution,
                ));
                feed.set_pose(rig_feed.pose);
                registry.register(Arc::clone(&feed) as Arc<dyn CameraFeed>);
                (rig_feed.clone(), feed)
            })
            .collect();

        let (mapper, setup_error) = match StereoUniformMapper::resolve(
            None,
            None,
            &registry,
            Some(UniformSet::new()),
            rig.calibration,
        ) {
            Ok(mapper) => (Some(mapper), None),
            Err(err) => (None, Some(err)),
        };

        Self {
            rig,
            feeds,
            mapper,
            setup_error,
            frame: 0,
        }
    }

    pub fn setup_error(&self) -> Option<&ConfigError> {
        self.setup_error.as_ref()
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Starts the feeds scheduled for this frame, then ticks the mapper.
    pub fn advance(&mut self) -> FrameOutcome {
        let frame = self.frame;
        self.frame += 1;

        for (rig_feed, feed) in &self.feeds {
            if rig_feed.start_frame == frame {
                feed.set_playing(true);
                if let Some(texture) = rig_feed.texture {
                    feed.present(texture);
                }
            }
        }

        let Some(mapper) = self.mapper.as_mut() else {
            return FrameOutcome::Inactive;
        };
        match mapper.tick() {
            Ok(()) => FrameOutcome::Written,
            Err(reason) => FrameOutcome::Skipped(reason),
        }
    }

    pub fn run(&mut self, frames: u32) -> Vec<FrameOutcome> {
        (0..frames).map(|_| self.advance()).collect()
    }

    pub fn uniforms(&self) -> Option<&UniformSet> {
        self.mapper.as_ref().and_then(|mapper| mapper.target())
    }

    /// Image plane placement for every playing feed.
    pub fn plane_placements(&self) -> Vec<(CameraPosition, PlaneTransform)> {
        self.feeds
            .iter()
            .filter_map(|(rig_feed, feed)| {
                self.rig
                    .plane
                    .place(&**feed)
                    .map(|plane| (rig_feed.eye, plane))
            })
            .collect()
    }

    /// Detaches the mapper and returns the uniforms it wrote.
    pub fn shutdown(&mut self) -> Option<UniformSet> {
        self.mapper.as_mut().and_then(|mapper| mapper.teardown())
    }
}

pub fn format_value(value: &UniformValue) -> String {
    match value {
        UniformValue::Texture(texture) => format!("texture #{}", texture.id()),
        UniformValue::Vec2(value) => format_vec2(*value),
        UniformValue::Vec4(value) => format_vec4(*value),
        UniformValue::Mat4(value) => format_mat4(value),
    }
}

fn format_vec2(value: Vec2) -> String {
    format!("({:.3}, {:.3})", value.x, value.y)
}

fn format_vec4(value: Vec4) -> String {
    format!(
        "({:.3}, {:.3}, {:.3}, {:.3})",
        value.x, value.y, value.z, value.w
    )
}

fn format_mat4(value: &Mat4) -> String {
    let rows: Vec<String> = (0..4).map(|i| format_vec4(value.row(i))).collect();
    format!("[{}]", rows.join(", "))
}

pub fn print_uniforms(set: &UniformSet) {
    println!("Final uniforms:");
    for (slot, value) in set.entries() {
        println!(" - {} = {}", slot.shader_name(), format_value(&value));
    }
}

pub fn print_planes(placements: &[(CameraPosition, PlaneTransform)]) {
    println!("Image planes:");
    for (eye, plane) in placements {
        println!(
            " - {} pos=({:.2}, {:.2}, {:.2}) scale=({:.3}, {:.3})",
            eye,
            plane.position.x,
            plane.position.y,
            plane.position.z,
            plane.scale.x,
            plane.scale.y
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms::{UniformParam, UniformSlot};
    use glam::{UVec2, Vec2};

    const RIG: &str = r#"
    <rig>
        <feed>
            <eye>left</eye>
            <texture>1</texture>
            <focal-length>1000 1000</focal-length>
            <sensor-resolution>1920 1080</sensor-resolution>
            <current-resolution>960 540</current-resolution>
        </feed>
        <feed>
            <eye>right</eye>
            <start-frame>2</start-frame>
            <texture>2</texture>
            <focal-length>1000 1000</focal-length>
            <sensor-resolution>1920 1080</sensor-resolution>
            <current-resolution>960 540</current-resolution>
        </feed>
    </rig>
    "#;

    #[test]
    fn session_waits_for_late_feed() {
        let mut session = Session::new(Rig::from_xml(RIG).unwrap());
        let outcomes = session.run(4);
        assert_eq!(
            outcomes,
            vec![
                FrameOutcome::Skipped(SkipReason::NotReady),
                FrameOutcome::Skipped(SkipReason::NotReady),
                FrameOutcome::Written,
                FrameOutcome::Written,
            ]
        );

        let uniforms = session.uniforms().unwrap();
        let slot = UniformSlot::new(CameraPosition::Right, UniformParam::CurrentResolution);
        assert_eq!(uniforms.vec4(slot), Some(Vec4::new(960.0, 540.0, 0.0, 0.0)));
        let focal = UniformSlot::new(CameraPosition::Left, UniformParam::FocalLength);
        assert_eq!(uniforms.vec2(focal), Some(Vec2::new(1000.0, 1000.0)));
        assert_eq!(session.plane_placements().len(), 2);
    }

    #[test]
    fn session_without_right_feed_is_inactive() {
        let rig = Rig::from_xml("<rig><feed><eye>left</eye></feed></rig>").unwrap();
        let mut session = Session::new(rig);
        assert_eq!(
            session.setup_error(),
            Some(&ConfigError::MissingFeed(CameraPosition::Right))
        );
        assert_eq!(session.advance(), FrameOutcome::Inactive);
        assert!(session.uniforms().is_none());
    }

    #[test]
    fn shutdown_hands_back_written_uniforms() {
        let mut session = Session::new(Rig::from_xml(RIG).unwrap());
        session.run(3);
        let uniforms = session.shutdown().unwrap();
        assert_eq!(uniforms.len(), 16);
        assert_eq!(
            session.advance(),
            FrameOutcome::Skipped(SkipReason::Detached)
        );
    }

    #[test]
    fn formats_values() {
        assert_eq!(
            format_value(&UniformValue::Vec2(Vec2::new(-0.05, 0.0))),
            "(-0.050, 0.000)"
        );
        assert_eq!(
            format_value(&UniformValue::Vec4(UVec2::new(960, 540).as_vec2().extend(0.0).extend(0.0))),
            "(960.000, 540.000, 0.000, 0.000)"
        );
    }
}
