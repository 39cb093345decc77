use anyhow::{anyhow, bail, Context, Result};
use glam::{Quat, UVec2, Vec2, Vec3};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::calibration::{Calibration, UvOffset};
use crate::feed::{CameraPosition, Intrinsics, Pose, TextureHandle};
use crate::plane::ImagePlane;

/// Headless description of a passthrough camera rig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Rig {
    pub calibration: Calibration,
    pub plane: ImagePlane,
    pub feeds: Vec<RigFeed>,
}

/// One simulated camera described by a rig file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigFeed {
    pub eye: CameraPosition,
    /// Frame index on which the feed starts playing.
    pub start_frame: u32,
    pub texture: Option<TextureHandle>,
    pub pose: Pose,
    pub intrinsics: Intrinsics,
    pub current_resolution: UVec2,
}

impl Rig {
    /// Parses the rig XML.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid rig XML")?;
        let root = document.root_element();

        let calibration = match root.children().find(|n| n.has_tag_name("calibration")) {
            Some(node) => parse_calibration(&node)?,
            None => Calibration::default(),
        };
        let distance = parse_f32(
            optional_text(&root, "plane-distance"),
            ImagePlane::default().distance,
        )?;
        if !distance.is_finite() || distance <= 0.0 {
            bail!("plane-distance must be a positive finite number, got {distance}");
        }
        let plane = ImagePlane::new(distance);

        let feeds = root
            .children()
            .filter(|n| n.has_tag_name("feed"))
            .map(|node| parse_feed(&node))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            calibration,
            plane,
            feeds,
        })
    }
}

fn parse_calibration(node: &Node<'_, '_>) -> Result<Calibration> {
    let left = parse_vec2(optional_text(node, "left-uv-offset"), Vec2::ZERO)?;
    let right = parse_vec2(optional_text(node, "right-uv-offset"), Vec2::ZERO)?;
    Ok(Calibration::new(
        UvOffset::new(CameraPosition::Left, left.x, left.y)?,
        UvOffset::new(CameraPosition::Right, right.x, right.y)?,
    ))
}

fn parse_feed(node: &Node<'_, '_>) -> Result<RigFeed> {
    let eye_name = required_text(node, "eye")?;
    let eye = CameraPosition::from_name(&eye_name)
        .ok_or_else(|| anyhow!("unknown eye {eye_name:?}; expected left or right"))?;

    let start_frame = match optional_text(node, "start-frame") {
        Some(value) => value
            .parse::<u32>()
            .map_err(|err| anyhow!("failed to parse start frame: {err}"))?,
        None => 0,
    };
    let texture = optional_text(node, "texture")
        .map(|value| {
            value
                .parse::<u64>()
                .map(TextureHandle::new)
                .map_err(|err| anyhow!("failed to parse texture id: {err}"))
        })
        .transpose()?;

    let position = parse_vec3(optional_text(node, "translation"), Vec3::ZERO)?;
    let euler = parse_vec3(optional_text(node, "rotation"), Vec3::ZERO)?;
    let rotation = Quat::from_rotation_z(euler.z.to_radians())
        * Quat::from_rotation_y(euler.y.to_radians())
        * Quat::from_rotation_x(euler.x.to_radians());

    let intrinsics = Intrinsics {
        focal_length: parse_vec2(optional_text(node, "focal-length"), Vec2::ZERO)?,
        principal_point: parse_vec2(optional_text(node, "principal-point"), Vec2::ZERO)?,
        sensor_resolution: parse_uvec2(optional_text(node, "sensor-resolution"))?,
    };
    let current_resolution = match optional_text(node, "current-resolution") {
        Some(value) => parse_uvec2(Some(value))?,
        None => intrinsics.sensor_resolution,
    };

    Ok(RigFeed {
        eye,
        start_frame,
        texture,
        pose: Pose { position, rotation },
        intrinsics,
        current_resolution,
    })
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_floats<const N: usize>(value: &str, what: &str) -> Result<[f32; N]> {
    let mut numbers = value.split_whitespace().map(|component| {
        component
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse {what} component {component:?}: {err}"))
    });
    let mut out = [0.0; N];
    for slot in out.iter_mut() {
        *slot = numbers
            .next()
            .ok_or_else(|| anyhow!("{what} is missing components"))??;
    }
    reject_extra_components(value, N, what)?;
    Ok(out)
}

fn reject_extra_components(value: &str, expected: usize, what: &str) -> Result<()> {
    match value.split_whitespace().nth(expected) {
        Some(extra) => Err(anyhow!(
            "failed to parse {what} {value:?}: expected {expected} components, found extra {extra:?}"
        )),
        None => Ok(()),
    }
}

fn parse_vec2(value: Option<String>, default: Vec2) -> Result<Vec2> {
    let Some(value) = value else {
        return Ok(default);
    };
    parse_floats::<2>(&value, "vector").map(Vec2::from_array)
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    parse_floats::<3>(&value, "vector").map(Vec3::from_array)
}

fn parse_uvec2(value: Option<String>) -> Result<UVec2> {
    let Some(value) = value else {
        return Ok(UVec2::ZERO);
    };
    let mut numbers = value.split_whitespace().map(|component| {
        component
            .parse::<u32>()
            .map_err(|err| anyhow!("failed to parse resolution component {component:?}: {err}"))
    });
    let width = numbers
        .next()
        .ok_or_else(|| anyhow!("resolution is missing components"))??;
    let height = numbers
        .next()
        .ok_or_else(|| anyhow!("resolution is missing components"))??;
    reject_extra_components(&value, 2, "resolution")?;
    Ok(UVec2::new(width, height))
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float: {err}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    const SAMPLE: &str = r#"
    <rig>
        <calibration>
            <left-uv-offset>-0.05 -0.02</left-uv-offset>
        </calibration>
        <plane-distance>1.5</plane-distance>
        <feed>
            <eye>left</eye>
            <texture>11</texture>
            <translation>-0.03 1.6 0</translation>
            <rotation>0 90 0</rotation>
            <focal-length>1000 1000</focal-length>
            <principal-point>960 540</principal-point>
            <sensor-resolution>1920 1080</sensor-resolution>
            <current-resolution>960 540</current-resolution>
        </feed>
        <feed>
            <eye>Right</eye>
            <start-frame>2</start-frame>
            <sensor-resolution>1280 960</sensor-resolution>
        </feed>
    </rig>
    "#;

    #[test]
    fn parse_rig_populates_feeds_and_calibration() {
        let rig = Rig::from_xml(SAMPLE).unwrap();
        assert_eq!(rig.feeds.len(), 2);
        assert_eq!(rig.plane.distance, 1.5);
        assert_eq!(rig.calibration.left.as_vec2(), Vec2::new(-0.05, -0.02));
        assert_eq!(rig.calibration.right, UvOffset::ZERO);

        let left = &rig.feeds[0];
        assert_eq!(left.eye, CameraPosition::Left);
        assert_eq!(left.start_frame, 0);
        assert_eq!(left.texture, Some(TextureHandle::new(11)));
        assert_eq!(left.pose.position, Vec3::new(-0.03, 1.6, 0.0));
        assert!((left.pose.rotation * Vec3::Z).abs_diff_eq(Vec3::X, 1e-5));
        assert_eq!(left.intrinsics.sensor_resolution, UVec2::new(1920, 1080));
        assert_eq!(left.current_resolution, UVec2::new(960, 540));

        let right = &rig.feeds[1];
        assert_eq!(right.eye, CameraPosition::Right);
        assert_eq!(right.start_frame, 2);
        assert_eq!(right.texture, None);
        assert_eq!(right.current_resolution, UVec2::new(1280, 960));
    }

    #[test]
    fn missing_eye_is_an_error() {
        let bad = "<rig><feed><texture>1</texture></feed></rig>";
        assert!(Rig::from_xml(bad).is_err());
    }

    #[test]
    fn out_of_range_calibration_is_rejected() {
        let bad = "<rig><calibration><left-uv-offset>-0.5 0</left-uv-offset></calibration></rig>";
        let err = Rig::from_xml(bad).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::UvOffsetOutOfRange {
                eye: CameraPosition::Left,
                axis: 'x',
                value: -0.5,
            })
        );
    }

    #[test]
    fn extra_vector_components_are_rejected() {
        let rigs = [
            "<rig><feed><eye>left</eye><focal-length>1000 1000 5</focal-length></feed></rig>",
            "<rig><feed><eye>left</eye><translation>0 1.6 0 1</translation></feed></rig>",
            "<rig><feed><eye>left</eye><sensor-resolution>1920 1080 3</sensor-resolution></feed></rig>",
            "<rig><calibration><left-uv-offset>-0.1 0 0</left-uv-offset></calibration></rig>",
        ];
        for xml in rigs {
            let err = Rig::from_xml(xml).unwrap_err();
            let message = format!("{err:#}");
            assert!(message.contains("failed to parse"), "{xml}: {message}");
            assert!(message.contains("found extra"), "{xml}: {message}");
        }
    }

    #[test]
    fn plane_distance_must_be_positive_and_finite() {
        for distance in ["0", "-1.5", "NaN", "inf"] {
            let xml = format!("<rig><plane-distance>{distance}</plane-distance></rig>");
            let err = Rig::from_xml(&xml).unwrap_err();
            assert!(
                err.to_string().contains("plane-distance must be a positive finite number"),
                "{distance}: {err:#}"
            );
        }
        let rig = Rig::from_xml("<rig><plane-distance>0.25</plane-distance></rig>").unwrap();
        assert_eq!(rig.plane.distance, 0.25);
    }
}
