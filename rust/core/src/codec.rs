// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! URL fragment codec for shareable view state.
//!
//! A fragment is a `::`-separated list of tagged segments, in any order:
//!
//! ```text
//! c:px,py,pz,tx,ty,tz[,true|false]         camera position, target, animate
//! p:nx=..,ny=..,nz=..,px=..,py=..,pz=..    one cut plane (repeatable)
//! p:x=d | p:y=d | p:z=d                    axis-aligned cut plane shorthand
//! i:id,id,...                              selected element path (repeatable)
//! ```
//!
//! Decoding is tolerant: a bad segment is skipped and reported, the rest of
//! the fragment still applies. Encoding is canonical (camera, planes,
//! selection) and uses shortest round-trip float formatting, so
//! `decode(encode(v)).state == v`.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, char, digit0, digit1, one_of},
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    multi::separated_list1,
    sequence::{pair, preceded, separated_pair, tuple},
    IResult,
};
use serde::{Deserialize, Serialize};

use crate::camera::{Axis, CameraState, CutPlane};
use crate::error::CodecError;
use crate::path::ElementPath;

pub const SEGMENT_SEPARATOR: &str = "::";

/// Everything a shared link carries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewState {
    pub camera: Option<CameraState>,
    pub cut_planes: Vec<CutPlane>,
    /// Selected element paths, primary selection first.
    pub selection: Vec<ElementPath>,
}

impl ViewState {
    pub fn is_empty(&self) -> bool {
        self.camera.is_none() && self.cut_planes.is_empty() && self.selection.is_empty()
    }

    /// Equality with float components compared within `epsilon`.
    pub fn approx_eq(&self, other: &ViewState, epsilon: f64) -> bool {
        let cameras = match (&self.camera, &other.camera) {
            (Some(a), Some(b)) => a.approx_eq(b, epsilon),
            (None, None) => true,
            _ => false,
        };
        cameras
            && self.cut_planes.len() == other.cut_planes.len()
            && self
                .cut_planes
                .iter()
                .zip(&other.cut_planes)
                .all(|(a, b)| a.approx_eq(b, epsilon))
            && self.selection == other.selection
    }
}

/// Result of a tolerant decode.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Decoded {
    pub state: ViewState,
    pub errors: Vec<CodecError>,
}

/// Serializes `state` to a fragment (without the leading `#`).
pub fn encode(state: &ViewState) -> String {
    let mut segments: Vec<String> = Vec::with_capacity(1 + state.cut_planes.len() + state.selection.len());

    if let Some(camera) = &state.camera {
        let (p, t) = (camera.position, camera.target);
        segments.push(format!(
            "c:{},{},{},{},{},{},{}",
            p.x, p.y, p.z, t.x, t.y, t.z, camera.animate
        ));
    }
    for plane in &state.cut_planes {
        let (n, p) = (plane.normal, plane.point);
        segments.push(format!(
            "p:nx={},ny={},nz={},px={},py={},pz={}",
            n.x, n.y, n.z, p.x, p.y, p.z
        ));
    }
    for path in state.selection.iter().filter(|p| !p.is_empty()) {
        segments.push(format!("i:{path}"));
    }

    segments.join(SEGMENT_SEPARATOR)
}

/// Parses a fragment, with or without its leading `#`.
///
/// Never fails as a whole; every skipped segment is reported in
/// [`Decoded::errors`].
pub fn decode(fragment: &str) -> Decoded {
    let body = fragment.strip_prefix('#').unwrap_or(fragment);
    let mut decoded = Decoded::default();

    for (index, raw) in body.split(SEGMENT_SEPARATOR).enumerate() {
        let segment = raw.trim();
        if segment.is_empty() {
            continue;
        }
        let Some((tag, rest)) = segment.split_once(':') else {
            decoded.errors.push(CodecError::MissingTag {
                index,
                segment: segment.to_string(),
            });
            continue;
        };

        let state = &mut decoded.state;
        let outcome = match tag {
            "c" => parse_camera(rest).map(|camera| {
                if state.camera.is_some() {
                    Some(CodecError::DuplicateCamera { index })
                } else {
                    state.camera = Some(camera);
                    None
                }
            }),
            "p" => parse_plane(rest).map(|plane| {
                state.cut_planes.push(plane);
                None
            }),
            "i" => parse_path(rest).map(|path| {
                state.selection.push(path);
                None
            }),
            _ => Ok(Some(CodecError::UnknownTag {
                index,
                tag: tag.to_string(),
            })),
        };

        match outcome {
            Ok(None) => {}
            Ok(Some(error)) => decoded.errors.push(error),
            Err(problem) => {
                // Tags reaching here are single ASCII letters
                let tag = tag.chars().next().unwrap_or('?');
                decoded.errors.push(problem.into_error(index, tag));
            }
        }
    }

    if !decoded.errors.is_empty() {
        tracing::warn!(
            errors = decoded.errors.len(),
            "skipped malformed fragment segments"
        );
    }
    decoded
}

/// Canonical form of a fragment: what [`encode`] produces for whatever
/// [`decode`] recovers from it. Two fragments with the same canonical form
/// describe the same view.
pub fn canonicalize(fragment: &str) -> String {
    encode(&decode(fragment).state)
}

/// Why a segment body was rejected, before the segment position is known.
#[derive(Debug)]
enum BodyError {
    Syntax(&'static str),
    NonFinite,
    Invalid(String),
}

impl BodyError {
    fn into_error(self, index: usize, tag: char) -> CodecError {
        match self {
            BodyError::Syntax(expected) => CodecError::Malformed {
                index,
                tag,
                reason: format!("expected {expected}"),
            },
            BodyError::NonFinite => CodecError::NonFinite { index, tag },
            BodyError::Invalid(reason) => CodecError::Malformed { index, tag, reason },
        }
    }
}

fn parse_camera(body: &str) -> Result<CameraState, BodyError> {
    let (_, (position, target, animate)) = camera_body(body)
        .map_err(|_| BodyError::Syntax("six comma-separated numbers and an optional true/false"))?;
    let camera = CameraState::new(position, target, animate.unwrap_or(true));
    if !camera.is_finite() {
        return Err(BodyError::NonFinite);
    }
    Ok(camera)
}

fn parse_plane(body: &str) -> Result<CutPlane, BodyError> {
    let (_, pairs) = plane_body(body).map_err(|_| BodyError::Syntax("comma-separated key=number pairs"))?;
    if pairs.iter().any(|(_, v)| !v.is_finite()) {
        return Err(BodyError::NonFinite);
    }

    if let [(key, offset)] = pairs.as_slice() {
        if let Some(axis) = Axis::from_name(key) {
            return Ok(CutPlane::from_axis(axis, *offset));
        }
    }

    const KEYS: [&str; 6] = ["nx", "ny", "nz", "px", "py", "pz"];
    let mut values: [Option<f64>; 6] = [None; 6];
    for (key, v) in pairs {
        let slot = KEYS
            .iter()
            .position(|k| *k == key)
            .ok_or_else(|| BodyError::Invalid(format!("unknown plane key '{key}'")))?;
        if values[slot].replace(v).is_some() {
            return Err(BodyError::Invalid(format!("plane key '{key}' given twice")));
        }
    }
    let mut components = [0.0; 6];
    for (slot, value) in values.iter().enumerate() {
        components[slot] =
            value.ok_or_else(|| BodyError::Invalid(format!("plane key '{}' missing", KEYS[slot])))?;
    }

    let plane = CutPlane::new(
        [components[0], components[1], components[2]],
        [components[3], components[4], components[5]],
    );
    if !plane.is_valid() {
        return Err(BodyError::Invalid("plane normal has zero length".to_string()));
    }
    Ok(plane)
}

fn parse_path(body: &str) -> Result<ElementPath, BodyError> {
    let (_, ids) = path_body(body).map_err(|_| BodyError::Syntax("comma-separated element ids"))?;
    Ok(ElementPath::from_ids(&ids))
}

/// Signed decimal: `-1`, `2.`, `.5`, `+3.25e-4`.
fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(one_of("+-")),
            alt((
                recognize(pair(digit1, opt(pair(char('.'), digit0)))),
                recognize(pair(char('.'), digit1)),
            )),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| fast_float::parse::<f64, _>(s),
    )(input)
}

fn triple(input: &str) -> IResult<&str, [f64; 3]> {
    map(
        tuple((number, preceded(char(','), number), preceded(char(','), number))),
        |(x, y, z)| [x, y, z],
    )(input)
}

fn flag(input: &str) -> IResult<&str, bool> {
    alt((value(true, tag("true")), value(false, tag("false"))))(input)
}

#[allow(clippy::type_complexity)]
fn camera_body(input: &str) -> IResult<&str, ([f64; 3], [f64; 3], Option<bool>)> {
    all_consuming(tuple((
        triple,
        preceded(char(','), triple),
        opt(preceded(char(','), flag)),
    )))(input)
}

fn plane_body(input: &str) -> IResult<&str, Vec<(&str, f64)>> {
    all_consuming(separated_list1(char(','), separated_pair(alpha1, char('='), number)))(input)
}

fn path_body(input: &str) -> IResult<&str, Vec<u32>> {
    all_consuming(separated_list1(
        char(','),
        map_res(digit1, |s: &str| s.parse::<u32>()),
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_number() {
        assert_eq!(number("42"), Ok(("", 42.0)));
        assert_eq!(number("-3.5"), Ok(("", -3.5)));
        assert_eq!(number("+2."), Ok(("", 2.0)));
        assert_eq!(number(".25,"), Ok((",", 0.25)));
        assert_eq!(number("1.5e-3"), Ok(("", 1.5e-3)));
        assert!(number("nan").is_err());
        assert!(number("-").is_err());
    }

    #[test]
    fn decodes_camera_and_selection() {
        let decoded = decode("c:1,2,3,4,5,6,false::i:1,3");
        assert!(decoded.errors.is_empty());
        let camera = decoded.state.camera.unwrap();
        assert_eq!(camera, CameraState::new([1.0, 2.0, 3.0], [4.0, 5.0, 6.0], false));
        assert_eq!(decoded.state.selection, vec![ElementPath::from_ids(&[1, 3])]);
    }

    #[test]
    fn camera_animates_by_default() {
        let decoded = decode("#c:1,2,3,4,5,6");
        assert!(decoded.state.camera.unwrap().animate);
    }

    #[test]
    fn decodes_plane_and_skips_unknown_tag() {
        let decoded = decode("p:nx=1,ny=0,nz=0,px=0,py=0,pz=0::x:garbage");
        assert_eq!(decoded.state.cut_planes, vec![CutPlane::new([1.0, 0.0, 0.0], [0.0; 3])]);
        assert_eq!(
            decoded.errors,
            vec![CodecError::UnknownTag {
                index: 1,
                tag: "x".to_string()
            }]
        );
    }

    #[test]
    fn plane_keys_in_any_order() {
        let decoded = decode("p:pz=3,px=1,nz=1,ny=0,py=2,nx=0");
        assert_eq!(
            decoded.state.cut_planes,
            vec![CutPlane::new([0.0, 0.0, 1.0], [1.0, 2.0, 3.0])]
        );
    }

    #[test]
    fn axis_shorthand_plane() {
        let decoded = decode("c:1,2,3,4,5,6::p:x=0");
        assert!(decoded.errors.is_empty());
        assert_eq!(decoded.state.cut_planes, vec![CutPlane::from_axis(Axis::X, 0.0)]);

        let offset = decode("p:z=-1.5").state.cut_planes[0];
        assert_relative_eq!(offset.point.z, -1.5);
    }

    #[test]
    fn malformed_segments_are_reported_not_fatal() {
        let decoded = decode("c:1,2,3::p:nx=1,ny=0::p:nx=0,ny=0,nz=0,px=0,py=0,pz=0::i:1,a::i:1,2::junk");
        assert_eq!(decoded.state.camera, None);
        assert!(decoded.state.cut_planes.is_empty());
        assert_eq!(decoded.state.selection, vec![ElementPath::from_ids(&[1, 2])]);
        let indices: Vec<usize> = decoded.errors.iter().map(CodecError::index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 5]);
        assert!(matches!(decoded.errors[4], CodecError::MissingTag { .. }));
    }

    #[test]
    fn duplicate_plane_key_rejected() {
        let decoded = decode("p:nx=1,nx=1,nz=0,px=0,py=0,pz=0");
        assert!(decoded.state.cut_planes.is_empty());
        assert!(matches!(decoded.errors[0], CodecError::Malformed { tag: 'p', .. }));
    }

    #[test]
    fn overflowing_numbers_are_non_finite() {
        let decoded = decode("c:1e999,2,3,4,5,6");
        assert_eq!(decoded.errors, vec![CodecError::NonFinite { index: 0, tag: 'c' }]);
        assert!(decoded.state.camera.is_none());
    }

    #[test]
    fn first_camera_wins() {
        let decoded = decode("c:1,1,1,0,0,0::c:2,2,2,0,0,0");
        assert_eq!(decoded.state.camera.unwrap().position.x, 1.0);
        assert_eq!(decoded.errors, vec![CodecError::DuplicateCamera { index: 1 }]);
    }

    #[test]
    fn empty_segments_are_ignored() {
        let decoded = decode("#::i:1::::");
        assert!(decoded.errors.is_empty());
        assert_eq!(decoded.state.selection.len(), 1);
        assert!(decode("").state.is_empty());
        assert!(decode("#").errors.is_empty());
    }

    #[test]
    fn encode_is_canonical() {
        let state = ViewState {
            camera: Some(CameraState::new([1.0, 2.0, 3.0], [4.0, 5.0, 6.0], false)),
            cut_planes: vec![CutPlane::new([1.0, 0.0, 0.0], [0.0, 0.5, -2.0])],
            selection: vec![ElementPath::from_ids(&[1, 3])],
        };
        assert_eq!(
            encode(&state),
            "c:1,2,3,4,5,6,false::p:nx=1,ny=0,nz=0,px=0,py=0.5,pz=-2::i:1,3"
        );
        assert_eq!(encode(&ViewState::default()), "");
    }

    #[test]
    fn round_trip_preserves_awkward_floats() {
        let state = ViewState {
            camera: Some(CameraState::new(
                [0.1 + 0.2, -1e-7, 123456789.123],
                [1.0 / 3.0, -0.0, 5e20],
                true,
            )),
            cut_planes: vec![CutPlane::new([0.0, -0.7071067811865476, 0.7071067811865476], [1e-300, 2.0, 3.0])],
            selection: vec![ElementPath::from_ids(&[1]), ElementPath::from_ids(&[1, 2, 9])],
        };
        let decoded = decode(&encode(&state));
        assert!(decoded.errors.is_empty());
        assert!(decoded.state.approx_eq(&state, 1e-9));
        assert_eq!(decoded.state, state);
    }

    #[test]
    fn canonicalize_ignores_segment_order() {
        assert_eq!(
            canonicalize("#i:1,3::c:1,2,3,4,5,6"),
            canonicalize("c:1.0,2,3,4,5,6,true::i:1,3")
        );
    }
}
