//! Alignment guides: snapping a moving note to the edges and centres of its peers.
//!
//! Each check is a stateless scan over the peer list. For every peer the
//! moving rectangle is compared edge-to-edge, centre-to-centre and against
//! the peer's opposite edges. Candidates under the threshold compete per
//! axis; the closest one becomes the snap value.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_ALIGNMENT_THRESHOLD;
use crate::note::{Note, NoteId};

/// Orientation of a guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideOrientation {
    /// A vertical line; snaps the x coordinate.
    Vertical,
    /// A horizontal line; snaps the y coordinate.
    Horizontal,
}

/// Which features of the two rectangles line up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlignmentKind {
    Left,
    Right,
    CenterX,
    /// Moving note's right edge against the peer's left edge.
    RightToLeft,
    /// Moving note's left edge against the peer's right edge.
    LeftToRight,
    Top,
    Bottom,
    CenterY,
    /// Moving note's bottom edge against the peer's top edge.
    BottomToTop,
    /// Moving note's top edge against the peer's bottom edge.
    TopToBottom,
}

impl AlignmentKind {
    pub fn orientation(self) -> GuideOrientation {
        match self {
            AlignmentKind::Left
            | AlignmentKind::Right
            | AlignmentKind::CenterX
            | AlignmentKind::RightToLeft
            | AlignmentKind::LeftToRight => GuideOrientation::Vertical,
            AlignmentKind::Top
            | AlignmentKind::Bottom
            | AlignmentKind::CenterY
            | AlignmentKind::BottomToTop
            | AlignmentKind::TopToBottom => GuideOrientation::Horizontal,
        }
    }
}

/// A guide to draw while a note is being positioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentGuide {
    #[serde(rename = "type")]
    pub orientation: GuideOrientation,
    /// Snapped top-left coordinate (x for vertical guides, y for horizontal)
    /// that this guide proposes for the moving note.
    pub position: f64,
    /// World coordinate where the guide line is drawn.
    pub line: f64,
    /// Peers aligned along this guide.
    pub notes: Vec<NoteId>,
}

/// Outcome of an alignment check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentResult {
    pub guides: Vec<AlignmentGuide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snap_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snap_y: Option<f64>,
}

impl AlignmentResult {
    /// Check if any axis snapped.
    pub fn is_snapped(&self) -> bool {
        self.snap_x.is_some() || self.snap_y.is_some()
    }

    /// Apply the snap to a position, passing through unsnapped axes.
    pub fn apply(&self, position: Point) -> Point {
        Point::new(
            self.snap_x.unwrap_or(position.x),
            self.snap_y.unwrap_or(position.y),
        )
    }
}

/// Snapped position together with the guides to display.
#[derive(Debug, Clone, PartialEq)]
pub struct SnappedPosition {
    pub position: Point,
    pub guides: Vec<AlignmentGuide>,
}

/// A single match between the moving rectangle and a peer.
#[derive(Debug, Clone)]
struct Candidate {
    kind: AlignmentKind,
    distance: f64,
    /// Proposed top-left coordinate on the candidate's axis.
    position: f64,
    line: f64,
    peer: NoteId,
}

/// Collect every candidate between `rect` and `peer` that is closer than `threshold`.
fn candidates_for(rect: Rect, peer_id: &str, peer: Rect, threshold: f64, out: &mut Vec<Candidate>) {
    let width = rect.width();
    let height = rect.height();
    let center = rect.center();
    let peer_center = peer.center();

    // (kind, distance, proposed top-left, line)
    let candidates = [
        (AlignmentKind::CenterX, center.x - peer_center.x, peer_center.x - width / 2.0, peer_center.x),
        (AlignmentKind::Left, rect.x0 - peer.x0, peer.x0, peer.x0),
        (AlignmentKind::Right, rect.x1 - peer.x1, peer.x1 - width, peer.x1),
        (AlignmentKind::RightToLeft, rect.x1 - peer.x0, peer.x0 - width, peer.x0),
        (AlignmentKind::LeftToRight, rect.x0 - peer.x1, peer.x1, peer.x1),
        (AlignmentKind::CenterY, center.y - peer_center.y, peer_center.y - height / 2.0, peer_center.y),
        (AlignmentKind::Top, rect.y0 - peer.y0, peer.y0, peer.y0),
        (AlignmentKind::Bottom, rect.y1 - peer.y1, peer.y1 - height, peer.y1),
        (AlignmentKind::BottomToTop, rect.y1 - peer.y0, peer.y0 - height, peer.y0),
        (AlignmentKind::TopToBottom, rect.y0 - peer.y1, peer.y1, peer.y1),
    ];

    for (kind, diff, position, line) in candidates {
        let distance = diff.abs();
        if distance < threshold {
            out.push(Candidate {
                kind,
                distance,
                position,
                line,
                peer: peer_id.to_string(),
            });
        }
    }
}

/// Pick the closest candidate on an axis. Ties keep the first one seen.
fn closest<'a>(candidates: &'a [Candidate], orientation: GuideOrientation) -> Option<&'a Candidate> {
    let mut best: Option<&Candidate> = None;
    for candidate in candidates.iter().filter(|c| c.kind.orientation() == orientation) {
        match best {
            Some(current) if candidate.distance >= current.distance => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// Merge candidates near the chosen snap into guides, one per distinct line.
fn guides_near(
    candidates: &[Candidate],
    orientation: GuideOrientation,
    snap: f64,
    radius: f64,
    guides: &mut Vec<AlignmentGuide>,
) {
    let start = guides.len();
    for candidate in candidates.iter().filter(|c| c.kind.orientation() == orientation) {
        if (candidate.position - snap).abs() > radius {
            continue;
        }
        let existing = guides[start..]
            .iter_mut()
            .find(|g| g.position == candidate.position && g.line == candidate.line);
        match existing {
            Some(guide) => {
                if !guide.notes.contains(&candidate.peer) {
                    guide.notes.push(candidate.peer.clone());
                }
            }
            None => guides.push(AlignmentGuide {
                orientation,
                position: candidate.position,
                line: candidate.line,
                notes: vec![candidate.peer.clone()],
            }),
        }
    }
}

/// Detect alignment between a rectangle and a set of peer notes.
///
/// `exclude` names the moving note so it never aligns with itself.
pub fn detect_rect<'a, I>(rect: Rect, exclude: Option<&str>, peers: I, threshold: f64) -> AlignmentResult
where
    I: IntoIterator<Item = &'a Note>,
{
    let mut candidates = Vec::new();
    for peer in peers {
        if exclude == Some(peer.id.as_str()) {
            continue;
        }
        candidates_for(rect, &peer.id, peer.bounds(), threshold, &mut candidates);
    }

    let snap_x = closest(&candidates, GuideOrientation::Vertical).map(|c| c.position);
    let snap_y = closest(&candidates, GuideOrientation::Horizontal).map(|c| c.position);

    let radius = threshold * 2.0;
    let mut guides = Vec::new();
    if let Some(x) = snap_x {
        guides_near(&candidates, GuideOrientation::Vertical, x, radius, &mut guides);
    }
    if let Some(y) = snap_y {
        guides_near(&candidates, GuideOrientation::Horizontal, y, radius, &mut guides);
    }

    AlignmentResult { guides, snap_x, snap_y }
}

/// Detect alignment guides for a note against its peers.
pub fn detect<'a, I>(note: &Note, peers: I, threshold: f64) -> AlignmentResult
where
    I: IntoIterator<Item = &'a Note>,
{
    detect_rect(note.bounds(), Some(&note.id), peers, threshold)
}

/// Detect alignment with the default threshold.
pub fn detect_default<'a, I>(note: &Note, peers: I) -> AlignmentResult
where
    I: IntoIterator<Item = &'a Note>,
{
    detect(note, peers, DEFAULT_ALIGNMENT_THRESHOLD)
}

/// Snap a moving rectangle to its peers and return the resolved top-left.
pub fn apply_snapping<'a, I>(rect: Rect, peers: I, threshold: f64) -> SnappedPosition
where
    I: IntoIterator<Item = &'a Note>,
{
    let result = detect_rect(rect, None, peers, threshold);
    SnappedPosition {
        position: result.apply(rect.origin()),
        guides: result.guides,
    }
}
