//! Tool surfaces and anchor points.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::dom::NodeId;

/// Kind of page region that receives a tool cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
    Compose,
    Reply,
    View,
}

impl SurfaceKind {
    /// Matcher priority within one scan.
    pub const PRIORITY: [SurfaceKind; 3] =
        [SurfaceKind::Compose, SurfaceKind::Reply, SurfaceKind::View];

    pub fn as_str(&self) -> &'static str {
        match self {
            SurfaceKind::Compose => "compose",
            SurfaceKind::Reply => "reply",
            SurfaceKind::View => "view",
        }
    }
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SurfaceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SurfaceKind::PRIORITY
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown surface kind: {}", s))
    }
}

/// A matched region of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Surface {
    pub kind: SurfaceKind,
    pub node: NodeId,
}

impl Surface {
    pub fn new(kind: SurfaceKind, node: NodeId) -> Self {
        Self { kind, node }
    }
}

/// Candidate insertion points, resolved by the host-page strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    AfterHeader,
    BeforeBody,
    BeforeEditor,
    AppendToContainer,
}

/// A resolved insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Before(NodeId),
    After(NodeId),
    Append(NodeId),
}
