/// Hardware shader stage a program was bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Fragment,
    Vertex,
    Geometry,
    Export,
    Hull,
    Local,
    Compute,
}

/// The role a program plays in the pipeline, independent of the hardware stage running it.
///
/// With tessellation enabled the hardware runs the API vertex shader on the local stage and the
/// evaluation shader on the vertex (or export) stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogicalStage {
    Fragment,
    TessellationControl,
    TessellationEval,
    Vertex,
    Geometry,
    Compute,
}

impl LogicalStage {
    pub fn is_tessellation(self) -> bool {
        matches!(self, Self::TessellationControl | Self::TessellationEval)
    }
}
