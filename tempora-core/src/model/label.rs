/// Categorical label applied to an event/order entry.
///
/// The numeric codes are the persisted representation and must not be
/// reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelType {
    /// `[B]` - a bounded event, begins and ends on the timeline.
    Begin,
    /// `[C]` - continuation of a bounded event.
    Continuation,
    /// `{U}` - unbounded on both ends.
    UnboundedBoth,
    /// `[U}` - bounded start, open toward the future.
    UnboundedRight,
    /// `{U]` - open past, bounded end.
    UnboundedLeft,
    /// `[R>` - placed after a point on another branch.
    RelativeAfter,
    /// `<R]` - placed before a point on another branch.
    RelativeBefore,
    /// `[<>]` - irrealis / hypothetical.
    Irrealis,
}

impl LabelType {
    pub fn all() -> &'static [LabelType] {
        &[
            LabelType::Begin,
            LabelType::Continuation,
            LabelType::UnboundedBoth,
            LabelType::UnboundedRight,
            LabelType::UnboundedLeft,
            LabelType::RelativeAfter,
            LabelType::RelativeBefore,
            LabelType::Irrealis,
        ]
    }

    pub fn code(&self) -> u8 {
        match self {
            LabelType::Begin => 0,
            LabelType::Continuation => 1,
            LabelType::UnboundedBoth => 2,
            LabelType::UnboundedRight => 3,
            LabelType::UnboundedLeft => 4,
            LabelType::RelativeAfter => 5,
            LabelType::RelativeBefore => 6,
            LabelType::Irrealis => 7,
        }
    }

    /// Unknown codes fall back to `Begin`, mirroring how loose input is
    /// normalized elsewhere rather than rejected.
    pub fn from_code(code: u8) -> LabelType {
        match code {
            1 => LabelType::Continuation,
            2 => LabelType::UnboundedBoth,
            3 => LabelType::UnboundedRight,
            4 => LabelType::UnboundedLeft,
            5 => LabelType::RelativeAfter,
            6 => LabelType::RelativeBefore,
            7 => LabelType::Irrealis,
            _ => LabelType::Begin,
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            LabelType::Begin => "[B]",
            LabelType::Continuation => "[C]",
            LabelType::UnboundedBoth => "{U}",
            LabelType::UnboundedRight => "[U}",
            LabelType::UnboundedLeft => "{U]",
            LabelType::RelativeAfter => "[R>",
            LabelType::RelativeBefore => "<R]",
            LabelType::Irrealis => "[<>]",
        }
    }

    /// Successor in the label cycle.
    ///
    /// The two directional-relative labels are reachable only through a
    /// dedicated placement action, never by cycling: cycling past
    /// `UnboundedLeft` jumps straight to `Irrealis`. An explicit table
    /// rather than arithmetic, so the skip stays auditable.
    pub fn next(&self) -> LabelType {
        match self {
            LabelType::Begin => LabelType::Continuation,
            LabelType::Continuation => LabelType::UnboundedBoth,
            LabelType::UnboundedBoth => LabelType::UnboundedRight,
            LabelType::UnboundedRight => LabelType::UnboundedLeft,
            LabelType::UnboundedLeft => LabelType::Irrealis,
            LabelType::RelativeAfter => LabelType::Irrealis,
            LabelType::RelativeBefore => LabelType::Irrealis,
            LabelType::Irrealis => LabelType::Begin,
        }
    }

    pub fn is_directional(&self) -> bool {
        matches!(self, LabelType::RelativeAfter | LabelType::RelativeBefore)
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(
            self,
            LabelType::UnboundedBoth | LabelType::UnboundedRight | LabelType::UnboundedLeft
        )
    }
}

impl Default for LabelType {
    fn default() -> Self {
        LabelType::Begin
    }
}
