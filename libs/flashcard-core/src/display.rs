//! Read-time presentation of a card under a set's flip mode.

/// Which text is shown first and which is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sides<'a> {
    pub front: &'a str,
    pub back: &'a str,
}

/// Swap question and answer when `flip_mode` is set.
///
/// Stored card content is never touched; this is purely a view.
pub fn sides<'a>(question: &'a str, answer: &'a str, flip_mode: bool) -> Sides<'a> {
    if flip_mode {
        Sides {
            front: answer,
            back: question,
        }
    } else {
        Sides {
            front: question,
            back: answer,
        }
    }
}
