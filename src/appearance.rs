use crate::color::{Rgb, hash_color};
use crate::config::LinkIdentity;
use crate::model::LinkColumn;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkColor {
    Hashed(Rgb),
    Gray,
    Black,
}

impl LinkColor {
    pub fn css(self) -> String {
        match self {
            Self::Hashed(rgb) => rgb.to_hex(),
            Self::Gray => "gray".to_owned(),
            Self::Black => "black".to_owned(),
        }
    }

    pub fn rgb(self) -> Rgb {
        match self {
            Self::Hashed(rgb) => rgb,
            Self::Gray => Rgb::new(128, 128, 128),
            Self::Black => Rgb::new(0, 0, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkAppearance {
    pub color: LinkColor,
    pub opacity: f32,
    pub stroke: Option<LinkColor>,
}

const FADED_OPACITY: f32 = 0.3;

pub fn same_link(a: &LinkColumn, b: &LinkColumn, identity: LinkIdentity) -> bool {
    match identity {
        LinkIdentity::Fingerprint => a.fingerprint() == b.fingerprint(),
        LinkIdentity::Pair => a.pair() == b.pair(),
    }
}

/// Colour pass for one link column given the current highlight and selection.
///
/// The selection, when present, is the reference link; otherwise the
/// highlight is. Links matching the reference (or all links when there is
/// none) keep their hashed colour, everything else fades to gray.
pub fn color_for(
    link_column: &LinkColumn,
    highlighted: Option<&LinkColumn>,
    selected: Option<&LinkColumn>,
    identity: LinkIdentity,
) -> LinkAppearance {
    let active = selected.or(highlighted);

    match active {
        Some(reference) if !same_link(link_column, reference, identity) => LinkAppearance {
            color: LinkColor::Gray,
            opacity: FADED_OPACITY,
            stroke: None,
        },
        _ => LinkAppearance {
            color: LinkColor::Hashed(hash_color(link_column.fingerprint())),
            opacity: 1.0,
            stroke: active.map(|_| LinkColor::Black),
        },
    }
}
