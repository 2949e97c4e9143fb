//! Shape tags and the assignment-kind table.
//!
//! Shapes are pure type-level keys: they are never instantiated with data.
//! The table maps a (destination shape, source shape) pair to the mechanism
//! that performs the assignment. Only `Dense2Dense` has an implementation in
//! `dense-assign`; the other kinds are named so that structured and sparse
//! crates can plug in without touching the dispatcher.

use std::fmt::Debug;

/// Structural category of an expression.
pub trait ShapeTag: Copy + Default + Debug + 'static {
    const NAME: &'static str;
}

macro_rules! shape_tags {
    ($($(#[$doc:meta])* $name:ident => $label:literal),* $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            pub struct $name;

            impl ShapeTag for $name {
                const NAME: &'static str = $label;
            }
        )*
    };
}

shape_tags!(
    /// Every coefficient is stored.
    Dense => "dense",
    /// Only the diagonal is stored.
    Diagonal => "diagonal",
    /// A band around the diagonal is stored.
    Band => "band",
    /// One triangle is stored.
    Triangular => "triangular",
    /// One triangle is stored and mirrored.
    SelfAdjoint => "self-adjoint",
    /// Only nonzeros are stored.
    Sparse => "sparse",
);

/// Dense rectangular loops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dense2Dense;

/// Triangle-to-triangle copies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Triangular2Triangular;

/// Scatter of a sparse source into a dense destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sparse2Dense;

/// Sparse-to-sparse assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sparse2Sparse;

/// Selects the assignment mechanism for `Self` (destination shape) and `Src`.
pub trait AssignmentKind<Src: ShapeTag>: ShapeTag {
    type Kind: Debug + Default;
}

impl AssignmentKind<Dense> for Dense {
    type Kind = Dense2Dense;
}

impl AssignmentKind<Triangular> for Triangular {
    type Kind = Triangular2Triangular;
}

impl AssignmentKind<Sparse> for Dense {
    type Kind = Sparse2Dense;
}

impl AssignmentKind<Sparse> for Sparse {
    type Kind = Sparse2Sparse;
}
