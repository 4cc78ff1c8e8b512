// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// List of all errors.
#[derive(Debug)]
pub enum Error {
    /// Failed to parse SVG path data.
    MalformedPath,

    /// Failed to parse a transform list.
    MalformedTransform,

    /// Failed to parse a color value.
    MalformedColor,

    /// A project document is missing required fields or is not valid JSON.
    MalformedProject(String),

    /// A group needs at least two members.
    TooFewMembers,

    /// Group members must belong to the same layer.
    MixedLayers,

    /// One of the requested members already belongs to a group.
    AlreadyGrouped(crate::EntityId),

    /// The last remaining layer cannot be deleted.
    LastLayer,

    /// The selection cannot be merged into a single path.
    NotMergeable,

    /// The referenced entity does not exist.
    NoSuchEntity(crate::EntityId),

    /// The referenced layer does not exist.
    NoSuchLayer(crate::LayerId),

    /// The referenced group does not exist.
    NoSuchGroup(crate::GroupId),

    /// A serialized project exceeds the autosave size cap.
    AutosaveTooLarge(usize),

    /// The blob store rejected a write.
    BlobStoreFailed(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::MalformedPath => {
                write!(f, "failed to parse SVG path data")
            }
            Error::MalformedTransform => {
                write!(f, "failed to parse a transform list")
            }
            Error::MalformedColor => {
                write!(f, "failed to parse a color value")
            }
            Error::MalformedProject(ref e) => {
                write!(f, "malformed project document: {}", e)
            }
            Error::TooFewMembers => {
                write!(f, "a group needs at least two members")
            }
            Error::MixedLayers => {
                write!(f, "group members must belong to the same layer")
            }
            Error::AlreadyGrouped(ref id) => {
                write!(f, "entity '{}' already belongs to a group", id)
            }
            Error::LastLayer => {
                write!(f, "the last layer cannot be deleted")
            }
            Error::NotMergeable => {
                write!(f, "the selection cannot be merged into a single path")
            }
            Error::NoSuchEntity(ref id) => {
                write!(f, "no entity with id '{}'", id)
            }
            Error::NoSuchLayer(ref id) => {
                write!(f, "no layer with id '{}'", id)
            }
            Error::NoSuchGroup(ref id) => {
                write!(f, "no group with id '{}'", id)
            }
            Error::AutosaveTooLarge(size) => {
                write!(f, "serialized project is too large for autosave: {}B", size)
            }
            Error::BlobStoreFailed(ref e) => {
                write!(f, "blob store write failed: {}", e)
            }
        }
    }
}

impl std::error::Error for Error {}
