/*
    STAM Library (Stand-off Text Annotation Model)
        by Maarten van Gompel <proycon@anaproy.nl>
        Digital Infrastucture, KNAW Humanities Cluster

        Licensed under the GNU General Public License v3

        https://github.com/annotation/stam-rust
*/

// This root module only groups the high-level API.
// See api/* for the high-level API implementations for each STAM object.

mod annotation;
mod annotationdata;
mod annotationdataset;
mod annotationstore;
mod datakey;
mod resources;
mod substore;
mod text;
mod textselection;

pub use text::*;
pub use textselection::SortTextualOrder;
