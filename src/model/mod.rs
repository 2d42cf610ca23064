//! # Point & Aspect Model
//!
//! Plain data shared by every stage: positions, labeled points, aspect
//! definitions and classified edges.
//!
//! Design rule: this module is pure data with no I/O and no logging.

pub mod position;
pub mod point;
pub mod aspect;

pub use position::{Position, RawPosition, circular_distance, FULL_CIRCLE, HALF_CIRCLE};
pub use point::{Point, Origin, OriginTagger, PrefixTagger, NoOrigin};
pub use aspect::{AspectKind, AspectDefinition, AspectVariant, AspectTable, AspectEdge};
