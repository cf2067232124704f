//! Idempotent span annotation over a mutable fragment tree.
//!
//! A host owns a [`Tree`] of elements and text fragments and keeps editing
//! it. An [`Engine`] repeatedly runs four passes over each root: quotations,
//! typewriter units, custom delimiters and locale runs. Each pass wraps the
//! spans it finds in marked elements and is skipped while its [`Signature`]
//! is unchanged, so a settled tree is left alone. A root that is being
//! streamed into can be mirrored as a [`StreamFrame`] whose changes come out
//! as minimal [`Patch`]es.
//!
//! ```rust
//! use spanweave::{Engine, EngineOptions, Pass, Tree};
//!
//! let mut tree = Tree::new();
//! let root = tree.create_root();
//! tree.append_text(root, "A <<b>> C <<d").unwrap();
//!
//! let mut options = EngineOptions::default();
//! options.custom.font = "Fira Code".into();
//! options.custom.open = "<<".into();
//! options.custom.close = ">>".into();
//! let mut engine = Engine::new(options);
//!
//! engine.tick(&mut tree);
//! assert_eq!(tree.marker_count(root, Pass::Delimiter), 1);
//! assert_eq!(tree.text_content(root), "A <<b>> C <<d");
//! ```

pub mod annotator;
pub mod delimiter;
pub mod locale;
pub mod quote;
pub mod segmentation;
pub mod stream;
pub mod typewriter;

mod engine;
mod error;
mod hook;
mod locale_data;
mod options;
mod passes;
mod scheduler;
mod signature;
mod span;
mod text_view;
mod tree;

#[cfg(test)]
mod tests;

pub use engine::{Engine, LifecycleEvent, RootReport, StreamUpdate, TickReport};
pub use error::{EngineError, HookError, TreeError};
pub use hook::PresentationHook;
pub use locale_data::LocaleKey;
pub use options::{
    CustomDelimiterOptions, DialogueOptions, EngineOptions, Granularity, Limits, LocaleFontRule,
    LocaleOptions, RenderMode, StreamEffect, StreamOptions, TypewriterOptions,
};
pub use quote::QuoteCategory;
pub use scheduler::{Notification, Reason, ScanPlan, ScanScheduler, Target};
pub use segmentation::Segmentation;
pub use signature::{Signature, SignatureCache};
pub use span::{Span, SpanKind, sorted_and_disjoint};
pub use stream::{Patch, StreamFrame, StreamNode, StreamUnit, apply_patches, reconcile};
pub use text_view::TextView;
pub use tree::{Element, Fragment, Marker, MarkerKind, NodeId, Pass, Role, Tree};
pub use typewriter::TypewriterTiming;
