//! The decoded content model: products and their assembly steps.
//!
//! A [`Product`] owns an ordered sequence of [`Step`]s. `Step` is a closed
//! enum; presentation code is expected to `match` on it exhaustively rather
//! than inspect a type tag.
//!
//! ```
//! use buildwell::model::{Product, Step};
//!
//! let chair = Product::new(
//!     "chair",
//!     "Chair",
//!     vec![Step::title("Setup"), Step::text("Attach legs"), Step::video("abc123")],
//! );
//!
//! for step in chair.steps() {
//!     match step {
//!         Step::Text { body } => println!("{body}"),
//!         Step::Title { heading } => println!("# {heading}"),
//!         Step::Video { video_id } => println!("[video {video_id}]"),
//!     }
//! }
//! assert_eq!(chair.videos().collect::<Vec<_>>(), ["abc123"]);
//! ```

use std::fmt;

/// One assembly step of a product's instructions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    /// A paragraph of instruction text.
    Text {
        /// The paragraph, verbatim.
        body: String,
    },
    /// A section heading.
    Title {
        /// The heading, verbatim.
        heading: String,
    },
    /// An embedded video, identified by an opaque external id.
    Video {
        /// Identifier handed to the video player. Never validated.
        video_id: String,
    },
}

impl Step {
    /// Creates a [`Step::Text`].
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text { body: body.into() }
    }

    /// Creates a [`Step::Title`].
    pub fn title(heading: impl Into<String>) -> Self {
        Self::Title {
            heading: heading.into(),
        }
    }

    /// Creates a [`Step::Video`].
    pub fn video(video_id: impl Into<String>) -> Self {
        Self::Video {
            video_id: video_id.into(),
        }
    }

    /// Returns the variant of this step.
    #[must_use]
    pub fn kind(&self) -> StepKind {
        match self {
            Self::Text { .. } => StepKind::Text,
            Self::Title { .. } => StepKind::Title,
            Self::Video { .. } => StepKind::Video,
        }
    }

    /// Returns the string carried by the step: body, heading, or video id.
    #[must_use]
    pub fn payload(&self) -> &str {
        match self {
            Self::Text { body } => body,
            Self::Title { heading } => heading,
            Self::Video { video_id } => video_id,
        }
    }

    /// Returns the readable text of a text or title step.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { body } => Some(body),
            Self::Title { heading } => Some(heading),
            Self::Video { .. } => None,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text { body } => write!(f, "{body}"),
            Self::Title { heading } => write!(f, "== {heading} =="),
            Self::Video { video_id } => write!(f, "[video: {video_id}]"),
        }
    }
}

/// The variant tag of a [`Step`], matching the `type` attribute values of
/// the catalog document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// `type="text"`
    Text,
    /// `type="title"`
    Title,
    /// `type="video"`
    Video,
}

impl StepKind {
    /// Returns the `type` attribute value for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Title => "title",
            Self::Video => "video",
        }
    }

    /// Maps a `type` attribute value onto a kind. Matching is exact and
    /// case-sensitive; anything else is `None`.
    #[must_use]
    pub fn from_type_attribute(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "title" => Some(Self::Title),
            "video" => Some(Self::Video),
            _ => None,
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A product with its assembly instructions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Product {
    id: String,
    name: String,
    steps: Vec<Step>,
}

impl Product {
    /// Creates a product from its parts.
    pub fn new(id: impl Into<String>, name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            steps,
        }
    }

    /// Returns the lookup identifier. Empty when the document omitted it.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the steps in document order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Returns the ids of all video steps, in order.
    pub fn videos(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|step| match step {
            Step::Video { video_id } => Some(video_id.as_str()),
            _ => None,
        })
    }
}
