//! Editorial content: media files and the texts that embed them.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Base, MediaId, TextId, base_record};
use crate::entity::{
    BASE_COLUMNS, Column, ColumnKind, Entity, EntityMeta, Related, Relation, RelationKind,
    require_non_empty,
};
use crate::error::DomainError;
use crate::record::{Node, Record};

/// Most media items a single text may reference.
pub const MAX_TEXT_MEDIA: usize = 10;

const MEDIA_COLUMNS: [Column; 7] = [
    BASE_COLUMNS[0],
    BASE_COLUMNS[1],
    BASE_COLUMNS[2],
    BASE_COLUMNS[3],
    Column::required("file", ColumnKind::Text),
    Column::required("file_type", ColumnKind::Text),
    Column::nullable("description", ColumnKind::Text),
];

const TEXT_COLUMNS: [Column; 8] = [
    BASE_COLUMNS[0],
    BASE_COLUMNS[1],
    BASE_COLUMNS[2],
    BASE_COLUMNS[3],
    Column::required("context_marker", ColumnKind::Text),
    Column::required("body", ColumnKind::Text),
    Column::required("is_default_media", ColumnKind::Bool),
    Column::required("reading_pagination", ColumnKind::Bool),
];

// ─────────────────────────────────────────────────────────────────────────────
// Media
// ─────────────────────────────────────────────────────────────────────────────

/// An uploaded file referenced by texts.
#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    pub id: MediaId,
    /// Storage path of the file
    pub file: String,
    /// e.g. "image", "video"
    pub file_type: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Media {
    pub fn new(file: impl Into<String>, file_type: impl Into<String>) -> Self {
        Self {
            id: MediaId::nil(),
            file: file.into(),
            file_type: file_type.into(),
            description: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Entity for Media {
    const META: EntityMeta = EntityMeta {
        name: "Media",
        table: "media",
        columns: &MEDIA_COLUMNS,
        write_timestamps: &[],
    };

    fn id(&self) -> Uuid {
        self.id.into_uuid()
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn from_record(record: &Record) -> Result<Self, DomainError> {
        let base = Base::read(record)?;
        Ok(Self {
            id: MediaId::from_uuid(base.id),
            file: record.text("file")?,
            file_type: record.text("file_type")?,
            description: record.opt_text("description")?,
            is_active: base.is_active,
            created_at: base.created_at,
            updated_at: base.updated_at,
        })
    }

    fn to_record(&self) -> Record {
        base_record(self.id(), self.is_active, self.created_at, self.updated_at)
            .with("file", self.file.as_str())
            .with("file_type", self.file_type.as_str())
            .with("description", self.description.clone())
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty("Media file", &self.file)?;
        require_non_empty("Media file type", &self.file_type)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Text
// ─────────────────────────────────────────────────────────────────────────────

/// A block of copy shown at a marked place in the client UI.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub id: TextId,
    /// Where the text is rendered, e.g. "home_banner"
    pub context_marker: String,
    pub body: String,
    pub is_default_media: bool,
    pub reading_pagination: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub media_files: Related<Vec<Media>>,
}

impl Text {
    pub const MEDIA_FILES: Relation = Relation {
        name: "media_files",
        target: &Media::META,
        kind: RelationKind::ManyToMany {
            table: "text_media",
            owner_key: "text_id",
            target_key: "media_id",
            max_links: Some(MAX_TEXT_MEDIA),
        },
    };

    pub fn new(context_marker: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: TextId::nil(),
            context_marker: context_marker.into(),
            body: body.into(),
            is_default_media: false,
            reading_pagination: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
            media_files: Related::NotLoaded,
        }
    }
}

impl Entity for Text {
    const META: EntityMeta = EntityMeta {
        name: "Text",
        table: "texts",
        columns: &TEXT_COLUMNS,
        write_timestamps: &[],
    };

    fn id(&self) -> Uuid {
        self.id.into_uuid()
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn from_record(record: &Record) -> Result<Self, DomainError> {
        let base = Base::read(record)?;
        Ok(Self {
            id: TextId::from_uuid(base.id),
            context_marker: record.text("context_marker")?,
            body: record.text("body")?,
            is_default_media: record.bool("is_default_media")?,
            reading_pagination: record.bool("reading_pagination")?,
            is_active: base.is_active,
            created_at: base.created_at,
            updated_at: base.updated_at,
            media_files: Related::NotLoaded,
        })
    }

    fn from_node(node: &Node) -> Result<Self, DomainError> {
        let mut text = Self::from_record(&node.record)?;
        text.media_files = node.related_many(Self::MEDIA_FILES.name)?;
        Ok(text)
    }

    fn to_record(&self) -> Record {
        base_record(self.id(), self.is_active, self.created_at, self.updated_at)
            .with("context_marker", self.context_marker.as_str())
            .with("body", self.body.as_str())
            .with("is_default_media", self.is_default_media)
            .with("reading_pagination", self.reading_pagination)
    }

    fn validate(&self) -> Result<(), DomainError> {
        require_non_empty("Text context marker", &self.context_marker)?;
        require_non_empty("Text body", &self.body)
    }
}
