/// File categorization by extension.
///
/// Every collected file lands in a category bucket. The category is derived
/// from the file extension alone, case-insensitively, using a fixed table.
///
/// # Examples
///
/// ```
/// use file_collector::file_category::{Category, FileMapper};
///
/// let mapper = FileMapper::default();
/// assert_eq!(mapper.classify("JPG"), Category::Images);
/// assert_eq!(mapper.classify("flac"), Category::Audio);
/// assert_eq!(mapper.classify("xyz"), Category::Other);
/// ```
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

/// Represents a broad file category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    /// Image files (JPG, PNG, GIF, etc.)
    Images,
    /// Document files (PDF, DOCX, TXT, etc.)
    Documents,
    /// Video files (MP4, MOV, MKV, etc.)
    Videos,
    /// Audio files (MP3, WAV, FLAC, etc.)
    Audio,
    /// Archive files (ZIP, RAR, 7Z, etc.)
    Archives,
    /// Anything not in the table. Only collected with the "All" selection.
    Other,
}

impl Category {
    /// The five categories backed by the extension table.
    pub const KNOWN: [Category; 5] = [
        Category::Images,
        Category::Documents,
        Category::Videos,
        Category::Audio,
        Category::Archives,
    ];

    /// Returns the name used as the prefix of the output bucket directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use file_collector::file_category::Category;
    ///
    /// assert_eq!(Category::Images.dir_name(), "Images");
    /// assert_eq!(Category::Other.dir_name(), "Other");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Images => "Images",
            Category::Documents => "Documents",
            Category::Videos => "Videos",
            Category::Audio => "Audio",
            Category::Archives => "Archives",
            Category::Other => "Other",
        }
    }

    /// Returns the bucket directory name for a file modified on `date`.
    ///
    /// ```
    /// use file_collector::file_category::Category;
    ///
    /// assert_eq!(Category::Videos.bucket("2024-03-01"), "Videos_2024-03-01");
    /// ```
    pub fn bucket(&self, date: &str) -> String {
        format!("{}_{}", self.dir_name(), date)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "images" | "image" => Ok(Category::Images),
            "documents" | "document" => Ok(Category::Documents),
            "videos" | "video" => Ok(Category::Videos),
            "audio" => Ok(Category::Audio),
            "archives" | "archive" => Ok(Category::Archives),
            "other" => Ok(Category::Other),
            other => Err(format!(
                "unknown category '{}': expected images, documents, videos, audio or archives",
                other
            )),
        }
    }
}

/// Which categories a run collects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySelection {
    /// Every file, including extensions outside the table (as `Other`).
    All,
    /// Only the listed categories.
    Only(BTreeSet<Category>),
}

impl CategorySelection {
    /// Builds an explicit selection.
    pub fn only<I: IntoIterator<Item = Category>>(categories: I) -> Self {
        CategorySelection::Only(categories.into_iter().collect())
    }

    /// Returns true if files of `category` belong in the plan.
    pub fn includes(&self, category: Category) -> bool {
        match self {
            CategorySelection::All => true,
            CategorySelection::Only(set) => set.contains(&category),
        }
    }

    /// Returns true for an explicit selection with nothing in it.
    pub fn is_empty(&self) -> bool {
        matches!(self, CategorySelection::Only(set) if set.is_empty())
    }
}

/// Maps file extensions to categories.
///
/// The default table is fixed; extra extensions can be layered on top via
/// [`FileMapper::add_extension_mapping`], which is how the `[extensions]`
/// configuration section is applied.
#[derive(Debug, Clone)]
pub struct FileMapper {
    extension_map: HashMap<String, Category>,
}

impl FileMapper {
    /// Creates a new `FileMapper` with the standard table.
    pub fn new() -> Self {
        let mut mapper = Self {
            extension_map: HashMap::new(),
        };
        mapper.populate_standard_mappings();
        mapper
    }

    fn populate_standard_mappings(&mut self) {
        let table: [(Category, &[&str]); 5] = [
            (
                Category::Images,
                &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp"],
            ),
            (
                Category::Documents,
                &["pdf", "docx", "txt", "xlsx", "csv", "pptx"],
            ),
            (
                Category::Videos,
                &["mp4", "mov", "avi", "mkv", "3gp", "wmv", "m4v"],
            ),
            (Category::Audio, &["mp3", "wav", "m4a", "ogg", "flac", "aac"]),
            (Category::Archives, &["zip", "rar", "7z", "tar", "gz", "iso"]),
        ];

        for (category, extensions) in table {
            for ext in extensions {
                self.add_extension_mapping(ext, category);
            }
        }
    }

    /// Adds a file extension to category mapping. A leading dot is ignored.
    pub fn add_extension_mapping(&mut self, ext: &str, category: Category) {
        let ext = ext.trim_start_matches('.').to_lowercase();
        self.extension_map.insert(ext, category);
    }

    /// Maps an extension to a table category, if it has one.
    ///
    /// ```
    /// use file_collector::file_category::{Category, FileMapper};
    ///
    /// let mapper = FileMapper::default();
    /// assert_eq!(mapper.extension_to_category("PDF"), Some(Category::Documents));
    /// assert_eq!(mapper.extension_to_category("rs"), None);
    /// ```
    pub fn extension_to_category(&self, ext: &str) -> Option<Category> {
        let ext = ext.trim_start_matches('.');
        self.extension_map.get(&ext.to_lowercase()).copied()
    }

    /// Classifies an extension, falling back to `Category::Other`.
    ///
    /// Whether an `Other` file is collected is decided by the run's
    /// [`CategorySelection`], not here.
    pub fn classify(&self, ext: &str) -> Category {
        self.extension_to_category(ext).unwrap_or(Category::Other)
    }
}

impl Default for FileMapper {
    fn default() -> Self {
        Self::new()
    }
}
