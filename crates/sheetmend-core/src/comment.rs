//! Cell comments (notes)
//!
//! The repair engine attaches its explanatory annotations as cell comments,
//! so the model carries them even though nothing else in the pipeline reads
//! them back.

/// A cell comment/note
#[derive(Debug, Clone, PartialEq)]
pub struct CellComment {
    /// Author of the comment
    pub author: String,
    /// Comment text content
    pub text: String,
}

impl CellComment {
    /// Create a new comment with the given author and text
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
        }
    }

    /// Create a comment with just text (empty author)
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            author: String::new(),
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_comment() {
        let c = CellComment::new("sheetmend", "dangling reference");
        assert_eq!(c.author, "sheetmend");
        assert_eq!(c.text, "dangling reference");
    }

    #[test]
    fn test_text_only() {
        let c = CellComment::text_only("note");
        assert!(c.author.is_empty());
    }
}
