use serde::Deserialize;
use validator::Validate;

use crate::models::domain::SourceKind;

#[derive(Debug, Clone, Deserialize)]
pub struct SelectSourceRequest {
    pub source: SourceKind,
}

/// An empty topic is accepted; it clears the session back to the welcome view.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TopicRequest {
    #[validate(length(max = 300, message = "Topic must be at most 300 characters"))]
    pub topic: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UploadQuery {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_source_request_parses_snake_case() {
        let req: SelectSourceRequest = serde_json::from_str(r#"{"source":"file"}"#).unwrap();
        assert_eq!(req.source, SourceKind::File);

        let req: SelectSourceRequest =
            serde_json::from_str(r#"{"source":"wikipedia_article"}"#).unwrap();
        assert_eq!(req.source, SourceKind::WikipediaArticle);
    }

    #[test]
    fn test_unknown_source_is_rejected() {
        assert!(serde_json::from_str::<SelectSourceRequest>(r#"{"source":"youtube"}"#).is_err());
    }

    #[test]
    fn test_topic_request_validation() {
        let empty = TopicRequest {
            topic: String::new(),
        };
        assert!(empty.validate().is_ok());

        let too_long = TopicRequest {
            topic: "a".repeat(301),
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_upload_query_requires_file_name() {
        let query = UploadQuery {
            file_name: String::new(),
        };
        assert!(query.validate().is_err());
    }
}
