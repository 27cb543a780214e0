use serde::{Deserialize, Serialize};

/// Response wrapper used by the user service
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
}

/// One page of a Spring Data `Page<T>` response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn has_next(&self) -> bool {
        !self.last
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Asc,
    #[serde(rename = "desc")]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Paging parameters for list endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub size: u32,
    pub sort_by: Option<String>,
    pub sort_direction: Option<SortDirection>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: 20,
            sort_by: None,
            sort_direction: None,
        }
    }
}

impl PageQuery {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            ..Self::default()
        }
    }

    pub fn sorted(mut self, sort_by: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_direction = Some(direction);
        self
    }

    /// Query pairs; services disagree on the name of the direction key.
    pub fn to_query(&self, direction_key: &str) -> Vec<(String, String)> {
        let mut query = vec![
            ("page".to_string(), self.page.to_string()),
            ("size".to_string(), self.size.to_string()),
        ];
        if let Some(sort_by) = &self.sort_by {
            query.push(("sortBy".to_string(), sort_by.clone()));
        }
        if let Some(direction) = self.sort_direction {
            query.push((direction_key.to_string(), direction.as_str().to_string()));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_without_data() {
        let envelope: StandardResponse<serde_json::Value> =
            serde_json::from_str(r#"{"success":true,"message":"OTP sent"}"#).unwrap();
        assert!(envelope.success);
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_page_decodes_spring_shape() {
        let page: Page<u32> = serde_json::from_str(
            r#"{"content":[1,2],"totalElements":12,"totalPages":6,"number":0,"size":2,"first":true,"last":false,"pageable":{}}"#,
        )
        .unwrap();
        assert_eq!(page.content, vec![1, 2]);
        assert_eq!(page.total_elements, 12);
        assert!(page.has_next());
    }

    #[test]
    fn test_page_query_direction_key() {
        let query = PageQuery::new(1, 10).sorted("name", SortDirection::Desc);
        let pairs = query.to_query("sortDirection");
        assert!(pairs.contains(&("sortDirection".to_string(), "desc".to_string())));
        assert!(pairs.contains(&("sortBy".to_string(), "name".to_string())));
        assert_eq!(PageQuery::default().to_query("sortDir").len(), 2);
    }
}
